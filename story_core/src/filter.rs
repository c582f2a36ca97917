//! Filter selections and the subsets derived from them.
//!
//! The level selection cascades into the title options: titles offered for
//! selection are always the distinct titles among records at the selected
//! level. Every accepted filter change recomputes both derived subsets.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::dataset::Dataset;
use crate::record::{OccupationLevel, Percentile, Percentiles, Record};

/// Either every value of a filter dimension or exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(selected) => selected == value,
        }
    }
}

impl<T> Selection<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn as_only(&self) -> Option<&T> {
        match self {
            Selection::All => None,
            Selection::Only(value) => Some(value),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("All"),
            Selection::Only(value) => value.fmt(f),
        }
    }
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_str("All"),
            Selection::Only(value) => value.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub year: Selection<i32>,
    pub level: Selection<OccupationLevel>,
    pub title: Selection<String>,
}

impl FilterState {
    /// Level and title only; the trend spans every year.
    pub fn matches_trend(&self, record: &Record) -> bool {
        self.level.matches(&record.level) && self.title.matches(&record.title)
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.year.matches(&record.year) && self.matches_trend(record)
    }
}

/// Distinct titles among records at `level`, or among all records for `All`.
pub fn title_options_for(
    level: &Selection<OccupationLevel>,
    records: &[Record],
) -> BTreeSet<String> {
    records
        .iter()
        .filter(|record| level.matches(&record.level))
        .map(|record| record.title.clone())
        .collect()
}

/// Choices offered by the select controls, each list led by `All`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub years: Vec<Selection<i32>>,
    pub levels: Vec<Selection<OccupationLevel>>,
    pub titles: Vec<Selection<String>>,
}

impl FilterOptions {
    pub fn derive(filter: &FilterState, dataset: &Dataset) -> Self {
        let years = std::iter::once(Selection::All)
            .chain(dataset.years().into_iter().map(Selection::Only))
            .collect();
        let levels = std::iter::once(Selection::All)
            .chain(OccupationLevel::ALL.into_iter().map(Selection::Only))
            .collect();
        let titles = std::iter::once(Selection::All)
            .chain(
                title_options_for(&filter.level, dataset.records())
                    .into_iter()
                    .map(Selection::Only),
            )
            .collect();
        Self {
            years,
            levels,
            titles,
        }
    }
}

/// Point guards: a plotted record needs a positive mean income and a
/// positive employment count.
pub fn has_plottable_values(record: &Record) -> bool {
    record.annual_mean > 0.0 && record.total_employment.is_some_and(|count| count > 0)
}

/// All filters plus the point guards. Applying it to its own output is a no-op.
pub fn point_subset(records: &[Record], filter: &FilterState) -> Vec<Record> {
    records
        .iter()
        .filter(|record| filter.matches(record) && has_plottable_values(record))
        .cloned()
        .collect()
}

/// One year of percentile values on the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub date: NaiveDate,
    pub percentiles: Percentiles,
    pub contributing: usize,
}

impl TrendPoint {
    fn from_record(record: &Record) -> Self {
        Self {
            year: record.year,
            date: record.date,
            percentiles: record.percentiles,
            contributing: 1,
        }
    }
}

struct YearBucket {
    date: NaiveDate,
    rows: usize,
    sums: [f64; 5],
    counts: [usize; 5],
}

/// Groups by year and averages every percentile column.
///
/// Only finite cells take part in a mean; a year with no finite value for a
/// column yields `NaN` there. Output is ascending by year and keeps the date
/// of the first record seen for each year.
pub fn aggregate_by_year<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<i32, YearBucket> = BTreeMap::new();
    for record in records {
        let bucket = buckets.entry(record.year).or_insert_with(|| YearBucket {
            date: record.date,
            rows: 0,
            sums: [0.0; 5],
            counts: [0; 5],
        });
        bucket.rows += 1;
        for percentile in Percentile::ALL {
            let value = record.percentile(percentile);
            if value.is_finite() {
                bucket.sums[percentile.slot()] += value;
                bucket.counts[percentile.slot()] += 1;
            }
        }
    }

    buckets
        .into_iter()
        .map(|(year, bucket)| {
            let percentiles = Percentiles::from_fn(|percentile| {
                let slot = percentile.slot();
                if bucket.counts[slot] > 0 {
                    bucket.sums[slot] / bucket.counts[slot] as f64
                } else {
                    f64::NAN
                }
            });
            TrendPoint {
                year,
                date: bucket.date,
                percentiles,
                contributing: bucket.rows,
            }
        })
        .collect()
}

/// Level and title filters only. With title `All` the matching records are
/// averaged per year; otherwise each matching record is its own point.
pub fn trend_subset(records: &[Record], filter: &FilterState) -> Vec<TrendPoint> {
    let matching = records.iter().filter(|record| filter.matches_trend(record));
    if filter.title.is_all() {
        return aggregate_by_year(matching);
    }
    let mut points: Vec<TrendPoint> = matching.map(TrendPoint::from_record).collect();
    points.sort_by_key(|point| point.year);
    points
}

/// Both subsets for the interactive scene, always recomputed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedSubsets {
    pub points: Vec<Record>,
    pub trend: Vec<TrendPoint>,
}

impl DerivedSubsets {
    pub fn compute(records: &[Record], filter: &FilterState) -> Self {
        let derived = Self {
            points: point_subset(records, filter),
            trend: trend_subset(records, filter),
        };
        tracing::debug!(
            target: "labor_story::filter",
            year = %filter.year,
            level = %filter.level,
            title = %filter.title,
            points = derived.points.len(),
            trend = derived.trend.len(),
            "filter.recomputed"
        );
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, level: OccupationLevel, year: i32, median: f64) -> Record {
        Record::new(
            title,
            level,
            11,
            year,
            median * 1.1,
            Some(1_000),
            Percentiles::new(median * 0.5, median * 0.7, median, median * 1.3, median * 1.8),
        )
        .unwrap()
    }

    #[test]
    fn selection_matches_everything_when_all() {
        assert!(Selection::<i32>::All.matches(&2020));
        assert!(Selection::Only(2020).matches(&2020));
        assert!(!Selection::Only(2021).matches(&2020));
        assert_eq!(Selection::Only(OccupationLevel::Minor).to_string(), "minor");
        assert_eq!(Selection::<String>::All.to_string(), "All");
    }

    #[test]
    fn title_options_follow_level() {
        let records = vec![
            record("A", OccupationLevel::Minor, 2020, 1.0),
            record("B", OccupationLevel::Minor, 2021, 1.0),
            record("C", OccupationLevel::Major, 2020, 1.0),
        ];
        let minor = title_options_for(&Selection::Only(OccupationLevel::Minor), &records);
        assert_eq!(minor.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
        let all = title_options_for(&Selection::All, &records);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn aggregate_averages_each_percentile() {
        let records = vec![
            record("Management Occupations", OccupationLevel::Major, 2024, 80_000.0),
            record("Management Occupations", OccupationLevel::Major, 2024, 90_000.0),
            record("Management Occupations", OccupationLevel::Major, 2023, 70_000.0),
        ];
        let trend = aggregate_by_year(&records);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].year, 2023);
        assert_eq!(trend[1].percentiles.median(), 85_000.0);
        assert_eq!(trend[1].percentiles.get(Percentile::P10), 42_500.0);
        assert_eq!(trend[1].contributing, 2);
    }

    #[test]
    fn aggregate_skips_missing_cells() {
        let mut sparse = record("X", OccupationLevel::Minor, 2022, 50_000.0);
        sparse.percentiles = Percentiles::new(f64::NAN, 1.0, 1.0, 1.0, f64::NAN);
        let full = record("Y", OccupationLevel::Minor, 2022, 50_000.0);
        let trend = aggregate_by_year([&sparse, &full]);
        assert_eq!(trend[0].percentiles.get(Percentile::P10), 25_000.0);

        let trend = aggregate_by_year([&sparse]);
        assert!(trend[0].percentiles.get(Percentile::P90).is_nan());
    }

    #[test]
    fn point_subset_applies_guards() {
        let mut unpaid = record("A", OccupationLevel::Minor, 2020, 10.0);
        unpaid.annual_mean = f64::NAN;
        let mut unstaffed = record("B", OccupationLevel::Minor, 2020, 10.0);
        unstaffed.total_employment = Some(0);
        let kept = record("C", OccupationLevel::Minor, 2020, 10.0);
        let points = point_subset(&[unpaid, unstaffed, kept], &FilterState::default());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].title, "C");
    }

    #[test]
    fn trend_ignores_year_filter() {
        let records = vec![
            record("A", OccupationLevel::Minor, 2020, 10.0),
            record("A", OccupationLevel::Minor, 2021, 20.0),
        ];
        let filter = FilterState {
            year: Selection::Only(2021),
            level: Selection::All,
            title: Selection::Only("A".to_string()),
        };
        let trend = trend_subset(&records, &filter);
        assert_eq!(trend.len(), 2);
        assert_eq!(point_subset(&records, &filter).len(), 1);
    }
}
