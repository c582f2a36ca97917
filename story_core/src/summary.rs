use serde::Serialize;

use crate::record::Record;

/// Aggregate figures for a subset of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubsetSummary {
    pub records: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub avg_mean_income: Option<f64>,
    pub total_employment: u64,
}

impl SubsetSummary {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut summary = SubsetSummary::default();
        let mut income_total = 0f64;
        let mut income_count = 0u64;

        for record in records {
            summary.records += 1;
            summary.first_year =
                Some(summary.first_year.map_or(record.year, |y| y.min(record.year)));
            summary.last_year =
                Some(summary.last_year.map_or(record.year, |y| y.max(record.year)));
            if record.annual_mean.is_finite() {
                income_total += record.annual_mean;
                income_count += 1;
            }
            summary.total_employment = summary
                .total_employment
                .saturating_add(record.employment_or_zero());
        }

        summary.avg_mean_income = if income_count > 0 {
            Some(income_total / income_count as f64)
        } else {
            None
        };
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{OccupationLevel, Percentiles};

    #[test]
    fn summarizes_span_and_totals() {
        let make = |year, mean, emp| {
            Record::new(
                "T",
                OccupationLevel::Minor,
                1,
                year,
                mean,
                emp,
                Percentiles::new(0.0, 0.0, 0.0, 0.0, 0.0),
            )
            .unwrap()
        };
        let records = [
            make(2021, 40_000.0, Some(10)),
            make(2019, f64::NAN, None),
            make(2023, 60_000.0, Some(5)),
        ];
        let summary = SubsetSummary::of(&records);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.first_year, Some(2019));
        assert_eq!(summary.last_year, Some(2023));
        assert_eq!(summary.avg_mean_income, Some(50_000.0));
        assert_eq!(summary.total_employment, 15);
    }

    #[test]
    fn huge_employment_counts_saturate() {
        let csv = "title,level,code_group,year,annual_mean,total_employment\n\
                   A,minor,11,2023,50000,1e19\n\
                   B,minor,11,2023,60000,1e19\n\
                   C,minor,11,2023,70000,1e30\n";
        let dataset = crate::Dataset::from_csv_str(csv).expect("counts parse");
        assert_eq!(
            dataset.records()[0].total_employment,
            Some(10_000_000_000_000_000_000)
        );
        assert_eq!(dataset.records()[2].total_employment, None);

        let summary = SubsetSummary::of(dataset.records());
        assert_eq!(summary.records, 3);
        assert_eq!(summary.total_employment, u64::MAX);
    }

    #[test]
    fn empty_subset_has_no_span() {
        let summary = SubsetSummary::of(std::iter::empty());
        assert_eq!(summary, SubsetSummary::default());
    }
}
