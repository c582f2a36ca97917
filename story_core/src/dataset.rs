//! Loading the labor-market CSV into an ordered, immutable record list.
//!
//! Monetary cells are parsed leniently: blanks, thousands separators, a
//! leading `$` and the suppression markers used by published wage tables
//! (`*`, `**`, `#`) are accepted, with unusable values becoming `NaN`. Title,
//! level, code group and year are required and fail the load when missing.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::record::{OccupationLevel, Percentiles, Record};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
    #[error("dataset contains no records")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(alias = "OCC_TITLE", alias = "title")]
    state_or_occupation_title: Option<String>,
    #[serde(rename = "AREA_TITLE")]
    area_title: Option<String>,
    #[serde(alias = "O_GROUP", alias = "OCC_GROUP", alias = "level")]
    occupation_level: Option<String>,
    #[serde(alias = "OCC_CODE", alias = "code_group")]
    occupation_code_group: Option<String>,
    #[serde(alias = "YEAR")]
    year: Option<String>,
    #[serde(alias = "A_MEAN")]
    annual_mean: Option<String>,
    #[serde(alias = "TOT_EMP")]
    total_employment: Option<String>,
    #[serde(alias = "A_PCT10")]
    annual_percentile_10: Option<String>,
    #[serde(alias = "A_PCT25")]
    annual_percentile_25: Option<String>,
    #[serde(alias = "A_MEDIAN", alias = "annual_median")]
    annual_percentile_50: Option<String>,
    #[serde(alias = "A_PCT75")]
    annual_percentile_75: Option<String>,
    #[serde(alias = "A_PCT90")]
    annual_percentile_90: Option<String>,
}

impl RawRow {
    fn into_record(self) -> Result<Record, String> {
        let title = [self.state_or_occupation_title, self.area_title]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .ok_or_else(|| "missing state_or_occupation_title".to_string())?;
        let level = self
            .occupation_level
            .ok_or_else(|| "missing occupation_level".to_string())?
            .parse::<OccupationLevel>()
            .map_err(|err| err.to_string())?;
        let code_group = parse_code_group(
            self.occupation_code_group
                .as_deref()
                .ok_or_else(|| "missing occupation_code_group".to_string())?,
        )?;
        let year = parse_year(
            self.year
                .as_deref()
                .ok_or_else(|| "missing year".to_string())?,
        )?;
        let percentiles = Percentiles::new(
            parse_amount(self.annual_percentile_10.as_deref()),
            parse_amount(self.annual_percentile_25.as_deref()),
            parse_amount(self.annual_percentile_50.as_deref()),
            parse_amount(self.annual_percentile_75.as_deref()),
            parse_amount(self.annual_percentile_90.as_deref()),
        );
        Record::new(
            title,
            level,
            code_group,
            year,
            parse_amount(self.annual_mean.as_deref()),
            parse_count(self.total_employment.as_deref()),
            percentiles,
        )
        .ok_or_else(|| format!("year {year} is out of range"))
    }
}

/// Parses a monetary cell. Anything unusable becomes `NaN`.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return f64::NAN;
    };
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// Parses an employment count. Suppressed or negative values become `None`.
pub fn parse_count(raw: Option<&str>) -> Option<u64> {
    let cleaned: String = raw?.trim().chars().filter(|c| *c != ',').collect();
    if let Ok(value) = cleaned.parse::<u64>() {
        return Some(value);
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0 && *value < u64::MAX as f64)
        .map(|value| value.round() as u64)
}

fn parse_year(raw: &str) -> Result<i32, String> {
    let trimmed = raw.trim();
    trimmed
        .parse::<i32>()
        .or_else(|_| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|value| value.fract() == 0.0 && value.abs() < i32::MAX as f64)
                .map(|value| value as i32)
                .ok_or(())
        })
        .map_err(|_| format!("invalid year '{trimmed}'"))
}

/// Accepts either a bare group number (`11`) or an SOC code (`11-0000`).
fn parse_code_group(raw: &str) -> Result<i32, String> {
    let trimmed = raw.trim();
    let head = trimmed.split('-').next().unwrap_or(trimmed);
    head.parse::<i32>()
        .map_err(|_| format!("invalid occupation_code_group '{trimmed}'"))
}

/// In-memory dataset, in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    source: Option<PathBuf>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            source: None,
        }
    }

    /// Parses CSV with a header row. An input with no data rows is rejected.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let line = row.position().map(|pos| pos.line()).unwrap_or_default();
            let raw: RawRow = row.deserialize(Some(&headers))?;
            let record = raw
                .into_record()
                .map_err(|reason| DatasetError::InvalidRow { line, reason })?;
            records.push(record);
        }
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self::from_records(records))
    }

    pub fn from_csv_str(csv: &str) -> Result<Self, DatasetError> {
        Self::from_reader(csv.as_bytes())
    }

    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut dataset = Self::from_reader(io::BufReader::new(file))?;
        dataset.source = Some(path.to_path_buf());
        tracing::info!(
            target: "labor_story::dataset",
            path = %path.display(),
            records = dataset.len(),
            "dataset.loaded"
        );
        Ok(dataset)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.records.iter().map(|record| record.year).collect()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.records.iter().map(|record| record.year).max()
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.records.iter().any(|record| record.year == year)
    }

    /// Distinct titles at `level`, sorted.
    pub fn titles_at(&self, level: OccupationLevel) -> BTreeSet<String> {
        self.records
            .iter()
            .filter(|record| record.level == level)
            .map(|record| record.title.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Percentile;

    const SAMPLE: &str = "\
state_or_occupation_title,occupation_level,occupation_code_group,year,annual_mean,total_employment,annual_percentile_10,annual_percentile_25,annual_percentile_50,annual_percentile_75,annual_percentile_90
Management Occupations,major,11,2023,\"137,750\",\"10,495,770\",56400,81650,116880,165410,*
Top Executives,minor,11,2023,140000,3000000,50000,70000,100000,150000,#
";

    #[test]
    fn parses_rows_in_file_order() {
        let dataset = Dataset::from_csv_str(SAMPLE).expect("sample parses");
        assert_eq!(dataset.len(), 2);
        let first = &dataset.records()[0];
        assert_eq!(first.title, "Management Occupations");
        assert_eq!(first.level, OccupationLevel::Major);
        assert_eq!(first.annual_mean, 137_750.0);
        assert_eq!(first.total_employment, Some(10_495_770));
        assert!(first.percentile(Percentile::P90).is_nan());
        assert_eq!(dataset.records()[1].level, OccupationLevel::Minor);
    }

    #[test]
    fn accepts_published_column_names() {
        let csv = "OCC_TITLE,O_GROUP,OCC_CODE,YEAR,A_MEAN,TOT_EMP,A_PCT10,A_PCT25,A_MEDIAN,A_PCT75,A_PCT90\n\
                   Legal Occupations,major,23-0000,2022,\"124,470\",**,48000,62000,99990,160000,#\n";
        let dataset = Dataset::from_csv_str(csv).expect("aliases parse");
        let record = &dataset.records()[0];
        assert_eq!(record.code_group, 23);
        assert_eq!(record.year, 2022);
        assert_eq!(record.total_employment, None);
        assert_eq!(record.percentiles.median(), 99_990.0);
    }

    #[test]
    fn occupation_title_wins_over_area_title() {
        let csv = "AREA_TITLE,OCC_TITLE,O_GROUP,OCC_CODE,YEAR,A_MEAN,TOT_EMP,A_PCT10,A_PCT25,A_MEDIAN,A_PCT75,A_PCT90\n\
                   U.S.,Legal Occupations,major,23-0000,2022,\"124,470\",\"1,200,000\",48000,62000,99990,160000,#\n\
                   Ohio,,major,00-0000,2022,60000,5000000,25000,32000,48000,70000,95000\n";
        let dataset = Dataset::from_csv_str(csv).expect("both title columns parse");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].title, "Legal Occupations");
        assert_eq!(dataset.records()[0].total_employment, Some(1_200_000));
        assert_eq!(dataset.records()[1].title, "Ohio");
    }

    #[test]
    fn missing_level_reports_line() {
        let csv = "state_or_occupation_title,occupation_level,occupation_code_group,year\n\
                   A,major,11,2020\n\
                   B,,13,2020\n";
        match Dataset::from_csv_str(csv) {
            Err(DatasetError::InvalidRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("occupation_level"), "{reason}");
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn header_only_input_is_empty() {
        let csv = "state_or_occupation_title,occupation_level,occupation_code_group,year\n";
        assert!(matches!(
            Dataset::from_csv_str(csv),
            Err(DatasetError::Empty)
        ));
    }

    #[test]
    fn lenient_amounts() {
        assert_eq!(parse_amount(Some("85,000")), 85_000.0);
        assert_eq!(parse_amount(Some("$1,250.50")), 1_250.5);
        assert!(parse_amount(Some("*")).is_nan());
        assert!(parse_amount(None).is_nan());
        assert_eq!(parse_count(Some("1,024")), Some(1024));
        assert_eq!(parse_count(Some("12.0")), Some(12));
        assert_eq!(parse_count(Some("**")), None);
        assert_eq!(parse_count(Some("1e30")), None);
        assert_eq!(parse_count(Some("-4")), None);
    }

    #[test]
    fn year_queries() {
        let dataset = Dataset::from_csv_str(SAMPLE).unwrap();
        assert_eq!(dataset.latest_year(), Some(2023));
        assert!(dataset.contains_year(2023));
        assert!(!dataset.contains_year(2019));
        assert_eq!(
            dataset.titles_at(OccupationLevel::Minor).into_iter().collect::<Vec<_>>(),
            vec!["Top Executives".to_string()]
        );
    }
}
