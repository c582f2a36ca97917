//! Typed occupation/income records.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Classification granularity of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OccupationLevel {
    Major,
    Minor,
}

impl OccupationLevel {
    pub const ALL: [OccupationLevel; 2] = [OccupationLevel::Major, OccupationLevel::Minor];

    pub fn as_str(self) -> &'static str {
        match self {
            OccupationLevel::Major => "major",
            OccupationLevel::Minor => "minor",
        }
    }
}

impl fmt::Display for OccupationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown occupation level '{}'", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for OccupationLevel {
    type Err = UnknownLevel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(OccupationLevel::Major),
            "minor" => Ok(OccupationLevel::Minor),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

/// One of the five published income percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Percentile {
    P10,
    P25,
    P50,
    P75,
    P90,
}

impl Percentile {
    pub const ALL: [Percentile; 5] = [
        Percentile::P10,
        Percentile::P25,
        Percentile::P50,
        Percentile::P75,
        Percentile::P90,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Percentile::P10 => "10th percentile",
            Percentile::P25 => "25th percentile",
            Percentile::P50 => "Median",
            Percentile::P75 => "75th percentile",
            Percentile::P90 => "90th percentile",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Percentile::P10 => 0,
            Percentile::P25 => 1,
            Percentile::P50 => 2,
            Percentile::P75 => 3,
            Percentile::P90 => 4,
        }
    }
}

/// Annual income at each published percentile. Missing values are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentiles([f64; 5]);

impl Percentiles {
    pub fn new(p10: f64, p25: f64, p50: f64, p75: f64, p90: f64) -> Self {
        Self([p10, p25, p50, p75, p90])
    }

    pub fn from_fn(mut value: impl FnMut(Percentile) -> f64) -> Self {
        let mut values = [f64::NAN; 5];
        for percentile in Percentile::ALL {
            values[percentile.slot()] = value(percentile);
        }
        Self(values)
    }

    pub fn get(&self, percentile: Percentile) -> f64 {
        self.0[percentile.slot()]
    }

    pub fn median(&self) -> f64 {
        self.get(Percentile::P50)
    }
}

/// A single row of the labor-market dataset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub title: String,
    pub level: OccupationLevel,
    pub code_group: i32,
    pub year: i32,
    pub date: NaiveDate,
    pub annual_mean: f64,
    pub total_employment: Option<u64>,
    pub percentiles: Percentiles,
}

impl Record {
    /// Builds a record, deriving `date` as January 1st of `year`.
    ///
    /// Returns `None` when the year is outside the calendar range chrono can
    /// represent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        level: OccupationLevel,
        code_group: i32,
        year: i32,
        annual_mean: f64,
        total_employment: Option<u64>,
        percentiles: Percentiles,
    ) -> Option<Self> {
        let date = date_for_year(year)?;
        Some(Self {
            title: title.into(),
            level,
            code_group,
            year,
            date,
            annual_mean,
            total_employment,
            percentiles,
        })
    }

    pub fn percentile(&self, percentile: Percentile) -> f64 {
        self.percentiles.get(percentile)
    }

    pub fn employment_or_zero(&self) -> u64 {
        self.total_employment.unwrap_or(0)
    }

    /// Ratio of the 90th to the 10th percentile, when both are usable.
    pub fn spread_ratio(&self) -> Option<f64> {
        let low = self.percentile(Percentile::P10);
        let high = self.percentile(Percentile::P90);
        (low.is_finite() && high.is_finite() && low > 0.0).then(|| high / low)
    }
}

pub fn date_for_year(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}
