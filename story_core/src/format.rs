//! Human-readable number formatting for tooltips, tables and axes.

/// How values on an axis or in a tooltip are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Currency,
    Count,
    Year,
}

impl ValueFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Currency => format_currency(value),
            ValueFormat::Count => {
                if value.is_finite() && value >= 0.0 {
                    format_count(value.round() as u64)
                } else {
                    NOT_AVAILABLE.to_string()
                }
            }
            ValueFormat::Year => {
                if value.is_finite() {
                    format!("{:.0}", value)
                } else {
                    NOT_AVAILABLE.to_string()
                }
            }
        }
    }

    /// Short form for axis tick labels (`$85k`, `1.2M`).
    pub fn format_compact(self, value: f64) -> String {
        match self {
            ValueFormat::Year => self.format(value),
            ValueFormat::Currency => format!("${}", compact(value)),
            ValueFormat::Count => compact(value),
        }
    }
}

const NOT_AVAILABLE: &str = "n/a";

/// Whole dollars with thousands separators, e.g. `$85,000`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.abs() as u64))
}

pub fn format_count(value: u64) -> String {
    group_thousands(value)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn compact(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        insta::assert_snapshot!(
            [85_000.0, 1_234_567.4, 999.5, -12_000.0]
                .iter()
                .map(|v| format_currency(*v))
                .collect::<Vec<_>>()
                .join(" | "),
            @"$85,000 | $1,234,567 | $1,000 | -$12,000"
        );
    }

    #[test]
    fn missing_values_read_as_not_available() {
        assert_eq!(format_currency(f64::NAN), "n/a");
        assert_eq!(ValueFormat::Count.format(f64::NAN), "n/a");
    }

    #[test]
    fn compact_axis_labels() {
        assert_eq!(ValueFormat::Currency.format_compact(85_000.0), "$85k");
        assert_eq!(ValueFormat::Count.format_compact(1_240_000.0), "1.2M");
        assert_eq!(ValueFormat::Year.format_compact(2024.0), "2024");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(12), "12");
    }
}
