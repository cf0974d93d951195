//! Percentage-share report over the trailing 12 calendar months.
//!
//! Pure computation: the caller hands in grouped `(year, month, project)`
//! hour totals, the report never touches the database.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

pub const WINDOW_MONTHS: usize = 12;

const MONTH_ABBREV: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Juin", "Juil", "Août", "Sep", "Oct", "Nov", "Déc",
];

/// Summed hours for one `(year, month, project)` triple, as produced by a
/// `GROUP BY` over the time-entry table.
#[derive(Debug, Clone)]
pub struct HourBucket {
    pub year: i32,
    pub month: i32,
    pub project: String,
    pub hours: f64,
}

/// Chart-ready output: 12 chronological month labels and, per project, the
/// percentage of that month's hours the project accounts for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyShares {
    pub labels: Vec<String>,
    pub series: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ReportError {
    #[error("invalid period {year}-{month}: month must be in 1..=12")]
    InvalidPeriod { year: i32, month: i32 },
}

/// A calendar month. Construction enforces `1 <= month <= 12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    year: i32,
    month: i32,
}

impl Period {
    pub fn new(year: i32, month: i32) -> Result<Self, ReportError> {
        if !(1..=12).contains(&month) {
            return Err(ReportError::InvalidPeriod { year, month });
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> i32 {
        self.month
    }

    fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Abbreviated French label, e.g. `"Avr 2024"`.
    pub fn label(self) -> String {
        format!("{} {}", MONTH_ABBREV[(self.month - 1) as usize], self.year)
    }
}

fn window_start(end: Period) -> Period {
    let mut year = end.year;
    let mut month = end.month - 11;
    if month < 1 {
        month += 12;
        year -= 1;
    }
    Period { year, month }
}

/// The 12 consecutive months ending at `end` inclusive, chronological.
pub fn window(end: Period) -> Vec<Period> {
    let mut periods = Vec::with_capacity(WINDOW_MONTHS);
    let mut p = window_start(end);
    for _ in 0..WINDOW_MONTHS {
        periods.push(p);
        p = p.next();
    }
    periods
}

/// Builds the stacked-chart series for the window ending at `end`.
///
/// Every project named in `buckets` gets a 12-element series, including
/// projects whose hours all fall outside the window (they keep an all-zero
/// row, matching the project list the caller materializes independently).
/// A month with no hours at all stays all-zero: the zero-total check is what
/// stands between us and a division by zero, not error handling.
///
/// Fails with [`ReportError::InvalidPeriod`] if any bucket carries a month
/// outside `1..=12`; that is a broken caller contract, not data to repair.
pub fn monthly_shares(end: Period, buckets: &[HourBucket]) -> Result<MonthlyShares, ReportError> {
    for b in buckets {
        if !(1..=12).contains(&b.month) {
            return Err(ReportError::InvalidPeriod { year: b.year, month: b.month });
        }
    }

    let periods = window(end);
    let labels: Vec<String> = periods.iter().map(|p| p.label()).collect();

    let mut series: BTreeMap<String, Vec<f64>> = buckets
        .iter()
        .map(|b| (b.project.clone(), vec![0.0; WINDOW_MONTHS]))
        .collect();

    for (pos, period) in periods.iter().enumerate() {
        let mut per_project: BTreeMap<&str, f64> = BTreeMap::new();
        for b in buckets
            .iter()
            .filter(|b| b.year == period.year && b.month == period.month)
        {
            *per_project.entry(b.project.as_str()).or_insert(0.0) += b.hours;
        }

        let month_total: f64 = per_project.values().sum();
        if month_total <= 0.0 {
            continue;
        }

        for (project, hours) in per_project {
            if let Some(row) = series.get_mut(project) {
                row[pos] = round1(100.0 * hours / month_total);
            }
        }
    }

    Ok(MonthlyShares { labels, series })
}

/// Round half away from zero to one decimal place.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bucket(year: i32, month: i32, project: &str, hours: f64) -> HourBucket {
        HourBucket { year, month, project: project.into(), hours }
    }

    fn march_2025() -> Period {
        Period::new(2025, 3).unwrap()
    }

    #[test]
    fn window_ends_at_current_month_and_spans_a_year() {
        let periods = window(march_2025());
        assert_eq!(periods.len(), WINDOW_MONTHS);
        assert_eq!(periods[0], Period::new(2024, 4).unwrap());
        assert_eq!(periods[11], Period::new(2025, 3).unwrap());
    }

    #[test]
    fn window_without_year_rollover() {
        let periods = window(Period::new(2025, 12).unwrap());
        assert_eq!(periods[0], Period::new(2025, 1).unwrap());
        assert_eq!(periods[11], Period::new(2025, 12).unwrap());
    }

    #[test]
    fn labels_are_french_month_abbreviations() {
        let report = monthly_shares(march_2025(), &[]).unwrap();
        assert_eq!(report.labels.len(), 12);
        assert_eq!(report.labels[0], "Avr 2024");
        assert_eq!(report.labels[1], "Mai 2024");
        assert_eq!(report.labels[11], "Mar 2025");
    }

    #[test]
    fn shares_are_percentages_of_the_month_total() {
        let buckets = vec![
            bucket(2025, 1, "Alpha", 10.0),
            bucket(2025, 1, "Beta", 30.0),
        ];
        let report = monthly_shares(march_2025(), &buckets).unwrap();

        // January 2025 sits at position 9 of the Avr 2024..Mar 2025 window.
        assert_eq!(report.labels[9], "Jan 2025");
        assert_eq!(report.series["Alpha"][9], 25.0);
        assert_eq!(report.series["Beta"][9], 75.0);
    }

    #[test]
    fn every_series_has_window_length() {
        let buckets = vec![
            bucket(2025, 2, "Alpha", 4.0),
            bucket(2024, 6, "Beta", 2.0),
        ];
        let report = monthly_shares(march_2025(), &buckets).unwrap();
        for row in report.series.values() {
            assert_eq!(row.len(), WINDOW_MONTHS);
        }
    }

    #[test]
    fn empty_months_stay_all_zero() {
        let buckets = vec![bucket(2025, 2, "Alpha", 8.0)];
        let report = monthly_shares(march_2025(), &buckets).unwrap();
        let row = &report.series["Alpha"];
        assert_eq!(row[10], 100.0);
        for (pos, value) in row.iter().enumerate() {
            if pos != 10 {
                assert_eq!(*value, 0.0);
            }
        }
    }

    #[test]
    fn out_of_window_project_keeps_an_all_zero_row() {
        let buckets = vec![
            bucket(2022, 5, "Ancien", 40.0),
            bucket(2025, 3, "Alpha", 8.0),
        ];
        let report = monthly_shares(march_2025(), &buckets).unwrap();
        assert_eq!(report.series["Ancien"], vec![0.0; WINDOW_MONTHS]);
        assert_eq!(report.series["Alpha"][11], 100.0);
    }

    #[test]
    fn occupied_months_sum_to_one_hundred_within_rounding() {
        let buckets = vec![
            bucket(2025, 3, "A", 7.0),
            bucket(2025, 3, "B", 11.0),
            bucket(2025, 3, "C", 3.0),
            bucket(2024, 12, "A", 5.0),
            bucket(2024, 12, "C", 9.0),
        ];
        let report = monthly_shares(march_2025(), &buckets).unwrap();
        let projects = report.series.len() as f64;
        for pos in [8, 11] {
            let sum: f64 = report.series.values().map(|row| row[pos]).sum();
            assert!(
                (sum - 100.0).abs() <= 0.1 * projects,
                "position {pos} sums to {sum}"
            );
        }
    }

    #[test]
    fn one_third_split_drifts_by_a_tenth() {
        let buckets = vec![
            bucket(2025, 3, "A", 1.0),
            bucket(2025, 3, "B", 1.0),
            bucket(2025, 3, "C", 1.0),
        ];
        let report = monthly_shares(march_2025(), &buckets).unwrap();
        let sum: f64 = report.series.values().map(|row| row[11]).sum();
        assert_eq!(report.series["A"][11], 33.3);
        assert!((sum - 99.9).abs() < 1e-9);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let buckets = vec![
            bucket(2025, 1, "Alpha", 10.0),
            bucket(2025, 2, "Beta", 3.5),
            bucket(2024, 7, "Alpha", 1.25),
        ];
        let first = monthly_shares(march_2025(), &buckets).unwrap();
        let second = monthly_shares(march_2025(), &buckets).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_month_is_rejected() {
        let buckets = vec![bucket(2025, 13, "Alpha", 1.0)];
        let err = monthly_shares(march_2025(), &buckets).unwrap_err();
        assert_eq!(err, ReportError::InvalidPeriod { year: 2025, month: 13 });

        assert!(Period::new(2025, 0).is_err());
        assert!(Period::new(2025, 13).is_err());
    }
}
