//! Query helpers for extracting data from loaded runs.

use chrono::NaiveDate;
use lf_results::DailyRecord;

use crate::error::{AppError, AppResult};

/// Summary of a run's date range and data.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub record_count: usize,
    pub series_count: usize,
}

pub fn get_run_summary(records: &[DailyRecord]) -> AppResult<RunSummary> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    };

    Ok(RunSummary {
        first_date: first.date,
        last_date: last.date,
        record_count: records.len(),
        series_count: first.values.len(),
    })
}

/// Series names in a run, sorted.
pub fn list_series_names(records: &[DailyRecord]) -> Vec<String> {
    records
        .first()
        .map(|r| r.values.keys().cloned().collect())
        .unwrap_or_default()
}

/// Extract one series as (date, value) pairs.
pub fn extract_series(records: &[DailyRecord], name: &str) -> AppResult<Vec<(NaiveDate, f64)>> {
    records
        .iter()
        .map(|r| {
            r.values
                .get(name)
                .map(|v| (r.date, *v))
                .ok_or_else(|| AppError::InvalidInput(format!("Unknown series: {}", name)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn records() -> Vec<DailyRecord> {
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        (0..3)
            .map(|i| DailyRecord {
                date: start + chrono::Days::new(i),
                values: BTreeMap::from([
                    ("stage_ft".to_string(), 14.0 + i as f64),
                    ("s77_release_cfs".to_string(), 100.0),
                ]),
            })
            .collect()
    }

    #[test]
    fn summary_and_names() {
        let r = records();
        let summary = get_run_summary(&r).unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.series_count, 2);
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2010, 1, 3).unwrap());
        assert_eq!(list_series_names(&r), ["s77_release_cfs", "stage_ft"]);
        assert!(get_run_summary(&[]).is_err());
    }

    #[test]
    fn extract_known_and_unknown() {
        let r = records();
        let stage = extract_series(&r, "stage_ft").unwrap();
        assert_eq!(stage[2].1, 16.0);
        assert!(matches!(
            extract_series(&r, "s308_release_cfs"),
            Err(AppError::InvalidInput(_))
        ));
    }
}
