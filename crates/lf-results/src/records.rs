//! Conversion between series sets and daily JSONL records.

use std::collections::BTreeMap;

use lf_core::{Horizon, SeriesSet, TimeSeries};

use crate::types::DailyRecord;
use crate::{ResultsError, ResultsResult};

/// One record per horizon day holding every series' value on that day.
pub fn records_from_series(horizon: &Horizon, sets: &[&SeriesSet]) -> Vec<DailyRecord> {
    horizon
        .dates()
        .map(|date| {
            let mut values = BTreeMap::new();
            for set in sets {
                for (name, s) in set.iter() {
                    if let Some(v) = s.get(date) {
                        values.insert(name.to_string(), v);
                    }
                }
            }
            DailyRecord { date, values }
        })
        .collect()
}

pub fn series_from_records(records: &[DailyRecord]) -> ResultsResult<SeriesSet> {
    let mut set = SeriesSet::new();
    let Some(first) = records.first() else {
        return Ok(set);
    };
    let mut columns: BTreeMap<&str, Vec<f64>> = first
        .values
        .keys()
        .map(|k| (k.as_str(), Vec::with_capacity(records.len())))
        .collect();
    let mut expected = first.date;
    for r in records {
        if r.date != expected {
            return Err(ResultsError::CorruptSeries {
                message: format!("expected {expected}, found {}", r.date),
            });
        }
        for (name, col) in columns.iter_mut() {
            let v = r.values.get(*name).ok_or_else(|| ResultsError::CorruptSeries {
                message: format!("{name} missing on {}", r.date),
            })?;
            col.push(*v);
        }
        expected = expected.succ_opt().unwrap_or(expected);
    }
    for (name, values) in columns {
        set.insert(name, TimeSeries::new(first.date, values))
            .map_err(|e| ResultsError::CorruptSeries {
                message: e.to_string(),
            })?;
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_core::NaiveDate;

    #[test]
    fn gap_in_dates_is_corrupt() {
        let d = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let records = vec![
            DailyRecord {
                date: d,
                values: [("stage_ft".to_string(), 14.0)].into(),
            },
            DailyRecord {
                date: d.succ_opt().unwrap().succ_opt().unwrap(),
                values: [("stage_ft".to_string(), 14.1)].into(),
            },
        ];
        assert!(series_from_records(&records).is_err());
    }

    #[test]
    fn merges_several_sets() {
        let d = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let h = Horizon::from_len(d, 3).unwrap();
        let mut hydro = SeriesSet::new();
        hydro
            .insert("stage_ft", TimeSeries::new(d, vec![14.0, 14.1, 14.2]))
            .unwrap();
        let mut nut = SeriesSet::new();
        nut.insert("tp_conc_mg_l", TimeSeries::new(d, vec![0.1, 0.1, 0.2]))
            .unwrap();

        let records = records_from_series(&h, &[&hydro, &nut]);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].values["tp_conc_mg_l"], 0.2);

        let back = series_from_records(&records).unwrap();
        assert_eq!(back.get("stage_ft").unwrap().values(), &[14.0, 14.1, 14.2]);
    }
}
