//! Dated daily series and the named store engines write into.
//!
//! A [`TimeSeries`] holds one value per day starting at `start`, so dates are
//! strictly increasing and contiguous by construction. Series arriving as
//! explicit `(date, value)` pairs go through [`TimeSeries::from_pairs`], which
//! rejects gaps, repeats and reordering.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::{CoreError, CoreResult, Horizon};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    pub fn constant(horizon: &Horizon, value: f64) -> Self {
        Self::new(horizon.start(), vec![value; horizon.days()])
    }

    /// Build from explicit pairs, checking daily contiguity.
    pub fn from_pairs(name: &str, pairs: &[(NaiveDate, f64)]) -> CoreResult<Self> {
        let Some(&(start, _)) = pairs.first() else {
            return Err(CoreError::InvalidArg {
                what: "series must contain at least one value",
            });
        };
        for (i, &(date, _)) in pairs.iter().enumerate() {
            if date != start + Duration::days(i as i64) {
                return Err(CoreError::NonContiguous {
                    name: name.to_string(),
                    date,
                });
            }
        }
        Ok(Self::new(start, pairs.iter().map(|&(_, v)| v).collect()))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date covered, or None for an empty series.
    pub fn end(&self) -> Option<NaiveDate> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.start + Duration::days(self.values.len() as i64 - 1))
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        if date < self.start {
            return None;
        }
        self.value_at((date - self.start).num_days() as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.start + Duration::days(i as i64), v))
    }

    pub fn covers(&self, horizon: &Horizon) -> bool {
        match self.end() {
            Some(end) => self.start <= horizon.start() && end >= horizon.end(),
            None => false,
        }
    }

    /// Copy of the values inside `horizon`.
    pub fn slice(&self, name: &str, horizon: &Horizon) -> CoreResult<Self> {
        if !self.covers(horizon) {
            return Err(CoreError::NotCovering {
                name: name.to_string(),
                start: horizon.start(),
                end: horizon.end(),
            });
        }
        let offset = (horizon.start() - self.start).num_days() as usize;
        Ok(Self::new(
            horizon.start(),
            self.values[offset..offset + horizon.days()].to_vec(),
        ))
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(self.start, self.values.iter().map(|&v| f(v)).collect())
    }
}

/// Named collection of series; write-once per name.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeriesSet {
    series: BTreeMap<String, TimeSeries>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, series: TimeSeries) -> CoreResult<()> {
        let name = name.into();
        if self.series.contains_key(&name) {
            return Err(CoreError::DuplicateSeries { name });
        }
        self.series.insert(name, series);
        Ok(())
    }

    pub fn get(&self, name: &str) -> CoreResult<&TimeSeries> {
        self.series.get(name).ok_or_else(|| CoreError::MissingSeries {
            name: name.to_string(),
        })
    }

    pub fn get_opt(&self, name: &str) -> Option<&TimeSeries> {
        self.series.get(name)
    }

    /// Fetch `name` and require that it covers `horizon`.
    ///
    /// A series that stops short counts as missing for the consumer.
    pub fn get_covering(&self, name: &str, horizon: &Horizon) -> CoreResult<&TimeSeries> {
        let series = self.get(name)?;
        if series.start() != horizon.start() || !series.covers(horizon) {
            return Err(CoreError::MissingSeries {
                name: name.to_string(),
            });
        }
        Ok(series)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TimeSeries)> {
        self.series.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Remove a series; used to build truncated fixtures and partial exports.
    pub fn remove(&mut self, name: &str) -> Option<TimeSeries> {
        self.series.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn from_pairs_rejects_gap() {
        let pairs = [(d(2020, 1, 1), 1.0), (d(2020, 1, 3), 2.0)];
        let err = TimeSeries::from_pairs("x", &pairs).unwrap_err();
        assert_eq!(
            err,
            CoreError::NonContiguous {
                name: "x".into(),
                date: d(2020, 1, 3)
            }
        );
    }

    #[test]
    fn from_pairs_rejects_reorder() {
        let pairs = [(d(2020, 1, 2), 1.0), (d(2020, 1, 1), 2.0)];
        assert!(TimeSeries::from_pairs("x", &pairs).is_err());
        assert!(TimeSeries::from_pairs("x", &[]).is_err());
    }

    #[test]
    fn slice_to_horizon() {
        let s = TimeSeries::new(d(2020, 1, 1), (0..10).map(f64::from).collect());
        let h = Horizon::new(d(2020, 1, 3), d(2020, 1, 5)).unwrap();
        let sliced = s.slice("x", &h).unwrap();
        assert_eq!(sliced.values(), &[2.0, 3.0, 4.0]);
        assert_eq!(sliced.start(), d(2020, 1, 3));

        let too_long = Horizon::new(d(2020, 1, 3), d(2020, 1, 20)).unwrap();
        assert!(s.slice("x", &too_long).is_err());
    }

    #[test]
    fn set_is_write_once() {
        let mut set = SeriesSet::new();
        let s = TimeSeries::new(d(2020, 1, 1), vec![1.0]);
        set.insert("a", s.clone()).unwrap();
        assert!(matches!(
            set.insert("a", s),
            Err(CoreError::DuplicateSeries { .. })
        ));
        assert!(matches!(set.get("b"), Err(CoreError::MissingSeries { .. })));
    }

    #[test]
    fn truncated_series_is_missing_for_consumer() {
        let mut set = SeriesSet::new();
        set.insert("a", TimeSeries::new(d(2020, 1, 1), vec![1.0; 5]))
            .unwrap();
        let h = Horizon::from_len(d(2020, 1, 1), 10).unwrap();
        assert!(matches!(
            set.get_covering("a", &h),
            Err(CoreError::MissingSeries { .. })
        ));
    }

    proptest! {
        #[test]
        fn dates_are_contiguous(len in 1usize..800, offset in 0i64..3000) {
            let start = d(2000, 1, 1) + Duration::days(offset);
            let s = TimeSeries::new(start, vec![0.0; len]);
            let dates: Vec<_> = s.iter().map(|(date, _)| date).collect();
            prop_assert_eq!(dates.len(), len);
            for w in dates.windows(2) {
                prop_assert_eq!(w[1] - w[0], Duration::days(1));
            }
            prop_assert_eq!(s.end(), dates.last().copied());
            let rebuilt = TimeSeries::from_pairs("p", &s.iter().collect::<Vec<_>>()).unwrap();
            prop_assert_eq!(rebuilt, s);
        }
    }
}
