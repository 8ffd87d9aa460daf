//! Simulated date range.

use chrono::{Duration, NaiveDate};

use crate::{CoreError, CoreResult};

/// Inclusive daily horizon `start..=end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Horizon {
    start: NaiveDate,
    end: NaiveDate,
}

impl Horizon {
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if end < start {
            return Err(CoreError::InvalidArg {
                what: "horizon end must not precede start",
            });
        }
        Ok(Self { start, end })
    }

    /// Horizon of `days` days beginning at `start`.
    pub fn from_len(start: NaiveDate, days: usize) -> CoreResult<Self> {
        if days == 0 {
            return Err(CoreError::InvalidArg {
                what: "horizon must contain at least one day",
            });
        }
        Ok(Self {
            start,
            end: start + Duration::days(days as i64 - 1),
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of simulated days.
    pub fn days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Simulated length in years of 365.25 days.
    pub fn years(&self) -> f64 {
        self.days() as f64 / 365.25
    }

    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        Some((date - self.start).num_days() as usize)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days()).map(move |i| self.date_at(i))
    }
}
