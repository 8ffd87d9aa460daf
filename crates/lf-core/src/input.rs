//! Forcing data loaded before a run.

use crate::{CoreResult, Horizon, SeriesSet, TimeSeries};

/// All forcing series for one horizon. Every series starts at the horizon
/// start and covers it exactly.
#[derive(Clone, Debug)]
pub struct InputData {
    horizon: Horizon,
    series: SeriesSet,
}

impl InputData {
    /// Slice every series in `raw` to `horizon`, failing if one falls short.
    pub fn new(horizon: Horizon, raw: SeriesSet) -> CoreResult<Self> {
        let mut series = SeriesSet::new();
        for (name, s) in raw.iter() {
            series.insert(name, s.slice(name, &horizon)?)?;
        }
        Ok(Self { horizon, series })
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn series(&self) -> &SeriesSet {
        &self.series
    }

    pub fn required(&self, name: &str) -> CoreResult<&TimeSeries> {
        self.series.get(name)
    }

    pub fn optional(&self, name: &str) -> Option<&TimeSeries> {
        self.series.get_opt(name)
    }

    /// Copy with series `name` multiplied by `factor`.
    pub fn with_scaled(&self, name: &str, factor: f64) -> CoreResult<Self> {
        let mut series = SeriesSet::new();
        for (n, s) in self.series.iter() {
            let s = if n == name { s.map(|v| v * factor) } else { s.clone() };
            series.insert(n, s)?;
        }
        self.series.get(name)?;
        Ok(Self {
            horizon: self.horizon,
            series,
        })
    }
}
