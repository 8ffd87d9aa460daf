use crate::{CoreResult, ParameterVector, SeriesSet, TimeSeries};

/// Output of one hydrology (and optionally nutrient) run.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedRun {
    pub params: ParameterVector,
    pub hydrology: SeriesSet,
    pub nutrient: Option<SeriesSet>,
}

impl CompletedRun {
    /// Look a series up in hydrology output first, then nutrient output.
    pub fn series(&self, name: &str) -> CoreResult<&TimeSeries> {
        match self.hydrology.get(name) {
            Ok(s) => Ok(s),
            Err(e) => match &self.nutrient {
                Some(n) => n.get(name).map_err(|_| e),
                None => Err(e),
            },
        }
    }

    pub fn series_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hydrology.names().collect();
        if let Some(n) = &self.nutrient {
            names.extend(n.names());
        }
        names
    }
}
