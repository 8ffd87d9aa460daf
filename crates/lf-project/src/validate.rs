//! Project validation logic.

use std::collections::{BTreeSet, HashSet};

use crate::schema::{
    ConstraintDef, LakeDef, LineDef, MetricDef, ObjectiveDef, Project, ScheduleDef,
    SimulationType,
};

/// Schedule line keys, highest first.
pub const LINE_KEYS: [&str; 8] = ["a", "b", "c", "d3", "d2", "d1", "d0", "wsm1"];

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing section: {section} ({reason})")]
    MissingSection { section: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let sim = &project.simulation;
    if sim.end < sim.start {
        return Err(invalid(
            "simulation.end",
            sim.end,
            "must not be before simulation.start",
        ));
    }
    if project.forcing.file.trim().is_empty() {
        return Err(invalid("forcing.file", "", "must name a file"));
    }

    validate_lake(&project.lake)?;
    validate_schedule(&project.schedule)?;

    let mut structure_ids = HashSet::new();
    for s in &project.structures {
        if s.id.is_empty() {
            return Err(invalid("structures.id", "", "must not be empty"));
        }
        if !structure_ids.insert(s.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: s.id.clone(),
                context: "structures".to_string(),
            });
        }
        if !(s.capacity_cfs >= 0.0) {
            return Err(invalid(
                format!("structures.{}.capacity_cfs", s.id),
                s.capacity_cfs,
                "must be non-negative",
            ));
        }
    }

    let mut augmentation_ids = HashSet::new();
    for a in &project.augmentation {
        if !augmentation_ids.insert(a.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: a.id.clone(),
                context: "augmentation".to_string(),
            });
        }
    }

    if let Some(ap) = &project.adaptive_protocol
        && !structure_ids.contains(ap.structure.as_str())
    {
        return Err(ValidationError::MissingReference {
            id: ap.structure.clone(),
            context: "adaptive_protocol.structure".to_string(),
        });
    }
    if let Some(rule) = &project.optimization_rule {
        for id in rule.monthly_cfs.keys() {
            if !structure_ids.contains(id.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: id.clone(),
                    context: "optimization_rule.monthly_cfs".to_string(),
                });
            }
        }
        if rule.low_stage_ft >= rule.high_stage_ft {
            return Err(invalid(
                "optimization_rule.low_stage_ft",
                rule.low_stage_ft,
                "must be below high_stage_ft",
            ));
        }
    }
    if let Some(n) = &project.nutrient {
        for id in &n.structures {
            if !structure_ids.contains(id.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: id.clone(),
                    context: "nutrient.structures".to_string(),
                });
            }
        }
    }

    for (name, value) in &project.parameters {
        if !value.is_finite() {
            return Err(invalid(format!("parameters.{name}"), value, "must be finite"));
        }
    }

    let mut var_names = HashSet::new();
    for v in &project.decision_variables {
        if !var_names.insert(v.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: v.name.clone(),
                context: "decision_variables".to_string(),
            });
        }
        if !(v.min.is_finite() && v.max.is_finite() && v.min < v.max) {
            return Err(invalid(
                format!("decision_variables.{}", v.name),
                format!("[{}, {}]", v.min, v.max),
                "needs finite min < max",
            ));
        }
    }

    validate_objectives(&project.objectives)?;
    validate_constraints(&project.constraints)?;

    if sim.kind == SimulationType::OptimizationScenario {
        validate_optimization(project)?;
    }
    Ok(())
}

fn validate_lake(lake: &LakeDef) -> Result<(), ValidationError> {
    let n = lake.stage_ft.len();
    if n < 2 || lake.storage_acft.len() != n || lake.area_acres.len() != n {
        return Err(invalid(
            "lake",
            n,
            "stage, storage and area tables need equal length of at least 2",
        ));
    }
    let increasing = |v: &[f64]| v.windows(2).all(|w| w[1] > w[0]);
    if !increasing(&lake.stage_ft) {
        return Err(invalid("lake.stage_ft", "", "must be strictly increasing"));
    }
    if !increasing(&lake.storage_acft) {
        return Err(invalid("lake.storage_acft", "", "must be strictly increasing"));
    }
    if lake.area_acres.iter().any(|a| !(*a >= 0.0))
        || !lake.area_acres.windows(2).all(|w| w[1] >= w[0])
    {
        return Err(invalid(
            "lake.area_acres",
            "",
            "must be non-negative and non-decreasing",
        ));
    }
    if lake.initial_stage_ft.is_none() && lake.initial_storage_acft.is_none() {
        return Err(ValidationError::MissingSection {
            section: "lake.initial_stage_ft".to_string(),
            reason: "one of initial_stage_ft or initial_storage_acft is required".to_string(),
        });
    }
    Ok(())
}

/// Stage of a line on `doy`, periodic over the year.
fn line_value(line: &LineDef, doy: u32) -> f64 {
    match line {
        LineDef::Flat(v) => *v,
        LineDef::Points(points) => {
            let Some(&(first_day, first)) = points.first() else {
                return f64::NAN;
            };
            if points.len() == 1 {
                return first;
            }
            let (last_day, last) = points[points.len() - 1];
            let wrap = |d: u32| d as f64 + 366.0;
            if doy < first_day || doy >= last_day {
                let d = if doy < first_day { wrap(doy) } else { doy as f64 };
                let span = wrap(first_day) - last_day as f64;
                let t = (d - last_day as f64) / span;
                return last + t * (first - last);
            }
            for w in points.windows(2) {
                let ((d0, v0), (d1, v1)) = (w[0], w[1]);
                if doy >= d0 && doy <= d1 {
                    let t = (doy - d0) as f64 / (d1 - d0) as f64;
                    return v0 + t * (v1 - v0);
                }
            }
            last
        }
    }
}

fn validate_schedule(schedule: &ScheduleDef) -> Result<(), ValidationError> {
    for key in schedule.lines.keys() {
        if !LINE_KEYS.contains(&key.as_str()) {
            return Err(invalid("schedule.lines", key, "unknown regulation line"));
        }
    }
    let mut lines = Vec::with_capacity(LINE_KEYS.len());
    for key in LINE_KEYS {
        let Some(line) = schedule.lines.get(key) else {
            return Err(ValidationError::MissingSection {
                section: format!("schedule.lines.{key}"),
                reason: "every regulation line is required".to_string(),
            });
        };
        if let LineDef::Points(points) = line {
            if points.is_empty() {
                return Err(invalid(format!("schedule.lines.{key}"), "[]", "needs points"));
            }
            if !points.windows(2).all(|w| w[1].0 > w[0].0)
                || points.iter().any(|(d, _)| !(1..=366).contains(d))
            {
                return Err(invalid(
                    format!("schedule.lines.{key}"),
                    "",
                    "days must be increasing within 1..=366",
                ));
            }
        }
        lines.push((key, line));
    }

    let mut days = BTreeSet::new();
    for (_, line) in &lines {
        if let LineDef::Points(points) = line {
            days.extend(points.iter().map(|p| p.0));
        }
    }
    if days.is_empty() {
        days.insert(1);
    }
    for doy in days {
        for w in lines.windows(2) {
            let (upper_key, upper) = w[0];
            let (lower_key, lower) = w[1];
            if line_value(upper, doy) < line_value(lower, doy) {
                return Err(invalid(
                    format!("schedule.lines.{upper_key}"),
                    doy,
                    &format!("falls below line {lower_key}"),
                ));
            }
        }
    }
    if !(schedule.wsm_band_ft > 0.0) {
        return Err(invalid(
            "schedule.wsm_band_ft",
            schedule.wsm_band_ft,
            "must be positive",
        ));
    }
    Ok(())
}

fn validate_metric(field: &str, metric: &MetricDef) -> Result<(), ValidationError> {
    if metric.series.is_empty() || metric.series.iter().any(|s| s.is_empty()) {
        return Err(invalid(
            format!("{field}.metric.series"),
            "",
            "must name at least one series",
        ));
    }
    if !metric.scale.is_finite() {
        return Err(invalid(
            format!("{field}.metric.scale"),
            metric.scale,
            "must be finite",
        ));
    }
    Ok(())
}

fn validate_objectives(objectives: &[ObjectiveDef]) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for o in objectives {
        if o.name.trim().is_empty() {
            return Err(invalid("objectives.name", "", "must not be empty"));
        }
        if !names.insert(o.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: o.name.clone(),
                context: "objectives".to_string(),
            });
        }
        validate_metric(&format!("objectives.{}", o.name), &o.metric)?;
    }
    Ok(())
}

fn validate_constraints(constraints: &[ConstraintDef]) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for c in constraints {
        if c.name.trim().is_empty() {
            return Err(invalid("constraints.name", "", "must not be empty"));
        }
        if !names.insert(c.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: c.name.clone(),
                context: "constraints".to_string(),
            });
        }
        let field = format!("constraints.{}", c.name);
        validate_metric(&field, &c.metric)?;
        match (c.min, c.max) {
            (None, None) => {
                return Err(invalid(field, "", "needs a min or max bound"));
            }
            (Some(lo), Some(hi)) if lo > hi => {
                return Err(invalid(field, format!("[{lo}, {hi}]"), "min exceeds max"));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_optimization(project: &Project) -> Result<(), ValidationError> {
    let Some(opt) = &project.optimizer else {
        return Err(ValidationError::MissingSection {
            section: "optimizer".to_string(),
            reason: "required for optimization_scenario".to_string(),
        });
    };
    if project.decision_variables.is_empty() {
        return Err(ValidationError::MissingSection {
            section: "decision_variables".to_string(),
            reason: "required for optimization_scenario".to_string(),
        });
    }
    if project.objectives.is_empty() {
        return Err(ValidationError::MissingSection {
            section: "objectives".to_string(),
            reason: "required for optimization_scenario".to_string(),
        });
    }
    if opt.population < 2 {
        return Err(invalid("optimizer.population", opt.population, "must be at least 2"));
    }
    if opt.generations == Some(0) || opt.max_evaluations == Some(0) {
        return Err(invalid("optimizer", 0, "budgets must be positive"));
    }
    if let Some(secs) = opt.wall_clock_secs
        && !(secs > 0.0 && secs.is_finite())
    {
        return Err(invalid("optimizer.wall_clock_secs", secs, "must be positive"));
    }
    if opt.generations.is_none() && opt.max_evaluations.is_none() && opt.wall_clock_secs.is_none()
    {
        return Err(invalid(
            "optimizer",
            "",
            "needs generations, max_evaluations or wall_clock_secs",
        ));
    }
    if opt.archive_capacity == Some(0) {
        return Err(invalid("optimizer.archive_capacity", 0, "must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_line_wraps_year_end() {
        let line = LineDef::Points(vec![(1, 10.0), (183, 12.0)]);
        assert_eq!(line_value(&line, 1), 10.0);
        assert_eq!(line_value(&line, 183), 12.0);
        assert!((line_value(&line, 92) - 11.0).abs() < 1e-12);
        let late = line_value(&line, 300);
        assert!(late < 12.0 && late > 10.0);
    }
}
