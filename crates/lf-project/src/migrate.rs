//! Schema migration framework.

use crate::ProjectError;
use crate::schema::Project;

pub const LATEST_VERSION: u32 = 2;

/// Version 1 parameter names that gained a namespace in version 2.
const LEGACY_NAMES: [(&str, &str); 8] = [
    ("p1", "release.p1"),
    ("p2", "release.p2"),
    ("cutback_z1", "supply.cutback_z1"),
    ("cutback_z2", "supply.cutback_z2"),
    ("cutback_z3", "supply.cutback_z3"),
    ("cutback_z4", "supply.cutback_z4"),
    ("settling_velocity", "nutrient.settling_velocity_m_per_day"),
    ("load_multiplier", "nutrient.load_multiplier"),
];

pub fn migrate_to_latest(mut project: Project) -> Result<Project, ProjectError> {
    while project.version < LATEST_VERSION {
        project = migrate_one_version(project)?;
    }
    Ok(project)
}

fn migrate_one_version(project: Project) -> Result<Project, ProjectError> {
    match project.version {
        0 => migrate_v0_to_v1(project),
        1 => migrate_v1_to_v2(project),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

fn migrate_v0_to_v1(mut project: Project) -> Result<Project, ProjectError> {
    project.version = 1;
    Ok(project)
}

fn rename(name: &str) -> Option<&'static str> {
    LEGACY_NAMES
        .iter()
        .find(|(old, _)| *old == name)
        .map(|(_, new)| *new)
}

fn migrate_v1_to_v2(mut project: Project) -> Result<Project, ProjectError> {
    let old = std::mem::take(&mut project.parameters);
    for (name, value) in old {
        let name = rename(&name).map(str::to_string).unwrap_or(name);
        if project.parameters.insert(name.clone(), value).is_some() {
            return Err(ProjectError::Migration {
                what: format!("parameter {name} given under both its old and new name"),
            });
        }
    }
    for v in &mut project.decision_variables {
        if let Some(new) = rename(&v.name) {
            v.name = new.to_string();
        }
    }

    project.version = 2;
    Ok(project)
}
