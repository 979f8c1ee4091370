//! Subsystem registration: centralizes on-disk initialization.
//!
//! Adding a new subsystem: append one entry to `SUBSYSTEMS`.

use crate::core::{db, error};
use crate::plugins::course;
use std::path::Path;

pub(crate) struct SubsystemInit {
    pub name: &'static str,
    pub initialize: fn(&Path) -> Result<(), error::CoursekitError>,
}

/// Everything that must exist under the data directory before serving.
pub(crate) const SUBSYSTEMS: &[SubsystemInit] = &[
    SubsystemInit { name: "courses", initialize: course::initialize_course_store },
    SubsystemInit { name: "progress", initialize: db::initialize_progress_db },
];

/// Initialize all subsystems sequentially.
pub(crate) fn initialize_all(data_dir: &Path) -> Result<(), error::CoursekitError> {
    for sub in SUBSYSTEMS {
        (sub.initialize)(data_dir)?;
        tracing::debug!(subsystem = sub.name, "initialized");
    }
    Ok(())
}
