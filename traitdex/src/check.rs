//! Compares freshly emitted data units with the ones already on disk.
use crate::unit::DataUnit;
use anyhow::{Context, Result};
use std::{fmt, fs, path::Path, path::PathBuf};
use traitdex_util::relative_file_paths;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaleUnit {
    /// Emitted, but absent from disk.
    Missing(PathBuf),
    /// On disk with different contents.
    Outdated(PathBuf),
    /// On disk, but no longer emitted.
    Extraneous(PathBuf),
}

impl fmt::Display for StaleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleUnit::Missing(path) => write!(f, "missing data unit {}", path.display()),
            StaleUnit::Outdated(path) => write!(f, "outdated data unit {}", path.display()),
            StaleUnit::Extraneous(path) => write!(f, "extraneous file {}", path.display()),
        }
    }
}

/// Every difference between `units` and the files below `implementors_dir`, in path order.
pub fn check_units(implementors_dir: &Path, units: &[DataUnit]) -> Result<Vec<StaleUnit>> {
    let mut on_disk = relative_file_paths(implementors_dir)?;
    let mut stale = Vec::new();
    for unit in units {
        let relative = unit.relative_path();
        if !on_disk.remove(&relative) {
            stale.push(StaleUnit::Missing(relative));
            continue;
        }
        let path = implementors_dir.join(&relative);
        let contents = fs::read(&path)
            .with_context(|| format!("failed to read data unit {}", path.display()))?;
        if contents != unit.contents().as_bytes() {
            stale.push(StaleUnit::Outdated(relative));
        }
    }
    stale.extend(on_disk.into_iter().map(StaleUnit::Extraneous));
    stale.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(stale)
}

impl StaleUnit {
    pub fn path(&self) -> &Path {
        match self {
            StaleUnit::Missing(path) | StaleUnit::Outdated(path) | StaleUnit::Extraneous(path) => {
                path
            }
        }
    }
}
