use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::LaunchError;

/// Registry of project roots that currently have a workflow running.
#[derive(Debug, Clone, Default)]
pub struct ProjectGuard {
    busy: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Exclusive claim on a project root, released on drop.
#[derive(Debug)]
pub struct ProjectLease {
    busy: Arc<Mutex<HashSet<PathBuf>>>,
    key: PathBuf,
}

impl ProjectGuard {
    /// Claim `project_root`, failing with [`LaunchError::Busy`] if it is taken.
    pub fn acquire(&self, project_root: &Path) -> Result<ProjectLease, LaunchError> {
        let key = normalize(project_root);
        let mut busy = self.busy.lock();
        if !busy.insert(key.clone()) {
            warn!("project {} is busy", key.display());
            return Err(LaunchError::Busy(project_root.to_path_buf()));
        }
        debug!("acquired project {}", key.display());
        Ok(ProjectLease {
            busy: Arc::clone(&self.busy),
            key,
        })
    }

    /// Whether a workflow currently holds `project_root`.
    pub fn is_busy(&self, project_root: &Path) -> bool {
        self.busy.lock().contains(&normalize(project_root))
    }
}

impl Drop for ProjectLease {
    fn drop(&mut self) {
        self.busy.lock().remove(&self.key);
        debug!("released project {}", self.key.display());
    }
}

// Paths that do not exist yet (a project about to be created) are keyed by
// their canonical parent so both spellings of a root collide.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
