//! Project registry — the public facade over per-project watchers.
//!
//! One [`crate::ReviewWatcher`] per open project, created on first use and
//! dropped on project close. The registry replaces any ambient per-project
//! singleton: a watcher being in the map is what "this project has a live
//! review subsystem" means.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::WatchConfig;
use crate::watcher::{ReviewWatcher, Toolchain, WatchError};

#[derive(Default)]
pub struct ReviewManager {
    watchers: HashMap<PathBuf, ReviewWatcher>,
}

impl ReviewManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the project's watcher, creating it on first use.
    ///
    /// An existing watcher keeps its original config; reconfiguring means
    /// disposing and re-opening.
    pub fn open(&mut self, project_root: &Path, config: WatchConfig) -> &mut ReviewWatcher {
        self.watchers
            .entry(project_root.to_path_buf())
            .or_insert_with(|| ReviewWatcher::new(project_root.to_path_buf(), config))
    }

    #[must_use]
    pub fn get_mut(&mut self, project_root: &Path) -> Option<&mut ReviewWatcher> {
        self.watchers.get_mut(project_root)
    }

    /// Open (if needed) and start the project's watch process.
    ///
    /// Errors are surfaced once by the caller; the watcher stays registered
    /// so a later `start` can retry after the user fixes their toolchain.
    pub fn start(
        &mut self,
        project_root: &Path,
        config: WatchConfig,
        toolchain: &dyn Toolchain,
    ) -> Result<(), WatchError> {
        self.open(project_root, config).start(toolchain)
    }

    /// Stop and forget the project's watcher. No-op for unknown roots.
    pub async fn dispose(&mut self, project_root: &Path) {
        if let Some(mut watcher) = self.watchers.remove(project_root) {
            watcher.stop().await;
        }
    }

    /// Stop everything; used at application shutdown.
    pub async fn dispose_all(&mut self) {
        let watchers = std::mem::take(&mut self.watchers);
        for (root, mut watcher) in watchers {
            tracing::info!(root = %root.display(), "disposing review watcher");
            watcher.stop().await;
        }
    }

    #[must_use]
    pub fn project_count(&self) -> usize {
        self.watchers.len()
    }
}
