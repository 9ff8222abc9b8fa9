//! Filesystem watcher publishing repository update events
//!
//! Every change below the repository root is mapped to the schema checkout it
//! touches and published as an external event. Bursts of file events are not
//! debounced here: the engine's job queue coalesces them per schema.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use schemasync_core::{EventRouter, RepositoryUpdateEvent};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;

/// Keeps the underlying OS watcher alive; dropping it stops publishing
pub struct RepositoryWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl RepositoryWatcher {
    /// Watch `root` recursively and publish to `router`
    ///
    /// Changes to `default_branch` and to hidden directories are ignored.
    pub fn start(root: &Path, default_branch: &str, router: EventRouter) -> Result<Self> {
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let watch_root = root.clone();
        let default_branch = default_branch.to_string();

        let mut watcher = recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for schema in schemas_for_event(&watch_root, &event) {
                    if schema == default_branch {
                        continue;
                    }
                    router.publish(RepositoryUpdateEvent::external(schema));
                }
            }
            Err(e) => tracing::warn!(error = %e, "repository watch error"),
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        tracing::info!(root = %root.display(), "watching repository for changes");
        Ok(Self {
            root,
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn schemas_for_event(root: &Path, event: &Event) -> BTreeSet<String> {
    if matches!(event.kind, EventKind::Access(_)) {
        return BTreeSet::new();
    }
    event
        .paths
        .iter()
        .filter_map(|path| schema_for_path(root, path))
        .collect()
}

/// Schema owning `path`, i.e. the first component below `root`
///
/// Returns `None` for the root itself, for paths outside it, and for hidden
/// top-level directories.
pub fn schema_for_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    match relative.components().next()? {
        Component::Normal(name) => {
            let name = name.to_str()?;
            if name.starts_with('.') {
                None
            } else {
                Some(name.to_string())
            }
        }
        _ => None,
    }
}
