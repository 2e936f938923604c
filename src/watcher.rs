//! Filesystem save notifications for files outside an editor.
//!
//! Parent directories are watched rather than the files themselves so that
//! saves done by writing a temporary file and renaming it over the original
//! are still seen.

use crate::{Error, Result};
use log::{debug, warn};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Reports saves of a fixed set of files.
pub struct SaveWatcher {
    // Dropping the watcher stops the notifications.
    _watcher: RecommendedWatcher,
    saves: UnboundedReceiver<PathBuf>,
}

impl SaveWatcher {
    /// Start watching `files`, which must exist.
    ///
    /// Reported paths are canonical, so compare them against canonical paths.
    pub fn new(files: &[PathBuf]) -> Result<Self> {
        let watched = files
            .iter()
            .map(|f| f.canonicalize().map_err(|e| Error::Watch(format!("{}: {}", f.display(), e))))
            .collect::<Result<BTreeSet<_>>>()?;
        let dirs: BTreeSet<PathBuf> = watched.iter().filter_map(|f| f.parent().map(PathBuf::from)).collect();

        let (tx, saves) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    warn!("File watch error: {}", e);
                    return;
                }
            };
            if !is_save(&event.kind) {
                return;
            }
            for path in event.paths {
                if watched.contains(&path) {
                    debug!("Saved {}", path.display());
                    let _ = tx.send(path);
                }
            }
        })?;

        for dir in &dirs {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        Ok(Self {
            _watcher: watcher,
            saves,
        })
    }

    /// Wait for the next save. `None` once the watcher has shut down.
    pub async fn next_save(&mut self) -> Option<PathBuf> {
        self.saves.recv().await
    }
}

fn is_save(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) | EventKind::Create(_) => true,
        _ => false,
    }
}
