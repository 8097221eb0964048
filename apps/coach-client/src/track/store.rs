//! File-backed track boundary store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use coach_core::TrackBoundary;
use tracing::{debug, warn};

/// Extension of stored boundary files.
const BOUNDARY_EXTENSION: &str = "boundary";

/// Lookup interface the metrics pipeline consumes.
pub trait TrackBoundaryStore: Send + Sync {
    /// Boundary for a (track, config) pair, if one is stored.
    fn get_boundary(&self, track_id: i32, track_config: Option<&str>)
        -> Option<Arc<TrackBoundary>>;

    /// All stored (track_id, config) pairs.
    fn list_boundaries(&self) -> Vec<(i32, Option<String>)>;
}

type BoundaryKey = (i32, Option<String>);

/// Store over a directory of serialized boundary files.
///
/// The directory is scanned once on first access; lookups afterwards are
/// served from the in-memory index for the lifetime of the session.
/// Unreadable files are skipped with a warning.
pub struct FileBoundaryStore {
    dir: PathBuf,
    index: Mutex<Option<HashMap<BoundaryKey, Arc<TrackBoundary>>>>,
}

impl FileBoundaryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            index: Mutex::new(None),
        }
    }

    /// Load every boundary file in the directory.
    fn load_index(&self) -> HashMap<BoundaryKey, Arc<TrackBoundary>> {
        let mut index = HashMap::new();

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "Cannot read boundary directory {}: {}",
                    self.dir.display(),
                    err
                );
                return index;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BOUNDARY_EXTENSION) {
                continue;
            }
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("Cannot read boundary file {}: {}", path.display(), err);
                    continue;
                }
            };
            match TrackBoundary::from_bytes(&bytes) {
                Ok(boundary) => {
                    debug!(
                        "Loaded boundary for track {} ({:?}) from {}",
                        boundary.track_id,
                        boundary.track_config_name,
                        path.display()
                    );
                    index.insert(
                        (boundary.track_id, boundary.track_config_name.clone()),
                        Arc::new(boundary),
                    );
                }
                Err(err) => {
                    warn!("Skipping boundary file {}: {}", path.display(), err);
                }
            }
        }

        index
    }

    fn with_index<R>(&self, f: impl FnOnce(&HashMap<BoundaryKey, Arc<TrackBoundary>>) -> R) -> R {
        let mut slot = self.index.lock().expect("boundary index poisoned");
        let index = slot.get_or_insert_with(|| self.load_index());
        f(index)
    }
}

impl TrackBoundaryStore for FileBoundaryStore {
    fn get_boundary(
        &self,
        track_id: i32,
        track_config: Option<&str>,
    ) -> Option<Arc<TrackBoundary>> {
        let key = (track_id, track_config.map(String::from));
        self.with_index(|index| index.get(&key).cloned())
    }

    fn list_boundaries(&self) -> Vec<(i32, Option<String>)> {
        self.with_index(|index| index.keys().cloned().collect())
    }
}
