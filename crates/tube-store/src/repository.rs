//! Version storage for tube snapshots.

use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::snapshot::TubeSnapshot;

new_key_type! {
    /// Handle to a stored tube version.
    pub struct TubeId;
}

/// A stored version and its neighbours in the lineage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTube {
    /// The recorded tube.
    pub snapshot: TubeSnapshot,
    /// Version number at save time.
    pub version: u32,
    /// Version this one was derived from.
    pub past: Option<TubeId>,
    /// Version derived from this one.
    pub future: Option<TubeId>,
}

/// Storage for a linear history of tube versions.
///
/// Each version links to the one it was derived from and to the one
/// derived from it.
pub trait TubeRepository {
    /// Store `snapshot`, linking `previous ↔ new` when `previous` is given.
    fn save(
        &mut self,
        snapshot: TubeSnapshot,
        version: u32,
        previous: Option<TubeId>,
    ) -> Result<TubeId>;

    /// The stored version `id`.
    fn load(&self, id: TubeId) -> Result<&StoredTube>;

    /// The version `id` was derived from.
    fn past(&self, id: TubeId) -> Result<Option<TubeId>> {
        Ok(self.load(id)?.past)
    }

    /// The version derived from `id`.
    fn future(&self, id: TubeId) -> Result<Option<TubeId>> {
        Ok(self.load(id)?.future)
    }

    /// Remove every version after `id`; returns how many were removed.
    fn delete_future_versions(&mut self, id: TubeId) -> Result<usize>;

    /// Most recently saved version still stored.
    fn latest(&self) -> Option<TubeId>;
}

/// [`TubeRepository`] held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tubes: SlotMap<TubeId, StoredTube>,
    latest: Option<TubeId>,
}

impl InMemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored versions.
    pub fn len(&self) -> usize {
        self.tubes.len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.tubes.is_empty()
    }
}

impl TubeRepository for InMemoryRepository {
    fn save(
        &mut self,
        snapshot: TubeSnapshot,
        version: u32,
        previous: Option<TubeId>,
    ) -> Result<TubeId> {
        if let Some(prev) = previous {
            if !self.tubes.contains_key(prev) {
                return Err(StoreError::UnknownId(prev));
            }
        }
        let id = self.tubes.insert(StoredTube {
            snapshot,
            version,
            past: previous,
            future: None,
        });
        if let Some(prev) = previous.and_then(|p| self.tubes.get_mut(p)) {
            prev.future = Some(id);
        }
        self.latest = Some(id);
        debug!(?id, version, ?previous, "tube version saved");
        Ok(id)
    }

    fn load(&self, id: TubeId) -> Result<&StoredTube> {
        self.tubes.get(id).ok_or(StoreError::UnknownId(id))
    }

    fn delete_future_versions(&mut self, id: TubeId) -> Result<usize> {
        let head = self
            .tubes
            .get_mut(id)
            .ok_or(StoreError::UnknownId(id))?
            .future
            .take();

        let mut removed = 0;
        let mut next = head;
        while let Some(n) = next {
            next = self.tubes.remove(n).and_then(|t| t.future);
            removed += 1;
            if self.latest == Some(n) {
                self.latest = Some(id);
            }
        }
        if removed > 0 {
            debug!(?id, removed, "redo chain dropped");
        }
        Ok(removed)
    }

    fn latest(&self) -> Option<TubeId> {
        self.latest
    }
}
