//! Fixture registry: an ordered stack of snapshot entries.
//!
//! Инварианты:
//! - записи упорядочены по SnapshotId (порядок вставки == порядок создания снапшотов);
//! - не больше одной записи на пару (identity, parameters);
//! - restore к записи X делает недостижимыми все снапшоты моложе X -> они удаляются
//!   (`prune_newer_than`).

use std::any::Any;
use std::sync::Arc;

use log::{debug, warn};

use crate::backend::{SnapshotId, SnapshotRestorer};
use crate::identity::FixtureIdentity;
use crate::param::{params_equal, Param};

/// One cached fixture run: who, with what, the snapshot taken right after,
/// and the memoized result.
pub struct SnapshotEntry<R> {
    pub identity: FixtureIdentity,
    pub parameters: Param,
    pub restorer: R,
    pub(crate) result: Arc<dyn Any + Send + Sync>,
}

impl<R: SnapshotRestorer> SnapshotEntry<R> {
    pub fn new<T: Send + Sync + 'static>(
        identity: FixtureIdentity,
        parameters: Param,
        restorer: R,
        result: Arc<T>,
    ) -> Self {
        Self {
            identity,
            parameters,
            restorer,
            result,
        }
    }

    pub fn snapshot_id(&self) -> SnapshotId {
        self.restorer.snapshot_id()
    }

    /// Memoized result, shared (never copied).
    pub fn result<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.result).downcast::<T>().ok()
    }

    fn matches(&self, identity: &FixtureIdentity, parameters: &Param) -> bool {
        self.identity == *identity && params_equal(&self.parameters, parameters)
    }
}

impl<R: SnapshotRestorer> std::fmt::Debug for SnapshotEntry<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotEntry")
            .field("identity", &self.identity)
            .field("parameters", &self.parameters)
            .field("snapshot_id", &self.snapshot_id())
            .finish()
    }
}

/// Ordered entries, oldest first.
pub struct FixtureRegistry<R> {
    entries: Vec<SnapshotEntry<R>>,
}

impl<R> Default for FixtureRegistry<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<R: SnapshotRestorer> FixtureRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapshotEntry<R>> {
        self.entries.iter()
    }

    /// First (and, by invariant, only) entry for (identity, parameters).
    pub fn find(&self, identity: &FixtureIdentity, parameters: &Param) -> Option<&SnapshotEntry<R>> {
        self.entries.iter().find(|e| e.matches(identity, parameters))
    }

    /// Push a new entry. Call only after a confirmed miss.
    pub fn append(&mut self, entry: SnapshotEntry<R>) {
        let id = entry.snapshot_id();
        if let Some(tail) = self.entries.last() {
            if tail.snapshot_id() > id {
                warn!(
                    "registry append: snapshot {} of `{}` is older than tail {} (backend ids not monotonic)",
                    id,
                    entry.identity,
                    tail.snapshot_id()
                );
            }
        }
        self.entries.push(entry);
    }

    /// Drop every entry whose snapshot is strictly younger than `id`.
    /// Returns how many were removed.
    pub fn prune_newer_than(&mut self, id: SnapshotId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.snapshot_id() <= id);
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!("registry prune: dropped {} entr(y/ies) newer than {}", pruned, id);
        }
        pruned
    }

    /// Remove the entry for (identity, parameters), if any.
    pub fn evict(&mut self, identity: &FixtureIdentity, parameters: &Param) -> Option<SnapshotEntry<R>> {
        let pos = self.entries.iter().position(|e| e.matches(identity, parameters))?;
        Some(self.entries.remove(pos))
    }

    /// Forget everything (e.g. after the backend was reset out-of-band).
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!("registry clear: dropping {} entr(y/ies)", self.entries.len());
        }
        self.entries.clear();
    }
}
