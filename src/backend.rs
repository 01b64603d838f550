//! Snapshot backend seam.
//!
//! The fixture cache never talks to a chain/VM/database directly. It only needs:
//! - take a snapshot of the current backend state -> restorer;
//! - restorer.snapshot_id(): total order, issued monotonically by the backend;
//! - restorer.restore(): revert the backend to that point. Restoring invalidates
//!   every snapshot taken after it.
//!
//! A restorer must survive being restored more than once: every cache hit
//! restores the same entry again.

use std::fmt;
use std::future::Future;

/// Backend-issued snapshot id. Ids grow in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(pub u64);

impl SnapshotId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<u64> for SnapshotId {
    fn from(v: u64) -> Self {
        SnapshotId(v)
    }
}

/// Errors reported by a snapshot backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The handle no longer corresponds to a live checkpoint
    /// (reverted past, or the backend was reset out-of-band).
    #[error("snapshot {0} is not valid on the backend")]
    InvalidSnapshot(SnapshotId),

    /// Anything else: transport, RPC, I/O ...
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BackendError {
    pub fn is_invalid_snapshot(&self) -> bool {
        matches!(self, BackendError::InvalidSnapshot(_))
    }
}

/// Handle returned by [`SnapshotBackend::take_snapshot`].
pub trait SnapshotRestorer {
    fn snapshot_id(&self) -> SnapshotId;

    /// Revert backend state to this snapshot.
    fn restore(&self) -> impl Future<Output = Result<(), BackendError>>;
}

/// Anything that can checkpoint its state.
pub trait SnapshotBackend {
    type Restorer: SnapshotRestorer;

    fn take_snapshot(&self) -> impl Future<Output = Result<Self::Restorer, BackendError>>;
}

impl<B: SnapshotBackend> SnapshotBackend for &B {
    type Restorer = B::Restorer;

    fn take_snapshot(&self) -> impl Future<Output = Result<Self::Restorer, BackendError>> {
        (**self).take_snapshot()
    }
}
