//! snapfix: snapshot-backed fixture cache for tests.
//!
//! A fixture runs once per distinct parameter set; every later call restores
//! the backend to the snapshot taken right after that first run and hands back
//! the memoized result.

pub mod backend;  // SnapshotBackend / SnapshotRestorer seam
pub mod config;
pub mod error;
pub mod identity;
pub mod loader;
pub mod metrics;
pub mod param;    // Param + params_equal
pub mod registry;

// Удобные реэкспорты
pub use backend::{BackendError, SnapshotBackend, SnapshotId, SnapshotRestorer};
pub use config::FixtureConfig;
pub use error::FixtureError;
pub use identity::FixtureIdentity;
pub use loader::FixtureLoader;
pub use param::{params_equal, FnHandle, Param, PatternHandle};
pub use registry::{FixtureRegistry, SnapshotEntry};
