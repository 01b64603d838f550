//! Errors surfaced by `FixtureLoader`.

use crate::backend::{BackendError, SnapshotId};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// The fixture has no stable name (closure, fn pointer, trait object).
    /// Caching it is refused rather than silently re-running it every time.
    #[error(
        "anonymous function `{type_name}` can't be used as a fixture; \
         pass a named `fn` item instead"
    )]
    AnonymousFixture { type_name: &'static str },

    /// Restore on a cache hit failed because the backend no longer knows the
    /// snapshot (e.g. it was reset out-of-band).
    #[error("snapshot {id} of fixture `{fixture}` is no longer valid; was the backend reset?")]
    StaleSnapshot {
        fixture: &'static str,
        id: SnapshotId,
        #[source]
        source: BackendError,
    },

    /// Any other restore / take-snapshot failure, unchanged.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The fixture body itself failed, unchanged. Nothing was cached.
    #[error(transparent)]
    Fixture(anyhow::Error),

    /// The memoized result did not downcast to the fixture's output type.
    /// Not reachable for well-formed identities: the identity is the
    /// callable's type, which fixes its output type. Kept as a guard instead
    /// of a panic.
    #[error("cached result of fixture `{fixture}` has an unexpected type")]
    ResultType { fixture: &'static str },
}

impl FixtureError {
    pub fn is_stale_snapshot(&self) -> bool {
        matches!(self, FixtureError::StaleSnapshot { .. })
    }

    pub fn is_anonymous_fixture(&self) -> bool {
        matches!(self, FixtureError::AnonymousFixture { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_type_guard_is_its_own_kind() {
        let e = FixtureError::ResultType { fixture: "deploy_token" };
        assert!(!e.is_stale_snapshot());
        assert!(!e.is_anonymous_fixture());
        assert_eq!(
            e.to_string(),
            "cached result of fixture `deploy_token` has an unexpected type"
        );
    }
}
