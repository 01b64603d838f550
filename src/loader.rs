//! `FixtureLoader`: run a fixture once, restore its snapshot afterwards.
//!
//! Hit:  restore(entry) -> prune entries newer than entry -> cached result.
//! Miss: run fixture -> take snapshot -> append entry -> result.
//!
//! Loads are sequential (`&mut self`). If a hit future is dropped after the
//! restore completed but before pruning, younger entries stay in the registry
//! until the next hit on an older entry prunes them.

use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::backend::{BackendError, SnapshotBackend, SnapshotId, SnapshotRestorer};
use crate::config::FixtureConfig;
use crate::error::FixtureError;
use crate::identity::FixtureIdentity;
use crate::metrics::{
    record_anonymous_rejection, record_entries_pruned, record_fixture_failure,
    record_fixture_hit, record_fixture_miss, record_restore, record_snapshot_taken,
    record_stale_snapshot,
};
use crate::param::Param;
use crate::registry::{FixtureRegistry, SnapshotEntry};

pub struct FixtureLoader<B: SnapshotBackend> {
    backend: B,
    registry: FixtureRegistry<B::Restorer>,
    config: FixtureConfig,
}

impl<B: SnapshotBackend> FixtureLoader<B> {
    /// Loader with configuration taken from SNAPFIX_* env variables.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, FixtureConfig::from_env())
    }

    pub fn with_config(backend: B, config: FixtureConfig) -> Self {
        debug!("FixtureLoader: {}", config);
        Self {
            backend,
            registry: FixtureRegistry::new(),
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &FixtureRegistry<B::Restorer> {
        &self.registry
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Number of (fixture, parameters) pairs currently cached.
    pub fn cached_fixtures(&self) -> usize {
        self.registry.len()
    }

    /// Forget every cached fixture. Use after resetting the backend
    /// out-of-band: all snapshots are gone at that point.
    pub fn clear_snapshots(&mut self) {
        self.registry.clear();
    }

    /// Load a fixture that takes no parameters.
    ///
    /// The first call runs `fixture` and snapshots the backend; later calls
    /// restore that snapshot and return the same `Arc` without running it.
    /// `fixture` must be a named `fn` item: closures are rejected with
    /// [`FixtureError::AnonymousFixture`].
    ///
    /// ```ignore
    /// async fn deploy_token() -> anyhow::Result<Token> { ... }
    ///
    /// let token = loader.load_fixture(deploy_token).await?;
    /// ```
    pub async fn load_fixture<F, Fut, T>(&mut self, fixture: F) -> Result<Arc<T>, FixtureError>
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<T>>,
        T: Send + Sync + 'static,
    {
        let identity = FixtureIdentity::of::<F>();
        self.load(identity, Param::Undefined, fixture).await
    }

    /// Load a fixture with parameters. Each distinct parameter value (as
    /// judged by [`params_equal`](crate::param::params_equal)) is cached
    /// separately.
    pub async fn load_fixture_with<F, Fut, T, P>(
        &mut self,
        fixture: F,
        parameters: P,
    ) -> Result<Arc<T>, FixtureError>
    where
        F: FnOnce(P) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<T>>,
        T: Send + Sync + 'static,
        P: Clone + Into<Param>,
    {
        let identity = FixtureIdentity::of::<F>();
        let key: Param = parameters.clone().into();
        self.load(identity, key, move || fixture(parameters)).await
    }

    async fn load<Run, Fut, T>(
        &mut self,
        identity: FixtureIdentity,
        parameters: Param,
        run: Run,
    ) -> Result<Arc<T>, FixtureError>
    where
        Run: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
        T: Send + Sync + 'static,
    {
        let name = match identity.name() {
            Some(n) => n,
            None => {
                record_anonymous_rejection();
                return Err(FixtureError::AnonymousFixture {
                    type_name: identity.type_name(),
                });
            }
        };

        // Hit: the borrow of the entry ends before the registry is mutated.
        let hit = match self.registry.find(&identity, &parameters) {
            Some(entry) => {
                let id = entry.snapshot_id();
                let cached = entry.result::<T>();
                let restored = entry.restorer.restore().await;
                Some((id, cached, restored))
            }
            None => None,
        };

        if let Some((id, cached, restored)) = hit {
            record_restore();
            if let Err(e) = restored {
                return Err(self.restore_failed(name, identity, &parameters, id, e));
            }

            let pruned = self.registry.prune_newer_than(id);
            record_entries_pruned(pruned);
            record_fixture_hit();
            if self.config.log_hits {
                debug!(
                    "load_fixture: hit `{}` -> restored snapshot {} (pruned {})",
                    name, id, pruned
                );
            }
            return cached.ok_or(FixtureError::ResultType { fixture: name });
        }

        // Miss
        record_fixture_miss();
        debug!("load_fixture: miss `{}` params={:?}, running fixture", name, parameters);

        let data = match run().await {
            Ok(v) => Arc::new(v),
            Err(e) => {
                record_fixture_failure();
                debug!("load_fixture: fixture `{}` failed, nothing cached: {:#}", name, e);
                return Err(FixtureError::Fixture(e));
            }
        };

        let restorer = self.backend.take_snapshot().await?;
        record_snapshot_taken();
        let id = restorer.snapshot_id();

        self.registry.append(SnapshotEntry::new(
            identity,
            parameters,
            restorer,
            Arc::clone(&data),
        ));
        info!(
            "load_fixture: cached `{}` at snapshot {} ({} entr(y/ies))",
            name,
            id,
            self.registry.len()
        );

        Ok(data)
    }

    fn restore_failed(
        &mut self,
        name: &'static str,
        identity: FixtureIdentity,
        parameters: &Param,
        id: SnapshotId,
        err: BackendError,
    ) -> FixtureError {
        if !err.is_invalid_snapshot() {
            debug!("load_fixture: restore of snapshot {} for `{}` failed: {}", id, name, err);
            return FixtureError::Backend(err);
        }

        record_stale_snapshot();
        if self.config.evict_stale {
            self.registry.evict(&identity, parameters);
            warn!(
                "load_fixture: snapshot {} of `{}` is stale; entry evicted, next call re-runs the fixture",
                id, name
            );
        } else {
            warn!("load_fixture: snapshot {} of `{}` is stale; entry kept", id, name);
        }

        FixtureError::StaleSnapshot {
            fixture: name,
            id,
            source: err,
        }
    }
}
