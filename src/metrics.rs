//! Lightweight global metrics for the fixture cache.
//!
//! Потокобезопасные атомарные счётчики (Relaxed), общие на процесс:
//! - hits / misses / fixture failures
//! - snapshots taken / restores / pruned entries
//! - stale snapshots / anonymous rejections

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Cache -----
static FIXTURE_HITS: AtomicU64 = AtomicU64::new(0);
static FIXTURE_MISSES: AtomicU64 = AtomicU64::new(0);
static FIXTURE_FAILURES: AtomicU64 = AtomicU64::new(0);
static ANONYMOUS_REJECTIONS: AtomicU64 = AtomicU64::new(0);

// ----- Snapshots -----
static SNAPSHOTS_TAKEN: AtomicU64 = AtomicU64::new(0);
static RESTORES: AtomicU64 = AtomicU64::new(0);
static ENTRIES_PRUNED: AtomicU64 = AtomicU64::new(0);
static STALE_SNAPSHOTS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    // Cache
    pub fixture_hits: u64,
    pub fixture_misses: u64,
    pub fixture_failures: u64,
    pub anonymous_rejections: u64,

    // Snapshots
    pub snapshots_taken: u64,
    pub restores: u64,
    pub entries_pruned: u64,
    pub stale_snapshots: u64,
}

impl MetricsSnapshot {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.fixture_hits + self.fixture_misses;
        if total == 0 {
            0.0
        } else {
            self.fixture_hits as f64 / total as f64
        }
    }
}

// ----- Recorders (Cache) -----
pub fn record_fixture_hit() {
    FIXTURE_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_fixture_miss() {
    FIXTURE_MISSES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_fixture_failure() {
    FIXTURE_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_anonymous_rejection() {
    ANONYMOUS_REJECTIONS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (Snapshots) -----
pub fn record_snapshot_taken() {
    SNAPSHOTS_TAKEN.fetch_add(1, Ordering::Relaxed);
}

pub fn record_restore() {
    RESTORES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_entries_pruned(n: usize) {
    ENTRIES_PRUNED.fetch_add(n as u64, Ordering::Relaxed);
}

pub fn record_stale_snapshot() {
    STALE_SNAPSHOTS.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        fixture_hits: FIXTURE_HITS.load(Ordering::Relaxed),
        fixture_misses: FIXTURE_MISSES.load(Ordering::Relaxed),
        fixture_failures: FIXTURE_FAILURES.load(Ordering::Relaxed),
        anonymous_rejections: ANONYMOUS_REJECTIONS.load(Ordering::Relaxed),

        snapshots_taken: SNAPSHOTS_TAKEN.load(Ordering::Relaxed),
        restores: RESTORES.load(Ordering::Relaxed),
        entries_pruned: ENTRIES_PRUNED.load(Ordering::Relaxed),
        stale_snapshots: STALE_SNAPSHOTS.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    FIXTURE_HITS.store(0, Ordering::Relaxed);
    FIXTURE_MISSES.store(0, Ordering::Relaxed);
    FIXTURE_FAILURES.store(0, Ordering::Relaxed);
    ANONYMOUS_REJECTIONS.store(0, Ordering::Relaxed);

    SNAPSHOTS_TAKEN.store(0, Ordering::Relaxed);
    RESTORES.store(0, Ordering::Relaxed);
    ENTRIES_PRUNED.store(0, Ordering::Relaxed);
    STALE_SNAPSHOTS.store(0, Ordering::Relaxed);
}
