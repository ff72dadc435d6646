//! Snapshot-backed fixture cache
//!
//! [`FixtureCache::load_fixture`] runs a fixture once, snapshots the node, and on
//! later calls with the same fixture name and arguments rolls the node back to
//! that snapshot instead of running setup again.
//!
//! ## Invalidation
//!
//! Restoring snapshot `n` rolls the node back past every snapshot taken after it,
//! so those records are dropped as soon as the restore succeeds. Records are kept
//! in creation order and their ids must increase strictly; a source that hands
//! out a non-increasing id is rejected with [`FixtureError::NonMonotonicSnapshotId`].
//!
//! The cache is owned by the test harness and borrowed mutably for every call,
//! so loads against one cache are always sequential.

use ethers::types::U256;
use serde::Serialize;
use std::any::Any;
use tracing::{debug, warn};

use crate::fixture::Fixture;
use crate::fixture_key::FixtureKey;
use crate::metrics;
use crate::snapshot::{Restorer, SnapshotError, SnapshotSource};

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// Fixtures are keyed by name; an empty name would never produce a cache hit.
    #[error("Fixtures must have a name; anonymous fixtures cannot be cached")]
    AnonymousFunction,
    #[error("Snapshot for fixture '{fixture}' is no longer valid; the node may have been restarted or reverted")]
    Snapshot {
        fixture: String,
        #[source]
        source: SnapshotError,
    },
    #[error("Arguments for fixture '{fixture}' cannot be encoded as a cache key: {source}")]
    ArgumentEncoding {
        fixture: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Fixture '{fixture}' was cached with a different result type")]
    DataTypeMismatch { fixture: String },
    #[error("Snapshot id {id} is not greater than the previous snapshot id {previous}")]
    NonMonotonicSnapshotId { id: U256, previous: U256 },
    #[error(transparent)]
    Setup(anyhow::Error),
    #[error(transparent)]
    Restore(SnapshotError),
    #[error(transparent)]
    TakeSnapshot(SnapshotError),
}

struct SnapshotRecord<R> {
    restorer: R,
    key: FixtureKey,
    data: Box<dyn Any + Send + Sync>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub pruned: u64,
}

pub struct FixtureCache<S: SnapshotSource> {
    source: S,
    snapshots: Vec<SnapshotRecord<S::Restorer>>,
    stats: FixtureCacheStats,
}

impl<S: SnapshotSource> FixtureCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshots: Vec::new(),
            stats: FixtureCacheStats::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run `fixture` with `args`, or restore the snapshot taken after its last run.
    ///
    /// On a hit the node is rolled back and a clone of the first run's result is
    /// returned without calling the fixture.
    pub async fn load_fixture<F, A, T>(&mut self, fixture: &F, args: A) -> Result<T, FixtureError>
    where
        F: Fixture<A, T> + ?Sized,
        A: Serialize + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        let name = fixture.name();
        if name.trim().is_empty() {
            return Err(FixtureError::AnonymousFunction);
        }

        let key = FixtureKey::new(name, &args).map_err(|source| FixtureError::ArgumentEncoding {
            fixture: name.to_string(),
            source,
        })?;

        if let Some(index) = self.snapshots.iter().position(|s| s.key == key) {
            return self.restore_at(index).await;
        }

        debug!("FixtureCache: miss for {}, running setup", key);
        let data = fixture.setup(args).await.map_err(FixtureError::Setup)?;
        let restorer = self
            .source
            .take_snapshot()
            .await
            .map_err(FixtureError::TakeSnapshot)?;

        let id = restorer.snapshot_id();
        if let Some(last) = self.snapshots.last() {
            let previous = last.restorer.snapshot_id();
            if id <= previous {
                return Err(FixtureError::NonMonotonicSnapshotId { id, previous });
            }
        }

        self.stats.misses += 1;
        metrics::increment_cache_miss(key.fixture());
        debug!("FixtureCache: cached {} under snapshot {}", key, id);

        self.snapshots.push(SnapshotRecord {
            restorer,
            key,
            data: Box::new(data.clone()),
        });
        metrics::set_cache_size(self.snapshots.len() as f64);

        Ok(data)
    }

    async fn restore_at<T>(&mut self, index: usize) -> Result<T, FixtureError>
    where
        T: Clone + Send + Sync + 'static,
    {
        let record = &mut self.snapshots[index];
        let restored_id = record.restorer.snapshot_id();

        let outcome = record.restorer.restore().await;
        match outcome {
            Ok(()) => {}
            Err(source @ SnapshotError::InvalidSnapshot { .. }) => {
                warn!(
                    "FixtureCache: snapshot {} for {} is no longer valid",
                    restored_id, record.key
                );
                metrics::increment_snapshot_error(record.key.fixture());
                return Err(FixtureError::Snapshot {
                    fixture: record.key.fixture().to_string(),
                    source,
                });
            }
            Err(e @ SnapshotError::RearmFailed { .. }) => {
                // The node already rolled back: this record's snapshot and every
                // later one are gone.
                let dropped = (self.snapshots.len() - index) as u64;
                self.snapshots.truncate(index);
                self.stats.pruned += dropped;
                metrics::increment_snapshots_pruned(dropped);
                metrics::set_cache_size(self.snapshots.len() as f64);
                warn!(
                    "FixtureCache: restore of snapshot {} could not re-arm, dropped {} snapshot(s)",
                    restored_id, dropped
                );
                return Err(FixtureError::Restore(e));
            }
            Err(e) => return Err(FixtureError::Restore(e)),
        }

        // The restored record may carry a fresh id now, so it is kept by position.
        let before = self.snapshots.len();
        let mut position = 0;
        self.snapshots.retain(|s| {
            let keep = position == index || s.restorer.snapshot_id() <= restored_id;
            position += 1;
            keep
        });
        let pruned = (before - self.snapshots.len()) as u64;

        // Records before `index` have smaller ids and all survive.
        let record = &self.snapshots[index];
        self.stats.hits += 1;
        self.stats.pruned += pruned;
        metrics::increment_cache_hit(record.key.fixture());
        if pruned > 0 {
            metrics::increment_snapshots_pruned(pruned);
            metrics::set_cache_size(self.snapshots.len() as f64);
        }
        debug!(
            "FixtureCache: restored {} from snapshot {}, pruned {} later snapshot(s)",
            record.key, restored_id, pruned
        );

        record
            .data
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| FixtureError::DataTypeMismatch {
                fixture: record.key.fixture().to_string(),
            })
    }

    /// Whether a snapshot is cached for `fixture` called with `args`.
    pub fn contains<F, A, T>(&self, fixture: &F, args: &A) -> bool
    where
        F: Fixture<A, T> + ?Sized,
        A: Serialize + Send + 'static,
        T: Send + 'static,
    {
        match FixtureKey::new(fixture.name(), args) {
            Ok(key) => self.snapshots.iter().any(|s| s.key == key),
            Err(_) => false,
        }
    }

    /// Drop every cached snapshot. The node itself is left untouched.
    pub fn clear_snapshots(&mut self) {
        if !self.snapshots.is_empty() {
            debug!("FixtureCache: clearing {} snapshot(s)", self.snapshots.len());
        }
        self.snapshots.clear();
        metrics::set_cache_size(0.0);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn stats(&self) -> FixtureCacheStats {
        self.stats
    }

    /// Snapshot ids currently cached, in creation order.
    pub fn snapshot_ids(&self) -> Vec<U256> {
        self.snapshots.iter().map(|s| s.restorer.snapshot_id()).collect()
    }
}
