//! # EVM Fixture Loader
//!
//! Snapshot-backed test fixtures for Anvil and Hardhat nodes.
//!
//! ## Overview
//!
//! Integration tests against a dev chain usually start from the same deployed
//! state: contracts deployed, balances funded, approvals granted. Running that
//! setup before every test is slow. [`FixtureCache::load_fixture`] runs a setup
//! function once, snapshots the node, and on later calls with the same fixture
//! and arguments reverts the node to that snapshot and hands back the cached result.
//!
//! ```ignore
//! use evm_fixture_loader::{fixture, EvmSnapshotSource, FixtureCache, Settings};
//!
//! async fn deploy_token(supply: u64) -> anyhow::Result<Address> { ... }
//!
//! let settings = Settings::new()?;
//! let mut fixtures = FixtureCache::new(EvmSnapshotSource::connect(&settings.node)?);
//!
//! let token = fixtures.load_fixture(&fixture!(deploy_token), 1_000).await?; // runs setup
//! let again = fixtures.load_fixture(&fixture!(deploy_token), 1_000).await?; // reverts
//! assert_eq!(token, again);
//! ```
//!
//! ## Layers
//!
//! ### Snapshots
//! [`SnapshotSource`] and [`Restorer`] abstract over the node's snapshot RPCs.
//!
//! ### Fixtures
//! A [`Fixture`] is a named async setup function; the name and canonically encoded
//! arguments form the cache key.
//!
//! ### Cache
//! [`FixtureCache`] keeps snapshot records in creation order and prunes the ones a
//! revert invalidated.

// Core
/// Snapshot-backed fixture cache
pub mod fixture_cache;
/// Fixture trait and named wrappers
pub mod fixture;
/// Canonical cache keys
pub mod fixture_key;
/// Node snapshot / revert primitives
pub mod snapshot;

// Infrastructure
/// Configuration management
pub mod settings;
/// Metrics and observability
pub mod metrics;
/// Logging and metrics bootstrap
pub mod telemetry;

// Re-exports for convenience
pub use fixture::{Fixture, NamedFixture};
pub use fixture_cache::{FixtureCache, FixtureCacheStats, FixtureError};
pub use fixture_key::FixtureKey;
pub use settings::{NodeSettings, Settings};
pub use snapshot::{EvmRestorer, EvmSnapshotSource, Restorer, SnapshotError, SnapshotSource};
