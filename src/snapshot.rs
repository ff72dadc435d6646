//! Network state snapshots
//!
//! A [`SnapshotSource`] captures the current state of a test node and hands back a
//! [`Restorer`] that can roll the node back to that state. [`EvmSnapshotSource`]
//! implements both over the `evm_snapshot` / `evm_revert` JSON-RPC methods exposed
//! by Anvil and Hardhat nodes.

use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Provider, ProviderError};
use ethers::types::U256;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::settings::NodeSettings;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The node no longer knows the snapshot (reverted past it, or restarted).
    #[error("Snapshot {id} is no longer valid on the node")]
    InvalidSnapshot { id: U256 },
    #[error("RPC error: {0}")]
    Rpc(#[from] ProviderError),
    #[error("Failed to connect to node: {0}")]
    Connection(String),
    /// The revert to `id` went through but no replacement snapshot could be taken;
    /// `id` and every later snapshot are gone from the node.
    #[error("Reverted to snapshot {id} but could not take a new one: {source}")]
    RearmFailed {
        id: U256,
        #[source]
        source: Box<SnapshotError>,
    },
}

/// Handle to a captured network state.
///
/// Ids handed out by one source must increase strictly with creation order;
/// the fixture cache relies on it to decide which snapshots a rollback invalidated.
#[async_trait]
pub trait Restorer: Send + Sync {
    fn snapshot_id(&self) -> U256;

    /// Roll the network back to this snapshot.
    ///
    /// A restorer stays usable after a successful restore, but may carry a new id.
    async fn restore(&mut self) -> Result<(), SnapshotError>;
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    type Restorer: Restorer;

    async fn take_snapshot(&self) -> Result<Self::Restorer, SnapshotError>;
}

/// Snapshot source backed by a node's `evm_snapshot` / `evm_revert` methods.
pub struct EvmSnapshotSource<P> {
    provider: Arc<Provider<P>>,
}

impl<P> Clone for EvmSnapshotSource<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P> fmt::Debug for EvmSnapshotSource<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmSnapshotSource").finish_non_exhaustive()
    }
}

impl<P: JsonRpcClient + 'static> EvmSnapshotSource<P> {
    pub fn new(provider: Arc<Provider<P>>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<Provider<P>> {
        &self.provider
    }
}

impl EvmSnapshotSource<Http> {
    /// Build an HTTP provider for the node described in `settings`.
    pub fn connect(settings: &NodeSettings) -> Result<Self, SnapshotError> {
        let provider = Provider::<Http>::try_from(settings.url.as_str())
            .map_err(|e| SnapshotError::Connection(format!("{}: {}", settings.url, e)))?
            .interval(Duration::from_millis(settings.poll_interval_ms));
        debug!("EvmSnapshotSource: connected to {}", settings.url);
        Ok(Self::new(Arc::new(provider)))
    }
}

async fn evm_snapshot<P: JsonRpcClient>(provider: &Provider<P>) -> Result<U256, SnapshotError> {
    let id: U256 = provider.request("evm_snapshot", ()).await?;
    Ok(id)
}

#[async_trait]
impl<P: JsonRpcClient + 'static> SnapshotSource for EvmSnapshotSource<P> {
    type Restorer = EvmRestorer<P>;

    async fn take_snapshot(&self) -> Result<EvmRestorer<P>, SnapshotError> {
        let snapshot_id = evm_snapshot(&self.provider).await?;
        debug!("EvmSnapshotSource: took snapshot {}", snapshot_id);
        Ok(EvmRestorer {
            provider: Arc::clone(&self.provider),
            snapshot_id,
        })
    }
}

pub struct EvmRestorer<P> {
    provider: Arc<Provider<P>>,
    snapshot_id: U256,
}

impl<P> fmt::Debug for EvmRestorer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmRestorer")
            .field("snapshot_id", &self.snapshot_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> Restorer for EvmRestorer<P> {
    fn snapshot_id(&self) -> U256 {
        self.snapshot_id
    }

    async fn restore(&mut self) -> Result<(), SnapshotError> {
        let reverted: bool = self
            .provider
            .request("evm_revert", [self.snapshot_id])
            .await?;
        if !reverted {
            warn!("EvmRestorer: node rejected revert to snapshot {}", self.snapshot_id);
            return Err(SnapshotError::InvalidSnapshot {
                id: self.snapshot_id,
            });
        }

        // evm_revert consumes the snapshot; re-arm so the next restore works too.
        let previous = self.snapshot_id;
        self.snapshot_id = evm_snapshot(&self.provider).await.map_err(|e| {
            warn!("EvmRestorer: reverted to snapshot {} but re-arm failed: {}", previous, e);
            SnapshotError::RearmFailed {
                id: previous,
                source: Box::new(e),
            }
        })?;
        debug!(
            "EvmRestorer: reverted to snapshot {}, re-armed as {}",
            previous, self.snapshot_id
        );
        Ok(())
    }
}
