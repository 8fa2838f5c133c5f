use crate::{
    adaptor::{NodeStatus, ProtocolVersion},
    error::Result,
    transport::RpcTransport,
};
use cosmos_core::{
    rpc_types::{BlockResponse, BlockResultsResponse},
    BlockPair,
};
use futures::future::try_join_all;
use log::info;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fetches block pairs from a live node.
///
/// The node's protocol version is detected once on connect and used for every response.
#[derive(Clone)]
pub struct RpcFetcher {
    /// Connection to the node.
    transport: Arc<dyn RpcTransport>,
    /// Adaptor selected on connect.
    version: ProtocolVersion,
    /// Node status as of connect.
    status: NodeStatus,
}

impl RpcFetcher {
    /// Query the node status over `transport` and select the matching adaptor.
    pub async fn connect(transport: Arc<dyn RpcTransport>) -> Result<Self> {
        let status = query_status(transport.as_ref()).await?;
        let version = ProtocolVersion::detect(&status.node_version);
        info!(
            "🔗 connected to {} at height {}, node version {} ({version:?})",
            status.chain_id, status.latest_block_height, status.node_version
        );
        Ok(RpcFetcher {
            transport,
            version,
            status,
        })
    }

    /// The adaptor in use.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Chain id reported by the node.
    pub fn chain_id(&self) -> &str {
        &self.status.chain_id
    }

    /// Node status as of connect.
    pub fn status(&self) -> &NodeStatus {
        &self.status
    }

    /// Latest committed height, queried now.
    pub async fn latest_height(&self) -> Result<u64> {
        Ok(query_status(self.transport.as_ref())
            .await?
            .latest_block_height)
    }

    /// Fetch the block at `height`.
    pub async fn fetch_block(&self, height: u64) -> Result<BlockResponse> {
        let value = self.transport.call("block", height_params(height)).await?;
        Ok(self.version.decode_block(value)?)
    }

    /// Fetch the block results at `height`.
    pub async fn fetch_block_results(&self, height: u64) -> Result<BlockResultsResponse> {
        let value = self
            .transport
            .call("block_results", height_params(height))
            .await?;
        Ok(self.version.decode_block_results(value)?)
    }

    /// Fetch the block and its results at `height` concurrently and pair them.
    pub async fn fetch_pair(&self, height: u64) -> Result<BlockPair> {
        let (block, block_results) =
            tokio::try_join!(self.fetch_block(height), self.fetch_block_results(height))?;
        Ok(BlockPair::new(block, block_results)?)
    }

    /// Fetch the pairs at `heights` concurrently.
    ///
    /// The result is in the order of `heights`. If any height fails the whole batch fails.
    pub async fn fetch_pairs(&self, heights: &[u64]) -> Result<Vec<BlockPair>> {
        try_join_all(heights.iter().map(|height| self.fetch_pair(*height))).await
    }
}

/// Call `status` and decode it.
async fn query_status(transport: &dyn RpcTransport) -> Result<NodeStatus> {
    let value = transport.call("status", Map::new()).await?;
    Ok(ProtocolVersion::decode_status(value)?)
}

/// `{"height": "<height>"}`; Tendermint takes heights as strings.
fn height_params(height: u64) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("height".to_string(), Value::String(height.to_string()));
    params
}
