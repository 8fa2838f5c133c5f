use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Block id as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockId {
    /// Upper-case hex block hash.
    pub hash: String,
}

/// Consensus versions of the block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Version {
    /// Block protocol version.
    pub block: u64,
    /// Application version.
    pub app: u64,
}

/// Block header fields the indexer uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Consensus versions.
    pub version: Version,
    /// Chain id, e.g. `cosmoshub-4`.
    pub chain_id: String,
    /// Block height.
    pub height: u64,
    /// Block time.
    pub time: DateTime<Utc>,
    /// Id of the previous block, absent at genesis.
    pub last_block_id: Option<BlockId>,
    /// Hex data hash.
    pub data_hash: String,
    /// Hex app hash.
    pub app_hash: String,
    /// Hex proposer address.
    pub proposer_address: String,
}

/// Header and raw transactions of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    /// Block header.
    pub header: Header,
    /// Raw `TxRaw` bytes, in block order.
    pub txs: Vec<Vec<u8>>,
}

/// Normalized response of the `block` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResponse {
    /// Id of this block.
    pub block_id: BlockId,
    /// Block contents.
    pub block: RawBlock,
}

/// Event attribute with its key and value as raw bytes.
///
/// Depending on the node version these were base64 or plain strings on the wire; after
/// normalization they are always the decoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventAttribute {
    /// Attribute key.
    pub key: Vec<u8>,
    /// Attribute value.
    pub value: Vec<u8>,
    /// Whether the node indexes this attribute.
    pub index: bool,
}

/// An ABCI event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    /// Event type, e.g. `transfer`.
    pub kind: String,
    /// Attributes in emission order.
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    /// Construct an event from UTF-8 key/value pairs.
    pub fn new<'a>(kind: &str, attributes: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Event {
            kind: kind.to_string(),
            attributes: attributes
                .into_iter()
                .map(|(key, value)| EventAttribute {
                    key: key.as_bytes().to_vec(),
                    value: value.as_bytes().to_vec(),
                    index: true,
                })
                .collect(),
        }
    }
}

/// Execution result of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxData {
    /// Result code, zero on success.
    pub code: u32,
    /// Module the code belongs to.
    pub codespace: String,
    /// Raw log; JSON on older SDKs, an error message for failed transactions.
    pub log: String,
    /// Additional info.
    pub info: String,
    /// Result data.
    pub data: Vec<u8>,
    /// Gas requested.
    pub gas_wanted: i64,
    /// Gas consumed.
    pub gas_used: i64,
    /// Events emitted.
    pub events: Vec<Event>,
}

impl TxData {
    /// Whether the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Normalized response of the `block_results` call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockResultsResponse {
    /// Height the results belong to.
    pub height: u64,
    /// One entry per transaction, in block order.
    pub results: Vec<TxData>,
    /// Begin-block events, if the node reports them.
    pub begin_block_events: Option<Vec<Event>>,
    /// End-block events, if the node reports them.
    pub end_block_events: Option<Vec<Event>>,
}

/// A block together with its results, checked to describe the same transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockPair {
    block: BlockResponse,
    block_results: BlockResultsResponse,
}

impl BlockPair {
    /// Pair `block` with `block_results`.
    ///
    /// Fails if the number of transaction results differs from the number of transactions.
    pub fn new(
        block: BlockResponse,
        block_results: BlockResultsResponse,
    ) -> Result<Self, ValidationError> {
        let tx_count = block.block.txs.len();
        let result_count = block_results.results.len();
        if tx_count != result_count {
            return Err(ValidationError::TxResultCountMismatch {
                height: block.block.header.height,
                tx_count,
                result_count,
            });
        }
        Ok(BlockPair {
            block,
            block_results,
        })
    }

    /// Height of the block.
    pub fn height(&self) -> u64 {
        self.block.block.header.height
    }

    /// The block.
    pub fn block(&self) -> &BlockResponse {
        &self.block
    }

    /// The block results.
    pub fn block_results(&self) -> &BlockResultsResponse {
        &self.block_results
    }

    /// Split back into the block and its results.
    pub fn into_parts(self) -> (BlockResponse, BlockResultsResponse) {
        (self.block, self.block_results)
    }
}
