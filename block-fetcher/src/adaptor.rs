//! Wire-protocol adaptors.
//!
//! Tendermint 0.34, Tendermint 0.37 and CometBFT 0.38 report the same block data in slightly
//! different JSON shapes. [`ProtocolVersion`] is detected once per connection and every response
//! is normalized into the [`cosmos_core::rpc_types`] model through it.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use cosmos_core::{
    rpc_types::{
        BlockId,
        BlockResponse,
        BlockResultsResponse,
        Event,
        EventAttribute,
        Header,
        RawBlock,
        TxData,
        Version,
    },
    DecodeError,
};
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

/// Attribute CometBFT 0.38 uses to tell begin-block from end-block events.
pub const MODE_ATTRIBUTE: &str = "mode";

/// The three wire-protocol families understood by the fetchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    /// Tendermint 0.34: base64 event attributes.
    Tendermint34,
    /// Tendermint 0.37: plain string event attributes.
    Tendermint37,
    /// CometBFT 0.38 and later: begin/end-block events merged into `finalize_block_events`.
    Comet38,
}

impl ProtocolVersion {
    /// Select the adaptor for a node version string as reported by `status`.
    pub fn detect(node_version: &str) -> Self {
        let version = node_version.trim_start_matches('v');
        if version.starts_with("0.37.") {
            ProtocolVersion::Tendermint37
        } else if version.starts_with("0.38.") || version.starts_with("1.") {
            ProtocolVersion::Comet38
        } else {
            ProtocolVersion::Tendermint34
        }
    }

    /// Normalize the result of a `block` call.
    pub fn decode_block(&self, value: Value) -> Result<BlockResponse, DecodeError> {
        let wire: WireBlockResponse = from_value("block", value)?;
        Ok(wire.into())
    }

    /// Normalize the result of a `block_results` call.
    pub fn decode_block_results(&self, value: Value) -> Result<BlockResultsResponse, DecodeError> {
        match self {
            ProtocolVersion::Tendermint34 => {
                from_value::<WireBlockResults<Base64Attribute>>("block_results", value)?
                    .normalize(false)
            }
            ProtocolVersion::Tendermint37 => {
                from_value::<WireBlockResults<StringAttribute>>("block_results", value)?
                    .normalize(false)
            }
            ProtocolVersion::Comet38 => {
                from_value::<WireBlockResults<StringAttribute>>("block_results", value)?
                    .normalize(true)
            }
        }
    }

    /// Decode the result of a `status` call.
    pub fn decode_status(value: Value) -> Result<NodeStatus, DecodeError> {
        let wire: WireStatus = from_value("status", value)?;
        Ok(NodeStatus {
            node_version: wire.node_info.version,
            chain_id: wire.node_info.network,
            latest_block_height: wire.sync_info.latest_block_height,
            latest_block_time: wire.sync_info.latest_block_time,
            earliest_block_height: wire.sync_info.earliest_block_height,
        })
    }
}

/// What the node reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    /// Consensus engine version, e.g. `0.37.2`.
    pub node_version: String,
    /// Chain id the node follows.
    pub chain_id: String,
    /// Latest committed height.
    pub latest_block_height: u64,
    /// Time of the latest committed block.
    pub latest_block_time: Option<DateTime<Utc>>,
    /// Lowest height the node still serves.
    pub earliest_block_height: u64,
}

/// Deserialize `value`, reporting failures as a malformed `what` response.
fn from_value<T: serde::de::DeserializeOwned>(what: &str, value: Value) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::MalformedResponse {
        what: what.to_string(),
        message: e.to_string(),
    })
}

/// Accepts a JSON number or a decimal string.
pub(crate) fn de_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString<T> {
        Number(T),
        String(String),
    }

    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.parse().map_err(de::Error::custom),
    }
}

/// Like [`de_number`], with null or absent meaning zero.
pub(crate) fn de_optional_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de> + Default,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString<T> {
        Number(T),
        String(String),
    }

    match Option::<NumberOrString<T>>::deserialize(deserializer)? {
        None => Ok(T::default()),
        Some(NumberOrString::Number(n)) => Ok(n),
        Some(NumberOrString::String(s)) if s.is_empty() => Ok(T::default()),
        Some(NumberOrString::String(s)) => s.parse().map_err(de::Error::custom),
    }
}

/// Null or absent becomes the default value.
fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A base64 string, with null or absent meaning empty.
fn de_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(s) => STANDARD.decode(s).map_err(de::Error::custom),
    }
}

/// A list of base64 strings, with null or absent meaning empty.
fn de_base64_list<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(|s| STANDARD.decode(s).map_err(de::Error::custom))
        .collect()
}

#[derive(Deserialize)]
struct WireBlockId {
    #[serde(default, deserialize_with = "de_null_default")]
    hash: String,
}

#[derive(Deserialize)]
struct WireVersion {
    #[serde(default, deserialize_with = "de_optional_number")]
    block: u64,
    #[serde(default, deserialize_with = "de_optional_number")]
    app: u64,
}

#[derive(Deserialize)]
struct WireHeader {
    version: WireVersion,
    chain_id: String,
    #[serde(deserialize_with = "de_number")]
    height: u64,
    time: DateTime<Utc>,
    #[serde(default)]
    last_block_id: Option<WireBlockId>,
    #[serde(default, deserialize_with = "de_null_default")]
    data_hash: String,
    #[serde(default, deserialize_with = "de_null_default")]
    app_hash: String,
    #[serde(default, deserialize_with = "de_null_default")]
    proposer_address: String,
}

#[derive(Deserialize)]
struct WireData {
    #[serde(default, deserialize_with = "de_base64_list")]
    txs: Vec<Vec<u8>>,
}

#[derive(Deserialize)]
struct WireBlock {
    header: WireHeader,
    data: WireData,
}

#[derive(Deserialize)]
struct WireBlockResponse {
    block_id: WireBlockId,
    block: WireBlock,
}

impl From<WireBlockResponse> for BlockResponse {
    fn from(wire: WireBlockResponse) -> Self {
        let header = wire.block.header;
        BlockResponse {
            block_id: BlockId {
                hash: wire.block_id.hash,
            },
            block: RawBlock {
                header: Header {
                    version: Version {
                        block: header.version.block,
                        app: header.version.app,
                    },
                    chain_id: header.chain_id,
                    height: header.height,
                    time: header.time,
                    last_block_id: header
                        .last_block_id
                        .filter(|id| !id.hash.is_empty())
                        .map(|id| BlockId { hash: id.hash }),
                    data_hash: header.data_hash,
                    app_hash: header.app_hash,
                    proposer_address: header.proposer_address,
                },
                txs: wire.block.data.txs,
            },
        }
    }
}

/// An event attribute in one of the wire encodings.
trait WireAttribute {
    /// Decode into raw key and value bytes.
    fn into_attribute(self) -> Result<EventAttribute, DecodeError>;
}

/// Tendermint 0.34 attribute: base64 key and value, either possibly null.
#[derive(Deserialize)]
struct Base64Attribute {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    index: bool,
}

impl WireAttribute for Base64Attribute {
    fn into_attribute(self) -> Result<EventAttribute, DecodeError> {
        let decode = |field: Option<String>| {
            STANDARD
                .decode(field.unwrap_or_default())
                .map_err(|e| DecodeError::MalformedResponse {
                    what: "block_results".to_string(),
                    message: format!("invalid base64 event attribute: {e}"),
                })
        };
        Ok(EventAttribute {
            key: decode(self.key)?,
            value: decode(self.value)?,
            index: self.index,
        })
    }
}

/// Tendermint 0.37 and CometBFT attribute: plain strings.
#[derive(Deserialize)]
struct StringAttribute {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    index: bool,
}

impl WireAttribute for StringAttribute {
    fn into_attribute(self) -> Result<EventAttribute, DecodeError> {
        Ok(EventAttribute {
            key: self.key.unwrap_or_default().into_bytes(),
            value: self.value.unwrap_or_default().into_bytes(),
            index: self.index,
        })
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
struct WireEvent<A> {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "de_null_default")]
    attributes: Vec<A>,
}

impl<A: WireAttribute> WireEvent<A> {
    fn normalize(self) -> Result<Event, DecodeError> {
        Ok(Event {
            kind: self.kind,
            attributes: self
                .attributes
                .into_iter()
                .map(WireAttribute::into_attribute)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
struct WireTxResult<A> {
    #[serde(default, deserialize_with = "de_optional_number")]
    code: u32,
    #[serde(default, deserialize_with = "de_null_default")]
    codespace: String,
    #[serde(default, deserialize_with = "de_null_default")]
    log: String,
    #[serde(default, deserialize_with = "de_null_default")]
    info: String,
    #[serde(default, deserialize_with = "de_base64")]
    data: Vec<u8>,
    #[serde(default, deserialize_with = "de_optional_number")]
    gas_wanted: i64,
    #[serde(default, deserialize_with = "de_optional_number")]
    gas_used: i64,
    #[serde(default, deserialize_with = "de_null_default")]
    events: Vec<WireEvent<A>>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "A: Deserialize<'de>"))]
struct WireBlockResults<A> {
    #[serde(deserialize_with = "de_number")]
    height: u64,
    #[serde(default, deserialize_with = "de_null_default")]
    txs_results: Vec<WireTxResult<A>>,
    #[serde(default)]
    begin_block_events: Option<Vec<WireEvent<A>>>,
    #[serde(default)]
    end_block_events: Option<Vec<WireEvent<A>>>,
    #[serde(default)]
    finalize_block_events: Option<Vec<WireEvent<A>>>,
}

fn normalize_events<A: WireAttribute>(
    events: Option<Vec<WireEvent<A>>>,
) -> Result<Option<Vec<Event>>, DecodeError> {
    events
        .map(|events| events.into_iter().map(WireEvent::normalize).collect())
        .transpose()
}

impl<A: WireAttribute> WireBlockResults<A> {
    /// Convert to the normalized model. With `split_finalize`, `finalize_block_events` are
    /// divided into begin-block and end-block events by their `mode` attribute.
    fn normalize(self, split_finalize: bool) -> Result<BlockResultsResponse, DecodeError> {
        let results = self
            .txs_results
            .into_iter()
            .map(|tx| -> Result<TxData, DecodeError> {
                Ok(TxData {
                    code: tx.code,
                    codespace: tx.codespace,
                    log: tx.log,
                    info: tx.info,
                    data: tx.data,
                    gas_wanted: tx.gas_wanted,
                    gas_used: tx.gas_used,
                    events: tx
                        .events
                        .into_iter()
                        .map(WireEvent::normalize)
                        .collect::<Result<_, DecodeError>>()?,
                })
            })
            .collect::<Result<Vec<_>, DecodeError>>()?;

        let mut begin_block_events = normalize_events(self.begin_block_events)?;
        let mut end_block_events = normalize_events(self.end_block_events)?;

        if split_finalize {
            if let Some(finalize) = normalize_events(self.finalize_block_events)? {
                let (begin, end): (Vec<_>, Vec<_>) =
                    finalize.into_iter().partition(is_begin_block_event);
                begin_block_events.get_or_insert_with(Vec::new).extend(begin);
                end_block_events.get_or_insert_with(Vec::new).extend(end);
            }
        }

        Ok(BlockResultsResponse {
            height: self.height,
            results,
            begin_block_events,
            end_block_events,
        })
    }
}

/// Whether a CometBFT 0.38 finalize-block event was emitted in the begin-block phase. Events
/// without a `mode` attribute count as end-block events.
fn is_begin_block_event(event: &Event) -> bool {
    event
        .attributes
        .iter()
        .any(|a| a.key == MODE_ATTRIBUTE.as_bytes() && a.value == b"BeginBlock")
}

#[derive(Deserialize)]
struct WireNodeInfo {
    network: String,
    version: String,
}

#[derive(Deserialize)]
struct WireSyncInfo {
    #[serde(deserialize_with = "de_number")]
    latest_block_height: u64,
    #[serde(default)]
    latest_block_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_optional_number")]
    earliest_block_height: u64,
}

#[derive(Deserialize)]
struct WireStatus {
    node_info: WireNodeInfo,
    sync_info: WireSyncInfo,
}
