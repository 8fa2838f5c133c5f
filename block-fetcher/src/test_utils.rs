//! Tendermint JSON fixtures and in-memory stand-ins for the node and the archive.

use crate::{
    adaptor::{ProtocolVersion, MODE_ATTRIBUTE},
    archive::{BundleIndex, BundleStorage, FinalizedBundle, COMPRESSION_GZIP},
    error::{ArchiveError, ConnectionError},
    transport::RpcTransport,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, SecondsFormat};
use cosmos_core::rpc_types::Event;
use flate2::{write::GzEncoder, Compression};
use serde_json::{json, Map, Value};
use std::{
    collections::{BTreeMap, HashMap, HashSet, VecDeque},
    io::Write,
    ops::RangeInclusive,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

/// 2024-01-01T00:00:00Z.
const GENESIS_TIME_SECS: i64 = 1_704_067_200;

fn block_time(height: u64) -> String {
    DateTime::from_timestamp(GENESIS_TIME_SECS + height as i64 * 6, 0)
        .unwrap()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn block_id(hash: String) -> Value {
    json!({ "hash": hash, "parts": { "total": 1, "hash": "" } })
}

/// Result of a `block` call at `height` carrying `txs`.
pub fn block_json(height: u64, txs: &[Vec<u8>]) -> Value {
    let txs: Vec<String> = txs.iter().map(|tx| STANDARD.encode(tx)).collect();
    json!({
        "block_id": block_id(format!("{height:064X}")),
        "block": {
            "header": {
                "version": { "block": "11", "app": "0" },
                "chain_id": "testchain-1",
                "height": height.to_string(),
                "time": block_time(height),
                "last_block_id": block_id(format!("{:064X}", height.saturating_sub(1))),
                "last_commit_hash": "",
                "data_hash": "",
                "validators_hash": "",
                "app_hash": "",
                "proposer_address": "A1B2"
            },
            "data": { "txs": txs },
            "evidence": { "evidence": [] },
            "last_commit": null
        }
    })
}

fn event_json(version: ProtocolVersion, event: &Event) -> Value {
    let encode = |bytes: &[u8]| match version {
        ProtocolVersion::Tendermint34 => Value::String(STANDARD.encode(bytes)),
        _ => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    };
    let attributes: Vec<Value> = event
        .attributes
        .iter()
        .map(|a| json!({ "key": encode(&a.key), "value": encode(&a.value), "index": a.index }))
        .collect();
    json!({ "type": event.kind, "attributes": attributes })
}

fn with_mode(event: &Event, mode: &str) -> Event {
    let mut event = event.clone();
    event.attributes.extend(Event::new("", [(MODE_ATTRIBUTE, mode)]).attributes);
    event
}

/// Result of a `block_results` call in the shape `version` reports it.
///
/// `results` holds the code and the events of each transaction.
pub fn block_results_json(
    version: ProtocolVersion,
    height: u64,
    results: &[(u32, Vec<Event>)],
    begin: &[Event],
    end: &[Event],
) -> Value {
    let events = |events: &[Event]| -> Vec<Value> {
        events.iter().map(|e| event_json(version, e)).collect()
    };
    let txs_results: Vec<Value> = results
        .iter()
        .map(|(code, tx_events)| {
            let (log, codespace) = if *code == 0 { ("", "") } else { ("out of gas", "sdk") };
            json!({
                "code": code,
                "data": null,
                "log": log,
                "info": "",
                "gas_wanted": "200000",
                "gas_used": "80000",
                "events": events(tx_events),
                "codespace": codespace
            })
        })
        .collect();

    let mut value = json!({
        "height": height.to_string(),
        "txs_results": txs_results,
        "validator_updates": null,
        "consensus_param_updates": null
    });
    if version == ProtocolVersion::Comet38 {
        let finalize: Vec<Event> = begin
            .iter()
            .map(|e| with_mode(e, "BeginBlock"))
            .chain(end.iter().map(|e| with_mode(e, "EndBlock")))
            .collect();
        value["finalize_block_events"] = Value::Array(events(&finalize));
        value["app_hash"] = json!("");
    } else {
        value["begin_block_events"] = Value::Array(events(begin));
        value["end_block_events"] = Value::Array(events(end));
    }
    value
}

/// Result of a `status` call.
pub fn status_json(version: &str, network: &str, latest_height: u64) -> Value {
    json!({
        "node_info": {
            "protocol_version": { "p2p": "8", "block": "11", "app": "0" },
            "id": "f3a1",
            "network": network,
            "version": version,
            "moniker": "mock"
        },
        "sync_info": {
            "latest_block_hash": format!("{latest_height:064X}"),
            "latest_block_height": latest_height.to_string(),
            "latest_block_time": block_time(latest_height),
            "earliest_block_height": "1",
            "catching_up": false
        }
    })
}

/// Deterministic raw transactions of a mock block.
pub fn mock_txs(height: u64, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| format!("tx-{height}-{i}").into_bytes())
        .collect()
}

/// In-memory node answering `status`, `block` and `block_results`.
pub struct MockNode {
    version: String,
    blocks: BTreeMap<u64, usize>,
    truncated: HashSet<u64>,
    delays: bool,
    failures: Mutex<VecDeque<ConnectionError>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockNode {
    /// A node without blocks reporting `version`.
    pub fn new(version: &str) -> Self {
        MockNode {
            version: version.to_string(),
            blocks: BTreeMap::new(),
            truncated: HashSet::new(),
            delays: false,
            failures: Mutex::new(VecDeque::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Serve `heights`, each with `txs` transactions.
    pub fn with_blocks(mut self, heights: RangeInclusive<u64>, txs: usize) -> Self {
        self.blocks.extend(heights.map(|height| (height, txs)));
        self
    }

    /// Report one result less than there are transactions at `height`.
    pub fn with_truncated_results(mut self, height: u64) -> Self {
        self.truncated.insert(height);
        self
    }

    /// Answer later heights sooner, so concurrent calls complete out of order.
    pub fn with_delays(mut self) -> Self {
        self.delays = true;
        self
    }

    /// Fail the next `count` `block` calls with `error`.
    pub fn with_failures(self, count: usize, error: ConnectionError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .extend(std::iter::repeat(error).take(count));
        self
    }

    /// Number of calls of `method` so far.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn height(params: &Map<String, Value>) -> u64 {
        params["height"].as_str().unwrap().parse().unwrap()
    }

    fn txs_at(&self, height: u64) -> Result<usize, ConnectionError> {
        self.blocks
            .get(&height)
            .copied()
            .ok_or_else(|| ConnectionError::Generic {
                message: format!("height {height} is not available"),
            })
    }
}

#[async_trait]
impl RpcTransport for MockNode {
    async fn call(
        &self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ConnectionError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default() += 1;

        match method {
            "status" => {
                let latest = self.blocks.keys().next_back().copied().unwrap_or(0);
                Ok(status_json(&self.version, "testchain-1", latest))
            }
            "block" => {
                let failure = self.failures.lock().unwrap().pop_front();
                if let Some(error) = failure {
                    return Err(error);
                }
                let height = Self::height(&params);
                if self.delays {
                    let delay = Duration::from_millis(20u64.saturating_sub(height * 2));
                    tokio::time::sleep(delay).await;
                }
                let txs = self.txs_at(height)?;
                Ok(block_json(height, &mock_txs(height, txs)))
            }
            "block_results" => {
                let height = Self::height(&params);
                let mut txs = self.txs_at(height)?;
                if self.truncated.contains(&height) {
                    txs -= 1;
                }
                let version = ProtocolVersion::detect(&self.version);
                Ok(block_results_json(version, height, &vec![(0, vec![]); txs], &[], &[]))
            }
            _ => Err(ConnectionError::Generic {
                message: format!("method {method} not found"),
            }),
        }
    }
}

/// Metadata of gzip bundle `id` covering `heights`.
pub fn archived_bundle(id: u64, heights: RangeInclusive<u64>) -> FinalizedBundle {
    FinalizedBundle {
        id,
        storage_id: format!("bundle-{id}"),
        storage_provider_id: 2,
        compression_id: COMPRESSION_GZIP,
        from_key: heights.start().to_string(),
        to_key: heights.end().to_string(),
        data_hash: String::new(),
    }
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Gzip bundle data for `heights`, matching what [`MockNode`] serves for Tendermint 0.37.
pub fn bundle_bytes(heights: RangeInclusive<u64>, txs: usize) -> Vec<u8> {
    let items: Vec<Value> = heights
        .map(|height| {
            json!({
                "key": height.to_string(),
                "value": {
                    "block": block_json(height, &mock_txs(height, txs)),
                    "block_results": block_results_json(
                        ProtocolVersion::Tendermint37,
                        height,
                        &vec![(0, vec![]); txs],
                        &[],
                        &[],
                    ),
                }
            })
        })
        .collect();
    gzip(&serde_json::to_vec(&items).unwrap())
}

/// Bundle index of consecutive bundles of equal size, starting at height 1.
pub struct MockBundleIndex {
    bundles: Vec<FinalizedBundle>,
    lookups: AtomicUsize,
}

impl MockBundleIndex {
    pub fn new(count: u64, blocks_per_bundle: u64) -> Self {
        let bundles = (0..count)
            .map(|id| {
                let start = id * blocks_per_bundle + 1;
                archived_bundle(id, start..=start + blocks_per_bundle - 1)
            })
            .collect();
        MockBundleIndex {
            bundles,
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of `finalized_bundle` calls so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleIndex for MockBundleIndex {
    async fn latest_bundle_id(&self) -> Result<u64, ArchiveError> {
        Ok(self.bundles.len() as u64 - 1)
    }

    async fn finalized_bundle(&self, id: u64) -> Result<FinalizedBundle, ArchiveError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.bundles
            .get(id as usize)
            .cloned()
            .ok_or(ArchiveError::BundleNotFound { height: 0 })
    }
}

enum StorageMode {
    Serve { txs: usize },
    Fail,
    Corrupt,
}

/// Storage generating bundle data on request.
pub struct MockStorage {
    mode: StorageMode,
    retrievals: AtomicUsize,
}

impl MockStorage {
    /// Serve valid bundles with `txs` transactions per block.
    pub fn new(txs: usize) -> Self {
        MockStorage {
            mode: StorageMode::Serve { txs },
            retrievals: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        MockStorage {
            mode: StorageMode::Fail,
            retrievals: AtomicUsize::new(0),
        }
    }

    /// Serve data that is not gzip.
    pub fn corrupt() -> Self {
        MockStorage {
            mode: StorageMode::Corrupt,
            retrievals: AtomicUsize::new(0),
        }
    }

    pub fn retrievals(&self) -> usize {
        self.retrievals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleStorage for MockStorage {
    async fn retrieve(&self, bundle: &FinalizedBundle) -> Result<Vec<u8>, ArchiveError> {
        self.retrievals.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            StorageMode::Serve { txs } => Ok(bundle_bytes(bundle.height_range()?, txs)),
            StorageMode::Fail => Err(ArchiveError::StorageFetchFailed {
                storage_id: bundle.storage_id.clone(),
                message: "502 Bad Gateway".to_string(),
            }),
            StorageMode::Corrupt => Ok(b"definitely not gzip".to_vec()),
        }
    }
}
