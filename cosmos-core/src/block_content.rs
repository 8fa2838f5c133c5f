use crate::{
    error::DecodeError,
    proto::{AuthInfo, TxBody, TxRaw},
    registry::TypeRegistry,
    rpc_types::{BlockId, BlockPair, Event, Header, TxData},
};
use log::{debug, warn};
use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::{cell::OnceCell, collections::BTreeMap, rc::Rc, sync::Arc};

/// Type url reported in errors about undecodable transaction envelopes.
pub const TX_TYPE_URL: &str = "/cosmos.tx.v1beta1.Tx";

/// Attribute linking a transaction event to the message that emitted it.
pub const MSG_INDEX_ATTRIBUTE: &str = "msg_index";

/// Block metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmosBlock {
    /// Id reported by the node.
    pub block_id: BlockId,
    /// Block header.
    pub header: Header,
    /// Number of transactions in the block.
    pub tx_count: usize,
}

impl CosmosBlock {
    /// Block height.
    pub fn height(&self) -> u64 {
        self.header.height
    }
}

/// The decoded envelope of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTx {
    /// Body holding the messages.
    pub body: TxBody,
    /// Signer and fee information.
    pub auth_info: AuthInfo,
    /// Signatures, one per signer.
    pub signatures: Vec<Vec<u8>>,
}

/// One transaction of a block.
#[derive(Debug)]
pub struct CosmosTransaction {
    /// Position in the block.
    pub idx: usize,
    /// The owning block.
    pub block: Rc<CosmosBlock>,
    /// Upper-case hex sha256 of the raw bytes.
    pub hash: String,
    /// Raw `TxRaw` bytes.
    pub raw: Vec<u8>,
    /// Execution result.
    pub result: TxData,
    /// Memoized envelope decode.
    decoded: OnceCell<Result<DecodedTx, DecodeError>>,
}

impl CosmosTransaction {
    /// Whether the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// The decoded envelope, decoded on first access.
    pub fn decoded_tx(&self) -> Result<&DecodedTx, DecodeError> {
        self.decoded
            .get_or_init(|| decode_tx(&self.raw))
            .as_ref()
            .map_err(Clone::clone)
    }
}

/// One message of a transaction.
#[derive(Debug)]
pub struct CosmosMessage {
    /// Position within the owning transaction.
    pub idx: usize,
    /// The owning transaction.
    pub tx: Rc<CosmosTransaction>,
    /// Protobuf type url of the payload.
    pub type_url: String,
    /// Encoded payload.
    pub value: Vec<u8>,
    /// Registry used to decode the payload.
    registry: Arc<TypeRegistry>,
    /// Memoized payload decode.
    decoded: OnceCell<Result<Value, DecodeError>>,
}

impl CosmosMessage {
    /// The decoded payload, decoded on first access.
    pub fn decoded_msg(&self) -> Result<&Value, DecodeError> {
        self.decoded
            .get_or_init(|| self.registry.decode(&self.type_url, &self.value))
            .as_ref()
            .map_err(Clone::clone)
    }
}

/// An event attribute as UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    #[serde(default)]
    pub value: String,
}

/// An event with UTF-8 attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Attributes in emission order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl StringEvent {
    /// Value of the first attribute named `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

impl From<&Event> for StringEvent {
    fn from(event: &Event) -> Self {
        StringEvent {
            kind: event.kind.clone(),
            attributes: event
                .attributes
                .iter()
                .map(|a| Attribute {
                    key: String::from_utf8_lossy(&a.key).into_owned(),
                    value: String::from_utf8_lossy(&a.value).into_owned(),
                })
                .collect(),
        }
    }
}

/// Events of one transaction emitted by the message at `msg_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLog {
    /// Index of the emitting message within the transaction.
    #[serde(default)]
    pub msg_index: usize,
    /// Events in emission order.
    #[serde(default)]
    pub events: Vec<StringEvent>,
}

/// One event of the block's event stream.
#[derive(Debug, Clone)]
pub struct CosmosEvent {
    /// Position in the block's event stream.
    pub idx: usize,
    /// The owning block.
    pub block: Rc<CosmosBlock>,
    /// The emitting transaction, absent for begin/end-block events.
    pub tx: Option<Rc<CosmosTransaction>>,
    /// The emitting message, absent for begin/end-block events.
    pub msg: Option<Rc<CosmosMessage>>,
    /// The message's grouped events, absent for begin/end-block events.
    pub log: Option<Rc<TxLog>>,
    /// The event itself.
    pub event: StringEvent,
}

/// The materialized event stream and where the transaction events sit in it.
#[derive(Debug)]
struct EventStream {
    /// Every event in block order.
    events: Vec<CosmosEvent>,
    /// Index of the first transaction event.
    tx_start: usize,
    /// Index one past the last transaction event.
    tx_end: usize,
}

/// Structured view over one fetched block.
///
/// Every accessor computes its result on first call and returns the cached value afterwards.
/// Memoization uses [`OnceCell`] and [`Rc`], so an instance belongs to one thread.
#[derive(Debug)]
pub struct LazyBlockContent {
    /// The wrapped block and results.
    pair: BlockPair,
    /// Registry used to decode message payloads.
    registry: Arc<TypeRegistry>,
    /// Memoized [`LazyBlockContent::block`].
    block: OnceCell<Rc<CosmosBlock>>,
    /// Memoized [`LazyBlockContent::transactions`].
    transactions: OnceCell<Vec<Rc<CosmosTransaction>>>,
    /// Messages grouped by owning transaction.
    tx_messages: OnceCell<Vec<Vec<Rc<CosmosMessage>>>>,
    /// Memoized [`LazyBlockContent::messages`].
    messages: OnceCell<Vec<Rc<CosmosMessage>>>,
    /// Memoized [`LazyBlockContent::events`].
    events: OnceCell<EventStream>,
}

impl LazyBlockContent {
    /// Wrap `pair`, decoding payloads with `registry` when they are accessed.
    pub fn new(pair: BlockPair, registry: Arc<TypeRegistry>) -> Self {
        LazyBlockContent {
            pair,
            registry,
            block: OnceCell::new(),
            transactions: OnceCell::new(),
            tx_messages: OnceCell::new(),
            messages: OnceCell::new(),
            events: OnceCell::new(),
        }
    }

    /// Height of the block.
    pub fn height(&self) -> u64 {
        self.pair.height()
    }

    /// The underlying block pair.
    pub fn pair(&self) -> &BlockPair {
        &self.pair
    }

    /// Give back the underlying block pair.
    pub fn into_pair(self) -> BlockPair {
        self.pair
    }

    /// Block metadata.
    pub fn block(&self) -> &Rc<CosmosBlock> {
        self.block.get_or_init(|| {
            let response = self.pair.block();
            Rc::new(CosmosBlock {
                block_id: response.block_id.clone(),
                header: response.block.header.clone(),
                tx_count: response.block.txs.len(),
            })
        })
    }

    /// Transactions in block order.
    pub fn transactions(&self) -> &[Rc<CosmosTransaction>] {
        self.transactions.get_or_init(|| {
            let block = self.block();
            let txs = &self.pair.block().block.txs;
            let results = &self.pair.block_results().results;
            txs.iter()
                .zip(results)
                .enumerate()
                .map(|(idx, (raw, result))| {
                    Rc::new(CosmosTransaction {
                        idx,
                        block: block.clone(),
                        hash: tx_hash(raw),
                        raw: raw.clone(),
                        result: result.clone(),
                        decoded: OnceCell::new(),
                    })
                })
                .collect()
        })
    }

    /// Messages of every transaction, in transaction order then in-transaction order.
    pub fn messages(&self) -> &[Rc<CosmosMessage>] {
        self.messages
            .get_or_init(|| self.tx_messages().iter().flatten().cloned().collect())
    }

    /// The block's event stream: begin-block, then successful transactions, then end-block.
    pub fn events(&self) -> &[CosmosEvent] {
        &self.event_stream().events
    }

    /// Begin-block events, a prefix of [`LazyBlockContent::events`].
    pub fn begin_block_events(&self) -> &[CosmosEvent] {
        let stream = self.event_stream();
        &stream.events[..stream.tx_start]
    }

    /// Events of successful transactions.
    pub fn transaction_events(&self) -> &[CosmosEvent] {
        let stream = self.event_stream();
        &stream.events[stream.tx_start..stream.tx_end]
    }

    /// End-block events, a suffix of [`LazyBlockContent::events`].
    pub fn end_block_events(&self) -> &[CosmosEvent] {
        let stream = self.event_stream();
        &stream.events[stream.tx_end..]
    }

    /// Messages grouped by transaction, built on first access.
    fn tx_messages(&self) -> &[Vec<Rc<CosmosMessage>>] {
        self.tx_messages.get_or_init(|| {
            self.transactions()
                .iter()
                .map(|tx| self.wrap_messages(tx))
                .collect()
        })
    }

    /// Wrap the messages of `tx`. An undecodable envelope yields no messages.
    fn wrap_messages(&self, tx: &Rc<CosmosTransaction>) -> Vec<Rc<CosmosMessage>> {
        let decoded = match tx.decoded_tx() {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(
                    "skipping messages of tx {} at height {}: {e}",
                    tx.hash,
                    self.height()
                );
                return Vec::new();
            }
        };
        decoded
            .body
            .messages
            .iter()
            .enumerate()
            .map(|(idx, any)| {
                Rc::new(CosmosMessage {
                    idx,
                    tx: tx.clone(),
                    type_url: any.type_url.clone(),
                    value: any.value.clone(),
                    registry: self.registry.clone(),
                    decoded: OnceCell::new(),
                })
            })
            .collect()
    }

    /// The event stream, built on first access.
    fn event_stream(&self) -> &EventStream {
        self.events.get_or_init(|| {
            let block = self.block();
            let results = self.pair.block_results();
            let mut events = Vec::new();

            let push_block_event = |events: &mut Vec<CosmosEvent>, event: &Event| {
                events.push(CosmosEvent {
                    idx: events.len(),
                    block: block.clone(),
                    tx: None,
                    msg: None,
                    log: None,
                    event: StringEvent::from(event),
                });
            };

            for event in results.begin_block_events.iter().flatten() {
                push_block_event(&mut events, event);
            }
            let tx_start = events.len();

            for (tx, messages) in self.transactions().iter().zip(self.tx_messages()) {
                if !tx.is_success() || messages.is_empty() {
                    continue;
                }
                for log in tx_logs(tx) {
                    let Some(msg) = messages.get(log.msg_index) else {
                        debug!(
                            "tx {} has events for message {} but only {} messages",
                            tx.hash,
                            log.msg_index,
                            messages.len()
                        );
                        continue;
                    };
                    let log = Rc::new(log);
                    for event in &log.events {
                        events.push(CosmosEvent {
                            idx: events.len(),
                            block: block.clone(),
                            tx: Some(tx.clone()),
                            msg: Some(msg.clone()),
                            log: Some(log.clone()),
                            event: event.clone(),
                        });
                    }
                }
            }
            let tx_end = events.len();

            for event in results.end_block_events.iter().flatten() {
                push_block_event(&mut events, event);
            }

            EventStream {
                events,
                tx_start,
                tx_end,
            }
        })
    }
}

/// Upper-case hex sha256 of raw transaction bytes.
pub fn tx_hash(raw: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(raw))
}

/// Decode a `TxRaw` and the body and auth info it wraps.
fn decode_tx(raw: &[u8]) -> Result<DecodedTx, DecodeError> {
    let malformed = |e: prost::DecodeError| DecodeError::MalformedPayload {
        type_url: TX_TYPE_URL.to_string(),
        message: e.to_string(),
    };
    let tx_raw = TxRaw::decode(raw).map_err(malformed)?;
    let body = TxBody::decode(tx_raw.body_bytes.as_slice()).map_err(malformed)?;
    let auth_info = AuthInfo::decode(tx_raw.auth_info_bytes.as_slice()).map_err(malformed)?;
    Ok(DecodedTx {
        body,
        auth_info,
        signatures: tx_raw.signatures,
    })
}

/// Group the events of a transaction by the message that emitted them.
///
/// Events carrying a `msg_index` attribute are grouped by it and events without one are
/// skipped. When no event carries the attribute the grouping comes from the JSON raw log.
fn tx_logs(tx: &CosmosTransaction) -> Vec<TxLog> {
    let events: Vec<StringEvent> = tx.result.events.iter().map(StringEvent::from).collect();

    if !events
        .iter()
        .any(|e| e.attribute(MSG_INDEX_ATTRIBUTE).is_some())
    {
        return raw_log_groups(tx);
    }

    let mut grouped: BTreeMap<usize, Vec<StringEvent>> = BTreeMap::new();
    for event in events {
        let Some(msg_index) = event
            .attribute(MSG_INDEX_ATTRIBUTE)
            .and_then(|v| v.parse::<usize>().ok())
        else {
            continue;
        };
        grouped.entry(msg_index).or_default().push(event);
    }

    grouped
        .into_iter()
        .map(|(msg_index, events)| TxLog { msg_index, events })
        .collect()
}

/// Parse the `[{"msg_index": n, "events": [...]}]` raw log of older SDKs.
fn raw_log_groups(tx: &CosmosTransaction) -> Vec<TxLog> {
    if tx.result.log.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<TxLog>>(&tx.result.log) {
        Ok(mut logs) => {
            logs.sort_by_key(|log| log.msg_index);
            logs
        }
        Err(e) => {
            debug!("raw log of tx {} is not a message log: {e}", tx.hash);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        proto,
        registry::{BoxError, MessageDecoder},
        rpc_types::EventAttribute,
        test_utils::{
            any_msg,
            block_response,
            content,
            encode_tx,
            msg_event,
            results_response,
            send_msg,
            tx_result,
        },
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn we_can_keep_event_indices_contiguous_when_transactions_fail() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let tx_count = rng.gen_range(0..8);
            let mut txs = Vec::new();
            let mut results = Vec::new();
            let mut failed = Vec::new();
            for i in 0..tx_count {
                let raw = encode_tx(
                    vec![send_msg("a", "b"), send_msg("c", "d")],
                    &format!("tx {i}"),
                );
                let code = if rng.gen_bool(0.4) { 5 } else { 0 };
                if code != 0 {
                    failed.push(tx_hash(&raw));
                }
                txs.push(raw);
                results.push(tx_result(
                    code,
                    vec![
                        msg_event("transfer", 0, &[("amount", "1uatom")]),
                        msg_event("message", 0, &[("action", "send")]),
                        msg_event("transfer", 1, &[("amount", "2uatom")]),
                    ],
                ));
            }
            let mut block_results = results_response(3, results);
            block_results.begin_block_events = Some(vec![Event::new("mint", [("amount", "1")])]);
            block_results.end_block_events = Some(vec![Event::new("complete_unbonding", [])]);

            let block = content(block_response(3, txs), block_results);
            let events = block.events();
            let succeeded = tx_count - failed.len();
            assert_eq!(events.len(), 2 + 3 * succeeded);
            for (i, event) in events.iter().enumerate() {
                assert_eq!(event.idx, i);
                if let Some(tx) = &event.tx {
                    assert!(!failed.contains(&tx.hash));
                }
            }
        }
    }

    #[test]
    fn we_can_scope_message_indices_to_their_transaction() {
        let block = content(
            block_response(
                5,
                vec![
                    encode_tx(vec![send_msg("a", "b"), send_msg("c", "d")], ""),
                    encode_tx(
                        vec![send_msg("e", "f"), send_msg("g", "h"), send_msg("i", "j")],
                        "",
                    ),
                ],
            ),
            results_response(5, vec![tx_result(0, vec![]), tx_result(7, vec![])]),
        );

        let messages = block.messages();
        let idx: Vec<_> = messages.iter().map(|m| (m.tx.idx, m.idx)).collect();
        assert_eq!(idx, vec![(0, 0), (0, 1), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(
            messages[3].decoded_msg().unwrap()["from_address"],
            serde_json::json!("g")
        );
    }

    struct SpyDecoder(Arc<AtomicUsize>);

    impl MessageDecoder for SpyDecoder {
        fn decode(&self, _bytes: &[u8]) -> Result<Value, BoxError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!({ "spied": true }))
        }
    }

    #[test]
    fn we_can_decode_each_payload_only_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = TypeRegistry::new();
        registry.register("/test.Spy", Arc::new(SpyDecoder(calls.clone())));

        let pair = BlockPair::new(
            block_response(
                1,
                vec![encode_tx(vec![any_msg("/test.Spy", vec![1, 2, 3])], "")],
            ),
            results_response(1, vec![tx_result(0, vec![])]),
        )
        .unwrap();
        let block = LazyBlockContent::new(pair, Arc::new(registry));

        let message = &block.messages()[0];
        let first = message.decoded_msg().unwrap();
        let second = message.decoded_msg().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let tx = &block.transactions()[0];
        assert!(std::ptr::eq(
            tx.decoded_tx().unwrap(),
            tx.decoded_tx().unwrap()
        ));
        assert!(Rc::ptr_eq(&block.messages()[0], message));
        assert!(std::ptr::eq(block.events(), block.events()));
    }

    #[test]
    fn we_can_hash_transactions_from_their_raw_bytes() {
        let raw = encode_tx(vec![send_msg("a", "b")], "memo");
        let block = content(
            block_response(9, vec![raw.clone()]),
            results_response(9, vec![tx_result(0, vec![])]),
        );
        let tx = &block.transactions()[0];
        assert_eq!(tx.hash, hex::encode_upper(Sha256::digest(&raw)));
        assert_eq!(tx.hash.len(), 64);
        assert_eq!(tx.block.height(), 9);
        assert_eq!(tx.decoded_tx().unwrap().body.memo, "memo");
    }

    #[test]
    fn we_can_skip_transaction_events_without_a_message_index() {
        let block = content(
            block_response(2, vec![encode_tx(vec![send_msg("a", "b")], "")]),
            results_response(
                2,
                vec![tx_result(
                    0,
                    vec![
                        Event::new("tx", [("fee", "10uatom")]),
                        msg_event("transfer", 0, &[("recipient", "b")]),
                        Event::new("tx", [("acc_seq", "a/1")]),
                    ],
                )],
            ),
        );
        let events = block.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.kind, "transfer");
        assert_eq!(events[0].msg.as_ref().unwrap().idx, 0);
        assert_eq!(events[0].log.as_ref().unwrap().msg_index, 0);
    }

    #[test]
    fn we_can_group_events_from_the_raw_log() {
        let raw_log = r#"[
            {"events":[{"type":"transfer","attributes":[{"key":"recipient","value":"b"}]}]},
            {"msg_index":1,"events":[{"type":"message","attributes":[{"key":"action","value":"send"}]},
                                     {"type":"transfer","attributes":[{"key":"recipient","value":"d"}]}]}
        ]"#;
        let mut result = tx_result(0, vec![Event::new("tx", [("fee", "1uatom")])]);
        result.log = raw_log.to_string();

        let block = content(
            block_response(
                2,
                vec![encode_tx(vec![send_msg("a", "b"), send_msg("c", "d")], "")],
            ),
            results_response(2, vec![result]),
        );
        let events = block.events();
        let summary: Vec<_> = events
            .iter()
            .map(|e| (e.idx, e.msg.as_ref().unwrap().idx, e.event.kind.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(0, 0, "transfer"), (1, 1, "message"), (2, 1, "transfer")]
        );
        assert_eq!(events[2].event.attribute("recipient"), Some("d"));
    }

    #[test]
    fn we_can_place_begin_and_end_block_events_around_transaction_events() {
        let mut results = results_response(
            4,
            vec![tx_result(
                0,
                vec![msg_event("transfer", 0, &[("amount", "5uatom")])],
            )],
        );
        results.begin_block_events = Some(vec![
            Event::new("mint", [("amount", "10")]),
            Event::new("rewards", [("validator", "v")]),
        ]);
        results.end_block_events = Some(vec![Event::new("complete_unbonding", [])]);

        let block = content(
            block_response(4, vec![encode_tx(vec![send_msg("a", "b")], "")]),
            results,
        );

        let begin: Vec<_> = block
            .begin_block_events()
            .iter()
            .map(|e| e.event.kind.as_str())
            .collect();
        assert_eq!(begin, vec!["mint", "rewards"]);
        assert!(block.begin_block_events().iter().all(|e| e.tx.is_none()));
        assert_eq!(block.transaction_events().len(), 1);
        assert_eq!(block.transaction_events()[0].idx, 2);
        assert_eq!(block.end_block_events().len(), 1);
        assert_eq!(block.end_block_events()[0].idx, 3);
        assert!(block.end_block_events()[0].msg.is_none());
    }

    #[test]
    fn we_can_read_a_block_with_an_undecodable_message() {
        let block = content(
            block_response(
                6,
                vec![encode_tx(
                    vec![any_msg("/unknown.Msg", vec![1]), send_msg("a", "b")],
                    "",
                )],
            ),
            results_response(
                6,
                vec![tx_result(
                    0,
                    vec![
                        msg_event("unknown", 0, &[]),
                        msg_event("transfer", 1, &[("amount", "1uatom")]),
                    ],
                )],
            ),
        );

        let messages = block.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].decoded_msg().unwrap_err(),
            DecodeError::UnknownType {
                type_url: "/unknown.Msg".to_string()
            }
        );
        assert!(messages[1].decoded_msg().is_ok());
        assert_eq!(block.events().len(), 2);
    }

    #[test]
    fn we_cannot_decode_a_malformed_transaction_envelope() {
        let block = content(
            block_response(6, vec![vec![0x0a, 0xff]]),
            results_response(
                6,
                vec![tx_result(0, vec![msg_event("transfer", 0, &[])])],
            ),
        );
        let tx = &block.transactions()[0];
        assert!(matches!(
            tx.decoded_tx(),
            Err(DecodeError::MalformedPayload { .. })
        ));
        assert!(block.messages().is_empty());
        assert!(block.events().is_empty());
    }

    #[test]
    fn we_can_read_non_utf8_attributes_lossily() {
        let mut results = results_response(1, vec![]);
        results.begin_block_events = Some(vec![Event {
            kind: "raw".to_string(),
            attributes: vec![EventAttribute {
                key: b"key".to_vec(),
                value: vec![b'o', 0xff, b'k'],
                index: false,
            }],
        }]);
        let block = content(block_response(1, vec![]), results);
        assert_eq!(
            block.events()[0].event.attribute("key"),
            Some("o\u{fffd}k")
        );
        assert_eq!(block.block().tx_count, 0);
        assert!(block.transactions().is_empty());
    }

    #[test]
    fn we_can_read_contract_messages_through_the_default_registry() {
        let block = content(
            block_response(
                8,
                vec![encode_tx(
                    vec![any_msg(
                        proto::MSG_EXECUTE_CONTRACT,
                        proto::MsgExecuteContract {
                            sender: "juno1s".to_string(),
                            contract: "juno1c".to_string(),
                            msg: br#"{"swap":{"input_token":"Token2"}}"#.to_vec(),
                            funds: vec![],
                        }
                        .encode_to_vec(),
                    )],
                    "",
                )],
            ),
            results_response(8, vec![tx_result(0, vec![])]),
        );
        assert_eq!(
            block.messages()[0].decoded_msg().unwrap()["msg"]["swap"]["input_token"],
            serde_json::json!("Token2")
        );
    }
}
