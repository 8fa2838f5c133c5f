use crate::{
    block_content::{CosmosBlock, CosmosEvent, CosmosMessage, CosmosTransaction},
    proto::MSG_EXECUTE_CONTRACT,
};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::{collections::BTreeMap, rc::Rc};

/// Selects blocks by height and age.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockFilter {
    /// Only heights divisible by this value match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulo: Option<u64>,
    /// Only blocks at most this many seconds old match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look_back_secs: Option<u64>,
}

/// Selects transactions by outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxFilter {
    /// Let failed transactions match as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_failed_tx: Option<bool>,
}

/// Selects messages by type and payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFilter {
    /// Exact type url.
    #[serde(rename = "type")]
    pub kind: String,
    /// Expected payload values keyed by dot-delimited path, e.g. `msg.swap.input_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, Value>>,
    /// Contract entry point for `MsgExecuteContract`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_call: Option<String>,
    /// Let messages of failed transactions match as well.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_failed_tx: Option<bool>,
}

/// Selects events by type, emitting message and attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    /// Exact event type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Filter the emitting message must pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_filter: Option<MessageFilter>,
    /// Attribute key/value pairs that must all be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
}

/// Whether `block` passes `filter`, judging its age against the current time.
pub fn filter_block(block: &CosmosBlock, filter: Option<&BlockFilter>) -> bool {
    filter_block_at(block, filter, Utc::now())
}

/// Whether `block` passes `filter`, judging its age against `now`.
pub fn filter_block_at(
    block: &CosmosBlock,
    filter: Option<&BlockFilter>,
    now: DateTime<Utc>,
) -> bool {
    let Some(filter) = filter else {
        return true;
    };

    if let Some(look_back_secs) = filter.look_back_secs {
        let cutoff = i64::try_from(look_back_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|window| now.checked_sub_signed(window));
        if cutoff.is_some_and(|cutoff| block.header.time < cutoff) {
            return false;
        }
    }

    match filter.modulo {
        Some(0) => {
            warn!("block filter modulo is 0, no block can match");
            false
        }
        Some(modulo) => block.height() % modulo == 0,
        None => true,
    }
}

/// Whether `tx` passes `filter`. Failed transactions only match when explicitly included.
pub fn filter_transaction(tx: &CosmosTransaction, filter: Option<&TxFilter>) -> bool {
    let include_failed = filter.and_then(|f| f.include_failed_tx).unwrap_or(false);
    include_failed || tx.is_success()
}

/// Whether `msg` passes `filter`.
///
/// Payload problems, such as an undecodable message or a path that does not exist, never fail;
/// they make the message not match.
pub fn filter_message(msg: &CosmosMessage, filter: Option<&MessageFilter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };

    let tx_filter = TxFilter {
        include_failed_tx: filter.include_failed_tx,
    };
    if !filter_transaction(&msg.tx, Some(&tx_filter)) {
        return false;
    }
    if msg.type_url != filter.kind {
        return false;
    }

    let values = filter.values.as_ref().filter(|v| !v.is_empty());
    let contract_call = filter
        .contract_call
        .as_deref()
        .filter(|_| filter.kind == MSG_EXECUTE_CONTRACT);
    if values.is_none() && contract_call.is_none() {
        return true;
    }

    let payload = match msg.decoded_msg() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(
                "message {} of tx {} cannot be filtered: {e}",
                msg.idx, msg.tx.hash
            );
            return false;
        }
    };

    for (path, expected) in values.into_iter().flatten() {
        let Some(actual) = value_at_path(payload, path) else {
            warn!("message filter: missing data at path {path}");
            return false;
        };
        if !values_match(actual, expected) {
            return false;
        }
    }

    match contract_call {
        None => true,
        Some(call) => match payload.get("msg") {
            Some(Value::String(msg)) => msg == call,
            Some(Value::Object(msg)) => msg.contains_key(call),
            _ => false,
        },
    }
}

/// Whether `event` passes `filter`.
pub fn filter_event(event: &CosmosEvent, filter: Option<&EventFilter>) -> bool {
    let Some(filter) = filter else {
        return true;
    };

    if event.event.kind != filter.kind {
        return false;
    }

    if let Some(message_filter) = &filter.message_filter {
        match &event.msg {
            Some(msg) if filter_message(msg, Some(message_filter)) => {}
            _ => return false,
        }
    }

    filter
        .attributes
        .iter()
        .flatten()
        .all(|(key, value)| {
            event
                .event
                .attributes
                .iter()
                .any(|a| &a.key == key && &a.value == value)
        })
}

/// Whether `element` passes any of `filters`, where an empty list lets everything through.
pub fn matches_any<T: ?Sized, F>(
    filters: &[F],
    element: &T,
    predicate: impl Fn(&T, Option<&F>) -> bool,
) -> bool {
    filters.is_empty() || filters.iter().any(|f| predicate(element, Some(f)))
}

/// Transactions passing any of `filters`.
pub fn filter_transactions<'a>(
    txs: &'a [Rc<CosmosTransaction>],
    filters: &[TxFilter],
) -> Vec<&'a Rc<CosmosTransaction>> {
    txs.iter()
        .filter(|tx| {
            let tx: &CosmosTransaction = tx;
            matches_any(filters, tx, filter_transaction)
        })
        .collect()
}

/// Messages passing any of `filters`.
pub fn filter_messages<'a>(
    messages: &'a [Rc<CosmosMessage>],
    filters: &[MessageFilter],
) -> Vec<&'a Rc<CosmosMessage>> {
    messages
        .iter()
        .filter(|msg| {
            let msg: &CosmosMessage = msg;
            matches_any(filters, msg, filter_message)
        })
        .collect()
}

/// Events passing any of `filters`.
pub fn filter_events<'a>(
    events: &'a [CosmosEvent],
    filters: &[EventFilter],
) -> Vec<&'a CosmosEvent> {
    events
        .iter()
        .filter(|event| matches_any(filters, *event, filter_event))
        .collect()
}

/// Walk a dot-delimited path through objects and arrays.
fn value_at_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Equality between a payload value and a filter value.
///
/// Integers may be carried as JSON numbers or as strings on either side; the payload value is
/// compared in the form of the filter value.
fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(actual), Value::String(expected)) => actual.to_string() == *expected,
        (Value::String(actual), Value::Number(expected)) => match actual.parse::<Number>() {
            Ok(actual) => numbers_match(&actual, expected),
            Err(_) => {
                debug!("{actual:?} is not numeric, cannot compare with {expected}");
                false
            }
        },
        (Value::Number(actual), Value::Number(expected)) => numbers_match(actual, expected),
        _ => actual == expected,
    }
}

/// Numeric equality across the integer and float forms of [`Number`].
fn numbers_match(a: &Number, b: &Number) -> bool {
    /// Integer value of `n`, if it has one.
    fn as_i128(n: &Number) -> Option<i128> {
        n.as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
    }
    match (as_i128(a), as_i128(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a.as_f64() == b.as_f64(),
    }
}
