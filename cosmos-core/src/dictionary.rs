use crate::{
    filter::{BlockFilter, EventFilter, MessageFilter, TxFilter},
    proto::MSG_EXECUTE_CONTRACT,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Entity name of message query entries.
pub const MESSAGES_ENTITY: &str = "messages";
/// Entity name of event query entries.
pub const EVENTS_ENTITY: &str = "events";

/// A handler's kind together with its optional filter, as declared in a project manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HandlerFilter {
    /// Runs once per block.
    Block {
        /// Block filter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<BlockFilter>,
    },
    /// Runs once per transaction.
    Transaction {
        /// Transaction filter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<TxFilter>,
    },
    /// Runs once per message.
    Message {
        /// Message filter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<MessageFilter>,
    },
    /// Runs once per event.
    Event {
        /// Event filter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<EventFilter>,
    },
}

/// How a condition compares the stored field with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Matcher {
    /// The field equals the value.
    EqualTo,
    /// The field, a JSON document, contains the value.
    Contains,
}

/// One condition of a [`QueryEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCondition {
    /// Indexed field.
    pub field: String,
    /// Value compared against.
    pub value: Value,
    /// Comparison.
    pub matcher: Matcher,
}

impl QueryCondition {
    /// Shorthand constructor.
    fn new(field: &str, value: Value, matcher: Matcher) -> Self {
        QueryCondition {
            field: field.to_string(),
            value,
            matcher,
        }
    }
}

/// Query over one entity of the dictionary; all conditions must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEntry {
    /// Queried entity.
    pub entity: String,
    /// Conditions, combined with AND.
    pub conditions: Vec<QueryCondition>,
}

/// Translate the filters of a set of handlers into dictionary query entries.
///
/// The dictionary only indexes messages and events, so a block or transaction handler, or a
/// message or event handler without a filter, needs every block. The result is then empty and
/// the dictionary must not be used.
pub fn build_query_conditions(handlers: &[HandlerFilter]) -> Vec<QueryEntry> {
    let mut entries = Vec::with_capacity(handlers.len());
    for handler in handlers {
        match handler {
            HandlerFilter::Message {
                filter: Some(filter),
            } => entries.push(QueryEntry {
                entity: MESSAGES_ENTITY.to_string(),
                conditions: message_conditions(filter),
            }),
            HandlerFilter::Event {
                filter: Some(filter),
            } => entries.push(QueryEntry {
                entity: EVENTS_ENTITY.to_string(),
                conditions: event_conditions(filter),
            }),
            _ => return Vec::new(),
        }
    }

    entries
        .into_iter()
        .unique_by(|entry| serde_json::to_string(entry).unwrap_or_default())
        .collect()
}

/// Conditions selecting messages that may pass `filter`.
fn message_conditions(filter: &MessageFilter) -> Vec<QueryCondition> {
    let mut conditions = vec![QueryCondition::new(
        "type",
        Value::String(filter.kind.clone()),
        Matcher::EqualTo,
    )];

    for (path, value) in filter.values.iter().flatten() {
        conditions.push(QueryCondition::new(
            "data",
            nest(path, value.clone()),
            Matcher::Contains,
        ));
    }

    if let Some(call) = &filter.contract_call {
        if filter.kind == MSG_EXECUTE_CONTRACT {
            let mut entry_point = Map::new();
            entry_point.insert(call.clone(), json!({}));
            conditions.push(QueryCondition::new(
                "data",
                json!({ "msg": entry_point }),
                Matcher::Contains,
            ));
        }
    }

    conditions
}

/// Conditions selecting events that may pass `filter`.
fn event_conditions(filter: &EventFilter) -> Vec<QueryCondition> {
    let mut conditions = vec![QueryCondition::new(
        "type",
        Value::String(filter.kind.clone()),
        Matcher::EqualTo,
    )];

    if let Some(message_filter) = &filter.message_filter {
        conditions.extend(message_conditions(message_filter).into_iter().map(
            |mut condition| {
                if condition.field == "type" {
                    condition.field = "msgType".to_string();
                }
                condition
            },
        ));
    }

    conditions
}

/// Wrap `value` in one object per segment of a dot-delimited path.
fn nest(path: &str, value: Value) -> Value {
    path.rsplit('.').fold(value, |inner, segment| {
        let mut object = Map::new();
        object.insert(segment.to_string(), inner);
        Value::Object(object)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto;
    use std::collections::BTreeMap;

    fn swap_filter() -> MessageFilter {
        MessageFilter {
            kind: proto::MSG_EXECUTE_CONTRACT.to_string(),
            values: Some(BTreeMap::from([(
                "msg.swap.input_token".to_string(),
                json!("Token2"),
            )])),
            contract_call: Some("swap".to_string()),
            include_failed_tx: None,
        }
    }

    #[test]
    fn we_can_build_conditions_for_message_handlers() {
        let entries = build_query_conditions(&[HandlerFilter::Message {
            filter: Some(swap_filter()),
        }]);
        assert_eq!(
            entries,
            vec![QueryEntry {
                entity: "messages".to_string(),
                conditions: vec![
                    QueryCondition::new(
                        "type",
                        json!(proto::MSG_EXECUTE_CONTRACT),
                        Matcher::EqualTo
                    ),
                    QueryCondition::new(
                        "data",
                        json!({ "msg": { "swap": { "input_token": "Token2" } } }),
                        Matcher::Contains
                    ),
                    QueryCondition::new(
                        "data",
                        json!({ "msg": { "swap": {} } }),
                        Matcher::Contains
                    ),
                ],
            }]
        );
    }

    #[test]
    fn we_can_build_conditions_for_event_handlers() {
        let entries = build_query_conditions(&[HandlerFilter::Event {
            filter: Some(EventFilter {
                kind: "wasm".to_string(),
                message_filter: Some(MessageFilter {
                    kind: proto::MSG_SEND.to_string(),
                    ..Default::default()
                }),
                attributes: None,
            }),
        }]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity, "events");
        assert_eq!(
            entries[0].conditions,
            vec![
                QueryCondition::new("type", json!("wasm"), Matcher::EqualTo),
                QueryCondition::new("msgType", json!(proto::MSG_SEND), Matcher::EqualTo),
            ]
        );
    }

    #[test]
    fn we_cannot_use_the_dictionary_for_unfiltered_handlers() {
        let message = HandlerFilter::Message {
            filter: Some(swap_filter()),
        };
        assert!(build_query_conditions(&[
            message.clone(),
            HandlerFilter::Block { filter: None }
        ])
        .is_empty());
        assert!(build_query_conditions(&[
            message.clone(),
            HandlerFilter::Transaction {
                filter: Some(TxFilter::default())
            }
        ])
        .is_empty());
        assert!(
            build_query_conditions(&[message, HandlerFilter::Event { filter: None }]).is_empty()
        );
        assert!(build_query_conditions(&[]).is_empty());
    }

    #[test]
    fn we_can_drop_duplicate_entries() {
        let handler = HandlerFilter::Message {
            filter: Some(swap_filter()),
        };
        let entries = build_query_conditions(&[handler.clone(), handler]);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn we_can_deserialize_handler_filters() {
        let handlers: Vec<HandlerFilter> = serde_json::from_value(json!([
            { "kind": "block", "filter": { "modulo": 100 } },
            { "kind": "transaction" },
            { "kind": "message", "filter": { "type": "/cosmos.bank.v1beta1.MsgSend" } },
            { "kind": "event", "filter": { "type": "transfer", "attributes": { "sender": "a" } } },
        ]))
        .unwrap();

        assert_eq!(
            handlers[0],
            HandlerFilter::Block {
                filter: Some(BlockFilter {
                    modulo: Some(100),
                    look_back_secs: None
                })
            }
        );
        assert_eq!(handlers[1], HandlerFilter::Transaction { filter: None });
        assert!(matches!(
            &handlers[2],
            HandlerFilter::Message { filter: Some(f) } if f.kind == proto::MSG_SEND
        ));
        assert!(matches!(
            &handlers[3],
            HandlerFilter::Event { filter: Some(f) } if f.attributes.is_some()
        ));
    }
}
