//! Fixture builders shared by the unit tests of this crate.

use crate::{
    block_content::LazyBlockContent,
    proto::{self, AuthInfo, TxBody, TxRaw},
    registry::TypeRegistry,
    rpc_types::{
        BlockId,
        BlockPair,
        BlockResponse,
        BlockResultsResponse,
        Event,
        Header,
        RawBlock,
        TxData,
        Version,
    },
};
use chrono::{DateTime, Utc};
use prost::Message;
use prost_types::Any;
use std::sync::Arc;

/// Fixed block time used by [`block_response`]: 2024-01-01T00:00:00Z.
pub const BLOCK_TIME_SECS: i64 = 1_704_067_200;

pub fn block_response_at(height: u64, time: DateTime<Utc>, txs: Vec<Vec<u8>>) -> BlockResponse {
    BlockResponse {
        block_id: BlockId {
            hash: format!("{height:064X}"),
        },
        block: RawBlock {
            header: Header {
                version: Version { block: 11, app: 0 },
                chain_id: "testchain-1".to_string(),
                height,
                time,
                last_block_id: (height > 1).then(|| BlockId {
                    hash: format!("{:064X}", height - 1),
                }),
                data_hash: String::new(),
                app_hash: String::new(),
                proposer_address: String::new(),
            },
            txs,
        },
    }
}

pub fn block_response(height: u64, txs: Vec<Vec<u8>>) -> BlockResponse {
    let time = DateTime::from_timestamp(BLOCK_TIME_SECS, 0).unwrap();
    block_response_at(height, time, txs)
}

pub fn results_response(height: u64, results: Vec<TxData>) -> BlockResultsResponse {
    BlockResultsResponse {
        height,
        results,
        begin_block_events: None,
        end_block_events: None,
    }
}

pub fn tx_result(code: u32, events: Vec<Event>) -> TxData {
    TxData {
        code,
        gas_wanted: 200_000,
        gas_used: 80_000,
        events,
        ..Default::default()
    }
}

/// An event tagged with the `msg_index` attribute.
pub fn msg_event(kind: &str, msg_index: usize, attributes: &[(&str, &str)]) -> Event {
    let msg_index = msg_index.to_string();
    Event::new(
        kind,
        attributes
            .iter()
            .copied()
            .chain([("msg_index", msg_index.as_str())]),
    )
}

pub fn any_msg(type_url: &str, value: Vec<u8>) -> Any {
    Any {
        type_url: type_url.to_string(),
        value,
    }
}

pub fn send_msg(from: &str, to: &str) -> Any {
    any_msg(
        proto::MSG_SEND,
        proto::MsgSend {
            from_address: from.to_string(),
            to_address: to.to_string(),
            amount: vec![proto::Coin {
                denom: "uatom".to_string(),
                amount: "1".to_string(),
            }],
        }
        .encode_to_vec(),
    )
}

pub fn execute_msg(sender: &str, contract: &str, msg: &str) -> Any {
    any_msg(
        proto::MSG_EXECUTE_CONTRACT,
        proto::MsgExecuteContract {
            sender: sender.to_string(),
            contract: contract.to_string(),
            msg: msg.as_bytes().to_vec(),
            funds: vec![],
        }
        .encode_to_vec(),
    )
}

/// Encode a signed transaction carrying `messages`.
pub fn encode_tx(messages: Vec<Any>, memo: &str) -> Vec<u8> {
    TxRaw {
        body_bytes: TxBody {
            messages,
            memo: memo.to_string(),
            timeout_height: 0,
        }
        .encode_to_vec(),
        auth_info_bytes: AuthInfo::default().encode_to_vec(),
        signatures: vec![vec![0; 64]],
    }
    .encode_to_vec()
}

pub fn content(block: BlockResponse, results: BlockResultsResponse) -> LazyBlockContent {
    LazyBlockContent::new(
        BlockPair::new(block, results).unwrap(),
        Arc::new(TypeRegistry::with_defaults()),
    )
}
