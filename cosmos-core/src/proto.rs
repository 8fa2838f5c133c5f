//! Protobuf definitions used by the decoder.
//!
//! Only the fields the indexer reads are declared; prost skips unknown fields while decoding.
//! Message types also derive `Serialize` so a decoded message can be handed out as JSON.

use serde::Serialize;

/// `/cosmos.bank.v1beta1.MsgSend`
pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";
/// `/cosmos.bank.v1beta1.MsgMultiSend`
pub const MSG_MULTI_SEND: &str = "/cosmos.bank.v1beta1.MsgMultiSend";
/// `/cosmos.staking.v1beta1.MsgDelegate`
pub const MSG_DELEGATE: &str = "/cosmos.staking.v1beta1.MsgDelegate";
/// `/cosmos.staking.v1beta1.MsgUndelegate`
pub const MSG_UNDELEGATE: &str = "/cosmos.staking.v1beta1.MsgUndelegate";
/// `/cosmos.staking.v1beta1.MsgBeginRedelegate`
pub const MSG_BEGIN_REDELEGATE: &str = "/cosmos.staking.v1beta1.MsgBeginRedelegate";
/// `/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward`
pub const MSG_WITHDRAW_DELEGATOR_REWARD: &str =
    "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward";
/// `/cosmos.gov.v1beta1.MsgVote`
pub const MSG_VOTE: &str = "/cosmos.gov.v1beta1.MsgVote";
/// `/ibc.applications.transfer.v1.MsgTransfer`
pub const MSG_TRANSFER: &str = "/ibc.applications.transfer.v1.MsgTransfer";
/// `/cosmwasm.wasm.v1.MsgExecuteContract`
pub const MSG_EXECUTE_CONTRACT: &str = "/cosmwasm.wasm.v1.MsgExecuteContract";
/// `/cosmwasm.wasm.v1.MsgInstantiateContract`
pub const MSG_INSTANTIATE_CONTRACT: &str = "/cosmwasm.wasm.v1.MsgInstantiateContract";
/// `/cosmwasm.wasm.v1.MsgMigrateContract`
pub const MSG_MIGRATE_CONTRACT: &str = "/cosmwasm.wasm.v1.MsgMigrateContract";

/// TxRaw is the wire form of a signed transaction as stored in a block.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxRaw {
    /// Encoded [`TxBody`].
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    /// Encoded [`AuthInfo`].
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    /// One signature per signer.
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// TxBody holds the messages of a transaction.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxBody {
    /// Messages in execution order.
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<prost_types::Any>,
    /// Free-form memo.
    #[prost(string, tag = "2")]
    pub memo: String,
    /// Height after which the transaction is no longer valid, zero for none.
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
}

/// AuthInfo describes the signers and the fee of a transaction.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct AuthInfo {
    /// One entry per signer, in signature order.
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    /// Fee paid by the transaction.
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
}

/// SignerInfo carries a signer's sequence number.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct SignerInfo {
    /// The signer's account sequence.
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

/// Fee is the fee and gas limit of a transaction.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Fee {
    /// Amount paid.
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    /// Maximum gas the transaction may consume.
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    /// Account paying the fee, when not the first signer.
    #[prost(string, tag = "3")]
    pub payer: String,
    /// Account granting the fee allowance.
    #[prost(string, tag = "4")]
    pub granter: String,
}

/// Coin is a denomination and an integer amount encoded as a string.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct Coin {
    /// Denomination.
    #[prost(string, tag = "1")]
    pub denom: String,
    /// Amount.
    #[prost(string, tag = "2")]
    pub amount: String,
}

/// `/cosmos.bank.v1beta1.MsgSend`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgSend {
    /// Sender address.
    #[prost(string, tag = "1")]
    pub from_address: String,
    /// Recipient address.
    #[prost(string, tag = "2")]
    pub to_address: String,
    /// Coins transferred.
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

/// One side of a [`MsgMultiSend`].
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct BankIo {
    /// Account address.
    #[prost(string, tag = "1")]
    pub address: String,
    /// Coins sent or received.
    #[prost(message, repeated, tag = "2")]
    pub coins: Vec<Coin>,
}

/// `/cosmos.bank.v1beta1.MsgMultiSend`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgMultiSend {
    /// Inputs.
    #[prost(message, repeated, tag = "1")]
    pub inputs: Vec<BankIo>,
    /// Outputs.
    #[prost(message, repeated, tag = "2")]
    pub outputs: Vec<BankIo>,
}

/// `/cosmos.staking.v1beta1.MsgDelegate`, also used for `MsgUndelegate`.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgDelegate {
    /// Delegator address.
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    /// Validator operator address.
    #[prost(string, tag = "2")]
    pub validator_address: String,
    /// Delegated amount.
    #[prost(message, optional, tag = "3")]
    pub amount: Option<Coin>,
}

/// `/cosmos.staking.v1beta1.MsgBeginRedelegate`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgBeginRedelegate {
    /// Delegator address.
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    /// Source validator.
    #[prost(string, tag = "2")]
    pub validator_src_address: String,
    /// Destination validator.
    #[prost(string, tag = "3")]
    pub validator_dst_address: String,
    /// Redelegated amount.
    #[prost(message, optional, tag = "4")]
    pub amount: Option<Coin>,
}

/// `/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgWithdrawDelegatorReward {
    /// Delegator address.
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    /// Validator operator address.
    #[prost(string, tag = "2")]
    pub validator_address: String,
}

/// `/cosmos.gov.v1beta1.MsgVote`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgVote {
    /// Proposal voted on.
    #[prost(uint64, tag = "1")]
    pub proposal_id: u64,
    /// Voter address.
    #[prost(string, tag = "2")]
    pub voter: String,
    /// Vote option enum value.
    #[prost(int32, tag = "3")]
    pub option: i32,
}

/// IBC client height.
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct IbcHeight {
    /// Revision number of the counterparty chain.
    #[prost(uint64, tag = "1")]
    pub revision_number: u64,
    /// Height within the revision.
    #[prost(uint64, tag = "2")]
    pub revision_height: u64,
}

/// `/ibc.applications.transfer.v1.MsgTransfer`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgTransfer {
    /// Port of the sending end.
    #[prost(string, tag = "1")]
    pub source_port: String,
    /// Channel of the sending end.
    #[prost(string, tag = "2")]
    pub source_channel: String,
    /// Transferred token.
    #[prost(message, optional, tag = "3")]
    pub token: Option<Coin>,
    /// Sender on this chain.
    #[prost(string, tag = "4")]
    pub sender: String,
    /// Receiver on the counterparty chain.
    #[prost(string, tag = "5")]
    pub receiver: String,
    /// Counterparty timeout height.
    #[prost(message, optional, tag = "6")]
    pub timeout_height: Option<IbcHeight>,
    /// Counterparty timeout in unix nanoseconds.
    #[prost(uint64, tag = "7")]
    pub timeout_timestamp: u64,
    /// Optional memo.
    #[prost(string, tag = "8")]
    pub memo: String,
}

/// `/cosmwasm.wasm.v1.MsgExecuteContract`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgExecuteContract {
    /// Caller address.
    #[prost(string, tag = "1")]
    pub sender: String,
    /// Contract address.
    #[prost(string, tag = "2")]
    pub contract: String,
    /// JSON encoded contract message.
    #[prost(bytes = "vec", tag = "3")]
    pub msg: Vec<u8>,
    /// Coins sent along with the call.
    #[prost(message, repeated, tag = "5")]
    pub funds: Vec<Coin>,
}

/// `/cosmwasm.wasm.v1.MsgInstantiateContract`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgInstantiateContract {
    /// Creator address.
    #[prost(string, tag = "1")]
    pub sender: String,
    /// Optional contract admin.
    #[prost(string, tag = "2")]
    pub admin: String,
    /// Stored code id.
    #[prost(uint64, tag = "3")]
    pub code_id: u64,
    /// Human readable label.
    #[prost(string, tag = "4")]
    pub label: String,
    /// JSON encoded instantiate message.
    #[prost(bytes = "vec", tag = "5")]
    pub msg: Vec<u8>,
    /// Coins sent to the new contract.
    #[prost(message, repeated, tag = "6")]
    pub funds: Vec<Coin>,
}

/// `/cosmwasm.wasm.v1.MsgMigrateContract`
#[derive(Clone, PartialEq, Serialize, ::prost::Message)]
pub struct MsgMigrateContract {
    /// Admin address.
    #[prost(string, tag = "1")]
    pub sender: String,
    /// Contract address.
    #[prost(string, tag = "2")]
    pub contract: String,
    /// New code id.
    #[prost(uint64, tag = "3")]
    pub code_id: u64,
    /// JSON encoded migrate message.
    #[prost(bytes = "vec", tag = "4")]
    pub msg: Vec<u8>,
}
