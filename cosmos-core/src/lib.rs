//! # Cosmos Core
//!
//! This library turns raw Tendermint/CometBFT block data into a normalized, lazily computed view
//! of blocks, transactions, messages and events, and evaluates declarative filters against it.
//!
//! ## Modules
//! - [`registry`]: Maps protobuf type urls to message decoders.
//! - [`block_content`]: Deferred, memoized view over one fetched block.
//! - [`filter`]: Predicates deciding which block elements a handler is interested in.
//! - [`dictionary`]: Translates handler filters into secondary-index query entries.

/// Error types shared by the decoding and validation paths.
pub mod error;

/// Hand-written prost definitions for the transaction envelope and the built-in message set.
pub mod proto;

/// The `registry` module maps type urls (e.g. `/cosmwasm.wasm.v1.MsgExecuteContract`) to
/// decoders producing JSON payloads.
///
/// Built-in Cosmos SDK, IBC and CosmWasm messages are registered by
/// [`registry::TypeRegistry::with_defaults`]. Chain specific messages can be added either in code
/// or from schema descriptor files through the [`schema`] module.
pub mod registry;

/// Runtime-loaded message schemas and the dynamic protobuf decoder built from them.
pub mod schema;

/// Normalized block and block-results responses, independent of the node's protocol version.
pub mod rpc_types;

/// The `block_content` module wraps one block pair into a structured view.
///
/// Transactions, messages and events are computed on first access and cached for the lifetime
/// of the [`block_content::LazyBlockContent`] instance. Event indices are contiguous across the
/// whole block: begin-block events, then transaction events, then end-block events.
pub mod block_content;

/// Block, transaction, message and event filters.
pub mod filter;

/// Query entries for an external dictionary service, derived from handler filters.
pub mod dictionary;

#[cfg(test)]
pub(crate) mod test_utils;

pub use block_content::{
    CosmosBlock,
    CosmosEvent,
    CosmosMessage,
    CosmosTransaction,
    LazyBlockContent,
};
pub use error::{DecodeError, ValidationError};
pub use registry::TypeRegistry;
pub use rpc_types::BlockPair;
