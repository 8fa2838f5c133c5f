//! # Block Fetcher
//!
//! Acquires Cosmos blocks together with their execution results, either from a node's JSON-RPC
//! endpoint or from a bundle archive, and hands them out as [`cosmos_core::BlockPair`]s.
//!
//! ## Modules
//! - [`rpc`]: Fetching from a live node, with the wire protocol detected on connect.
//! - [`archive`]: Fetching historical heights from compressed bundles.
//! - [`dispatcher`]: Archive first, RPC as fallback, with bounded retries.

/// Error taxonomy of the fetch paths and the kinds reported to callers.
pub mod error;

/// Normalization of the Tendermint 0.34, 0.37 and CometBFT 0.38 response shapes.
pub mod adaptor;

/// JSON-RPC over HTTP or WebSocket.
pub mod transport;

/// Fetching block pairs from a live node.
pub mod rpc;

pub mod archive;

/// The `dispatcher` module chooses the source for each batch of heights.
///
/// An archive failure for any height of a batch sends the whole batch to RPC. RPC failures are
/// retried with exponential backoff, except for blocks that fail validation.
pub mod dispatcher;

/// Argument groups for binaries embedding the fetchers.
pub mod config;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::FetcherArgs;
pub use dispatcher::{FetchDispatcher, RetryPolicy};
pub use error::{ErrorKind, FetchError};
