use snafu::Snafu;

/// Errors raised while decoding message payloads, transactions or node responses.
///
/// Decode results are memoized by the block content, so the error is `Clone` and carries its
/// cause as rendered text rather than as a boxed source.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum DecodeError {
    /// No decoder has been registered for the type url.
    #[snafu(display("no decoder registered for type url {type_url}"))]
    UnknownType {
        /// The type url that was looked up.
        type_url: String,
    },

    /// The bytes did not match the schema registered for the type url.
    #[snafu(display("failed to decode {type_url}: {message}"))]
    MalformedPayload {
        /// The type url the bytes were decoded as.
        type_url: String,
        /// Rendered cause.
        message: String,
    },

    /// A node or archive response did not have the expected shape.
    #[snafu(display("malformed {what} response: {message}"))]
    MalformedResponse {
        /// Which response was being decoded.
        what: String,
        /// Rendered cause.
        message: String,
    },
}

/// Block-level invariant violations. These are checked eagerly and fail the whole block.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum ValidationError {
    /// The number of transaction results does not equal the number of transactions.
    #[snafu(display(
        "block {height} has {tx_count} transactions but {result_count} transaction results"
    ))]
    TxResultCountMismatch {
        /// Height of the offending block.
        height: u64,
        /// Number of raw transactions in the block.
        tx_count: usize,
        /// Number of entries in the block results.
        result_count: usize,
    },
}
