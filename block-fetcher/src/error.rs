use cosmos_core::{DecodeError, ValidationError};
use snafu::Snafu;

/// Discriminated error kind handed to the orchestration layer to drive its retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request timed out.
    Timeout,
    /// The connection was lost or could not be established.
    Connection,
    /// The endpoint rejected the request due to rate limiting.
    RateLimit,
    /// The response exceeded the configured size limit.
    OversizedResponse,
    /// The requested data does not exist at the source.
    NotFound,
    /// A response or payload could not be decoded.
    Decode,
    /// A block violated a block-level invariant.
    Validation,
    /// Anything else.
    Unknown,
}

/// Transport failures, classified from the transport's error text.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectionError {
    /// The request timed out.
    #[snafu(display("request timed out: {message}"))]
    Timeout {
        /// Transport error text.
        message: String,
    },

    /// The connection was closed or reset.
    #[snafu(display("disconnected: {message}"))]
    Disconnected {
        /// Transport error text.
        message: String,
    },

    /// The endpoint is rate limiting us.
    #[snafu(display("rate limited: {message}"))]
    RateLimited {
        /// Transport error text.
        message: String,
    },

    /// The response was larger than the client accepts.
    #[snafu(display("response too large: {message}"))]
    OversizedResponse {
        /// Transport error text.
        message: String,
    },

    /// Any other transport failure.
    #[snafu(display("connection error: {message}"))]
    Generic {
        /// Transport error text.
        message: String,
    },
}

impl ConnectionError {
    /// The discriminated kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectionError::Timeout { .. } => ErrorKind::Timeout,
            ConnectionError::Disconnected { .. } => ErrorKind::Connection,
            ConnectionError::Generic { .. } => ErrorKind::Unknown,
            ConnectionError::RateLimited { .. } => ErrorKind::RateLimit,
            ConnectionError::OversizedResponse { .. } => ErrorKind::OversizedResponse,
        }
    }
}

/// Classify a transport error by its message text.
///
/// The RPC clients do not expose structured status codes consistently, so this matches on the
/// rendered error. The patterns follow the wording of the clients in use and can break when they
/// change their messages.
pub fn classify_connection_error(message: &str) -> ConnectionError {
    let lower = message.to_lowercase();
    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));
    let message = message.to_string();

    if contains_any(&["429", "too many requests", "rate limit"]) {
        ConnectionError::RateLimited { message }
    } else if contains_any(&["too large", "too big", "exceeds", "max response size"]) {
        ConnectionError::OversizedResponse { message }
    } else if contains_any(&["timed out", "timeout", "deadline has elapsed"]) {
        ConnectionError::Timeout { message }
    } else if contains_any(&[
        "connection closed",
        "disconnected",
        "restart required",
        "background task closed",
        "connection reset",
        "connection refused",
        "broken pipe",
    ]) {
        ConnectionError::Disconnected { message }
    } else {
        ConnectionError::Generic { message }
    }
}

/// Errors of the archive path. Every variant lets the dispatcher fall back to RPC.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ArchiveError {
    /// No finalized bundle covers the height.
    #[snafu(display("no bundle covers height {height}"))]
    BundleNotFound {
        /// Requested height.
        height: u64,
    },

    /// No archive pool indexes the chain.
    #[snafu(display("no archive pool found for chain {chain_id}"))]
    PoolNotFound {
        /// Chain id that was looked up.
        chain_id: String,
    },

    /// The archive network has no known REST endpoint and none was configured.
    #[snafu(display("no archive endpoint known for network {network}"))]
    UnknownNetwork {
        /// Archive network chain id.
        network: String,
    },

    /// A call to the archive network's REST API failed.
    #[snafu(display("archive request to {url} failed: {message}"))]
    MetadataRequestFailed {
        /// Requested url.
        url: String,
        /// Rendered cause.
        message: String,
    },

    /// The storage provider did not return the bundle.
    #[snafu(display("failed to retrieve bundle data {storage_id}: {message}"))]
    StorageFetchFailed {
        /// Storage id of the bundle.
        storage_id: String,
        /// Rendered cause.
        message: String,
    },

    /// The bundle data could not be decompressed.
    #[snafu(display("failed to decompress bundle {bundle_id}: {source}"))]
    DecompressionFailed {
        /// Bundle id.
        bundle_id: u64,
        /// Source gzip error.
        source: std::io::Error,
    },

    /// The bundle uses a compression the fetcher does not know.
    #[snafu(display("unsupported compression id {compression_id}"))]
    UnsupportedCompression {
        /// Compression id from the bundle metadata.
        compression_id: u32,
    },

    /// The decompressed bundle is not the expected JSON.
    #[snafu(display("malformed bundle {bundle_id}: {message}"))]
    MalformedBundle {
        /// Bundle id.
        bundle_id: u64,
        /// Rendered cause.
        message: String,
    },

    /// A bundle key or range bound is not a height.
    #[snafu(display("bundle key {key:?} is not a height"))]
    InvalidBundleKey {
        /// Offending key.
        key: String,
    },

    /// A block inside the bundle could not be decoded.
    #[snafu(display("failed to decode bundle block: {source}"), context(false))]
    Decode {
        /// Source decode error.
        source: DecodeError,
    },

    /// A block inside the bundle violates a block-level invariant.
    #[snafu(display("invalid bundle block: {source}"), context(false))]
    Validation {
        /// Source validation error.
        source: ValidationError,
    },
}

impl ArchiveError {
    /// The discriminated kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::BundleNotFound { .. }
            | ArchiveError::PoolNotFound { .. }
            | ArchiveError::UnknownNetwork { .. } => ErrorKind::NotFound,
            ArchiveError::MetadataRequestFailed { .. }
            | ArchiveError::StorageFetchFailed { .. } => ErrorKind::Connection,
            ArchiveError::DecompressionFailed { .. }
            | ArchiveError::UnsupportedCompression { .. }
            | ArchiveError::MalformedBundle { .. }
            | ArchiveError::InvalidBundleKey { .. }
            | ArchiveError::Decode { .. } => ErrorKind::Decode,
            ArchiveError::Validation { .. } => ErrorKind::Validation,
        }
    }
}

/// Errors surfaced by the fetchers and the dispatcher.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// The node could not be reached.
    #[snafu(display("failed to query the node: {source}"), context(false))]
    Connection {
        /// Source connection error.
        source: ConnectionError,
    },

    /// A node response could not be decoded.
    #[snafu(display("failed to decode node response: {source}"), context(false))]
    Decode {
        /// Source decode error.
        source: DecodeError,
    },

    /// A fetched block violates a block-level invariant.
    #[snafu(display("invalid block: {source}"), context(false))]
    Validation {
        /// Source validation error.
        source: ValidationError,
    },

    /// The archive path failed.
    #[snafu(display("archive fetch failed: {source}"), context(false))]
    Archive {
        /// Source archive error.
        source: ArchiveError,
    },

    /// Every attempt of the RPC path failed.
    #[snafu(display("giving up after {attempts} attempts: {source}"))]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error of the last attempt.
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// The discriminated kind of this error. Exhausted retries report the kind of the last attempt.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Connection { source } => source.kind(),
            FetchError::Decode { .. } => ErrorKind::Decode,
            FetchError::Validation { .. } => ErrorKind::Validation,
            FetchError::Archive { source } => source.kind(),
            FetchError::RetriesExhausted { source, .. } => source.kind(),
        }
    }
}

/// Result alias for fetch operations.
pub type Result<T, E = FetchError> = std::result::Result<T, E>;
