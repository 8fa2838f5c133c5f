//! Command line and environment configuration of the fetchers.

use crate::{archive::HttpBundleStorage, dispatcher::RetryPolicy};
use clap::Args;
use std::time::Duration;
use url::Url;

/// Default response size limit of RPC calls: 100 MiB.
const DEFAULT_MAX_RESPONSE_SIZE: &str = "104857600";

/// Connection to the node's JSON-RPC endpoint.
#[derive(Debug, Clone, Args)]
pub struct RpcArgs {
    /// RPC endpoint of the node, `http(s)://` or `ws(s)://`.
    #[arg(long, env, default_value = "http://127.0.0.1:26657")]
    pub rpc_url: Url,

    /// Timeout of a single RPC call, in seconds. Also used for archive requests.
    #[arg(long, env, default_value = "30")]
    pub rpc_timeout_secs: u64,

    /// Largest RPC response accepted, in bytes.
    #[arg(long, env, default_value = DEFAULT_MAX_RESPONSE_SIZE)]
    pub rpc_max_response_size: u32,
}

impl RpcArgs {
    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// Optional bundle archive used for historical heights.
#[derive(Debug, Clone, Args)]
pub struct ArchiveArgs {
    /// Chain id of the archive network, e.g. `kyve-1`.
    ///
    /// The archive is only used when this is set.
    #[arg(long, env)]
    pub archive_network: Option<String>,

    /// REST endpoint of the archive network.
    ///
    /// Defaults to the public endpoint of `archive_network`.
    #[arg(long, env)]
    pub archive_endpoint: Option<Url>,

    /// Gateway the bundle data is downloaded from.
    #[arg(long, env, default_value = HttpBundleStorage::DEFAULT_URL)]
    pub archive_storage_url: Url,

    /// Archive pool to read. Skips discovery by chain id.
    #[arg(long, env)]
    pub archive_pool_id: Option<u64>,
}

/// Retries of the RPC path.
#[derive(Debug, Clone, Args)]
pub struct RetryArgs {
    /// Attempts per batch before giving up.
    #[arg(long, env, default_value = "5")]
    pub fetch_max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[arg(long, env, default_value = "500")]
    pub fetch_min_delay_ms: u64,

    /// Upper bound of the delay between retries, in milliseconds.
    #[arg(long, env, default_value = "10000")]
    pub fetch_max_delay_ms: u64,
}

impl From<&RetryArgs> for RetryPolicy {
    fn from(args: &RetryArgs) -> Self {
        RetryPolicy {
            max_attempts: args.fetch_max_attempts,
            min_delay: Duration::from_millis(args.fetch_min_delay_ms),
            max_delay: Duration::from_millis(args.fetch_max_delay_ms),
        }
    }
}

/// Everything needed to build a [`crate::dispatcher::FetchDispatcher`].
#[derive(Debug, Clone, Args)]
pub struct FetcherArgs {
    /// Node connection.
    #[command(flatten)]
    pub rpc: RpcArgs,

    /// Bundle archive.
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Retry policy.
    #[command(flatten)]
    pub retry: RetryArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        fetcher: FetcherArgs,
    }

    #[test]
    fn we_can_parse_fetcher_args_with_defaults() {
        let cli = TestCli::parse_from(["test"]);
        let args = cli.fetcher;
        assert_eq!(args.rpc.rpc_url.as_str(), "http://127.0.0.1:26657/");
        assert_eq!(args.rpc.timeout(), Duration::from_secs(30));
        assert_eq!(args.archive.archive_network, None);
        assert_eq!(args.archive.archive_storage_url.as_str(), "https://arweave.net/");

        let policy = RetryPolicy::from(&args.retry);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.min_delay, Duration::from_millis(500));
    }

    #[test]
    fn we_can_parse_archive_args() {
        let cli = TestCli::parse_from([
            "test",
            "--rpc-url",
            "wss://rpc.osmosis.zone/websocket",
            "--archive-network",
            "kyve-1",
            "--archive-pool-id",
            "3",
        ]);
        assert_eq!(cli.fetcher.rpc.rpc_url.scheme(), "wss");
        assert_eq!(cli.fetcher.archive.archive_network.as_deref(), Some("kyve-1"));
        assert_eq!(cli.fetcher.archive.archive_pool_id, Some(3));
    }

    #[test]
    fn we_cannot_parse_an_invalid_rpc_url() {
        assert!(TestCli::try_parse_from(["test", "--rpc-url", "not a url"]).is_err());
    }
}
