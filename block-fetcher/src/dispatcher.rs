use crate::{
    archive::ArchiveFetcher,
    config::FetcherArgs,
    error::{FetchError, Result},
    rpc::RpcFetcher,
    transport::JsonRpcTransport,
};
use cosmos_core::{BlockPair, LazyBlockContent, TypeRegistry};
use exponential_backoff::Backoff;
use log::{error, warn};
use std::{sync::Arc, time::Duration};

/// Bounds of the RPC retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per batch, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound of the delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Produces blocks for batches of heights from the archive when possible, and from RPC otherwise.
pub struct FetchDispatcher {
    rpc: RpcFetcher,
    archive: Option<ArchiveFetcher>,
    registry: Arc<TypeRegistry>,
    retry: RetryPolicy,
}

impl FetchDispatcher {
    /// RPC-only dispatcher decoding messages with `registry`.
    pub fn new(rpc: RpcFetcher, registry: Arc<TypeRegistry>) -> Self {
        FetchDispatcher {
            rpc,
            archive: None,
            registry,
            retry: RetryPolicy::default(),
        }
    }

    /// Try `archive` first for every batch.
    pub fn with_archive(mut self, archive: ArchiveFetcher) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Replace the RPC retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Connect to the node and, if configured, the archive.
    ///
    /// Failing to set up the archive is not fatal; the dispatcher then only uses RPC.
    pub async fn connect(args: &FetcherArgs, registry: Arc<TypeRegistry>) -> Result<Self> {
        let transport = JsonRpcTransport::connect(
            &args.rpc.rpc_url,
            args.rpc.timeout(),
            args.rpc.rpc_max_response_size,
        )
        .await?;
        let rpc = RpcFetcher::connect(Arc::new(transport)).await?;
        let mut dispatcher =
            FetchDispatcher::new(rpc, registry).with_retry_policy((&args.retry).into());

        match ArchiveFetcher::from_args(&args.archive, dispatcher.chain_id(), args.rpc.timeout())
            .await
        {
            Ok(Some(archive)) => dispatcher = dispatcher.with_archive(archive),
            Ok(None) => {}
            Err(e) => warn!("archive unavailable, fetching from RPC only: {e}"),
        }
        Ok(dispatcher)
    }

    /// Chain id of the node.
    pub fn chain_id(&self) -> &str {
        self.rpc.chain_id()
    }

    /// Latest height of the node.
    pub async fn latest_height(&self) -> Result<u64> {
        self.rpc.latest_height().await
    }

    /// Fetch the pairs at `heights`, in order.
    ///
    /// If the archive fails for any height, the whole batch is fetched again from RPC.
    pub async fn fetch_block_pairs(&mut self, heights: &[u64]) -> Result<Vec<BlockPair>> {
        if let Some(archive) = self.archive.as_mut() {
            match archive.fetch_pairs(heights).await {
                Ok(pairs) => return Ok(pairs),
                Err(e) => warn!("archive fetch failed, falling back to RPC: {e}"),
            }
        }
        self.fetch_rpc_with_retry(heights).await
    }

    /// Fetch the blocks at `heights`, in order, ready for filtering.
    pub async fn fetch_blocks(&mut self, heights: &[u64]) -> Result<Vec<LazyBlockContent>> {
        let pairs = self.fetch_block_pairs(heights).await?;
        Ok(pairs
            .into_iter()
            .map(|pair| LazyBlockContent::new(pair, self.registry.clone()))
            .collect())
    }

    async fn fetch_rpc_with_retry(&self, heights: &[u64]) -> Result<Vec<BlockPair>> {
        let mut delays = Backoff::new(
            self.retry.max_attempts.max(1),
            self.retry.min_delay,
            self.retry.max_delay,
        )
        .into_iter();

        let mut attempts = 0;
        loop {
            attempts += 1;
            let err = match self.rpc.fetch_pairs(heights).await {
                Ok(pairs) => return Ok(pairs),
                Err(e @ FetchError::Validation { .. }) => return Err(e),
                Err(e) => e,
            };

            match delays.next().flatten() {
                Some(delay) => {
                    warn!(
                        "RPC fetch attempt {attempts} failed ({:?}): {err}, retrying in {delay:?}",
                        err.kind()
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!("RPC fetch failed after {attempts} attempts: {err}");
                    return Err(FetchError::RetriesExhausted {
                        attempts,
                        source: Box::new(err),
                    });
                }
            }
        }
    }
}
