use super::{
    api::http_client,
    decompress,
    parse_bundle,
    BundleEntry,
    BundleIndex,
    BundleStorage,
    FinalizedBundle,
    HttpBundleStorage,
    KyveClient,
};
use crate::{config::ArchiveArgs, error::ArchiveError};
use cosmos_core::BlockPair;
use log::{debug, info, warn};
use std::{collections::BTreeMap, ops::RangeInclusive, sync::Arc, time::Duration};
use url::Url;

/// The one bundle held in memory.
struct CachedBundle {
    id: u64,
    range: RangeInclusive<u64>,
    entries: BTreeMap<u64, BundleEntry>,
}

/// Fetches block pairs from the bundle archive.
///
/// Heights are expected in increasing order over the fetcher's lifetime. The binary search only
/// moves its lower bound forward, and only the most recent bundle is cached. A height below the
/// bundle at the lower bound resets the search with a warning.
///
/// Methods take `&mut self`, so one instance serves one fetch at a time.
pub struct ArchiveFetcher {
    index: Arc<dyn BundleIndex>,
    storage: Arc<dyn BundleStorage>,
    /// Smallest bundle id the search considers.
    lower_bound: u64,
    /// First height of the bundle at `lower_bound`, once it has been found.
    lower_bound_start: Option<u64>,
    cached: Option<CachedBundle>,
}

impl ArchiveFetcher {
    /// Fetcher over an index and a storage.
    pub fn new(index: Arc<dyn BundleIndex>, storage: Arc<dyn BundleStorage>) -> Self {
        ArchiveFetcher {
            index,
            storage,
            lower_bound: 0,
            lower_bound_start: None,
            cached: None,
        }
    }

    /// Connect to the archive configured in `args` for blocks of `chain_id`.
    ///
    /// Returns `None` when no archive network is configured.
    pub async fn from_args(
        args: &ArchiveArgs,
        chain_id: &str,
        timeout: Duration,
    ) -> Result<Option<Self>, ArchiveError> {
        let Some(network) = &args.archive_network else {
            return Ok(None);
        };

        let endpoint = match &args.archive_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => KyveClient::default_endpoint(network)
                .and_then(|endpoint| Url::parse(endpoint).ok())
                .ok_or_else(|| ArchiveError::UnknownNetwork {
                    network: network.clone(),
                })?,
        };

        let client = http_client(timeout)?;
        let index = KyveClient::connect(client.clone(), endpoint, chain_id, args.archive_pool_id)
            .await?;
        let storage = HttpBundleStorage::new(client, args.archive_storage_url.clone());
        Ok(Some(ArchiveFetcher::new(Arc::new(index), Arc::new(storage))))
    }

    /// Id of the bundle whose range contains `height`.
    ///
    /// Binary search over `[lower bound, latest bundle]`, one metadata call per probe.
    pub async fn locate_bundle(&mut self, height: u64) -> Result<FinalizedBundle, ArchiveError> {
        if self.lower_bound_start.is_some_and(|start| height < start) {
            warn!(
                "height {height} precedes archive bundle {}, restarting the bundle search",
                self.lower_bound
            );
            self.lower_bound = 0;
            self.lower_bound_start = None;
        }

        let latest = self.index.latest_bundle_id().await?;
        let mut low = self.lower_bound;
        let mut high = latest;
        while low <= high {
            let mid = low + (high - low) / 2;
            let bundle = self.index.finalized_bundle(mid).await?;
            let range = bundle.height_range()?;
            debug!("probed bundle {mid} covering {range:?} for height {height}");

            if range.contains(&height) {
                self.lower_bound = mid;
                self.lower_bound_start = Some(*range.start());
                return Ok(bundle);
            }
            if height < *range.start() {
                match mid.checked_sub(1) {
                    Some(below) => high = below,
                    None => break,
                }
            } else {
                low = mid + 1;
            }
        }

        Err(ArchiveError::BundleNotFound { height })
    }

    /// Download, decompress and parse `bundle`.
    async fn load_bundle(&self, bundle: FinalizedBundle) -> Result<CachedBundle, ArchiveError> {
        let range = bundle.height_range()?;
        let data = self.storage.retrieve(&bundle).await?;
        let data = decompress(&bundle, data)?;
        let entries = parse_bundle(bundle.id, &data)?;
        info!(
            "📦 loaded archive bundle {} with {} blocks ({range:?})",
            bundle.id,
            entries.len()
        );
        Ok(CachedBundle {
            id: bundle.id,
            range,
            entries,
        })
    }

    /// The raw entry at `height` and the id of its bundle, from the cached bundle or a newly
    /// loaded one.
    ///
    /// The cache slot is only replaced once the new bundle has loaded.
    async fn entry(&mut self, height: u64) -> Result<(u64, BundleEntry), ArchiveError> {
        let bundle = match self.cached.take() {
            Some(cached) if cached.range.contains(&height) => cached,
            previous => {
                self.cached = previous;
                let located = self.locate_bundle(height).await?;
                self.load_bundle(located).await?
            }
        };

        let entry = bundle.entries.get(&height).cloned();
        let bundle_id = bundle.id;
        self.cached = Some(bundle);
        let entry = entry.ok_or_else(|| ArchiveError::MalformedBundle {
            bundle_id,
            message: format!("missing height {height}"),
        })?;
        Ok((bundle_id, entry))
    }

    /// Fetch the pairs at `heights`, in order. If any height fails the whole batch fails.
    pub async fn fetch_pairs(&mut self, heights: &[u64]) -> Result<Vec<BlockPair>, ArchiveError> {
        let mut pairs = Vec::with_capacity(heights.len());
        for &height in heights {
            let (bundle_id, entry) = self.entry(height).await?;
            pairs.push(entry.decode(bundle_id, height)?);
        }
        Ok(pairs)
    }
}
