use super::{BundleIndex, BundleStorage, FinalizedBundle};
use crate::{
    adaptor::{de_number, de_optional_number},
    error::ArchiveError,
};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use url::Url;

/// Runtime of pools that archive Tendermint blocks together with their results.
pub const TENDERMINT_RUNTIME: &str = "@kyvejs/tendermint-bsync";

/// REST endpoints of the public archive networks.
const DEFAULT_ENDPOINTS: [(&str, &str); 3] = [
    ("kyve-1", "https://api.kyve.network"),
    ("kaon-1", "https://api.kaon.kyve.network"),
    ("korellia-2", "https://api.korellia.kyve.network"),
];

/// Build the HTTP client shared by the archive index and storage.
pub(crate) fn http_client(timeout: Duration) -> Result<Client, ArchiveError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ArchiveError::MetadataRequestFailed {
            url: String::new(),
            message: e.to_string(),
        })
}

#[derive(Deserialize)]
struct PoolsResponse {
    #[serde(default)]
    pools: Vec<WirePool>,
}

#[derive(Deserialize)]
struct PoolResponse {
    pool: WirePool,
}

#[derive(Deserialize)]
struct WirePool {
    #[serde(deserialize_with = "de_number")]
    id: u64,
    data: WirePoolData,
}

#[derive(Deserialize)]
struct WirePoolData {
    #[serde(default)]
    runtime: String,
    /// JSON document, serialized as a string.
    #[serde(default)]
    config: String,
    #[serde(default, deserialize_with = "de_optional_number")]
    total_bundles: u64,
}

#[derive(Deserialize)]
struct PoolConfig {
    #[serde(default)]
    network: String,
}

#[derive(Deserialize)]
struct BundleResponse {
    finalized_bundle: FinalizedBundle,
}

/// Id of the first pool archiving `chain_id` with the Tendermint runtime.
fn select_pool(pools: &[WirePool], chain_id: &str) -> Option<u64> {
    pools
        .iter()
        .find(|pool| {
            pool.data.runtime == TENDERMINT_RUNTIME
                && serde_json::from_str::<PoolConfig>(&pool.data.config)
                    .is_ok_and(|config| config.network == chain_id)
        })
        .map(|pool| pool.id)
}

/// [`BundleIndex`] backed by the REST API of a KYVE network.
#[derive(Debug, Clone)]
pub struct KyveClient {
    client: Client,
    endpoint: Url,
    pool_id: u64,
}

impl KyveClient {
    /// The public REST endpoint of archive `network`, if it is one of the known networks.
    pub fn default_endpoint(network: &str) -> Option<&'static str> {
        DEFAULT_ENDPOINTS
            .iter()
            .find(|(name, _)| *name == network)
            .map(|(_, endpoint)| *endpoint)
    }

    /// Connect to the pool archiving `chain_id`.
    ///
    /// With an explicit `pool_id` no discovery takes place.
    pub async fn connect(
        client: Client,
        endpoint: Url,
        chain_id: &str,
        pool_id: Option<u64>,
    ) -> Result<Self, ArchiveError> {
        let mut kyve = KyveClient {
            client,
            endpoint,
            pool_id: 0,
        };
        kyve.pool_id = match pool_id {
            Some(pool_id) => pool_id,
            None => {
                let response: PoolsResponse = kyve
                    .get("/kyve/query/v1beta1/pools?pagination.limit=1000")
                    .await?;
                select_pool(&response.pools, chain_id).ok_or_else(|| {
                    ArchiveError::PoolNotFound {
                        chain_id: chain_id.to_string(),
                    }
                })?
            }
        };
        info!("📦 using archive pool {} for {chain_id}", kyve.pool_id);
        Ok(kyve)
    }

    /// Pool the client reads from.
    pub fn pool_id(&self) -> u64 {
        self.pool_id
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ArchiveError> {
        let url = format!("{}{path}", self.endpoint.as_str().trim_end_matches('/'));
        debug!("GET {url}");
        let failed = |e: reqwest::Error| ArchiveError::MetadataRequestFailed {
            url: url.clone(),
            message: e.to_string(),
        };
        self.client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(failed)?
            .json()
            .await
            .map_err(failed)
    }
}

#[async_trait]
impl BundleIndex for KyveClient {
    async fn latest_bundle_id(&self) -> Result<u64, ArchiveError> {
        let path = format!("/kyve/query/v1beta1/pool/{}", self.pool_id);
        let response: PoolResponse = self.get(&path).await?;
        response
            .pool
            .data
            .total_bundles
            .checked_sub(1)
            .ok_or_else(|| ArchiveError::MetadataRequestFailed {
                url: path,
                message: "pool has no finalized bundles".to_string(),
            })
    }

    async fn finalized_bundle(&self, id: u64) -> Result<FinalizedBundle, ArchiveError> {
        let response: BundleResponse = self
            .get(&format!("/kyve/v1/bundles/{}/{id}", self.pool_id))
            .await?;
        Ok(response.finalized_bundle)
    }
}

/// [`BundleStorage`] reading from an HTTP gateway of the storage provider.
#[derive(Debug, Clone)]
pub struct HttpBundleStorage {
    client: Client,
    base_url: Url,
}

impl HttpBundleStorage {
    /// Default gateway for bundle data.
    pub const DEFAULT_URL: &'static str = "https://arweave.net";

    /// Storage reading `{base_url}/{storage_id}`.
    pub fn new(client: Client, base_url: Url) -> Self {
        HttpBundleStorage { client, base_url }
    }
}

#[async_trait]
impl BundleStorage for HttpBundleStorage {
    async fn retrieve(&self, bundle: &FinalizedBundle) -> Result<Vec<u8>, ArchiveError> {
        let url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            bundle.storage_id
        );
        info!("⬇️ downloading bundle {} from {url}", bundle.id);
        let failed = |e: reqwest::Error| ArchiveError::StorageFetchFailed {
            storage_id: bundle.storage_id.clone(),
            message: e.to_string(),
        };
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(failed)?
            .bytes()
            .await
            .map_err(failed)?;
        Ok(bytes.to_vec())
    }
}
