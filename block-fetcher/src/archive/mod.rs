//! Historical blocks from a KYVE-style bundle archive.
//!
//! The archive stores consecutive blocks in numbered, compressed bundles. [`ArchiveFetcher`]
//! finds the bundle covering a height by binary search over the bundle ids and keeps the most
//! recently downloaded bundle in memory.

use crate::{adaptor::de_number, error::ArchiveError};
use async_trait::async_trait;
use serde::Deserialize;
use std::ops::RangeInclusive;

mod api;
pub use api::{HttpBundleStorage, KyveClient, TENDERMINT_RUNTIME};

mod bundle;
pub use bundle::{decompress, parse_bundle, BundleEntry, COMPRESSION_GZIP, COMPRESSION_NONE};

mod fetcher;
pub use fetcher::ArchiveFetcher;

/// Metadata of a finalized bundle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FinalizedBundle {
    /// Bundle id, counting from 0 within the pool.
    #[serde(deserialize_with = "de_number")]
    pub id: u64,
    /// Id of the bundle data at the storage provider.
    pub storage_id: String,
    /// Storage provider the data lives at.
    #[serde(deserialize_with = "de_number")]
    pub storage_provider_id: u32,
    /// Compression of the stored data.
    #[serde(deserialize_with = "de_number")]
    pub compression_id: u32,
    /// First height in the bundle.
    pub from_key: String,
    /// Last height in the bundle.
    pub to_key: String,
    /// Hash of the bundle data.
    #[serde(default)]
    pub data_hash: String,
}

impl FinalizedBundle {
    /// Heights covered by this bundle.
    pub fn height_range(&self) -> Result<RangeInclusive<u64>, ArchiveError> {
        let parse = |key: &str| {
            key.parse::<u64>().map_err(|_| ArchiveError::InvalidBundleKey {
                key: key.to_string(),
            })
        };
        Ok(parse(&self.from_key)?..=parse(&self.to_key)?)
    }
}

/// Bundle metadata of one archive pool.
#[async_trait]
pub trait BundleIndex: Send + Sync {
    /// Id of the newest finalized bundle.
    async fn latest_bundle_id(&self) -> Result<u64, ArchiveError>;

    /// Metadata of bundle `id`.
    async fn finalized_bundle(&self, id: u64) -> Result<FinalizedBundle, ArchiveError>;
}

/// Where bundle data is stored.
#[async_trait]
pub trait BundleStorage: Send + Sync {
    /// Download the raw, still compressed, data of `bundle`.
    async fn retrieve(&self, bundle: &FinalizedBundle) -> Result<Vec<u8>, ArchiveError>;
}
