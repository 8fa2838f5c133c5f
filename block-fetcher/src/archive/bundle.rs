use super::FinalizedBundle;
use crate::{
    adaptor::ProtocolVersion,
    error::{ArchiveError, DecompressionFailedSnafu},
};
use cosmos_core::BlockPair;
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;
use snafu::ResultExt;
use std::{collections::BTreeMap, io::Read};

/// Compression id of uncompressed bundle data.
pub const COMPRESSION_NONE: u32 = 0;
/// Compression id of gzip bundle data.
pub const COMPRESSION_GZIP: u32 = 1;

/// Undo the compression of `bundle`'s stored `data`.
pub fn decompress(bundle: &FinalizedBundle, data: Vec<u8>) -> Result<Vec<u8>, ArchiveError> {
    match bundle.compression_id {
        COMPRESSION_NONE => Ok(data),
        COMPRESSION_GZIP => {
            let mut decompressed = Vec::new();
            GzDecoder::new(data.as_slice())
                .read_to_end(&mut decompressed)
                .context(DecompressionFailedSnafu {
                    bundle_id: bundle.id,
                })?;
            Ok(decompressed)
        }
        compression_id => Err(ArchiveError::UnsupportedCompression { compression_id }),
    }
}

/// One item of a bundle.
#[derive(Deserialize)]
struct DataItem {
    key: String,
    value: BundleEntry,
}

/// The raw RPC results of one height, as stored in a bundle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BundleEntry {
    /// Result of the `block` call.
    pub block: Value,
    /// Result of the `block_results` call.
    pub block_results: Value,
}

impl BundleEntry {
    /// Normalize the entry stored under `height` in bundle `bundle_id`.
    ///
    /// Bundles are always written in the Tendermint 0.37 shape. The decoded block must carry the
    /// height the entry is keyed by.
    pub fn decode(self, bundle_id: u64, height: u64) -> Result<BlockPair, ArchiveError> {
        let adaptor = ProtocolVersion::Tendermint37;
        let block = adaptor.decode_block(self.block)?;
        let block_results = adaptor.decode_block_results(self.block_results)?;
        let pair = BlockPair::new(block, block_results)?;
        if pair.height() != height {
            return Err(ArchiveError::MalformedBundle {
                bundle_id,
                message: format!("entry {height} holds block {}", pair.height()),
            });
        }
        Ok(pair)
    }
}

/// Parse decompressed bundle data into its entries by height.
pub fn parse_bundle(
    bundle_id: u64,
    data: &[u8],
) -> Result<BTreeMap<u64, BundleEntry>, ArchiveError> {
    let items: Vec<DataItem> =
        serde_json::from_slice(data).map_err(|e| ArchiveError::MalformedBundle {
            bundle_id,
            message: e.to_string(),
        })?;

    items
        .into_iter()
        .map(|item| -> Result<_, ArchiveError> {
            let height = item
                .key
                .parse::<u64>()
                .map_err(|_| ArchiveError::InvalidBundleKey { key: item.key })?;
            Ok((height, item.value))
        })
        .collect()
}
