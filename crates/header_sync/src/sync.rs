use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::header::HeaderRecord;
use crate::net::rpc::{RpcClient, RpcError};
use crate::store::{HeaderStore, StoreError};

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
    #[error("cache store error: {0}")]
    Store(#[from] StoreError),
}

/// Source of block headers addressed by hash.
///
/// `RpcClient` is the production implementation; tests substitute scripted
/// doubles to drive the walk deterministically.
#[async_trait]
pub trait HeaderSource {
    async fn fetch_header(&self, hash: &str) -> Result<HeaderRecord, RpcError>;
}

#[async_trait]
impl HeaderSource for RpcClient {
    async fn fetch_header(&self, hash: &str) -> Result<HeaderRecord, RpcError> {
        self.get_block_header(hash).await
    }
}

/// Outcome of one bounded walk along the header chain.
#[derive(Debug, Default)]
pub struct ChainWalk {
    /// Newly fetched headers with a known successor, in fetch order.
    pub new_headers: Vec<HeaderRecord>,
    /// The observed chain tip, when the walk reached a header with no
    /// successor. Never persisted; the next run fetches it again.
    pub tip: Option<HeaderRecord>,
}

/// Resolves the hash the walk should fetch first.
///
/// A cache hit on `start_hash` means that header and everything before it
/// are already stored, so the walk continues from its recorded successor
/// without re-fetching the hit. On a miss the requested hash itself is
/// fetched.
pub fn resolve_start(cache: &[HeaderRecord], start_hash: &str) -> String {
    // Duplicate hashes cannot survive a save; if a hand-edited cache carries
    // them anyway, the index keeps the last one.
    let by_hash: HashMap<&str, &HeaderRecord> =
        cache.iter().map(|h| (h.hash.as_str(), h)).collect();

    match by_hash.get(start_hash) {
        Some(cached) => cached.nextblockhash.clone(),
        None => start_hash.to_string(),
    }
}

/// Walks forward from the resume point, fetching at most `max_blocks`
/// headers.
///
/// The walk stops early when a fetched header has no successor. A fetch
/// failure aborts the whole walk.
pub async fn walk_chain<C: HeaderSource>(
    source: &C,
    cache: &[HeaderRecord],
    start_hash: &str,
    max_blocks: usize,
) -> Result<ChainWalk, SyncError> {
    let mut current = resolve_start(cache, start_hash);
    if current != start_hash {
        debug!("resuming from the cached successor of {start_hash}");
    }

    let mut walk = ChainWalk::default();
    for _ in 0..max_blocks {
        if current.is_empty() {
            debug!("no known successor; stopping");
            break;
        }

        let header = source.fetch_header(&current).await?;
        info!(
            "fetched block {} at height {} ({} tx)",
            header.hash, header.height, header.n_tx
        );

        current = header.nextblockhash.clone();
        if header.has_successor() {
            walk.new_headers.push(header);
        } else {
            // The tip has nothing to resume from, so it is kept out of the
            // cached set.
            walk.tip = Some(header);
        }
    }
    Ok(walk)
}

/// Merges freshly fetched headers into the existing cache content.
///
/// The result is sorted by `(height, hash)` ascending and deduplicated by
/// hash; of two records sharing a hash, the first in the sorted sequence
/// survives. No field values are merged between duplicates.
pub fn merge_headers(existing: Vec<HeaderRecord>, fetched: &[HeaderRecord]) -> Vec<HeaderRecord> {
    let mut merged = existing;
    merged.extend_from_slice(fetched);
    merged.sort_by(|a, b| (a.height, a.hash.as_str()).cmp(&(b.height, b.hash.as_str())));
    merged.dedup_by(|a, b| a.hash == b.hash);
    merged
}

/// Runs one full sync pass: load the cache, walk the chain, merge, persist.
///
/// With no store configured the walk still runs but nothing is persisted.
/// The save happens even when the walk fetched nothing, normalizing
/// whatever ordering the existing file had.
pub async fn sync_chain<C, S>(
    source: &C,
    store: Option<&S>,
    start_hash: &str,
    max_blocks: usize,
) -> Result<ChainWalk, SyncError>
where
    C: HeaderSource,
    S: HeaderStore,
{
    let cache = match store {
        Some(s) => s.load()?,
        None => Vec::new(),
    };
    debug!("loaded {} cached header(s)", cache.len());

    let walk = walk_chain(source, &cache, start_hash, max_blocks).await?;

    if let Some(s) = store {
        let merged = merge_headers(cache, &walk.new_headers);
        s.save(&merged)?;
        info!(
            "cache now holds {} header(s), {} newly fetched",
            merged.len(),
            walk.new_headers.len()
        );
    }

    Ok(walk)
}
