use crate::blocks::BlockId;
use lru::LruCache;
use prose_protocol::{DocRange, Finding};
use std::num::NonZeroUsize;
use std::time::Instant;

/// Cached analysis result for one block. Findings are stored relative
/// to the block's text, so an entry stays intact no matter how the
/// document around the block changes.
#[derive(Debug, Clone)]
struct CacheEntry {
    hash: u64,
    findings: Vec<Finding>,
    created: Instant,
}

/// Capacity-bounded per-block result cache.
///
/// Keyed by block identity; an entry is only usable while the block's
/// live content hash still matches the hash the entry was stored under.
/// Ranges are rebased onto the block's current document position on the
/// way out, so a hit can be merged without touching an analyzer.
pub(crate) struct ResultCache {
    entries: LruCache<BlockId, CacheEntry>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("non-zero capacity");
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Findings cached for this block under exactly this content hash,
    /// rebased so the block's first text byte sits at `text_from`
    pub fn get(&mut self, id: BlockId, hash: u64, text_from: usize) -> Option<Vec<Finding>> {
        let entry = self.entries.get(&id)?;
        if entry.hash != hash {
            return None;
        }
        log::debug!(
            "cache hit for block {id} (entry age {:?})",
            entry.created.elapsed()
        );
        Some(
            entry
                .findings
                .iter()
                .cloned()
                .map(|mut finding| {
                    finding.range = DocRange::new(
                        finding.range.from + text_from,
                        finding.range.to + text_from,
                    );
                    finding
                })
                .collect(),
        )
    }

    /// Store (or overwrite) the entry for a block. `text_from` is the
    /// document position of the block's first text byte; findings
    /// starting before it are discarded.
    pub fn put(&mut self, id: BlockId, hash: u64, text_from: usize, findings: Vec<Finding>) {
        let findings = findings
            .into_iter()
            .filter_map(|mut finding| {
                let from = finding.range.from.checked_sub(text_from)?;
                let to = finding.range.to.checked_sub(text_from)?;
                finding.range = DocRange::new(from, to);
                Some(finding)
            })
            .collect();
        self.entries.put(
            id,
            CacheEntry {
                hash,
                findings,
                created: Instant::now(),
            },
        );
    }

    /// Drop a block's entry
    pub fn remove(&mut self, id: BlockId) {
        self.entries.pop(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
