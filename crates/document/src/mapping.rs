use prose_protocol::DocRange;
use serde::{Deserialize, Serialize};

/// Which side a position sticks to when content is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// Stay before the inserted content
    Before,
    /// Move past the inserted content
    After,
}

/// One replaced span of an edit: the pre-edit range `[from, to)` was
/// replaced by `new_len` positions of new content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacedSpan {
    pub from: usize,
    pub to: usize,
    pub new_len: usize,
}

/// Position mapping through one document edit.
///
/// Spans are non-overlapping and ascending, all in pre-edit coordinates.
/// Every live finding (and every cached finding) is re-projected through
/// the mapping of each edit before any new analysis is dispatched, so
/// decorations never desync from text while analysis is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMapping {
    spans: Vec<ReplacedSpan>,
}

impl EditMapping {
    /// Mapping that moves nothing
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Mapping for replacing `[from, to)` with `new_len` positions
    #[must_use]
    pub fn replace(from: usize, to: usize, new_len: usize) -> Self {
        Self {
            spans: vec![ReplacedSpan { from, to, new_len }],
        }
    }

    /// Mapping for inserting `len` positions at `pos`
    #[must_use]
    pub fn insert(pos: usize, len: usize) -> Self {
        Self::replace(pos, pos, len)
    }

    /// Mapping for deleting `[from, to)`
    #[must_use]
    pub fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to, 0)
    }

    /// Replaced spans, ascending, in pre-edit coordinates
    #[must_use]
    pub fn spans(&self) -> &[ReplacedSpan] {
        &self.spans
    }

    /// Map a pre-edit position into post-edit coordinates.
    ///
    /// Returns `None` for positions strictly inside a replaced span: the
    /// position was deleted.
    #[must_use]
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Option<usize> {
        let mut result = pos as isize;
        for span in &self.spans {
            if pos < span.from {
                break;
            }
            if pos == span.from {
                if matches!(assoc, Assoc::After) {
                    result += span.new_len as isize;
                }
                break;
            }
            if pos < span.to {
                return None;
            }
            result += span.new_len as isize - (span.to - span.from) as isize;
        }
        debug_assert!(result >= 0);
        Some(result as usize)
    }

    /// Re-project a range through the edit.
    ///
    /// Returns `None` if either endpoint was deleted or the result is
    /// empty/inverted; the owning finding must be dropped, not guessed.
    #[must_use]
    pub fn map_range(&self, range: DocRange) -> Option<DocRange> {
        let from = self.map_pos(range.from, Assoc::After)?;
        let to = self.map_pos(range.to, Assoc::Before)?;
        (from < to).then_some(DocRange::new(from, to))
    }

    /// Post-edit ranges covering the replacement content. Deletions
    /// yield an empty range at the deletion point.
    #[must_use]
    pub fn changed_ranges(&self) -> Vec<DocRange> {
        let mut delta: isize = 0;
        let mut out = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            let new_from = (span.from as isize + delta) as usize;
            out.push(DocRange::new(new_from, new_from + span.new_len));
            delta += span.new_len as isize - (span.to - span.from) as isize;
        }
        out
    }

    /// Map a document length through the edit
    #[must_use]
    pub fn map_len(&self, old_len: usize) -> usize {
        let delta: isize = self
            .spans
            .iter()
            .map(|s| s.new_len as isize - (s.to - s.from) as isize)
            .sum();
        (old_len as isize + delta) as usize
    }
}
