use crate::types::{DocumentSnapshot, BLOCK_OPEN_OFFSET};
use prose_protocol::DocRange;
use serde::{Deserialize, Serialize};

/// One analyzable prose unit of the document: an ephemeral projection of a
/// block node, recomputed on each snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Node span `[start, end)` in document coordinates, boundaries included
    pub range: DocRange,
    /// The node's text content
    pub text: String,
}

impl Block {
    /// Document-coordinate span of the text content alone
    #[must_use]
    pub fn text_range(&self) -> DocRange {
        DocRange::new(
            self.range.from + BLOCK_OPEN_OFFSET,
            self.range.from + BLOCK_OPEN_OFFSET + self.text.len(),
        )
    }
}

/// Extract the analyzable blocks of a snapshot, in document order.
///
/// Code blocks are skipped entirely and whitespace-only nodes produce no
/// block. Pure: re-running on an unchanged snapshot yields identical
/// ranges and text.
#[must_use]
pub fn segment(snapshot: &DocumentSnapshot) -> Vec<Block> {
    let mut blocks = Vec::new();
    for (start, node) in snapshot.node_spans() {
        if !node.kind.is_analyzable() {
            continue;
        }
        if node.text.trim().is_empty() {
            continue;
        }
        blocks.push(Block {
            range: DocRange::new(start, start + node.span_len()),
            text: node.text.clone(),
        });
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocNode, DocumentSnapshot, NodeKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segment_skips_code_blocks() {
        let snapshot = DocumentSnapshot::new(vec![
            DocNode::paragraph("Some prose."),
            DocNode::new(NodeKind::CodeBlock, "let x = teh_value;"),
            DocNode::new(NodeKind::Heading, "A heading"),
        ]);
        let blocks = segment(&snapshot);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Some prose.");
        assert_eq!(blocks[1].text, "A heading");
    }

    #[test]
    fn test_segment_skips_whitespace_only() {
        let snapshot = DocumentSnapshot::new(vec![
            DocNode::paragraph("   "),
            DocNode::paragraph(""),
            DocNode::paragraph("Real content"),
        ]);
        let blocks = segment(&snapshot);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "Real content");
    }

    #[test]
    fn test_segment_is_stable() {
        let snapshot = DocumentSnapshot::new(vec![
            DocNode::paragraph("First paragraph."),
            DocNode::new(NodeKind::Quote, "A quoted line."),
        ]);
        assert_eq!(segment(&snapshot), segment(&snapshot));
    }

    #[test]
    fn test_block_ranges_are_contiguous_node_spans() {
        let snapshot = DocumentSnapshot::new(vec![
            DocNode::paragraph("abc"),
            DocNode::paragraph("de"),
        ]);
        let blocks = segment(&snapshot);
        assert_eq!(blocks[0].range, DocRange::new(0, 5));
        assert_eq!(blocks[1].range, DocRange::new(5, 9));
        assert_eq!(blocks[0].text_range(), DocRange::new(1, 4));
    }
}
