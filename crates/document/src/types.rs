use crate::error::{DocumentError, Result};
use crate::mapping::EditMapping;
use prose_protocol::DocRange;
use serde::{Deserialize, Serialize};

/// Structural offset between a block node's document position and the first
/// character of its text: one position for the node's opening boundary.
///
/// Analyzer results carry offsets relative to block text; translating them
/// back into document coordinates adds the block start plus this constant.
pub const BLOCK_OPEN_OFFSET: usize = 1;

/// Kind of a block-level document node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Paragraph,
    Heading,
    Quote,
    ListItem,
    /// Opaque to analysis: never segmented, never decorated
    CodeBlock,
}

impl NodeKind {
    /// Whether this node's text is prose that should be analyzed
    #[must_use]
    pub const fn is_analyzable(self) -> bool {
        !matches!(self, Self::CodeBlock)
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Quote => "quote",
            Self::ListItem => "list_item",
            Self::CodeBlock => "code_block",
        }
    }
}

/// One block-level node with its inline text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    pub kind: NodeKind,
    pub text: String,
}

impl DocNode {
    /// Create a node
    pub fn new(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Shorthand for a paragraph node
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Paragraph, text)
    }

    /// Document positions occupied by this node: opening boundary, text
    /// bytes, closing boundary.
    #[must_use]
    pub fn span_len(&self) -> usize {
        self.text.len() + 2
    }
}

/// Immutable snapshot of the document at one point in time.
///
/// Coordinates: position 0 is the document start; each node contributes one
/// position for its opening boundary, one per text byte, and one for its
/// closing boundary. The core only ever observes snapshots; the editor
/// surface owns and mutates the real document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    nodes: Vec<DocNode>,
}

impl DocumentSnapshot {
    /// Create a snapshot from block nodes
    #[must_use]
    pub fn new(nodes: Vec<DocNode>) -> Self {
        Self { nodes }
    }

    /// The empty document
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Block nodes in document order
    #[must_use]
    pub fn nodes(&self) -> &[DocNode] {
        &self.nodes
    }

    /// Total document length in document positions
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.iter().map(DocNode::span_len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate nodes together with their start positions
    pub fn node_spans(&self) -> impl Iterator<Item = (usize, &DocNode)> {
        let mut pos = 0;
        self.nodes.iter().map(move |node| {
            let start = pos;
            pos += node.span_len();
            (start, node)
        })
    }

    /// Extract the text at a range, if the range lies inside a single
    /// node's text span. Returns `None` for ranges touching node
    /// boundaries or crossing nodes.
    #[must_use]
    pub fn text_in(&self, range: DocRange) -> Option<&str> {
        if range.is_empty() {
            return None;
        }
        for (start, node) in self.node_spans() {
            let text_from = start + BLOCK_OPEN_OFFSET;
            let text_to = text_from + node.text.len();
            if range.from >= text_from && range.to <= text_to {
                return node
                    .text
                    .get(range.from - text_from..range.to - text_from);
            }
        }
        None
    }

    /// Apply a text replacement, returning the resulting snapshot and the
    /// position mapping for the edit.
    ///
    /// Endpoints must lie within node text spans (inclusive of both text
    /// edges), or the range must cover whole nodes exactly. A range
    /// crossing from one node's text into another merges the two nodes.
    pub fn replace_range(&self, range: DocRange, insert: &str) -> Result<(Self, EditMapping)> {
        if range.to < range.from {
            return Err(DocumentError::InvertedRange {
                from: range.from,
                to: range.to,
            });
        }
        let len = self.len();
        if range.to > len {
            return Err(DocumentError::OutOfBounds {
                pos: range.to,
                len,
            });
        }

        let mapping = EditMapping::replace(range.from, range.to, insert.len());

        // Whole-node removal: range starts at a node's opening boundary and
        // ends at a (possibly later) node's closing edge.
        if let Some(nodes) = self.remove_whole_nodes(range, insert) {
            return Ok((Self::new(nodes), mapping));
        }

        let mut out: Vec<DocNode> = Vec::with_capacity(self.nodes.len());
        let mut merged: Option<DocNode> = None;
        let mut endpoints_ok = (false, false);

        for (start, node) in self.node_spans() {
            let text_from = start + BLOCK_OPEN_OFFSET;
            let text_to = text_from + node.text.len();
            let end = start + node.span_len();

            if end <= range.from || start >= range.to {
                if let Some(done) = merged.take() {
                    out.push(done);
                }
                out.push(node.clone());
                continue;
            }

            // Node overlapped by the edit
            if range.from >= text_from && range.from <= text_to {
                endpoints_ok.0 = true;
                let prefix = &node.text[..range.from - text_from];
                merged = Some(DocNode::new(
                    node.kind,
                    format!("{prefix}{insert}"),
                ));
            }
            if range.to >= text_from && range.to <= text_to {
                endpoints_ok.1 = true;
                let suffix = &node.text[range.to - text_from..];
                match merged.as_mut() {
                    Some(m) => m.text.push_str(suffix),
                    // Edit started outside any text span
                    None => {
                        return Err(DocumentError::BoundarySplit {
                            from: range.from,
                            to: range.to,
                        })
                    }
                }
            }
            // Fully covered interior nodes are dropped
        }
        if let Some(done) = merged.take() {
            out.push(done);
        }

        if !(endpoints_ok.0 && endpoints_ok.1) {
            return Err(DocumentError::BoundarySplit {
                from: range.from,
                to: range.to,
            });
        }

        Ok((Self::new(out), mapping))
    }

    /// Insert text at a position inside a node's text span
    pub fn insert_at(&self, pos: usize, insert: &str) -> Result<(Self, EditMapping)> {
        self.replace_range(DocRange::new(pos, pos), insert)
    }

    /// Delete the text at a range
    pub fn delete_range(&self, range: DocRange) -> Result<(Self, EditMapping)> {
        self.replace_range(range, "")
    }

    fn remove_whole_nodes(&self, range: DocRange, insert: &str) -> Option<Vec<DocNode>> {
        if !insert.is_empty() || range.is_empty() {
            return None;
        }
        let mut starts_at_open = false;
        let mut ends_at_close = false;
        let mut out = Vec::with_capacity(self.nodes.len());
        for (start, node) in self.node_spans() {
            let end = start + node.span_len();
            if start == range.from {
                starts_at_open = true;
            }
            if end == range.to {
                ends_at_close = true;
            }
            if start >= range.from && end <= range.to {
                continue;
            }
            // Partial overlap disqualifies the whole-node path
            if start < range.to && end > range.from {
                return None;
            }
            out.push(node.clone());
        }
        (starts_at_open && ends_at_close).then_some(out)
    }
}
