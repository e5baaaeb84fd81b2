use crate::types::{DocNode, DocumentSnapshot, NodeKind};

/// Parse a markdown-ish plain text file into a block-node snapshot.
///
/// This is a convenience for hosts (and the CLI) that feed files rather
/// than a live editor document: fenced code blocks become opaque
/// `CodeBlock` nodes, `#` lines headings, `>` lines quotes, `-`/`*`
/// lines list items, and blank-line separated runs of text paragraphs.
#[must_use]
pub fn parse_markdown(input: &str) -> DocumentSnapshot {
    let mut nodes = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut code: Option<Vec<&str>> = None;

    let flush_paragraph = |nodes: &mut Vec<DocNode>, paragraph: &mut Vec<&str>| {
        if !paragraph.is_empty() {
            nodes.push(DocNode::paragraph(paragraph.join(" ")));
            paragraph.clear();
        }
    };

    for line in input.lines() {
        let trimmed = line.trim_end();

        if let Some(buffer) = code.as_mut() {
            if trimmed.trim_start().starts_with("```") {
                nodes.push(DocNode::new(NodeKind::CodeBlock, buffer.join("\n")));
                code = None;
            } else {
                buffer.push(line);
            }
            continue;
        }

        if trimmed.trim_start().starts_with("```") {
            flush_paragraph(&mut nodes, &mut paragraph);
            code = Some(Vec::new());
        } else if trimmed.is_empty() {
            flush_paragraph(&mut nodes, &mut paragraph);
        } else if let Some(rest) = heading_text(trimmed) {
            flush_paragraph(&mut nodes, &mut paragraph);
            nodes.push(DocNode::new(NodeKind::Heading, rest));
        } else if let Some(rest) = trimmed.strip_prefix("> ") {
            flush_paragraph(&mut nodes, &mut paragraph);
            nodes.push(DocNode::new(NodeKind::Quote, rest));
        } else if let Some(rest) = list_item_text(trimmed) {
            flush_paragraph(&mut nodes, &mut paragraph);
            nodes.push(DocNode::new(NodeKind::ListItem, rest));
        } else {
            paragraph.push(trimmed);
        }
    }

    // Unterminated fence: keep the content opaque rather than analyzing code
    if let Some(buffer) = code {
        nodes.push(DocNode::new(NodeKind::CodeBlock, buffer.join("\n")));
    }
    flush_paragraph(&mut nodes, &mut paragraph);

    DocumentSnapshot::new(nodes)
}

fn heading_text(line: &str) -> Option<&str> {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    line[hashes..].strip_prefix(' ')
}

fn list_item_text(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_paragraphs_and_headings() {
        let doc = parse_markdown("# Title\n\nFirst line\nstill first.\n\nSecond.\n");
        let nodes = doc.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind, NodeKind::Heading);
        assert_eq!(nodes[0].text, "Title");
        assert_eq!(nodes[1].text, "First line still first.");
        assert_eq!(nodes[2].text, "Second.");
    }

    #[test]
    fn test_parse_fenced_code_is_opaque() {
        let doc = parse_markdown("Before.\n\n```rust\nlet x = 1;\n```\n\nAfter.\n");
        let nodes = doc.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1].kind, NodeKind::CodeBlock);
        assert_eq!(nodes[1].text, "let x = 1;");
    }

    #[test]
    fn test_parse_quote_and_list() {
        let doc = parse_markdown("> quoted words\n- item one\n* item two\n");
        let nodes = doc.nodes();
        assert_eq!(nodes[0].kind, NodeKind::Quote);
        assert_eq!(nodes[1].kind, NodeKind::ListItem);
        assert_eq!(nodes[2].text, "item two");
    }
}
