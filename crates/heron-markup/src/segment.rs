//! Splits transcoded mrkdwn into renderable blocks.

use serde::{Deserialize, Serialize};

/// How a block would render. Classification is currently cosmetic (every
/// kind posts as one mrkdwn section) but kept as a per-segment extension
/// point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Code,
    Quote,
    Table,
    Text,
}

/// One renderable segment of a transcoded reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodedBlock {
    pub kind: BlockKind,
    pub content: String,
}

/// Split transcoded text into blank-line-separated blocks, classified by
/// their leading characters. Empty input yields an empty sequence; blank
/// segments are dropped; source order is preserved and no segment is ever
/// split or merged across the `"\n\n"` boundary.
pub fn segment(text: &str) -> Vec<TranscodedBlock> {
    text.split("\n\n")
        .filter(|part| !part.trim().is_empty())
        .map(|part| TranscodedBlock {
            kind: classify(part),
            content: part.to_string(),
        })
        .collect()
}

fn classify(part: &str) -> BlockKind {
    if part.starts_with("```") {
        BlockKind::Code
    } else if part.starts_with(">>>") {
        BlockKind::Quote
    } else if part.starts_with('|') && part.contains('\n') {
        BlockKind::Table
    } else {
        BlockKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_paragraphs_in_order() {
        let blocks = segment("a\n\nb\n\nc");
        assert_eq!(blocks.len(), 3);
        let contents: Vec<&str> = blocks.iter().map(|b| b.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
        assert!(blocks.iter().all(|b| b.kind == BlockKind::Text));
    }

    #[test]
    fn empty_input_yields_empty_sequence() {
        assert!(segment("").is_empty());
    }

    #[test]
    fn whitespace_only_segments_dropped() {
        let blocks = segment("a\n\n   \n\nb");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn classifies_code_block() {
        let blocks = segment("```\nlet x = 1;\n```");
        assert_eq!(blocks[0].kind, BlockKind::Code);
    }

    #[test]
    fn classifies_quote_block() {
        let blocks = segment(">>> wisdom");
        assert_eq!(blocks[0].kind, BlockKind::Quote);
    }

    #[test]
    fn classifies_table_block() {
        let blocks = segment("| a | b\n| 1 | 2");
        assert_eq!(blocks[0].kind, BlockKind::Table);
    }

    #[test]
    fn leading_pipe_without_newline_is_text() {
        let blocks = segment("| just a pipe");
        assert_eq!(blocks[0].kind, BlockKind::Text);
    }

    #[test]
    fn code_block_not_split_or_merged() {
        let blocks = segment("intro\n\n```\na\nb\n```\n\noutro");
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].kind, BlockKind::Code);
        assert_eq!(blocks[1].content, "```\na\nb\n```");
    }
}
