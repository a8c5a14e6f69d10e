//! Outbound reply assembly.

use slack_morphism::prelude::*;

use heron_markup::TranscodedBlock;

/// Slack rejects message text past ~40k characters; 39k leaves headroom.
const REPLY_MAX_CHARS: usize = 39_000;

/// A reply ready to post: the full mrkdwn text plus its segmented blocks,
/// anchored to the originating thread.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub channel: String,
    /// Reply anchor: the original `thread_ts`, or the message's own `ts`
    /// when it started a fresh conversation.
    pub thread_ts: String,
    pub text: String,
    pub blocks: Vec<TranscodedBlock>,
}

/// Render each transcoded block as one mrkdwn section. Classification is
/// cosmetic for now; every block kind posts the same way.
pub fn section_blocks(blocks: &[TranscodedBlock]) -> Vec<SlackBlock> {
    blocks
        .iter()
        .map(|block| {
            SlackBlock::Section(
                SlackSectionBlock::new().with_text(md!("{}", block.content.clone())),
            )
        })
        .collect()
}

/// Cap reply text at the Slack ceiling, appending an ellipsis marker when
/// truncation happened.
pub fn truncate_reply(value: &str) -> String {
    truncate_chars(value, REPLY_MAX_CHARS)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    // An odd number of fence markers means the cut landed inside a code
    // block; close it so everything after the cut does not render as code.
    if truncated.matches("```").count() % 2 == 1 {
        truncated.push_str("\n```");
    }
    truncated.push_str("...");
    truncated
}
