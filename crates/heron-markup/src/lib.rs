//! Markdown → Slack mrkdwn transcoding and block segmentation.
//!
//! Pure text processing with no I/O and no shared state. `to_chat_markup` is
//! total: unmatched markdown passes through unchanged rather than failing.

pub mod segment;
pub mod transcode;

pub use segment::{segment, BlockKind, TranscodedBlock};
pub use transcode::to_chat_markup;
