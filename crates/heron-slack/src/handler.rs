//! Per-event handler.
//!
//! Runs once per inbound `IncomingMessage`. Performs:
//! 1. Bot-identity lookup (cached, lazily re-resolved)
//! 2. Eligibility decision (+ thread-participation check when needed)
//! 3. Mention stripping
//! 4. Session key construction
//! 5. Attachment downloads
//! 6. Prediction call
//! 7. Reply extraction, transcoding, segmentation and posting
//!
//! A failure anywhere past eligibility becomes an apology posted into the
//! same thread; it never propagates out of the handler.

use tracing::{debug, warn};

use heron_core::config::HeronConfig;
use heron_core::types::IncomingMessage;
use heron_markup::{segment, to_chat_markup};
use heron_predict::{extract_reply, PredictClient, PredictRequest, FALLBACK_UPSTREAM};

use crate::adapter::SlackAdapter;
use crate::attach;
use crate::eligibility::{self, Eligibility};
use crate::identity::BotIdentity;
use crate::send::{self, OutgoingMessage};

/// Placeholder question for attachment-only messages.
const ATTACHMENT_ONLY_TEXT: &str = "[User sent attachment(s)]";

/// Handle one inbound event end to end. Infallible by design: every
/// failure path either skips the event or posts an apology.
pub async fn handle_message(
    adapter: &SlackAdapter,
    predict: &PredictClient,
    identity: &BotIdentity,
    http: &reqwest::Client,
    config: &HeronConfig,
    msg: IncomingMessage,
) {
    let bot_user_id = identity.get_or_resolve(adapter).await;

    match eligibility::evaluate(&msg, bot_user_id.as_deref()) {
        Eligibility::Skip => {
            debug!(channel = %msg.channel, kind = %msg.kind, "event not eligible, skipping");
            return;
        }
        Eligibility::Respond => {}
        Eligibility::CheckThread => {
            // Strict policy: a thread reply without a mention is only
            // eligible when the bot already took part in that thread.
            let Some(bot_user_id) = bot_user_id.as_deref() else {
                return;
            };
            let Some(thread_ts) = msg.thread_ts.as_deref() else {
                return;
            };
            match adapter
                .bot_participated_in_thread(&msg.channel, thread_ts, bot_user_id)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    debug!(channel = %msg.channel, thread = %thread_ts, "not a participant, skipping");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, channel = %msg.channel, "thread history lookup failed, skipping");
                    return;
                }
            }
        }
    }

    let question = eligibility::strip_mention(&msg.text, bot_user_id.as_deref().unwrap_or(""));
    if question.is_empty() && msg.files.is_empty() {
        return;
    }
    let question = if question.is_empty() {
        ATTACHMENT_ONLY_TEXT.to_string()
    } else {
        question
    };

    let session_key = msg.session_key();
    let uploads = attach::collect_uploads(
        http,
        &config.slack.bot_token,
        &msg.files,
        config.max_attachment_bytes,
    )
    .await;

    let request = PredictRequest {
        question,
        session_id: session_key.clone(),
        uploads,
    };

    let reply_text = match predict.predict(&request).await {
        Ok(payload) => extract_reply(&payload),
        Err(e) => {
            warn!(
                error = %e,
                endpoint = %predict.endpoint(),
                session = %session_key,
                "prediction call failed"
            );
            FALLBACK_UPSTREAM.to_string()
        }
    };

    let markup = send::truncate_reply(&to_chat_markup(&reply_text));
    let blocks = segment(&markup);

    let reply = OutgoingMessage {
        channel: msg.channel.clone(),
        thread_ts: msg.anchor().to_string(),
        text: markup,
        blocks,
    };

    if let Err(e) = adapter.post_reply(&reply).await {
        warn!(error = %e, session = %session_key, "failed to post reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::types::ChannelKind;

    fn message(text: &str, thread_ts: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            text: text.to_string(),
            channel: "C1".into(),
            kind: ChannelKind::Channel,
            ts: "200.1".into(),
            thread_ts: thread_ts.map(String::from),
            sender_is_bot: false,
            files: Vec::new(),
        }
    }

    #[test]
    fn reply_anchor_prefers_thread_ts() {
        let threaded = message("hi", Some("100.0"));
        assert_eq!(threaded.anchor(), "100.0");

        let fresh = message("hi", None);
        assert_eq!(fresh.anchor(), "200.1");
    }

    #[test]
    fn attachment_only_placeholder_is_nonempty() {
        assert!(!ATTACHMENT_ONLY_TEXT.trim().is_empty());
    }
}
