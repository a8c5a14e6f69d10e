//! The message-eligibility decision: should this event be answered?
//!
//! Pure function of the event and the bot's identity. The only external
//! input, whether the bot previously participated in a thread, is
//! surfaced as `CheckThread` so the collaborator call stays outside.

use heron_core::types::{ChannelKind, IncomingMessage};

/// Outcome of the eligibility check, in priority order of the rules that
/// produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Do not respond.
    Skip,
    /// Respond unconditionally.
    Respond,
    /// Respond only if the bot previously participated in this thread
    /// (resolved via the conversation-history API).
    CheckThread,
}

/// Decide whether an inbound event warrants a reply.
///
/// Rules, in priority order:
/// 1. Messages from bots (including ourselves) are never answered.
/// 2. Direct messages are always answered.
/// 3. Channel/group messages are answered when they mention the bot;
///    thread replies without a mention defer to prior-participation.
///    While the bot identity is unresolved, mention detection cannot
///    work, so channel eligibility degrades to never-eligible.
/// 4. Everything else is skipped.
pub fn evaluate(msg: &IncomingMessage, bot_user_id: Option<&str>) -> Eligibility {
    if msg.sender_is_bot {
        return Eligibility::Skip;
    }

    match msg.kind {
        ChannelKind::Im => Eligibility::Respond,
        ChannelKind::Channel | ChannelKind::Group => {
            let Some(bot_user_id) = bot_user_id else {
                return Eligibility::Skip;
            };
            if contains_mention(&msg.text, bot_user_id) {
                Eligibility::Respond
            } else if msg.thread_ts.is_some() {
                Eligibility::CheckThread
            } else {
                Eligibility::Skip
            }
        }
        ChannelKind::Other => Eligibility::Skip,
    }
}

/// Return `true` if `text` contains the `<@USERID>` mention token.
pub fn contains_mention(text: &str, bot_user_id: &str) -> bool {
    if bot_user_id.is_empty() {
        return false;
    }
    text.contains(&mention_token(bot_user_id))
}

/// Remove the bot's mention token from the message text before it is
/// forwarded to the prediction service.
pub fn strip_mention(text: &str, bot_user_id: &str) -> String {
    if bot_user_id.is_empty() {
        return text.trim().to_string();
    }
    text.replace(&mention_token(bot_user_id), "")
        .trim()
        .to_string()
}

fn mention_token(bot_user_id: &str) -> String {
    format!("<@{bot_user_id}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(kind: ChannelKind, text: &str, thread_ts: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            text: text.to_string(),
            channel: "C1".into(),
            kind,
            ts: "100.1".into(),
            thread_ts: thread_ts.map(String::from),
            sender_is_bot: false,
            files: Vec::new(),
        }
    }

    #[test]
    fn bot_senders_never_answered() {
        let mut msg = message(ChannelKind::Im, "<@UBOT> hi", None);
        msg.sender_is_bot = true;
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::Skip);

        let mut threaded = message(ChannelKind::Channel, "<@UBOT> hi", Some("1.0"));
        threaded.sender_is_bot = true;
        assert_eq!(evaluate(&threaded, Some("UBOT")), Eligibility::Skip);
    }

    #[test]
    fn direct_messages_always_eligible() {
        let msg = message(ChannelKind::Im, "no mention here", None);
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::Respond);
        // Even while identity is unresolved.
        assert_eq!(evaluate(&msg, None), Eligibility::Respond);
    }

    #[test]
    fn channel_mention_is_eligible() {
        let msg = message(ChannelKind::Channel, "hey <@UBOT>, ping", None);
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::Respond);
    }

    #[test]
    fn group_mention_is_eligible() {
        let msg = message(ChannelKind::Group, "<@UBOT> status?", None);
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::Respond);
    }

    #[test]
    fn channel_without_mention_or_thread_is_skipped() {
        let msg = message(ChannelKind::Channel, "general chatter", None);
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::Skip);
    }

    #[test]
    fn thread_reply_without_mention_defers_to_participation() {
        let msg = message(ChannelKind::Channel, "follow-up question", Some("99.5"));
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::CheckThread);
    }

    #[test]
    fn unresolved_identity_degrades_channels_to_skip() {
        let msg = message(ChannelKind::Channel, "<@UBOT> hi", Some("1.0"));
        assert_eq!(evaluate(&msg, None), Eligibility::Skip);
    }

    #[test]
    fn unknown_channel_type_never_eligible() {
        let msg = message(ChannelKind::Other, "<@UBOT> hi", Some("1.0"));
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::Skip);
    }

    #[test]
    fn mention_of_other_user_does_not_count() {
        let msg = message(ChannelKind::Channel, "<@USOMEONE> hi", None);
        assert_eq!(evaluate(&msg, Some("UBOT")), Eligibility::Skip);
    }

    #[test]
    fn strip_mention_removes_token_and_trims() {
        assert_eq!(strip_mention("<@UBOT> what is up", "UBOT"), "what is up");
        assert_eq!(strip_mention("what is up", "UBOT"), "what is up");
        assert_eq!(strip_mention("  padded  ", ""), "padded");
    }

    #[test]
    fn empty_identity_matches_nothing() {
        assert!(!contains_mention("<@> odd", ""));
    }
}
