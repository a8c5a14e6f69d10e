use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack conversation class, from the wire `channel_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Direct message.
    Im,
    /// Public channel.
    Channel,
    /// Private channel / group.
    Group,
    /// Anything else (mpim, unknown future types). Never eligible.
    Other,
}

impl ChannelKind {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "im" => ChannelKind::Im,
            "channel" => ChannelKind::Channel,
            "group" => ChannelKind::Group,
            _ => ChannelKind::Other,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelKind::Im => "im",
            ChannelKind::Channel => "channel",
            ChannelKind::Group => "group",
            ChannelKind::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A file attached to an incoming message. Fetched and discarded per
/// invocation, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRef {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Authenticated download URL (requires the bot token as bearer).
    /// Size is not known until fetch time; the download path enforces
    /// the attachment cap from `Content-Length` and the received bytes.
    pub private_url: String,
}

/// Immutable snapshot of one inbound chat event. Lifetime is the duration
/// of one handling cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub text: String,
    pub channel: String,
    pub kind: ChannelKind,
    /// Opaque ordered token identifying this message.
    pub ts: String,
    /// Present when the message is a thread reply.
    pub thread_ts: Option<String>,
    /// True when the sender is a bot (including ourselves).
    pub sender_is_bot: bool,
    #[serde(default)]
    pub files: Vec<FileRef>,
}

impl IncomingMessage {
    /// The thread anchor for replies: the thread this message lives in,
    /// or the message itself when it starts a fresh conversation.
    pub fn anchor(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }

    /// Deterministic conversation identifier handed to the prediction
    /// service so it can maintain its own context.
    ///
    /// | Conversation    | Key format                              |
    /// |-----------------|-----------------------------------------|
    /// | DM              | `slack:im:{channel}:{ts}`               |
    /// | Channel message | `slack:channel:{channel}:{ts}`          |
    /// | Thread reply    | `slack:{kind}:{channel}:{thread_ts}`    |
    pub fn session_key(&self) -> String {
        format!("slack:{}:{}:{}", self.kind, self.channel, self.anchor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(kind: ChannelKind, thread_ts: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            text: "hello".into(),
            channel: "C123".into(),
            kind,
            ts: "1700000000.000100".into(),
            thread_ts: thread_ts.map(String::from),
            sender_is_bot: false,
            files: Vec::new(),
        }
    }

    #[test]
    fn session_key_uses_own_ts_without_thread() {
        let msg = message(ChannelKind::Channel, None);
        assert_eq!(msg.session_key(), "slack:channel:C123:1700000000.000100");
    }

    #[test]
    fn session_key_uses_thread_anchor_when_present() {
        let msg = message(ChannelKind::Group, Some("1699.5"));
        assert_eq!(msg.session_key(), "slack:group:C123:1699.5");
    }

    #[test]
    fn session_key_is_deterministic_for_same_conversation() {
        let a = message(ChannelKind::Channel, Some("42.1"));
        let mut b = message(ChannelKind::Channel, Some("42.1"));
        b.ts = "1700000099.000500".into();
        b.text = "a different reply in the same thread".into();
        assert_eq!(a.session_key(), b.session_key());
    }

    #[test]
    fn channel_kind_from_wire() {
        assert_eq!(ChannelKind::from_wire("im"), ChannelKind::Im);
        assert_eq!(ChannelKind::from_wire("channel"), ChannelKind::Channel);
        assert_eq!(ChannelKind::from_wire("group"), ChannelKind::Group);
        assert_eq!(ChannelKind::from_wire("mpim"), ChannelKind::Other);
        assert_eq!(ChannelKind::from_wire(""), ChannelKind::Other);
    }
}
