//! Pulls the reply text out of a prediction response payload.

use serde_json::Value;

/// Posted when the payload parses but yields no reply text.
pub const FALLBACK_NO_REPLY: &str =
    "Sorry, I couldn't find a usable reply in the response. Please try again.";

/// Posted when the prediction call itself fails.
pub const FALLBACK_UPSTREAM: &str =
    "Sorry, something went wrong while generating a reply. Please try again.";

/// Map a prediction payload to plain reply text. Total: any shape
/// mismatch degrades to `FALLBACK_NO_REPLY` rather than failing.
///
/// Resolution order:
/// 1. top-level `text` string
/// 2. `assistant.messages[]`: first entry with role "assistant", its
///    `content[0].text.value`
/// 3. the fallback apology
pub fn extract_reply(payload: &Value) -> String {
    if let Some(text) = payload.get("text").and_then(Value::as_str) {
        return text.to_string();
    }

    if let Some(messages) = payload
        .pointer("/assistant/messages")
        .and_then(Value::as_array)
    {
        for message in messages {
            if message.get("role").and_then(Value::as_str) != Some("assistant") {
                continue;
            }
            if let Some(value) = message
                .pointer("/content/0/text/value")
                .and_then(Value::as_str)
            {
                return value.to_string();
            }
        }
    }

    FALLBACK_NO_REPLY.to_string()
}
