//! Slack channel adapter.
//!
//! Wraps a slack-morphism socket-mode listener plus a Web API session.
//! Inbound `message` events are mapped to `IncomingMessage` and forwarded
//! over an mpsc channel; the adapter also exposes the Web API calls the
//! handler needs (post reply, auth.test, thread history).

use anyhow::{Context, Result};
use slack_morphism::prelude::SlackClientHyperHttpsConnector;
use slack_morphism::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use heron_core::config::SlackConfig;
use heron_core::types::{ChannelKind, FileRef, IncomingMessage};

use crate::send::OutgoingMessage;

#[derive(Clone)]
struct SlackBridge {
    tx: mpsc::UnboundedSender<IncomingMessage>,
}

pub struct SlackAdapter {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
}

impl SlackAdapter {
    /// Connect in socket mode and start forwarding push events. Returns
    /// the adapter plus the inbound event stream, one `IncomingMessage`
    /// per push event.
    pub async fn connect(
        cfg: &SlackConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<IncomingMessage>)> {
        info!("slack: connecting (socket mode)");
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = SlackClientHyperHttpsConnector::new()
            .context("failed to create slack hyper connector")?;
        let client: Arc<SlackClient<SlackClientHyperHttpsConnector>> =
            Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(cfg.bot_token.clone()));
        let app_token = SlackApiToken::new(SlackApiTokenValue(cfg.app_token.clone()));

        let env = Arc::new(
            SlackClientEventsListenerEnvironment::new(client.clone())
                .with_user_state(SlackBridge { tx }),
        );

        let callbacks = SlackSocketModeListenerCallbacks::new()
            .with_push_events(push_events_callback::<SlackClientHyperHttpsConnector>);

        let socket_mode_config = SlackClientSocketModeConfig::new();
        let socket_mode_listener =
            SlackClientSocketModeListener::new(&socket_mode_config, env, callbacks);

        socket_mode_listener
            .listen_for(&app_token)
            .await
            .context("failed to register socket mode listener")?;
        info!("slack: socket mode listener registered");

        tokio::spawn(async move {
            socket_mode_listener.start().await;
            tracing::warn!("slack: socket mode listener stopped");
        });

        Ok((SlackAdapter { client, bot_token }, rx))
    }

    /// Resolve the bot's own user id via `auth.test`.
    pub async fn bot_user_id(&self) -> Result<String> {
        let session = self.client.open_session(&self.bot_token);
        let resp = session
            .auth_test()
            .await
            .context("auth.test call failed")?;
        Ok(resp.user_id.to_string())
    }

    /// Return `true` when the bot already posted into the given thread.
    /// Used by the strict channel-eligibility policy for thread replies
    /// without a direct mention.
    pub async fn bot_participated_in_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        bot_user_id: &str,
    ) -> Result<bool> {
        let session = self.client.open_session(&self.bot_token);
        let req = SlackApiConversationsRepliesRequest::new(
            SlackChannelId(channel.to_string()),
            SlackTs(thread_ts.to_string()),
        );
        let resp = session
            .conversations_replies(&req)
            .await
            .context("conversations.replies call failed")?;

        Ok(resp.messages.iter().any(|m| {
            m.sender
                .user
                .as_ref()
                .map(|u| u.to_string() == bot_user_id)
                .unwrap_or(false)
        }))
    }

    /// Post a reply, anchored into the originating thread.
    pub async fn post_reply(&self, reply: &OutgoingMessage) -> Result<()> {
        debug!(
            channel = %reply.channel,
            thread = %reply.thread_ts,
            blocks = reply.blocks.len(),
            "slack: posting reply"
        );
        let session = self.client.open_session(&self.bot_token);

        let content = SlackMessageContent::new()
            .with_text(reply.text.clone())
            .with_blocks(crate::send::section_blocks(&reply.blocks));

        let mut req =
            SlackApiChatPostMessageRequest::new(SlackChannelId(reply.channel.clone()), content);
        req.thread_ts = Some(SlackTs(reply.thread_ts.clone()));

        session
            .chat_post_message(&req)
            .await
            .context("chat.postMessage call failed")?;
        Ok(())
    }
}

async fn push_events_callback<SCHC>(
    event: SlackPushEventCallback,
    _client: Arc<SlackClient<SCHC>>,
    state: SlackClientEventsUserState,
) -> UserCallbackResult<()>
where
    SCHC: SlackClientHttpConnector + Send + Sync + 'static,
{
    let bridge = {
        let guard = state.read().await;
        guard
            .get_user_state::<SlackBridge>()
            .cloned()
            .ok_or("missing slack bridge")?
    };

    if let SlackEventCallbackBody::Message(message) = event.event {
        if let Some(incoming) = map_message_event(message) {
            debug!(
                channel = %incoming.channel,
                kind = %incoming.kind,
                thread = incoming.thread_ts.as_deref().unwrap_or("-"),
                files = incoming.files.len(),
                "slack: message event -> incoming"
            );
            let _ = bridge.tx.send(incoming);
        }
    }

    Ok(())
}

/// Map a wire `message` event to the core snapshot. The core consumes
/// exactly text / channel / channel_type / ts / thread_ts / bot_id /
/// files and nothing else.
fn map_message_event(message: SlackMessageEvent) -> Option<IncomingMessage> {
    let channel = message.origin.channel.as_ref()?.to_string();
    let kind = message
        .origin
        .channel_type
        .as_ref()
        .map(|t| ChannelKind::from_wire(&t.to_string()))
        .unwrap_or(ChannelKind::Other);

    let text = message
        .content
        .as_ref()
        .and_then(|c| c.text.clone())
        .unwrap_or_default();

    let files = message
        .content
        .as_ref()
        .and_then(|c| c.files.as_ref())
        .map(|files| files.iter().filter_map(map_file).collect())
        .unwrap_or_default();

    Some(IncomingMessage {
        text,
        channel,
        kind,
        ts: message.origin.ts.to_string(),
        thread_ts: message.origin.thread_ts.as_ref().map(|ts| ts.to_string()),
        sender_is_bot: message.sender.bot_id.is_some(),
        files,
    })
}

fn map_file(file: &SlackFile) -> Option<FileRef> {
    let private_url = file
        .url_private_download
        .as_ref()
        .or(file.url_private.as_ref())?
        .to_string();

    Some(FileRef {
        id: file.id.to_string(),
        name: file.name.clone().unwrap_or_else(|| "file".to_string()),
        mime_type: file
            .mimetype
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        private_url,
    })
}
