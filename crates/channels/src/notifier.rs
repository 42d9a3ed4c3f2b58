// Channel Notifier
//
// Lets any channel adapter act as the poller's notifier by rendering the
// notification payload as a single rich embed, or as plain text.

use crate::adapter::{ChannelAdapter, Embed, EmbedField, MessageContent};
use async_trait::async_trait;
use playerwatch_core::{NotificationPayload, Notifier, NotifyStyle, PlayerWatchError};

/// Render a payload as a platform-neutral embed
pub fn payload_to_embed(payload: &NotificationPayload) -> Embed {
    Embed {
        title: Some(payload.title.clone()),
        description: Some(payload.description.clone()),
        color: Some(payload.emphasis.color()),
        fields: payload
            .sections
            .iter()
            .map(|section| EmbedField {
                name: section.name.clone(),
                value: section.value.clone(),
                inline: false,
            })
            .collect(),
        footer: Some(payload.footer.clone()),
    }
}

/// Notifier backed by a channel adapter
pub struct ChannelNotifier<A> {
    adapter: A,
    style: NotifyStyle,
}

impl<A: ChannelAdapter> ChannelNotifier<A> {
    pub fn new(adapter: A) -> Self {
        Self::with_style(adapter, NotifyStyle::Embed)
    }

    pub fn with_style(adapter: A, style: NotifyStyle) -> Self {
        Self { adapter, style }
    }

    fn render(&self, payload: &NotificationPayload) -> MessageContent {
        match self.style {
            NotifyStyle::Embed => MessageContent::embed(payload_to_embed(payload)),
            NotifyStyle::Text => MessageContent::text(payload.to_plain_text()),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}

#[async_trait]
impl<A: ChannelAdapter> Notifier for ChannelNotifier<A> {
    async fn notify(
        &self,
        channel_id: &str,
        payload: &NotificationPayload,
    ) -> Result<(), PlayerWatchError> {
        let to_error = |e: crate::adapter::ChannelError| {
            PlayerWatchError::notify_error(
                format!("{}:{}", self.adapter.platform_name(), channel_id),
                e.to_string(),
            )
        };

        let target = self
            .adapter
            .resolve_target(channel_id)
            .await
            .map_err(to_error)?;

        self.adapter
            .send_message(target, self.render(payload))
            .await
            .map_err(to_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ChannelError, MessageTarget};
    use playerwatch_core::NotificationFormatter;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryAdapter {
        sent: Mutex<Vec<(MessageTarget, MessageContent)>>,
        reject: bool,
    }

    #[async_trait]
    impl ChannelAdapter for MemoryAdapter {
        fn platform_name(&self) -> &str {
            "memory"
        }

        async fn send_message(
            &self,
            target: MessageTarget,
            content: MessageContent,
        ) -> Result<(), ChannelError> {
            if self.reject {
                return Err(ChannelError::SendFailed {
                    target,
                    reason: "rejected".to_string(),
                });
            }
            self.sent.lock().unwrap().push((target, content));
            Ok(())
        }

        async fn resolve_target(&self, identifier: &str) -> Result<MessageTarget, ChannelError> {
            Ok(MessageTarget::Channel(identifier.to_string()))
        }

        async fn health_check(&self) -> Result<bool, ChannelError> {
            Ok(true)
        }
    }

    fn payload() -> NotificationPayload {
        let joined: HashSet<String> = ["Carol".to_string()].into();
        let left: HashSet<String> = ["Alice".to_string()].into();
        NotificationFormatter::new("abc123").format(&joined, &left, 2)
    }

    #[test]
    fn embed_mirrors_payload() {
        let payload = payload();
        let embed = payload_to_embed(&payload);

        assert_eq!(embed.title.as_deref(), Some(payload.title.as_str()));
        assert_eq!(embed.color, Some(0x2ECC71));
        assert_eq!(embed.footer.as_deref(), Some("Server: abc123"));
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["✅ Joined (1)", "🚪 Left (1)", "📊 Current Status"]);
        assert!(embed.fields.iter().all(|f| !f.inline));
    }

    #[tokio::test]
    async fn notify_sends_one_embed_to_channel() {
        let notifier = ChannelNotifier::new(MemoryAdapter::default());
        notifier.notify("42", &payload()).await.expect("notify");

        let sent = notifier.adapter().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, MessageTarget::Channel("42".to_string()));
        assert_eq!(sent[0].1.embeds.len(), 1);
        assert!(sent[0].1.text.is_none());
    }

    #[tokio::test]
    async fn text_style_sends_plain_text() {
        let notifier = ChannelNotifier::with_style(MemoryAdapter::default(), NotifyStyle::Text);
        let payload = payload();
        notifier.notify("42", &payload).await.expect("notify");

        let sent = notifier.adapter().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.embeds.is_empty());
        let text = sent[0].1.text.as_deref().expect("text body");
        assert_eq!(text, payload.to_plain_text());
        assert!(text.contains("Carol"));
        assert!(text.contains("Alice"));
    }

    #[tokio::test]
    async fn adapter_errors_become_notify_errors() {
        let notifier = ChannelNotifier::new(MemoryAdapter {
            reject: true,
            ..Default::default()
        });
        let err = notifier.notify("42", &payload()).await.unwrap_err();
        assert!(err.to_string().contains("memory:42"));
        assert!(err.to_string().contains("rejected"));
    }
}
