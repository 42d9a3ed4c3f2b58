// Channel Adapter Interface
//
// Defines the interface the notifier uses to reach a messaging platform.

use async_trait::async_trait;
use thiserror::Error;

/// Message target (where to send)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    Channel(String),
}

/// Message content
#[derive(Debug, Clone, Default)]
pub struct MessageContent {
    pub text: Option<String>,
    pub embeds: Vec<Embed>,
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            text: None,
            embeds: vec![embed],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, str::is_empty) && self.embeds.is_empty()
    }
}

/// Rich embed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

/// Named block inside an embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Unified channel adapter trait
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Platform name (e.g., "discord")
    fn platform_name(&self) -> &str;

    /// Send message to target
    async fn send_message(
        &self,
        target: MessageTarget,
        content: MessageContent,
    ) -> Result<(), ChannelError>;

    /// Resolve identifier to target
    async fn resolve_target(&self, identifier: &str) -> Result<MessageTarget, ChannelError>;

    /// Check if adapter is healthy
    async fn health_check(&self) -> Result<bool, ChannelError>;
}

/// Channel error type
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Send failed to {target:?}: {reason}")]
    SendFailed { target: MessageTarget, reason: String },

    #[error("Resolve failed for {identifier}: {reason}")]
    ResolveFailed { identifier: String, reason: String },

    #[error("Health check failed for {platform}: {reason}")]
    HealthCheckFailed { platform: String, reason: String },

    #[error("Authentication failed for {platform}: {reason}")]
    AuthenticationFailed { platform: String, reason: String },
}
