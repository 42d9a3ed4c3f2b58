// Discord Platform Adapter
//
// Sends notifications to a Discord channel through the REST API (twilight-http).
// No gateway connection is opened; posting messages only needs the bot token.

use crate::adapter::{ChannelAdapter, ChannelError, Embed, MessageContent, MessageTarget};
use async_trait::async_trait;
use std::sync::Arc;
use twilight_http::Client as HttpClient;
use twilight_model::channel::message::embed::{
    Embed as TwilightEmbed, EmbedField as TwilightEmbedField, EmbedFooter,
};
use twilight_model::id::{marker::ChannelMarker, Id};

/// Discord message length limit
pub const MESSAGE_LIMIT: usize = 2000;
/// Discord embed field value limit
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// Discord adapter configuration
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Bot token
    pub bot_token: String,

    /// Message character limit
    pub message_limit: usize,
}

impl DiscordConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            message_limit: MESSAGE_LIMIT,
        }
    }
}

/// Discord adapter
pub struct DiscordAdapter {
    config: DiscordConfig,
    http: Arc<HttpClient>,
}

impl DiscordAdapter {
    /// Create new Discord adapter
    pub fn new(config: DiscordConfig) -> Self {
        let http = HttpClient::new(config.bot_token.clone());
        Self {
            config,
            http: Arc::new(http),
        }
    }

    /// Create from the application config (token already resolved from file or env)
    pub fn from_config(config: &playerwatch_core::DiscordConfig) -> Result<Self, ChannelError> {
        let bot_token = config
            .token()
            .ok_or_else(|| ChannelError::AuthenticationFailed {
                platform: "discord".to_string(),
                reason: "bot token not set".to_string(),
            })?;

        Ok(Self::new(DiscordConfig::new(bot_token)))
    }

    /// Split message into chunks if too long
    pub fn chunk_message(message: &str, limit: usize) -> Vec<String> {
        if message.chars().count() <= limit {
            return vec![message.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for line in message.lines() {
            if current.chars().count() + line.chars().count() + 1 > limit {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                current = line.chars().take(limit).collect();
            } else {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(line);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Parse channel ID from various formats
    pub fn parse_channel_id(identifier: &str) -> Result<Id<ChannelMarker>, ChannelError> {
        let invalid = |reason: &str| ChannelError::ResolveFailed {
            identifier: identifier.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = identifier.trim();
        let id_str = if trimmed.starts_with("<#") && trimmed.ends_with('>') {
            // Channel mention <#123456789>
            trimmed.trim_start_matches("<#").trim_end_matches('>')
        } else {
            trimmed
        };

        if id_str.is_empty() || id_str.len() > 20 || !id_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("Invalid snowflake ID"));
        }

        let raw = id_str
            .parse::<u64>()
            .map_err(|_| invalid("Invalid snowflake ID"))?;
        Id::new_checked(raw).ok_or_else(|| invalid("Snowflake ID cannot be zero"))
    }

    /// Convert a platform-neutral embed into Discord's model
    pub fn to_discord_embed(embed: &Embed) -> TwilightEmbed {
        TwilightEmbed {
            author: None,
            color: embed.color,
            description: embed.description.clone(),
            fields: embed
                .fields
                .iter()
                .map(|field| TwilightEmbedField {
                    inline: field.inline,
                    name: field.name.clone(),
                    value: truncate_field_value(&field.value, FIELD_VALUE_LIMIT),
                })
                .collect(),
            footer: embed.footer.as_ref().map(|text| EmbedFooter {
                icon_url: None,
                proxy_icon_url: None,
                text: text.clone(),
            }),
            image: None,
            kind: "rich".to_string(),
            provider: None,
            thumbnail: None,
            timestamp: None,
            title: embed.title.clone(),
            url: None,
            video: None,
        }
    }
}

/// Keep whole lines up to `limit` chars, then note how many lines were dropped
fn truncate_field_value(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }

    let lines: Vec<&str> = value.lines().collect();
    let mut kept = String::new();
    let mut used = 0;

    for (index, line) in lines.iter().enumerate() {
        let remaining = lines.len() - index;
        // room for "\n…and N more"
        let suffix_len = format!("\n…and {} more", remaining).chars().count();
        let line_len = line.chars().count() + usize::from(!kept.is_empty());
        if used + line_len + suffix_len > limit {
            if !kept.is_empty() {
                kept.push('\n');
            }
            kept.push_str(&format!("…and {} more", remaining));
            return kept;
        }
        if !kept.is_empty() {
            kept.push('\n');
        }
        kept.push_str(line);
        used += line_len;
    }

    kept
}

#[async_trait]
impl ChannelAdapter for DiscordAdapter {
    fn platform_name(&self) -> &str {
        "discord"
    }

    async fn send_message(
        &self,
        target: MessageTarget,
        content: MessageContent,
    ) -> Result<(), ChannelError> {
        let MessageTarget::Channel(channel_id) = &target;
        let id = Self::parse_channel_id(channel_id)?;

        if content.is_empty() {
            return Err(ChannelError::SendFailed {
                target,
                reason: "Message content is empty".to_string(),
            });
        }

        if !content.embeds.is_empty() {
            let embeds: Vec<TwilightEmbed> =
                content.embeds.iter().map(Self::to_discord_embed).collect();
            let text = content.text.as_deref().unwrap_or_default();

            let mut request = self.http.create_message(id).embeds(&embeds);
            if !text.is_empty() {
                request = request.content(text);
            }
            request.await.map_err(|e| ChannelError::SendFailed {
                target: target.clone(),
                reason: format!("HTTP error: {}", e),
            })?;

            tracing::info!(
                "Discord send_message: target={:?}, embeds={}",
                target,
                embeds.len()
            );
            return Ok(());
        }

        let text = content.text.as_deref().unwrap_or_default();
        let chunks = Self::chunk_message(text, self.config.message_limit);
        let chunk_count = chunks.len();

        for chunk in &chunks {
            self.http
                .create_message(id)
                .content(chunk)
                .await
                .map_err(|e| ChannelError::SendFailed {
                    target: target.clone(),
                    reason: format!("HTTP error: {}", e),
                })?;

            tracing::debug!("Sent message chunk to Discord channel {}", id);
        }

        tracing::info!(
            "Discord send_message: target={:?}, chunks={}",
            target,
            chunk_count
        );

        Ok(())
    }

    async fn resolve_target(&self, identifier: &str) -> Result<MessageTarget, ChannelError> {
        let id = Self::parse_channel_id(identifier)?;
        Ok(MessageTarget::Channel(id.get().to_string()))
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        if self.config.bot_token.trim().is_empty() {
            return Ok(false);
        }

        let response = self.http.current_user().await.map_err(|e| {
            let reason = e.to_string();
            let lowered = reason.to_lowercase();
            if lowered.contains("401") || lowered.contains("unauthorized") {
                tracing::error!("❌ Discord Bot Token is invalid or expired!");
                return ChannelError::AuthenticationFailed {
                    platform: "discord".to_string(),
                    reason,
                };
            }
            ChannelError::HealthCheckFailed {
                platform: "discord".to_string(),
                reason,
            }
        })?;

        let user = response
            .model()
            .await
            .map_err(|e| ChannelError::HealthCheckFailed {
                platform: "discord".to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!("Discord bot authenticated as {}", user.name);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::EmbedField;

    #[test]
    fn parses_raw_and_mention_ids() {
        assert_eq!(
            DiscordAdapter::parse_channel_id("123456789012345678")
                .unwrap()
                .get(),
            123456789012345678
        );
        assert_eq!(
            DiscordAdapter::parse_channel_id("<#987654321>").unwrap().get(),
            987654321
        );
    }

    #[test]
    fn rejects_bad_ids() {
        assert!(DiscordAdapter::parse_channel_id("general").is_err());
        assert!(DiscordAdapter::parse_channel_id("").is_err());
        assert!(DiscordAdapter::parse_channel_id("0").is_err());
        assert!(DiscordAdapter::parse_channel_id("<#>").is_err());
        assert!(DiscordAdapter::parse_channel_id("99999999999999999999999").is_err());
    }

    #[test]
    fn chunks_long_messages_on_line_boundaries() {
        let message = "aaaa\nbbbb\ncccc";
        assert_eq!(DiscordAdapter::chunk_message(message, 100), vec![message]);
        assert_eq!(
            DiscordAdapter::chunk_message(message, 9),
            vec!["aaaa\nbbbb", "cccc"]
        );
    }

    #[test]
    fn converts_embed_fields_and_footer() {
        let embed = Embed {
            title: Some("Title".to_string()),
            description: Some("desc".to_string()),
            color: Some(0x2ECC71),
            fields: vec![EmbedField {
                name: "Joined (1)".to_string(),
                value: "• Carol".to_string(),
                inline: false,
            }],
            footer: Some("Server: abc123".to_string()),
        };

        let converted = DiscordAdapter::to_discord_embed(&embed);
        assert_eq!(converted.kind, "rich");
        assert_eq!(converted.title.as_deref(), Some("Title"));
        assert_eq!(converted.color, Some(0x2ECC71));
        assert_eq!(converted.fields.len(), 1);
        assert_eq!(converted.fields[0].value, "• Carol");
        assert!(!converted.fields[0].inline);
        assert_eq!(
            converted.footer.map(|f| f.text),
            Some("Server: abc123".to_string())
        );
    }

    #[test]
    fn long_field_values_are_truncated() {
        let value = (0..300)
            .map(|i| format!("• Player{:03}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let truncated = truncate_field_value(&value, FIELD_VALUE_LIMIT);

        assert!(truncated.chars().count() <= FIELD_VALUE_LIMIT);
        assert!(truncated.starts_with("• Player000\n• Player001"));
        assert!(truncated.contains("more"));
        assert_eq!(truncate_field_value("• short", FIELD_VALUE_LIMIT), "• short");
    }

    #[tokio::test]
    async fn empty_content_is_rejected_before_sending() {
        let adapter = DiscordAdapter::new(DiscordConfig::new("token"));
        let result = adapter
            .send_message(
                MessageTarget::Channel("42".to_string()),
                MessageContent::text(""),
            )
            .await;
        assert!(matches!(result, Err(ChannelError::SendFailed { .. })));
    }

    #[test]
    fn plain_text_notification_fits_after_chunking() {
        let text = (0..400)
            .map(|i| format!("• Player{:03}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = DiscordAdapter::chunk_message(&text, MESSAGE_LIMIT);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MESSAGE_LIMIT));
        assert_eq!(chunks.join("\n"), text);
    }

    #[tokio::test]
    async fn resolve_target_normalizes_mentions() {
        let adapter = DiscordAdapter::new(DiscordConfig::new("token"));
        assert_eq!(
            adapter.resolve_target("<#42>").await.unwrap(),
            MessageTarget::Channel("42".to_string())
        );
    }
}
