// Channel Adapters for Message Platforms
//
// This crate implements the Discord adapter and the bridge that lets a
// channel adapter deliver player activity notifications.

pub mod adapter;
pub mod notifier;
pub mod platforms;

pub use adapter::{
    ChannelAdapter, ChannelError, Embed, EmbedField, MessageContent, MessageTarget,
};
pub use notifier::{payload_to_embed, ChannelNotifier};
pub use platforms::discord::DiscordAdapter;
