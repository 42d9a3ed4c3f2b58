pub mod config;
pub mod error;
pub mod notification;
pub mod poller;
pub mod presence;
pub mod snapshot;
pub mod staleness;

// Re-export commonly used types
pub use config::{
    Config, ConfigLoader, ConfigValidator, DiscordConfig, NotifyStyle, PollerConfig, ServerConfig,
};
pub use error::{DomainError, InfraError, PlayerWatchError};
pub use notification::{Emphasis, NotificationFormatter, NotificationPayload, PayloadSection};
pub use poller::{Notifier, PollOutcome, PollerSettings, PresencePoller};
pub use presence::{PresenceDiff, PresenceState, Transition};
pub use snapshot::{HttpSnapshotFetcher, ServerSnapshot, SnapshotSource};
