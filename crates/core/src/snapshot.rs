//! Server status snapshots.
//!
//! `HttpSnapshotFetcher` turns the status endpoint into a [`ServerSnapshot`].
//! It never fails: every transport or parse problem collapses into
//! [`ServerSnapshot::offline`] so the poller simply skips that cycle.

use crate::config::ServerConfig;
use crate::error::PlayerWatchError;
use crate::staleness;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name used for player records that carry no `name`
pub const UNKNOWN_PLAYER: &str = "Unknown";

/// Point-in-time read of the game server
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerSnapshot {
    pub is_online: bool,
    pub player_count: u64,
    pub players: HashSet<String>,
}

impl ServerSnapshot {
    /// The "offline/unknown" snapshot every failure degrades to
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn online<I, S>(player_count: u64, players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            is_online: true,
            player_count,
            players: players.into_iter().map(Into::into).collect(),
        }
    }

    /// Player names in lexicographic order
    pub fn sorted_players(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.players.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Anything that can produce a snapshot on demand
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Never fails; problems are reported as an offline snapshot
    async fn fetch(&self) -> ServerSnapshot;
}

// ============================================================================
// Response schema
// ============================================================================

/// Top-level status response. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "Data", default)]
    pub data: Option<ServerData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerData {
    #[serde(rename = "lastSeen", default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub clients: Option<u64>,
    #[serde(default)]
    pub players: Option<Vec<PlayerEntry>>,
}

impl ServerData {
    /// `Data: {}` carries nothing usable
    fn is_empty(&self) -> bool {
        self.last_seen.is_none() && self.clients.is_none() && self.players.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerEntry {
    #[serde(default)]
    pub name: Option<String>,
}

impl StatusResponse {
    /// Build a snapshot from a decoded response, judging staleness against `now`
    pub fn into_snapshot(self, now: DateTime<Utc>, staleness_threshold: i64) -> ServerSnapshot {
        let data = match self.data {
            Some(data) if !data.is_empty() => data,
            _ => {
                warn!("No server data found in response");
                return ServerSnapshot::offline();
            }
        };

        let last_seen = data.last_seen.unwrap_or_default();
        if !staleness::is_fresh(&last_seen, now, staleness_threshold) {
            info!(
                last_seen = %last_seen,
                threshold_secs = staleness_threshold,
                "Server appears offline (lastSeen is stale)"
            );
            return ServerSnapshot::offline();
        }

        let players = data
            .players
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.name.unwrap_or_else(|| UNKNOWN_PLAYER.to_string()))
            .collect();

        ServerSnapshot {
            is_online: true,
            player_count: data.clients.unwrap_or(0),
            players,
        }
    }
}

// ============================================================================
// HTTP fetcher
// ============================================================================

#[derive(Debug, Error)]
enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fetches snapshots from the configured status endpoint
pub struct HttpSnapshotFetcher {
    client: reqwest::Client,
    url: String,
    staleness_threshold: i64,
}

impl HttpSnapshotFetcher {
    pub fn new(server: &ServerConfig) -> Result<Self, PlayerWatchError> {
        let url = server.endpoint_url();
        let client = reqwest::Client::builder()
            .timeout(server.fetch_timeout())
            .build()
            .map_err(|e| PlayerWatchError::network_error(&url, e.to_string()))?;

        Ok(Self {
            client,
            url,
            staleness_threshold: server.staleness_threshold_seconds,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch_response(&self) -> Result<StatusResponse, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotFetcher {
    async fn fetch(&self) -> ServerSnapshot {
        match self.fetch_response().await {
            Ok(response) => {
                let snapshot = response.into_snapshot(Utc::now(), self.staleness_threshold);
                debug!(
                    online = snapshot.is_online,
                    players = snapshot.player_count,
                    "Fetched server snapshot"
                );
                snapshot
            }
            Err(e) => {
                warn!(url = %self.url, "Error fetching server data: {}", e);
                ServerSnapshot::offline()
            }
        }
    }
}
