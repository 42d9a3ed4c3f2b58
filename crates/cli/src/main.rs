mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{Cli, Commands};
use playerwatch_channels::{ChannelAdapter, ChannelError, ChannelNotifier, DiscordAdapter};
use playerwatch_core::{
    Config, ConfigValidator, HttpSnapshotFetcher, NotificationFormatter, PollerSettings,
    PresencePoller, PresenceState, ServerSnapshot, SnapshotSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("playerwatch=info,playerwatch_core=info,playerwatch_channels=info,warn")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    // Handle ConfigSample immediately without loading config
    if let Some(Commands::ConfigSample { output }) = &cli.command {
        let path = output
            .clone()
            .unwrap_or_else(|| PathBuf::from("./playerwatch.sample.yaml"));
        Config::sample().save(&path)?;
        println!("✅ Sample config written to {:?}", path);
        return Ok(());
    }

    let config = Config::load(&cli.config_path)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Check => handle_check(&config).await,
        Commands::Preview {
            joined,
            left,
            count,
        } => {
            handle_preview(&config, joined, left, count);
            Ok(())
        }
        Commands::Run => handle_run(config).await,
        Commands::ConfigSample { .. } => Ok(()),
    }
}

async fn handle_check(config: &Config) -> Result<()> {
    ConfigValidator::validate_source(config)?;

    let fetcher = HttpSnapshotFetcher::new(&config.server)?;
    println!("Testing status API connection: {}", fetcher.url());
    print_snapshot_report(&fetcher.fetch().await);
    Ok(())
}

fn handle_preview(config: &Config, joined: Vec<String>, left: Vec<String>, count: u64) {
    let joined: HashSet<String> = joined.into_iter().filter(|n| !n.is_empty()).collect();
    let left: HashSet<String> = left.into_iter().filter(|n| !n.is_empty()).collect();

    if joined.is_empty() && left.is_empty() {
        println!("No joined or left players given; nothing would be sent.");
        return;
    }

    let payload = NotificationFormatter::new(&config.server.code).format(&joined, &left, count);
    println!("{}", payload.to_plain_text());
}

async fn handle_run(config: Config) -> Result<()> {
    for (setting, state) in config.summary() {
        info!("{}: {}", setting, state);
    }
    ConfigValidator::validate_source(&config)?;

    let fetcher = HttpSnapshotFetcher::new(&config.server)?;
    info!("Testing status API connection: {}", fetcher.url());
    preflight(&config, &fetcher).await?;

    let adapter = DiscordAdapter::from_config(&config.discord)?;
    match adapter.health_check().await {
        Ok(true) => {}
        Ok(false) => warn!("Discord adapter reports unhealthy, continuing"),
        Err(e @ ChannelError::AuthenticationFailed { .. }) => {
            return Err(e).context("Discord rejected the bot token");
        }
        Err(e) => warn!("Discord health check failed, continuing: {}", e),
    }
    adapter
        .resolve_target(&config.discord.channel_id)
        .await
        .context("Invalid discord.channel_id")?;

    info!("Monitoring server: {}", config.server.code);

    let poller = PresencePoller::new(
        fetcher,
        ChannelNotifier::with_style(adapter, config.discord.style),
        NotificationFormatter::new(&config.server.code),
        PollerSettings {
            channel_id: config.discord.channel_id.clone(),
            interval: config.poller.interval(),
            send_timeout: config.discord.send_timeout(),
        },
    );

    let state = poller.run_until(PresenceState::new(), shutdown_signal()).await;
    info!(tracked_players = state.players().len(), "Shut down");
    Ok(())
}

/// Test fetch and report, then the full validation. The report is printed even
/// when the Discord settings are incomplete.
async fn preflight<S: SnapshotSource>(config: &Config, source: &S) -> Result<ServerSnapshot> {
    let snapshot = source.fetch().await;
    print_snapshot_report(&snapshot);
    ConfigValidator::validate(config)?;
    Ok(snapshot)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c, running until killed: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received ctrl-c, shutting down");
}

fn print_snapshot_report(snapshot: &ServerSnapshot) {
    if snapshot.is_online {
        println!("✓ API connected successfully!");
        println!("✓ Server is online with {} players", snapshot.player_count);
        println!("✓ Player names: {:?}", snapshot.sorted_players());
    } else {
        println!("⚠ Could not connect to server or server is offline");
        println!("Updates will not be sent until the server is online");
    }
}
