//! Vigil - hard-to-miss alerts for time-sensitive items.
//!
//! This is the console front end of the alert engine. It loads alert items
//! from a JSON file, presents them on a simulated display topology and reads
//! user input from stdin.
//!
//! # Configuration
//!
//! Create a `config.yaml` file (see [`vigil::config`] for every key):
//!
//! ```yaml
//! alerts:
//!   max_snooze_attempts: 3
//!   monitor_preference: all_monitors
//!
//! displays:
//!   - id: 1
//!     bounds: { x: 0, y: 0, width: 1920, height: 1080 }
//!     is_primary: true
//! ```
//!
//! Any value can be overridden with `VIGIL_` environment variables, e.g.
//! `VIGIL_ALERTS__MAX_SNOOZE_ATTEMPTS=5`.
//!
//! # Usage
//!
//! ```bash
//! vigil --config config.yaml --items items.json
//! ```
//!
//! # Commands
//!
//! - `show <id>` - Present an item
//! - `action` - Press the action button of the alert on screen
//! - `dismiss` - Close the alert on screen
//! - `snooze [secs]` - Snooze the alert on screen
//! - `sleep` / `wake` - Simulate host sleep and wake
//! - `unplug <display-id>` - Disconnect a display
//! - `status` - Print the engine state
//! - `quit` - Exit
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, error::ErrorKind};
use env_logger::Env;
use futures::future::{BoxFuture, FutureExt};
use log::{debug, error, info, warn};
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use vigil::{
    alerts::{
        AlertDelegate, AlertEngine, AlertItem, DismissalReason, ItemLoader, RecoveryGuard,
        StatProperties,
    },
    config::Config,
    displays::{DisplayId, StaticDisplays},
    platform::{ConsoleRenderer, ConsoleSoundPlayer, HostMonitor, HostSignal, SurfaceCallbacks},
};

/// Command-line arguments.
///
/// # Examples
///
/// ```bash
/// vigil --config config.yaml --items items.json
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,

    /// Path to the JSON file holding the alert items.
    #[arg(short, long)]
    items: String,
}

/// A line typed on stdin, parsed like a command line without binary name.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

/// Commands accepted on stdin.
#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Present an item
    Show { id: String },
    /// Press the action button of the alert on screen
    Action,
    /// Close the alert on screen
    Dismiss,
    /// Snooze the alert on screen, for the default duration without `secs`
    Snooze { secs: Option<u64> },
    /// Simulate the host going to sleep
    Sleep,
    /// Simulate the host waking up
    Wake,
    /// Disconnect a display
    Unplug { display: DisplayId },
    /// Print the engine state
    Status,
    /// Exit
    #[command(alias = "exit")]
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Command, clap::Error> {
        Line::try_parse_from(line.split_whitespace()).map(|line| line.command)
    }
}

/// Delegate logging the lifecycle.
///
/// Snoozed items that already ended are not presented again.
struct LoggingDelegate;

impl AlertDelegate for LoggingDelegate {
    fn on_did_show(&self, item: &AlertItem) {
        info!("showing {} ({})", item.title, item.countdown(Utc::now()));
    }

    fn on_did_dismiss(&self, item: &AlertItem, reason: DismissalReason) {
        info!("{} closed: {}", item.title, reason.as_str());
    }

    fn on_action_tapped(&self, item: &AlertItem) {
        match &item.action_url {
            Some(url) => info!("opening {}", url),
            None => info!("{} has no action url", item.title),
        }
    }

    fn on_snoozed(&self, item: &AlertItem, duration: Duration) {
        info!("{} back in {}s", item.title, duration.as_secs());
    }

    fn on_track_stat(&self, event: &str, properties: &StatProperties) {
        debug!("stat {} {}", event, serde_json::Value::Object(properties.clone()));
    }

    fn should_show(&self, item: &AlertItem) -> BoxFuture<'static, bool> {
        let still_relevant = Utc::now() < item.end_time;
        async move { still_relevant }.boxed()
    }
}

/// Main entry point.
///
/// 1. **Logging Setup**: `info` level by default, overridable with `RUST_LOG`
/// 2. **Configuration Loading**: YAML file with `VIGIL_` overrides
/// 3. **Engine Setup**: console renderer, terminal bell, static displays
/// 4. **Command Loop**: reads commands from stdin until `quit` or EOF
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting vigil {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    if let Err(e) = run(config, &args.items).await {
        error!("{:#}", e);
    }
}

async fn run(config: Config, items_path: &str) -> anyhow::Result<()> {
    let items = ItemLoader::new(items_path.to_string()).load().await;

    let renderer = ConsoleRenderer::new();
    let displays = Arc::new(StaticDisplays::new(config.displays.clone()));
    let recovery = RecoveryGuard::new();
    let engine = AlertEngine::new(
        config.alerts.engine_config(),
        Arc::new(renderer.clone()),
        Arc::new(ConsoleSoundPlayer),
        displays.clone(),
        recovery.clone(),
    );

    let delegate: Arc<dyn AlertDelegate> = Arc::new(LoggingDelegate);
    engine.set_delegate(Some(&delegate));

    let (signals, receiver) = mpsc::channel(8);
    let monitor = HostMonitor::new(engine.clone(), recovery, config.alerts.recovery_grace());
    tokio::spawn(monitor.run(receiver));

    if let Err(e) = engine.show_combined(&items) {
        warn!("{}", e);
    }

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                info!("{}", e);
                continue;
            }
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        match command {
            Command::Show { id } => match items.iter().find(|item| item.id == id) {
                Some(item) => {
                    if let Err(e) = engine.present(item.clone()) {
                        warn!("{}", e);
                    }
                }
                None => warn!("no item with id {}", id),
            },
            Command::Action => with_callbacks(&renderer, SurfaceCallbacks::action),
            Command::Dismiss => with_callbacks(&renderer, SurfaceCallbacks::dismiss),
            Command::Snooze { secs } => with_callbacks(&renderer, |callbacks| {
                callbacks.snooze(secs.map(Duration::from_secs))
            }),
            Command::Sleep => signals.send(HostSignal::WillSleep).await?,
            Command::Wake => signals.send(HostSignal::DidWake).await?,
            Command::Unplug { display } => {
                if displays.remove_display(display) {
                    signals.send(HostSignal::DisplaysChanged).await?;
                } else {
                    warn!("no display with id {}", display);
                }
            }
            Command::Status => {
                match engine.current_item() {
                    Some(item) => info!(
                        "showing {} on {} displays",
                        item.id,
                        engine.surface_count()
                    ),
                    None => info!("nothing on screen"),
                }
                for item in &items {
                    let count = engine.snooze_count(&item.id);
                    if count > 0 || engine.has_pending_snooze(&item.id) {
                        info!(
                            "{} snoozed {} times, pending: {}",
                            item.id,
                            count,
                            engine.has_pending_snooze(&item.id)
                        );
                    }
                }
            }
            Command::Quit => break,
        }
    }

    engine.dismiss();
    info!("bye");
    Ok(())
}

/// Acts on the alert on screen like a click on its window.
fn with_callbacks(renderer: &ConsoleRenderer, click: impl FnOnce(&SurfaceCallbacks)) {
    match renderer.last_callbacks() {
        Some(callbacks) => click(&callbacks),
        None => warn!("no alert was shown yet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("show m1").unwrap(),
            Command::Show { id: "m1".into() }
        );
        assert_eq!(Command::parse("action").unwrap(), Command::Action);
        assert_eq!(Command::parse("  dismiss ").unwrap(), Command::Dismiss);
        assert_eq!(
            Command::parse("snooze").unwrap(),
            Command::Snooze { secs: None }
        );
        assert_eq!(
            Command::parse("snooze 90").unwrap(),
            Command::Snooze { secs: Some(90) }
        );
        assert_eq!(
            Command::parse("unplug 2").unwrap(),
            Command::Unplug { display: 2 }
        );
        assert_eq!(Command::parse("sleep").unwrap(), Command::Sleep);
        assert_eq!(Command::parse("wake").unwrap(), Command::Wake);
        assert_eq!(Command::parse("status").unwrap(), Command::Status);
        assert_eq!(Command::parse("quit").unwrap(), Command::Quit);
        assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_invalid_commands() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("show").is_err());
        assert!(Command::parse("snooze soon").is_err());
        assert!(Command::parse("unplug main").is_err());
        assert!(Command::parse("action now").is_err());
        assert!(Command::parse("reboot").is_err());
    }

    #[test]
    fn test_help_is_reported_as_help() {
        let error = Command::parse("help").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DisplayHelp);
    }

    #[tokio::test]
    async fn test_logging_delegate_skips_ended_items() {
        let ended = AlertItem::new("m1", "Standup", Utc::now() - chrono::Duration::hours(2));
        let upcoming = AlertItem::new("m2", "Review", Utc::now() + chrono::Duration::minutes(5));

        assert!(!LoggingDelegate.should_show(&ended).await);
        assert!(LoggingDelegate.should_show(&upcoming).await);
    }
}
