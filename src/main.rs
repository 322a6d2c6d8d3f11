pub mod config;
pub mod mqtt;
pub mod ui;

use crate::config::AppConfig;
use crate::mqtt::{
    BrokerClientFactory, ColorSelection, Credentials, ReportSink, SessionLauncher, SessionOutcome,
};
use crate::ui::StrudelUI;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Log filter used when `RUST_LOG` is unset. rumqttc logs every packet at
/// debug, so it is held to warnings.
const DEFAULT_LOG_FILTER: &str = "strudel_remote=info,rumqttc=warn,eframe=warn";

/// Pick a color and send it to the strip over MQTT
#[derive(Parser, Debug)]
#[command(name = "strudel-remote", version)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the color picker window (default)
    Ui,
    /// Publish a single color and exit
    Publish {
        /// Color name; "gray" sends "random"
        #[arg(long)]
        color: String,
        #[arg(long, default_value = "")]
        user: String,
        #[arg(long, env = "STRUDEL_MQTT_PASSWORD", default_value = "", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let cli = Cli::parse();

    let config = AppConfig::load_or_init(cli.config).await?;
    info!("Using broker {} (topic {})", config.broker, config.broker.topic);

    let factory = Arc::new(BrokerClientFactory::new(config.broker.clone()));

    match cli.command.unwrap_or(Command::Ui) {
        Command::Publish {
            color,
            user,
            password,
        } => {
            let color = ColorSelection::from_swatch(&color)?;
            let launcher = SessionLauncher::new(factory, &config.broker, ReportSink::log_only());
            let report = launcher
                .begin(color, Credentials::new(user, password))
                .await
                .map_err(|e| eyre!("Session task failed: {}", e))?;

            match report.outcome {
                SessionOutcome::Published => Ok(()),
                SessionOutcome::Failed(e) => Err(e.into()),
            }
        }
        Command::Ui => run_ui(config, factory),
    }
}

fn run_ui(config: AppConfig, factory: Arc<BrokerClientFactory>) -> Result<()> {
    let (report_tx, report_rx) = mpsc::channel(100);
    let launcher =
        SessionLauncher::new(factory, &config.broker, ReportSink::with_channel(report_tx));
    let runtime = tokio::runtime::Handle::current();

    info!("Starting color picker UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("Strudel")
        .with_fullscreen(config.ui.fullscreen);

    eframe::run_native(
        "Strudel",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(StrudelUI::new(
                cc,
                launcher,
                runtime,
                report_rx,
                config.broker.clone(),
                &config.ui,
            )))
        }),
    )
    .map_err(|e| eyre!("UI terminated with error: {}", e))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env(std::env::var("RUST_LOG").ok());
    Ok(())
}

/// Directives from `RUST_LOG`, or the crate default when unset or blank.
fn log_directives(env: Option<String>) -> String {
    env.filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn setup_logging_env(env: Option<String>) {
    let directives = log_directives(env);
    let (filter, rejected) = match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_LOG_FILTER), Some(e)),
    };

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    if let Some(e) = rejected {
        warn!("Ignoring RUST_LOG '{}': {}", directives, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_arguments_parse() {
        let cli = Cli::try_parse_from([
            "strudel-remote",
            "publish",
            "--color",
            "gray",
            "--user",
            "strudel",
            "--password",
            "pw",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Publish {
                color,
                user,
                password,
            }) => {
                assert_eq!(color, "gray");
                assert_eq!(user, "strudel");
                assert_eq!(password, "pw");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn log_filter_defaults_to_crate_level() {
        assert_eq!(log_directives(None), DEFAULT_LOG_FILTER);
        assert_eq!(log_directives(Some("  ".to_string())), DEFAULT_LOG_FILTER);
        assert_eq!(
            log_directives(Some("rumqttc=trace".to_string())),
            "rumqttc=trace"
        );
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn ui_is_the_default() {
        let cli = Cli::try_parse_from(["strudel-remote", "--config", "/tmp/strudel.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/strudel.toml")));
    }
}
