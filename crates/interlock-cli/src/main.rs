//! `interlockd`: badge-controlled power interlock daemon.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use interlock_controller::{AccessController, ControllerSettings, SessionEvent};
use interlock_core::InterlockConfig;
use interlock_hardware::devices::AnyStopSignal;
use interlock_hardware::gpio::{GpioInput, GpioRelay};
use interlock_hardware::iio::IioAnalogInput;
use interlock_hardware::serial::SerialBadgeReader;
use interlock_hardware::{ActiveLevel, BadgeDecoder, DebouncedStopButton, PeakCurrentSensor};
use interlock_network::{AuthClient, AuthClientConfig};

/// Log level for the daemon
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// interlockd command line arguments
#[derive(Parser, Debug)]
#[command(name = "interlockd")]
#[command(version, about = "Badge-controlled power interlock for shop tools", long_about = None)]
struct CliArgs {
    /// Configuration file (TOML); built-in defaults apply without one
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Validate the configuration, print the effective settings and exit
    #[arg(long)]
    check_config: bool,

    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_level, args.verbose);

    tracing::info!("Starting interlockd v{}", interlock_core::VERSION);

    let config = load_config(args.config.as_ref())?;
    if args.check_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    run(config).await
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<InterlockConfig> {
    let config = match path {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            InterlockConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            InterlockConfig::default()
        }
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

async fn run(config: InterlockConfig) -> anyhow::Result<()> {
    // Relay first, so the tool is held off before anything else can fail.
    let relay = GpioRelay::open(
        &config.relay.chip,
        config.relay.line,
        ActiveLevel::from_active_low(config.relay.active_low),
    )
    .context("relay")?;

    let reader = SerialBadgeReader::open(
        &config.reader.device,
        config.reader.baud_rate,
        ActiveLevel::from_active_low(config.reader.enable_active_low),
    )
    .context("badge reader")?;
    let decoder = BadgeDecoder::new(
        reader,
        config.timing.reader_quiet(),
        config.timing.frame_assembly_timeout(),
    );

    let sensor = PeakCurrentSensor::new(
        IioAnalogInput::new(&config.sensor.sample_path),
        config.sensor.threshold,
        config.sensor.window,
        config.sensor.sample_interval(),
    );
    tracing::info!(
        path = %config.sensor.sample_path.display(),
        threshold = sensor.threshold(),
        "Current sensor configured"
    );

    let stop = if config.stop_button.enabled {
        let input = GpioInput::open(
            &config.stop_button.chip,
            config.stop_button.line,
            ActiveLevel::from_active_low(config.stop_button.active_low),
        )
        .context("stop button")?;
        AnyStopSignal::Gpio(DebouncedStopButton::new(input, config.stop_button.debounce()))
    } else {
        tracing::warn!("Stop button disabled, sessions end only on idle expiry");
        AnyStopSignal::Disabled
    };

    let transport = AuthClient::new(AuthClientConfig::from_config(&config));

    let mut controller = AccessController::new(
        decoder,
        sensor,
        stop,
        relay,
        transport,
        ControllerSettings::from_config(&config),
    );

    let mut interval = tokio::time::interval(config.timing.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown_signal = tokio::signal::ctrl_c();
    tokio::pin!(shutdown_signal);

    tracing::info!(
        tool = %config.server.tool_id,
        server = %config.server.host,
        "Interlock ready"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for event in controller.tick().await {
                    log_event(&event);
                }
            }
            result = &mut shutdown_signal => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for shutdown signal: {}", e);
                }
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    for event in controller.shutdown().await {
        log_event(&event);
    }
    tracing::info!("Interlock stopped, power off");
    Ok(())
}

fn log_event(event: &SessionEvent) {
    tracing::debug!(?event, "Session event");
}

/// Initialize logging with tracing
fn init_logging(level: LogLevel, verbose_count: u8) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let filter = match effective_level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Verbose => "info,interlock_controller=debug,interlockd=debug",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_verbose_count() {
        let args = CliArgs::parse_from(["interlockd", "-vv", "--config", "/etc/interlock.toml"]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, Some(PathBuf::from("/etc/interlock.toml")));
        assert!(!args.check_config);
    }

    #[test]
    fn test_defaults_validate() {
        let config = load_config(None).unwrap();
        assert!(config.stop_button.enabled);
    }
}
