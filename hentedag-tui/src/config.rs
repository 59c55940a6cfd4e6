use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use hentedag_core::PlatformConfig;
use hentedag_provider_oslo::{BASE_URL, FETCH_TIMEOUT};
use log::LevelFilter;
use serde::Deserialize;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Parser)]
#[command(name = "hentedag")]
#[command(about = "Days until the next waste pickup for an Oslo address", long_about = None)]
pub(crate) struct Cli {
    /// Address exactly as printed on the pickup page, e.g. "Storgata 1".
    #[arg(long)]
    address: Option<String>,

    /// Street to search for; defaults to the address.
    #[arg(long)]
    street: Option<String>,

    /// TOML file with the same keys as the flags; flags take precedence.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seconds between polling cycles.
    #[arg(long, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Pickup page to query.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Write logs to this file; logging is off without one.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        help = "Set the logging level"
    )]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    address: Option<String>,
    street: Option<String>,
    poll_interval: Option<u64>,
    timeout: Option<u64>,
    base_url: Option<String>,
    log_file: Option<PathBuf>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Effective settings after merging flags over the config file.
#[derive(Debug)]
pub(crate) struct Settings {
    pub platform: PlatformConfig,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub base_url: String,
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Settings {
    pub(crate) fn load(cli: Cli) -> Result<Self> {
        let file = match cli.config.as_deref() {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: Cli, file: FileConfig) -> Result<Self> {
        let address = cli
            .address
            .or(file.address)
            .map(|address| address.trim().to_owned())
            .filter(|address| !address.is_empty())
            .context("an address is required (--address or `address` in the config file)")?;

        let poll_secs = cli
            .poll_interval
            .or(file.poll_interval)
            .unwrap_or(DEFAULT_POLL_INTERVAL.as_secs());
        if poll_secs == 0 {
            bail!("poll interval must be at least one second");
        }

        let timeout = cli
            .timeout
            .or(file.timeout)
            .map_or(FETCH_TIMEOUT, Duration::from_secs);
        if timeout.is_zero() {
            bail!("timeout must be at least one second");
        }

        Ok(Self {
            platform: PlatformConfig::new(address, cli.street.or(file.street)),
            poll_interval: Duration::from_secs(poll_secs),
            timeout,
            base_url: cli
                .base_url
                .or(file.base_url)
                .unwrap_or_else(|| BASE_URL.to_owned()),
            log_file: cli.log_file.or(file.log_file),
            log_level: cli.log_level.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::iter;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(iter::once("hentedag").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn defaults_apply_with_only_an_address() {
        let settings =
            Settings::merge(cli(&["--address", "Storgata 1"]), FileConfig::default())
                .expect("settings");

        assert_eq!(settings.platform.street(), "Storgata 1", "street defaults");
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL, "hourly");
        assert_eq!(settings.timeout, Duration::from_secs(10), "ten seconds");
        assert_eq!(settings.base_url, BASE_URL, "Oslo page");
        assert_eq!(settings.log_level, LevelFilter::Info, "info level");
    }

    #[test]
    fn flags_override_config_file() {
        let file: FileConfig = toml::from_str(
            r#"
            address = "Storgata 1"
            street = "Storgata"
            poll_interval = 600
            timeout = 5
            "#,
        )
        .expect("config parses");

        let settings = Settings::merge(cli(&["--poll-interval", "30"]), file).expect("settings");

        assert_eq!(settings.platform.address, "Storgata 1", "address from file");
        assert_eq!(settings.platform.street(), "Storgata", "street from file");
        assert_eq!(settings.poll_interval, Duration::from_secs(30), "flag wins");
        assert_eq!(settings.timeout, Duration::from_secs(5), "timeout from file");
    }

    #[test]
    fn address_is_required() {
        let err = Settings::merge(cli(&["--address", "  "]), FileConfig::default())
            .expect_err("blank address");

        assert!(err.to_string().contains("address is required"), "{err}");
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let result = Settings::merge(
            cli(&["--address", "Storgata 1", "--poll-interval", "0"]),
            FileConfig::default(),
        );

        assert!(result.is_err(), "zero interval");
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let parsed = toml::from_str::<FileConfig>("adress = \"Storgata 1\"");

        assert!(parsed.is_err(), "typo in key");
    }
}
