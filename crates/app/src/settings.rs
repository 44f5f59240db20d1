//! Handles settings for the application.
//!
//! Configuration is read from an optional TOML file (`config/settings.toml`
//! unless `--config` says otherwise) and from `TALLYBOT__*` environment
//! variables, e.g. `TALLYBOT__TELEGRAM__TOKEN`.

use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use engine::AccessMode;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    pub server: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
    #[serde(default)]
    pub mode: AccessMode,
    /// JSON file for sessions; kept in memory when absent.
    pub state_path: Option<String>,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

fn default_call_timeout_secs() -> u64 {
    10
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub telegram: Option<Telegram>,
}

#[derive(Debug, Parser)]
#[command(name = "tallybot", version)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long, env = "TALLYBOT_CONFIG")]
    config: Option<String>,
    /// Override the log level.
    #[arg(long)]
    level: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings = Self::from_sources(path, None)?;
        if let Some(level) = args.level {
            settings.app.level = level;
        }
        Ok(settings)
    }

    fn from_sources(path: &str, inline: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::with_name(path).required(false));
        if let Some(toml) = inline {
            builder = builder.add_source(File::from_str(toml, config::FileFormat::Toml));
        }
        builder
            .add_source(
                Environment::with_prefix("TALLYBOT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("telegram.allowed_users")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
