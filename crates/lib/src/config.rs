//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.clyde/config.json`) and environment.
//! Environment variables override the file; `Settings::resolve` validates the result.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const TOKEN_ENV: &str = "CLYDE_DISCORD_USER_TOKEN";
pub const CHANNEL_ID_ENV: &str = "CLYDE_CHANNEL_ID";
pub const AGENT_ID_ENV: &str = "CLYDE_AGENT_ID";
pub const THEME_ENV: &str = "CLYDE_THEME";
/// Theme variable read by glamour-based tools; used when CLYDE_THEME is unset.
pub const GLAMOUR_STYLE_ENV: &str = "GLAMOUR_STYLE";
pub const CONFIG_PATH_ENV: &str = "CLYDE_CONFIG_PATH";

/// Clyde's Discord user id.
pub const DEFAULT_AGENT_ID: u64 = 1081004946872352958;

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
const DEFAULT_INSTRUCTIONS: &str =
    "Answer the question while being as specific and short as possible. DO NOT add extra details";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Discord account and target settings.
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Reply rendering settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// One-shot query settings.
    #[serde(default)]
    pub query: QueryConfig,
}

/// Discord connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    /// User token. Overridden by CLYDE_DISCORD_USER_TOKEN env.
    pub token: Option<String>,
    /// Channel the conversation happens in. Overridden by CLYDE_CHANNEL_ID env.
    pub channel_id: Option<String>,
    /// Author whose messages count as replies (default: Clyde). Overridden by CLYDE_AGENT_ID env.
    pub agent_id: Option<String>,
    /// REST API base URL (default https://discord.com/api/v10).
    pub api_base: Option<String>,
    /// Gateway WebSocket URL.
    pub gateway_url: Option<String>,
}

/// Reply rendering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// "dark" (default), "light", "notty", or a path to a JSON theme file. Overridden by CLYDE_THEME env.
    pub theme: Option<String>,
}

/// Which reply representation a one-shot query prints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    Plain,
    #[default]
    Styled,
}

/// One-shot query settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    /// Appended to one-shot prompts. Empty string disables; absent uses the built-in default.
    pub instructions: Option<String>,
    #[serde(default)]
    pub output: OutputStyle,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No $CLYDE_DISCORD_USER_TOKEN given.")]
    MissingToken,
    #[error("No $CLYDE_CHANNEL_ID given.")]
    MissingChannelId,
    #[error("invalid agent id {0:?}")]
    InvalidAgentId(String),
}

/// Validated settings the rest of the program runs on.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    /// Raw channel setting; parsed into a channel id on first use by the session.
    pub channel_id: String,
    pub agent_id: crate::event::UserId,
    pub api_base: String,
    pub gateway_url: String,
    pub theme: Option<String>,
    pub instructions: Option<String>,
    pub output: OutputStyle,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl Settings {
    /// Resolve settings from config and process environment.
    pub fn resolve(config: &Config) -> Result<Self, ConfigError> {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Resolve settings with an explicit environment lookup: env values override config.
    pub fn resolve_with(
        config: &Config,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str, fallback: &Option<String>| {
            non_empty(env(key)).or_else(|| non_empty(fallback.clone()))
        };

        let token = lookup(TOKEN_ENV, &config.discord.token).ok_or(ConfigError::MissingToken)?;
        let channel_id =
            lookup(CHANNEL_ID_ENV, &config.discord.channel_id).ok_or(ConfigError::MissingChannelId)?;
        let agent_id = match lookup(AGENT_ID_ENV, &config.discord.agent_id) {
            Some(raw) => raw.parse::<crate::event::UserId>().map_err(|_| ConfigError::InvalidAgentId(raw))?,
            None => crate::event::UserId(DEFAULT_AGENT_ID),
        };
        let api_base = non_empty(config.discord.api_base.clone())
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let gateway_url = non_empty(config.discord.gateway_url.clone())
            .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
        let instructions = match &config.query.instructions {
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s.clone()),
            None => Some(DEFAULT_INSTRUCTIONS.to_string()),
        };

        Ok(Self {
            token,
            channel_id,
            agent_id,
            api_base,
            gateway_url,
            theme: non_empty(env(THEME_ENV))
                .or_else(|| non_empty(env(GLAMOUR_STYLE_ENV)))
                .or_else(|| non_empty(config.display.theme.clone())),
            instructions,
            output: config.query.output,
        })
    }
}

/// `$CLYDE_CONFIG_PATH`, else `~/.clyde/config.json`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    let home = dirs::home_dir().unwrap_or_default();
    home.join(".clyde").join("config.json")
}

/// Read the config file at `path` (or the default location). A file that does
/// not exist yields the defaults; one that cannot be read or parsed is an error.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok((Config::default(), path));
        }
        Err(e) => return Err(e).with_context(|| format!("reading config from {}", path.display())),
    };
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    Ok((config, path))
}
