//! Configuration module for the flickr-gallery application.
//!
//! Values are layered with figment: built-in defaults, then an optional TOML
//! file, then `FLICKR_`-prefixed environment variables.

use crate::flickr::ClientConfig;
use crate::page::PageSettings;
use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Flickr API key
    pub api_key: String,
    /// Flickr REST endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Owner NSID for pages that don't name their own
    #[serde(default)]
    pub default_user: Option<String>,
    /// How long fetched Flickr data stays fresh
    ///
    /// Accepts plain seconds (`300`) or a duration string (`5m`, `1h`).
    #[serde(
        default = "default_expires_in",
        deserialize_with = "deserialize_duration"
    )]
    pub expires_in: Duration,
    /// Serve the last good value when a refresh fails
    #[serde(default = "default_true")]
    pub serve_stale: bool,
    /// Outbound Flickr requests allowed per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: NonZeroU32,
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
    /// Port for the web server
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base log level, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Graceful shutdown budget
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub shutdown_timeout: Duration,
    /// Gallery pages keyed by page id
    #[serde(default)]
    pub pages: BTreeMap<String, PageSettings>,
}

fn default_api_url() -> String {
    "https://api.flickr.com/services/rest/".to_owned()
}

fn default_expires_in() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_true() -> bool {
    true
}

fn default_requests_per_second() -> NonZeroU32 {
    NonZeroU32::new(5).unwrap_or(NonZeroU32::MIN)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(8)
}

impl Config {
    /// Load configuration from `path` (if it exists) and the environment.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Self::figment(path)
            .extract()
            .with_context(|| format!("Failed to load config (file: {})", path.display()))
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("FLICKR_").split("__"))
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            requests_per_second: self.requests_per_second,
            timeout: self.request_timeout,
        }
    }
}

fn duration_parser() -> DurationParser<'static> {
    DurationParser::builder()
        .time_units(&[
            TimeUnit::MilliSecond,
            TimeUnit::Second,
            TimeUnit::Minute,
            TimeUnit::Hour,
            TimeUnit::Day,
        ])
        .default_unit(TimeUnit::Second)
        .build()
}

/// Accepts an integer number of seconds or a duration string like `90s`, `5m`
/// or `1h`.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) => Ok(Duration::from_secs(secs)),
        Raw::Text(text) => {
            let parsed = duration_parser()
                .parse(text.trim())
                .map_err(|e| Error::custom(format!("invalid duration '{text}': {e}")))?;
            Duration::try_from(parsed)
                .map_err(|e| Error::custom(format!("duration '{text}' out of range: {e}")))
        }
    }
}
