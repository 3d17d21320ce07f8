use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Settings for the long-flight ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// A flight lasting strictly longer than this many seconds is "long"
    #[serde(default = "default_long_flight_threshold_secs")]
    pub long_flight_threshold_secs: i64,
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
    #[serde(default = "default_max_top_n")]
    pub max_top_n: usize,
    /// How long a computed ranking may be served from cache
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_long_flight_threshold_secs() -> i64 {
    3 * 60 * 60
}

fn default_top_n() -> usize {
    10
}

fn default_max_top_n() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    60
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            long_flight_threshold_secs: default_long_flight_threshold_secs(),
            default_top_n: default_top_n(),
            max_top_n: default_max_top_n(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl AnalyticsConfig {
    /// Requested N, or the default, clamped to `1..=max_top_n`
    pub fn resolve_top_n(&self, requested: Option<usize>) -> NonZeroUsize {
        let max = self.max_top_n.max(1);
        let n = requested.unwrap_or(self.default_top_n).clamp(1, max);
        NonZeroUsize::new(n).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prometheus `/metrics` listener; disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_interface() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1337
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
            metrics_port: None,
        }
    }
}

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub web: WebConfig,
}

impl AppConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the resolved default path if it
    /// exists, otherwise built-in defaults. Environment overrides apply last.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = config_path();
                if default_path.exists() {
                    Self::load(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, &contents)
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", tmp_path, path))?;
        Ok(())
    }

    /// Applies `FLIGHTOPS_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, value: String) -> Result<T>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid value {:?} for {}", value, key))
        }

        if let Some(v) = lookup("FLIGHTOPS_LONG_FLIGHT_SECS") {
            self.analytics.long_flight_threshold_secs = parse("FLIGHTOPS_LONG_FLIGHT_SECS", v)?;
        }
        if let Some(v) = lookup("FLIGHTOPS_DEFAULT_TOP_N") {
            self.analytics.default_top_n = parse("FLIGHTOPS_DEFAULT_TOP_N", v)?;
        }
        if let Some(v) = lookup("FLIGHTOPS_MAX_TOP_N") {
            self.analytics.max_top_n = parse("FLIGHTOPS_MAX_TOP_N", v)?;
        }
        if let Some(v) = lookup("FLIGHTOPS_INTERFACE") {
            self.web.interface = v;
        }
        if let Some(v) = lookup("FLIGHTOPS_PORT") {
            self.web.port = parse("FLIGHTOPS_PORT", v)?;
        }
        if let Some(v) = lookup("FLIGHTOPS_METRICS_PORT") {
            self.web.metrics_port = Some(parse("FLIGHTOPS_METRICS_PORT", v)?);
        }
        Ok(())
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `FLIGHTOPS_CONFIG` env var
/// 2. `./flightops.toml`
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("FLIGHTOPS_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("./flightops.toml")
}
