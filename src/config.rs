use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_RESPONSE_SIZE: usize = 4 * 1024 * 1024;
const DEFAULT_MAX_REFERRALS: usize = 5;

/// Runtime settings for lookups. The server table is loaded separately,
/// see [`crate::ServerTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Applies to name resolution, connect and every read. `0` disables it.
    pub whois_timeout_seconds: u64,
    pub max_response_size: usize,
    /// Upper bound on registrar referrals followed for one lookup.
    pub max_referrals: usize,
    pub rdap_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    pub whois_timeout_seconds: u64,
    pub max_response_size: usize,
    pub max_referrals: usize,
    pub rdap_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whois_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            max_referrals: DEFAULT_MAX_REFERRALS,
            rdap_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Config {
    /// Defaults overridden by environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Like [`Config::load`], reading variables through `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut settings = config::Config::builder()
            .set_default("whois_timeout_seconds", defaults.whois_timeout_seconds)?
            .set_default("max_response_size", defaults.max_response_size as u64)?
            .set_default("max_referrals", defaults.max_referrals as u64)?
            .set_default("rdap_timeout_seconds", defaults.rdap_timeout_seconds)?;

        settings = Self::apply_env_overrides(settings, lookup)?;

        let config_data: ConfigData = settings.build()?.try_deserialize()?;

        Ok(Config {
            whois_timeout_seconds: config_data.whois_timeout_seconds,
            max_response_size: config_data.max_response_size,
            max_referrals: config_data.max_referrals,
            rdap_timeout_seconds: config_data.rdap_timeout_seconds,
        })
    }

    pub fn whois_timeout(&self) -> Option<Duration> {
        Self::seconds(self.whois_timeout_seconds)
    }

    pub fn rdap_timeout(&self) -> Option<Duration> {
        Self::seconds(self.rdap_timeout_seconds)
    }

    fn seconds(value: u64) -> Option<Duration> {
        (value > 0).then(|| Duration::from_secs(value))
    }

    fn apply_env_overrides<F>(
        mut settings: config::ConfigBuilder<config::builder::DefaultState>,
        lookup: F,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_mappings = [
            ("WHOIS_TIMEOUT_SECONDS", "whois_timeout_seconds"),
            ("WHOIS_TIMEOUT", "whois_timeout_seconds"),
            ("MAX_RESPONSE_SIZE", "max_response_size"),
            ("MAX_REFERRALS", "max_referrals"),
            ("RDAP_TIMEOUT_SECONDS", "rdap_timeout_seconds"),
            ("RDAP_TIMEOUT", "rdap_timeout_seconds"),
        ];

        for (env_var, config_key) in env_mappings {
            if let Some(value) = lookup(env_var) {
                settings = settings.set_override(config_key, value)?;
            }
        }

        Ok(settings)
    }
}
