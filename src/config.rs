use std::path::PathBuf;
use std::time::Duration;

use crate::reminder::DEFAULT_AUTHORIZATION_DELAY;
use crate::scheduler::DEFAULT_DISPATCH_INTERVAL;

pub const ENV_DATA_DIR: &str = "NEXTASK_DATA_DIR";
pub const ENV_AUTH_DELAY_MS: &str = "NEXTASK_AUTH_DELAY_MS";
pub const ENV_DISPATCH_INTERVAL_MS: &str = "NEXTASK_DISPATCH_INTERVAL_MS";
const DEFAULT_DATA_DIR: &str = "nextask-data";

/// Host settings. Everything the user edits lives in `settings.json` instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub auth_request_delay: Duration,
    pub dispatch_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            auth_request_delay: DEFAULT_AUTHORIZATION_DELAY,
            dispatch_interval: DEFAULT_DISPATCH_INTERVAL,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = value(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let auth_request_delay = value(ENV_AUTH_DELAY_MS)
            .map(|raw| parse_millis(ENV_AUTH_DELAY_MS, &raw, defaults.auth_request_delay))
            .unwrap_or(defaults.auth_request_delay);
        let dispatch_interval = value(ENV_DISPATCH_INTERVAL_MS)
            .map(|raw| parse_millis(ENV_DISPATCH_INTERVAL_MS, &raw, defaults.dispatch_interval))
            .filter(|interval| !interval.is_zero())
            .unwrap_or(defaults.dispatch_interval);

        Self {
            data_dir,
            auth_request_delay,
            dispatch_interval,
        }
    }
}

fn parse_millis(key: &str, raw: &str, fallback: Duration) -> Duration {
    match raw.trim().parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(err) => {
            log::warn!("config: invalid {key}={raw:?} ({err}), using {fallback:?}");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_values_use_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.auth_request_delay, Duration::from_secs(1));
        assert_eq!(config.dispatch_interval, Duration::from_secs(1));
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/tmp/nextask"),
            (ENV_AUTH_DELAY_MS, "250"),
            (ENV_DISPATCH_INTERVAL_MS, " 500 "),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/nextask"));
        assert_eq!(config.auth_request_delay, Duration::from_millis(250));
        assert_eq!(config.dispatch_interval, Duration::from_millis(500));
    }

    #[test]
    fn invalid_or_zero_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, "   "),
            (ENV_AUTH_DELAY_MS, "soon"),
            (ENV_DISPATCH_INTERVAL_MS, "0"),
        ]));
        assert_eq!(config, AppConfig::default());
    }
}
