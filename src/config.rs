//! Process configuration from environment variables.
//!
//! | Variable                  | Default                      |
//! |---------------------------|------------------------------|
//! | `SCV_LISTEN_ADDR`         | `0.0.0.0:8080`               |
//! | `SCV_DATA_DIR`            | `./data`                     |
//! | `SCV_TASK_BASE_URL`       | `http://127.0.0.1:<port>`    |
//! | `SCV_QUEUE_POLL_SECS`     | `5`                          |
//! | `SCV_QUEUE_MAX_ATTEMPTS`  | `10`                         |
//! | `SCV_DEPLOY_TIMEOUT_SECS` | `30`                         |
//!
//! Runtime settings (credentials, repo, deploy targets) are not here; they
//! live in the settings store and are changed over RPC.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::deploy::DEFAULT_DEPLOY_TIMEOUT;
use crate::queue::{RetryConfig, RunnerConfig};

pub const ENV_LISTEN_ADDR: &str = "SCV_LISTEN_ADDR";
pub const ENV_DATA_DIR: &str = "SCV_DATA_DIR";
pub const ENV_TASK_BASE_URL: &str = "SCV_TASK_BASE_URL";
pub const ENV_QUEUE_POLL_SECS: &str = "SCV_QUEUE_POLL_SECS";
pub const ENV_QUEUE_MAX_ATTEMPTS: &str = "SCV_QUEUE_MAX_ATTEMPTS";
pub const ENV_DEPLOY_TIMEOUT_SECS: &str = "SCV_DEPLOY_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Base URL the queue runner delivers tasks to; normally this process.
    pub task_base_url: String,
    pub queue_poll_interval: Duration,
    pub queue_max_attempts: u32,
    pub deploy_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr: SocketAddr =
            parse_or(&lookup, ENV_LISTEN_ADDR, SocketAddr::from(([0, 0, 0, 0], 8080)))?;

        let data_dir = lookup(ENV_DATA_DIR)
            .filter(|v| !v.is_empty())
            .map_or_else(|| PathBuf::from("./data"), PathBuf::from);

        let task_base_url = match lookup(ENV_TASK_BASE_URL).filter(|v| !v.is_empty()) {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => url,
            Some(url) => {
                return Err(ConfigError::Invalid {
                    var: ENV_TASK_BASE_URL,
                    value: url,
                    reason: "must start with http:// or https://".to_string(),
                });
            }
            None => format!("http://127.0.0.1:{}", listen_addr.port()),
        };

        let poll_secs: u64 = parse_or(&lookup, ENV_QUEUE_POLL_SECS, 5)?;
        let queue_max_attempts: u32 =
            parse_or(&lookup, ENV_QUEUE_MAX_ATTEMPTS, RetryConfig::DEFAULT.max_attempts)?;
        let deploy_timeout_secs: u64 =
            parse_or(&lookup, ENV_DEPLOY_TIMEOUT_SECS, DEFAULT_DEPLOY_TIMEOUT.as_secs())?;

        for (var, value) in [
            (ENV_QUEUE_POLL_SECS, poll_secs),
            (ENV_QUEUE_MAX_ATTEMPTS, u64::from(queue_max_attempts)),
            (ENV_DEPLOY_TIMEOUT_SECS, deploy_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    var,
                    value: value.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        Ok(Config {
            listen_addr,
            data_dir,
            task_base_url,
            queue_poll_interval: Duration::from_secs(poll_secs),
            queue_max_attempts,
            deploy_timeout: Duration::from_secs(deploy_timeout_secs),
        })
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.data_dir.join("settings")
    }

    pub fn queue_dir(&self) -> PathBuf {
        self.data_dir.join("queue")
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            poll_interval: self.queue_poll_interval,
            retry: RetryConfig::DEFAULT.with_max_attempts(self.queue_max_attempts),
            // Outlive the deploy call the delivery is waiting on.
            request_timeout: self.deploy_timeout * 2,
            ..RunnerConfig::new(self.task_base_url.clone())
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.task_base_url, "http://127.0.0.1:8080");
        assert_eq!(config.queue_poll_interval, Duration::from_secs(5));
        assert_eq!(config.queue_max_attempts, 10);
        assert_eq!(config.deploy_timeout, Duration::from_secs(30));
        assert_eq!(config.settings_dir(), PathBuf::from("./data/settings"));
        assert_eq!(config.queue_dir(), PathBuf::from("./data/queue"));
    }

    #[test]
    fn task_base_url_follows_listen_port() {
        let config = config_from(&[(ENV_LISTEN_ADDR, "127.0.0.1:9000")]).unwrap();
        assert_eq!(config.task_base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            (ENV_DATA_DIR, "/var/lib/scv"),
            (ENV_TASK_BASE_URL, "https://relay.internal"),
            (ENV_QUEUE_POLL_SECS, "1"),
            (ENV_QUEUE_MAX_ATTEMPTS, "3"),
            (ENV_DEPLOY_TIMEOUT_SECS, "10"),
        ])
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/scv"));
        assert_eq!(config.task_base_url, "https://relay.internal");

        let runner = config.runner_config();
        assert_eq!(runner.base_url, "https://relay.internal");
        assert_eq!(runner.poll_interval, Duration::from_secs(1));
        assert_eq!(runner.retry.max_attempts, 3);
        assert_eq!(runner.request_timeout, Duration::from_secs(20));
    }

    #[test]
    fn unparsable_values_are_errors() {
        let err = config_from(&[(ENV_QUEUE_POLL_SECS, "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_QUEUE_POLL_SECS, .. }));

        assert!(config_from(&[(ENV_LISTEN_ADDR, "localhost")]).is_err());
        assert!(config_from(&[(ENV_TASK_BASE_URL, "relay.internal")]).is_err());
        assert!(config_from(&[(ENV_QUEUE_MAX_ATTEMPTS, "0")]).is_err());
    }
}
