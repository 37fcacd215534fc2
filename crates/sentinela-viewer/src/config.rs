use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::Result;
use sentinela_client::config::NvrConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct Config {
    pub nvr: NvrConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct ViewerConfig {
    /// How often the camera list is re-fetched and reconciled.
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(deserialize = "kebab-case"))]
pub struct MediaConfig {
    #[serde(default = "default_stun_servers")]
    pub stun_servers: Vec<String>,
    /// Upper bound on waiting for candidate gathering before the offer is sent.
    #[serde(with = "humantime_serde", default = "default_gather_timeout")]
    pub gather_timeout: Duration,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            stun_servers: default_stun_servers(),
            gather_timeout: default_gather_timeout(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("screenshots")
}

fn default_stun_servers() -> Vec<String> {
    vec!["stun:stun.l.google.com:19302".to_string()]
}

fn default_gather_timeout() -> Duration {
    Duration::from_secs(2)
}

pub use clap::Parser;

#[derive(Parser, Debug)]
pub struct Args<T: serde::de::DeserializeOwned + Clone + Send + Sync + 'static> {
    #[arg(short, long, env, value_parser = toml_from_file::<T>)]
    pub config: Option<T>,
    #[arg(short, long, env, default_value = "false")]
    pub validate: bool,
}

impl<T: serde::de::DeserializeOwned + Clone + Send + Sync + 'static> Args<T> {
    pub fn get_config(&self) -> Result<T> {
        if let Some(config) = &self.config {
            Ok(config.clone())
        } else {
            let default_path = default_config_path();
            toml_from_file(&default_path)
        }
    }
}

pub fn default_config_path() -> String {
    if let Ok(home_dir) = std::env::var("HOME") {
        format!("{home_dir}/.sentinela-viewer/config.toml")
    } else {
        "config.toml".to_string()
    }
}

pub fn toml_from_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let toml = std::fs::read_to_string(path)?;
    let config_json = toml::from_str(&toml)?;
    let config = serde_json::from_value(config_json)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let raw = r#"
            [nvr]
            address = "nvr.local"
            port = 8000

            [store]
            path = "/var/lib/sentinela/layout.db"
        "#;
        let json: serde_json::Value = toml::from_str(raw).unwrap();
        let config: Config = serde_json::from_value(json).unwrap();

        assert_eq!(config.nvr.address, "nvr.local");
        assert_eq!(config.viewer.poll_interval, Duration::from_secs(10));
        assert_eq!(config.media.gather_timeout, Duration::from_secs(2));
        assert_eq!(config.media.stun_servers.len(), 1);
    }

    #[test]
    fn parses_full_config() {
        let raw = r#"
            [nvr]
            address = "10.0.0.5"
            port = 443
            tls = true
            verify-ssl = false

            [store]
            path = "layout.db"

            [viewer]
            poll-interval = "30s"
            screenshot-dir = "/tmp/shots"

            [media]
            stun-servers = ["stun:stun.example.org:3478"]
            gather-timeout = "500ms"
        "#;
        let json: serde_json::Value = toml::from_str(raw).unwrap();
        let config: Config = serde_json::from_value(json).unwrap();

        assert!(config.nvr.tls);
        assert!(!config.nvr.verify_ssl);
        assert_eq!(config.viewer.poll_interval, Duration::from_secs(30));
        assert_eq!(config.media.gather_timeout, Duration::from_millis(500));
    }
}
