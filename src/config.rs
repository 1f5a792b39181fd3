use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bot::command::{callback_data_for_preset, MAX_CALLBACK_DATA_LEN};

/// Long-poll timeout used when `monitor_interval` is missing or not positive.
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 3;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    /// Path to the sox binary (or anything sox-compatible).
    sox_bin: String,
    /// Preset name -> extra sox arguments, appended verbatim.
    #[serde(default)]
    sox_presets: BTreeMap<String, Vec<String>>,
    api_token: String,
    /// Telegram usernames allowed to use the bot.
    #[serde(default)]
    available_ids: Vec<String>,
    /// Long-poll timeout in seconds (non-positive = default).
    #[serde(default)]
    monitor_interval: i64,
    #[serde(default)]
    is_verbose: bool,
    /// Optional file that receives a copy of the log.
    log_file: Option<String>,
}

/// Immutable process-wide settings, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub sox_bin: PathBuf,
    /// Sorted so the preset keyboard is stable between invocations.
    pub presets: BTreeMap<String, Vec<String>>,
    pub api_token: String,
    /// Allow-list of usernames, without the leading `@`.
    pub available_ids: Vec<String>,
    pub monitor_interval: Duration,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.sox_bin.trim().is_empty() {
            return Err(ConfigError::Validation("sox_bin is required".into()));
        }
        if file.api_token.is_empty() {
            return Err(ConfigError::Validation("api_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.api_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "api_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }

        for name in file.sox_presets.keys() {
            if name.is_empty() || name.trim() != name {
                return Err(ConfigError::Validation(format!(
                    "preset name {name:?} must be non-empty and have no surrounding whitespace"
                )));
            }
            // Telegram rejects inline buttons whose callback data is longer than this
            if callback_data_for_preset(name).len() > MAX_CALLBACK_DATA_LEN {
                return Err(ConfigError::Validation(format!(
                    "preset name {name:?} is too long for an inline button"
                )));
            }
        }

        let monitor_interval = if file.monitor_interval > 0 {
            Duration::from_secs(file.monitor_interval as u64)
        } else {
            Duration::from_secs(DEFAULT_MONITOR_INTERVAL_SECS)
        };

        let mut available_ids: Vec<String> = Vec::with_capacity(file.available_ids.len());
        for id in file.available_ids {
            let id = id.trim().trim_start_matches('@').to_string();
            if !id.is_empty() && !available_ids.contains(&id) {
                available_ids.push(id);
            }
        }

        Ok(Self {
            sox_bin: PathBuf::from(file.sox_bin),
            presets: file.sox_presets,
            api_token: file.api_token,
            available_ids,
            monitor_interval,
            verbose: file.is_verbose,
            log_file: file.log_file.map(PathBuf::from),
        })
    }

    /// Check if the given username is on the allow-list.
    pub fn is_available_id(&self, username: &str) -> bool {
        self.available_ids.iter().any(|id| id == username)
    }

    pub fn preset(&self, name: &str) -> Option<&[String]> {
        self.presets.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(r#"{
            "sox_bin": "/usr/bin/sox",
            "sox_presets": {
                "chipmunk": ["pitch", "800"],
                "slow": ["speed", "0.7"]
            },
            "api_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "available_ids": ["alice", "@bob"],
            "monitor_interval": 10,
            "is_verbose": true
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.sox_bin, PathBuf::from("/usr/bin/sox"));
        assert_eq!(config.preset("chipmunk"), Some(&["pitch".to_string(), "800".to_string()][..]));
        assert_eq!(config.available_ids, vec!["alice", "bob"]);
        assert_eq!(config.monitor_interval, Duration::from_secs(10));
        assert!(config.verbose);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let file = write_config(r#"{
            "sox_bin": "sox",
            "api_token": "123456789:ABCdef"
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert!(config.presets.is_empty());
        assert!(config.available_ids.is_empty());
        assert!(!config.verbose);
        assert_eq!(config.monitor_interval, Duration::from_secs(DEFAULT_MONITOR_INTERVAL_SECS));
    }

    #[test]
    fn test_non_positive_interval_falls_back() {
        for interval in ["0", "-5"] {
            let file = write_config(&format!(r#"{{
                "sox_bin": "sox",
                "api_token": "123456789:ABCdef",
                "monitor_interval": {interval}
            }}"#));
            let config = Config::load(file.path()).unwrap();
            assert_eq!(config.monitor_interval, Duration::from_secs(3));
        }
    }

    #[test]
    fn test_presets_are_sorted() {
        let file = write_config(r#"{
            "sox_bin": "sox",
            "api_token": "123456789:ABCdef",
            "sox_presets": { "zeta": [], "alpha": ["reverse"], "mid": ["speed", "2.0"] }
        }"#);
        let config = Config::load(file.path()).unwrap();
        let names: Vec<&str> = config.presets.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_duplicate_ids_collapse() {
        let file = write_config(r#"{
            "sox_bin": "sox",
            "api_token": "123456789:ABCdef",
            "available_ids": ["alice", "@alice", " ", "bob"]
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.available_ids, vec!["alice", "bob"]);
        assert!(config.is_available_id("alice"));
        assert!(!config.is_available_id("@alice"));
        assert!(!config.is_available_id("carol"));
    }

    #[test]
    fn test_empty_sox_bin() {
        let file = write_config(r#"{
            "sox_bin": "",
            "api_token": "123456789:ABCdef"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("sox_bin"));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "sox_bin": "sox",
            "api_token": ""
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("api_token"));
    }

    #[test]
    fn test_invalid_token_format() {
        for token in ["invalid_token_no_colon", "notanumber:ABCdef", "123456789:"] {
            let file = write_config(&format!(r#"{{
                "sox_bin": "sox",
                "api_token": "{token}"
            }}"#));
            let err = assert_err(Config::load(file.path()));
            assert!(matches!(err, ConfigError::Validation(_)), "token {token} should be rejected");
        }
    }

    #[test]
    fn test_preset_name_with_padding_rejected() {
        let file = write_config(r#"{
            "sox_bin": "sox",
            "api_token": "123456789:ABCdef",
            "sox_presets": { " echo": ["echo", "0.8", "0.9", "1000", "0.3"] }
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_preset_name_too_long_rejected() {
        let name = "x".repeat(60);
        let file = write_config(&format!(r#"{{
            "sox_bin": "sox",
            "api_token": "123456789:ABCdef",
            "sox_presets": {{ "{name}": ["speed", "2.0"] }}
        }}"#));
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_missing_required_field() {
        let file = write_config(r#"{ "api_token": "123456789:ABCdef" }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
