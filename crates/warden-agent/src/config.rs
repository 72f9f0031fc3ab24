use envconfig::Envconfig;
use std::path::PathBuf;
use std::time::Duration;
use warden_monitor::MonitorConfig;
use warden_policy::{CodeTable, IdentityPolicy};
use warden_types::ReadDirection;

#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(default = "10")]
    pub poll_interval_secs: u64,

    #[envconfig(default = "15")]
    pub backoff_secs: u64,

    #[envconfig(default = "30")]
    pub read_timeout_secs: u64,

    #[envconfig(default = "/var/log/logwarden")]
    pub log_directory: PathBuf,

    #[envconfig(default = "4624")]
    pub session_start_code: u32,

    #[envconfig(default = "4634")]
    pub session_end_code: u32,

    #[envconfig(default = "Security")]
    pub source_name: String,

    // Holds <source_name>.jsonl
    #[envconfig(default = "/var/lib/logwarden/journal")]
    pub journal_dir: PathBuf,

    #[envconfig(default = "backwards")]
    pub read_direction: ReadDirection,

    #[envconfig(default = "domain-separator")]
    pub identity_policy: IdentityPolicy,

    // 0 keeps every processed record id for the life of the process
    #[envconfig(default = "0")]
    pub dedup_trailing_window: u64,

    #[envconfig(default = "/etc/xdg/autostart")]
    pub autostart_dir: PathBuf,

    #[envconfig(default = "/run/logwarden.pid")]
    pub pid_file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envconfig::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::init_from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("POLL_INTERVAL_SECS must be > 0".into()));
        }
        if self.backoff_secs == 0 {
            return Err(ConfigError::Invalid("BACKOFF_SECS must be > 0".into()));
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::Invalid("READ_TIMEOUT_SECS must be > 0".into()));
        }
        if self.session_start_code == self.session_end_code {
            return Err(ConfigError::Invalid(format!(
                "session start and end codes are both {}",
                self.session_start_code
            )));
        }
        if self.source_name.trim().is_empty() {
            return Err(ConfigError::Invalid("SOURCE_NAME is empty".into()));
        }
        Ok(())
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            source_name: self.source_name.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            backoff: Duration::from_secs(self.backoff_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            read_direction: self.read_direction,
            dedup_trailing_window: match self.dedup_trailing_window {
                0 => None,
                n => Some(n),
            },
        }
    }

    pub fn classifier(&self) -> CodeTable {
        CodeTable::new(self.session_start_code, self.session_end_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use warden_policy::{EventClassifier, FieldIndex, SessionAction};

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::init_from_hashmap(&env)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        let monitor = config.monitor_config();
        assert_eq!(monitor.poll_interval, Duration::from_secs(10));
        assert_eq!(monitor.backoff, Duration::from_secs(15));
        assert_eq!(monitor.source_name, "Security");
        assert_eq!(monitor.read_direction, ReadDirection::Backwards);
        assert_eq!(monitor.dedup_trailing_window, None);
        assert_eq!(config.identity_policy, IdentityPolicy::default());
        assert_eq!(config.log_directory, PathBuf::from("/var/log/logwarden"));
        assert_eq!(config.classifier().classify(4624), SessionAction::SessionStart);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("POLL_INTERVAL_SECS", "2"),
            ("SESSION_START_CODE", "528"),
            ("SESSION_END_CODE", "538"),
            ("READ_DIRECTION", "forwards"),
            ("IDENTITY_POLICY", "field:5"),
            ("DEDUP_TRAILING_WINDOW", "4096"),
            ("LOG_DIRECTORY", "/tmp/sessions"),
        ])
        .unwrap();
        let monitor = config.monitor_config();
        assert_eq!(monitor.poll_interval, Duration::from_secs(2));
        assert_eq!(monitor.read_direction, ReadDirection::Forwards);
        assert_eq!(monitor.dedup_trailing_window, Some(4096));
        assert_eq!(
            config.identity_policy,
            IdentityPolicy::FieldIndex(FieldIndex { index: 5 })
        );
        let table = config.classifier();
        assert_eq!(table.classify(528), SessionAction::SessionStart);
        assert_eq!(table.classify(538), SessionAction::SessionEnd);
        assert_eq!(table.classify(4624), SessionAction::Ignored);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("POLL_INTERVAL_SECS", "0")]),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(&[("BACKOFF_SECS", "0")]),
            Err(ConfigError::Invalid(ref m)) if m.contains("BACKOFF_SECS")
        ));
        assert!(matches!(
            load(&[("SESSION_END_CODE", "4624")]),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(&[("READ_DIRECTION", "sideways")]),
            Err(ConfigError::Env(_))
        ));
        assert!(matches!(
            load(&[("IDENTITY_POLICY", "field:")]),
            Err(ConfigError::Env(_))
        ));
    }
}
