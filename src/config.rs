use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `remote.password` from the file.
pub const PASSWORD_ENV: &str = "UPLOAD_ONCE_PASSWORD";

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    // remote directory the files land in; "." is the login directory
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("remote_dir", &self.remote_dir)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("io_timeout_secs", &self.io_timeout_secs)
            .finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    // pointing this elsewhere forgets every past upload
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub retry_backoff_ms: u64,
}

fn default_port() -> u16 {
    22
}
fn default_remote_dir() -> String {
    ".".to_string()
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_io_timeout() -> u64 {
    30
}
fn default_source_dir() -> PathBuf {
    PathBuf::from("/home/rsync/log")
}
fn default_pattern() -> String {
    "L*.BIN".to_string()
}
fn default_ledger_path() -> PathBuf {
    PathBuf::from("/home/rsync/log/uploaded.txt")
}
fn default_lock_path() -> PathBuf {
    PathBuf::from("/tmp/upload.lock")
}
fn default_log_path() -> PathBuf {
    PathBuf::from("/home/rsync/log/upload.log")
}
fn default_max_attempts() -> u32 {
    crate::transfer::DEFAULT_MAX_ATTEMPTS
}

impl Config {
    /// `~/.upload-once/config.json`, or `./config.json` without a home dir.
    pub fn default_path() -> PathBuf {
        match dirs::home_dir() {
            Some(home) => home.join(".".to_owned() + env!("CARGO_PKG_NAME")).join("config.json"),
            None => PathBuf::from("config.json"),
        }
    }

    /// Read and validate the JSON config at `path`, then apply the password
    /// override from the environment.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let mut config = Self::from_json(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        if let Ok(pw) = std::env::var(PASSWORD_ENV)
            && !pw.is_empty()
        {
            config.remote.password = Some(pw);
        }
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.remote.host.trim().is_empty() {
            anyhow::bail!("remote.host must not be empty");
        }
        if self.remote.username.trim().is_empty() {
            anyhow::bail!("remote.username must not be empty");
        }
        if self.pattern.is_empty() {
            anyhow::bail!("pattern must not be empty");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if self.remote.connect_timeout_secs == 0 {
            anyhow::bail!("remote.connect_timeout_secs must be at least 1");
        }
        if self.remote.io_timeout_secs == 0 {
            anyhow::bail!("remote.io_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{"remote": {"host": "ftp.host.com", "username": "ftpuser", "password": "ftppass"}}"#;

    #[test]
    fn defaults_follow_deployment_layout() {
        let c = Config::from_json(MINIMAL).unwrap();
        assert_eq!(c.remote.port, 22);
        assert_eq!(c.remote.remote_dir, ".");
        assert_eq!(c.source_dir, PathBuf::from("/home/rsync/log"));
        assert_eq!(c.pattern, "L*.BIN");
        assert_eq!(c.ledger_path, PathBuf::from("/home/rsync/log/uploaded.txt"));
        assert_eq!(c.lock_path, PathBuf::from("/tmp/upload.lock"));
        assert_eq!(c.log_path, PathBuf::from("/home/rsync/log/upload.log"));
        assert_eq!(c.max_attempts, 3);
        assert_eq!(c.retry_backoff(), Duration::ZERO);
    }

    #[test]
    fn rejects_missing_host_and_zero_attempts() {
        assert!(Config::from_json(r#"{"remote": {"username": "u"}}"#).is_err());
        assert!(Config::from_json(r#"{"remote": {"host": " ", "username": "u"}}"#).is_err());
        let zero = r#"{"remote": {"host": "h", "username": "u"}, "max_attempts": 0}"#;
        assert!(Config::from_json(zero).is_err());
    }

    #[test]
    fn rejects_zero_timeouts() {
        let connect = r#"{"remote": {"host": "h", "username": "u", "connect_timeout_secs": 0}}"#;
        let err = Config::from_json(connect).unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
        let io = r#"{"remote": {"host": "h", "username": "u", "io_timeout_secs": 0}}"#;
        let err = Config::from_json(io).unwrap_err();
        assert!(err.to_string().contains("io_timeout_secs"));
        let huge = r#"{"remote": {"host": "h", "username": "u", "io_timeout_secs": 18446744073709551615}}"#;
        assert!(Config::from_json(huge).is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let c = Config::from_json(MINIMAL).unwrap();
        let shown = format!("{:?}", c);
        assert!(!shown.contains("ftppass"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn read_from_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.json");
        let err = Config::read_from(&missing).unwrap_err();
        assert!(format!("{:#}", err).contains("config.json"));

        std::fs::write(&missing, MINIMAL).unwrap();
        let c = Config::read_from(&missing).unwrap();
        assert_eq!(c.remote.host, "ftp.host.com");
    }
}
