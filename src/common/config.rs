//! Configuration file handling
//!
//! Defaults come from an optional `config.toml` in the platform config
//! directory; command-line flags override individual values when the run
//! settings are resolved.

use reqwest::Url;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Default manifest file name, looked up in the current directory
pub const DEFAULT_MANIFEST: &str = "postman-executor.yaml";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// MongoDB settings
    #[serde(default)]
    pub mongo: MongoConfig,

    /// Server under test
    #[serde(default)]
    pub server: ServerConfig,

    /// Reachability probe settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Collection runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// MongoDB settings
#[derive(Debug, Deserialize)]
pub struct MongoConfig {
    /// `host:port`, or `container:port` in docker mode
    #[serde(default = "default_mongo_address")]
    pub address: String,

    /// Mongo shell binary
    #[serde(default = "default_mongo_shell")]
    pub shell: String,

    /// Import tool binary
    #[serde(default = "default_mongo_import")]
    pub import: String,

    /// Whether Mongo runs inside a docker container
    #[serde(default)]
    pub docker: bool,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            address: default_mongo_address(),
            shell: default_mongo_shell(),
            import: default_mongo_import(),
            docker: false,
        }
    }
}

fn default_mongo_address() -> String {
    "localhost:27017".to_string()
}
fn default_mongo_shell() -> String {
    "mongo".to_string()
}
fn default_mongo_import() -> String {
    "mongoimport".to_string()
}

/// Server under test
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Environment key that receives the server host
    #[serde(default = "default_ip_key")]
    pub ip_key: String,

    /// Environment key that receives the server port
    #[serde(default = "default_port_key")]
    pub port_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            ip_key: default_ip_key(),
            port_key: default_port_key(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:3001".to_string()
}
fn default_ip_key() -> String {
    "ip".to_string()
}
fn default_port_key() -> String {
    "port".to_string()
}

/// Reachability probe settings, used in CI mode
#[derive(Debug, Deserialize)]
pub struct ProbeConfig {
    /// Maximum attempts before giving up
    #[serde(default = "default_probe_attempts")]
    pub attempts: u32,

    /// Pause between attempts
    #[serde(default = "default_probe_interval")]
    pub interval_secs: u64,

    /// Timeout of a single request
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            attempts: default_probe_attempts(),
            interval_secs: default_probe_interval(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_probe_attempts() -> u32 {
    10
}
fn default_probe_interval() -> u64 {
    4
}
fn default_probe_timeout() -> u64 {
    10
}

/// Collection runner settings
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    /// newman binary
    #[serde(default = "default_newman")]
    pub newman: String,

    /// Directory receiving one report subdirectory per test
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            newman: default_newman(),
            reports_dir: default_reports_dir(),
        }
    }
}

fn default_newman() -> String {
    "newman".to_string()
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("newman")
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read '{}': {}", path.display(), e))
                })?;
                return Self::from_toml(&content);
            }
        }
        Ok(Self::default())
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}

/// Command-line overrides for a run
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub manifest: Option<PathBuf>,
    pub docker: bool,
    pub mongo: Option<String>,
    pub server_url: Option<String>,
    pub ip_key: Option<String>,
    pub port_key: Option<String>,
    pub ci: bool,
}

/// Bounded retry policy for the server probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Sleep between two attempts
    pub interval: Duration,
}

impl RetryPolicy {
    /// A single attempt, failing immediately
    pub fn once() -> Self {
        Self {
            attempts: 1,
            interval: Duration::ZERO,
        }
    }
}

/// Where Mongo is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoTarget {
    /// Host name, or container name in docker mode
    pub host: String,
    pub port: String,
    pub docker: bool,
    pub shell: String,
    pub import: String,
}

/// Where the server under test listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub url: String,
    pub host: String,
    pub port: u16,
    pub ip_key: String,
    pub port_key: String,
}

impl ServerTarget {
    /// Environment handed to the collection runner
    pub fn environment(&self) -> Vec<(String, String)> {
        vec![
            (self.ip_key.clone(), self.host.clone()),
            (self.port_key.clone(), self.port.to_string()),
        ]
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub manifest: PathBuf,
    pub mongo: MongoTarget,
    pub server: ServerTarget,
    pub probe: RetryPolicy,
    pub probe_timeout: Duration,
    pub newman: String,
    pub reports_dir: PathBuf,
}

impl RunSettings {
    /// Merge the config file with command-line overrides
    pub fn resolve(config: Config, overrides: Overrides) -> Result<Self> {
        let manifest = overrides
            .manifest
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));

        let address = overrides.mongo.unwrap_or(config.mongo.address);
        let (host, port) = parse_mongo_address(&address)?;
        let mongo = MongoTarget {
            host,
            port,
            docker: overrides.docker || config.mongo.docker,
            shell: config.mongo.shell,
            import: config.mongo.import,
        };

        let url = overrides.server_url.unwrap_or(config.server.url);
        let (url, host, port) = parse_server_url(&url)?;
        let server = ServerTarget {
            url,
            host,
            port,
            ip_key: overrides.ip_key.unwrap_or(config.server.ip_key),
            port_key: overrides.port_key.unwrap_or(config.server.port_key),
        };

        let probe = if overrides.ci {
            RetryPolicy {
                attempts: config.probe.attempts.max(1),
                interval: Duration::from_secs(config.probe.interval_secs),
            }
        } else {
            RetryPolicy::once()
        };

        Ok(Self {
            manifest,
            mongo,
            server,
            probe,
            probe_timeout: Duration::from_secs(config.probe.timeout_secs),
            newman: config.runner.newman,
            reports_dir: config.runner.reports_dir,
        })
    }
}

/// Split a `host:port` Mongo address
pub fn parse_mongo_address(address: &str) -> Result<(String, String)> {
    match address.split(':').collect::<Vec<_>>().as_slice() {
        [host, port] if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok((host.to_string(), port.to_string()))
        }
        _ => Err(Error::Config(
            "--mongo has an incorrect format, it should be: ip:port".to_string(),
        )),
    }
}

/// Parse `http(s)://ip:port` or a bare `ip:port` into url, host and port
pub fn parse_server_url(raw: &str) -> Result<(String, String, u16)> {
    let invalid = || {
        Error::Config(
            "--serverurl has an incorrect format, it should be: http(s)://ip:port or ip:port"
                .to_string(),
        )
    };

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url.host_str().ok_or_else(invalid)?.to_string();
    let port = url.port().ok_or_else(invalid)?;
    Ok((with_scheme, host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.mongo.address, "localhost:27017");
        assert_eq!(config.server.url, "http://localhost:3001");
        assert_eq!(config.probe.attempts, 10);
        assert_eq!(config.probe.interval_secs, 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [mongo]
            shell = "mongosh"

            [probe]
            attempts = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.mongo.shell, "mongosh");
        assert_eq!(config.mongo.import, "mongoimport");
        assert_eq!(config.probe.attempts, 3);
        assert_eq!(config.probe.interval_secs, 4);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[probe]\nattempts = \"many\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_parse_mongo_address() {
        assert_eq!(
            parse_mongo_address("mongo-test:27018").unwrap(),
            ("mongo-test".to_string(), "27018".to_string())
        );
        assert!(parse_mongo_address("localhost").is_err());
        assert!(parse_mongo_address("a:b:c").is_err());
        assert!(parse_mongo_address("host:port").is_err());
    }

    #[test]
    fn test_parse_server_url() {
        let (url, host, port) = parse_server_url("http://127.0.0.1:3001").unwrap();
        assert_eq!(url, "http://127.0.0.1:3001");
        assert_eq!(host, "127.0.0.1");
        assert_eq!(port, 3001);

        let (url, host, port) = parse_server_url("api.local:8080").unwrap();
        assert_eq!(url, "http://api.local:8080");
        assert_eq!(host, "api.local");
        assert_eq!(port, 8080);

        assert!(parse_server_url("http://localhost").is_err());
    }

    #[test]
    fn test_resolve_overrides() {
        let overrides = Overrides {
            mongo: Some("db:1234".to_string()),
            server_url: Some("http://app:9000".to_string()),
            ip_key: Some("host".to_string()),
            ci: true,
            docker: true,
            ..Default::default()
        };
        let settings = RunSettings::resolve(Config::default(), overrides).unwrap();

        assert_eq!(settings.manifest, PathBuf::from(DEFAULT_MANIFEST));
        assert_eq!(settings.mongo.host, "db");
        assert!(settings.mongo.docker);
        assert_eq!(settings.probe.attempts, 10);
        assert_eq!(settings.probe.interval, Duration::from_secs(4));
        assert_eq!(
            settings.server.environment(),
            vec![
                ("host".to_string(), "app".to_string()),
                ("port".to_string(), "9000".to_string()),
            ]
        );
    }

    #[test]
    fn test_interactive_mode_probes_once() {
        let settings = RunSettings::resolve(Config::default(), Overrides::default()).unwrap();
        assert_eq!(settings.probe, RetryPolicy::once());
    }
}
