use crate::constants::{
    DEFAULT_DATA_TIMEOUT_SECS, DEFAULT_GREETING, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_PERMISSIONS,
    DEFAULT_TRANSFER_BUFFER_SIZE, USERNAME_REGEX,
};
use crate::core_auth::Permissions;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid passive port range {low}-{high}")]
    InvalidPassiveRange { low: u16, high: u16 },

    #[error("Control port {0} lies inside the passive port range")]
    ControlPortInPassiveRange(u16),

    #[error("Invalid username pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Invalid permission string {perm:?} for user {username}")]
    InvalidPermissions { username: String, perm: String },
}

/// Inclusive range of ports handed out for passive data connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u16, u16)", into = "(u16, u16)")]
pub struct PassivePortRange {
    pub low: u16,
    pub high: u16,
}

impl PassivePortRange {
    pub fn new(low: u16, high: u16) -> Result<Self, ConfigError> {
        let range = Self { low, high };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low == 0 || self.low > self.high {
            return Err(ConfigError::InvalidPassiveRange {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.low..=self.high).contains(&port)
    }

    pub fn port_count(&self) -> usize {
        usize::from(self.high - self.low) + 1
    }
}

impl From<(u16, u16)> for PassivePortRange {
    fn from((low, high): (u16, u16)) -> Self {
        Self { low, high }
    }
}

impl From<PassivePortRange> for (u16, u16) {
    fn from(range: PassivePortRange) -> Self {
        (range.low, range.high)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub passive_ports: PassivePortRange,
    /// Address advertised in PASV replies. Defaults to the control connection's local address.
    #[serde(default)]
    pub masquerade_address: Option<IpAddr>,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_data_timeout")]
    pub data_timeout_secs: u64,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_transfer_buffer_size")]
    pub transfer_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 2121,
            passive_ports: PassivePortRange {
                low: 60000,
                high: 60100,
            },
            masquerade_address: None,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            data_timeout_secs: DEFAULT_DATA_TIMEOUT_SECS,
            greeting: default_greeting(),
            transfer_buffer_size: DEFAULT_TRANSFER_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_idle_timeout() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

fn default_data_timeout() -> u64 {
    DEFAULT_DATA_TIMEOUT_SECS
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_transfer_buffer_size() -> usize {
    DEFAULT_TRANSFER_BUFFER_SIZE
}

fn default_perm() -> String {
    DEFAULT_PERMISSIONS.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    pub home: PathBuf,
    #[serde(default = "default_perm")]
    pub perm: String,
}

impl UserConfig {
    pub fn permissions(&self) -> Result<Permissions, ConfigError> {
        Permissions::parse(&self.perm).map_err(|_| ConfigError::InvalidPermissions {
            username: self.username.clone(),
            perm: self.perm.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// Flat JSON layout of the historical `config.json` deployment file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LegacyJsonConfig {
    ftp_host: String,
    ftp_port: u16,
    pasv_ports: (u16, u16),
    #[serde(default)]
    users: Vec<LegacyJsonUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LegacyJsonUser {
    username: String,
    password: String,
    home: PathBuf,
    #[serde(default = "default_perm")]
    perm: String,
}

impl From<LegacyJsonConfig> for Config {
    fn from(legacy: LegacyJsonConfig) -> Self {
        let masquerade_address = legacy
            .ftp_host
            .parse::<IpAddr>()
            .ok()
            .filter(|ip| !ip.is_unspecified());
        Config {
            server: ServerConfig {
                host: legacy.ftp_host,
                port: legacy.ftp_port,
                passive_ports: legacy.pasv_ports.into(),
                masquerade_address,
                ..ServerConfig::default()
            },
            users: legacy
                .users
                .into_iter()
                .map(|u| UserConfig {
                    username: u.username,
                    password: u.password,
                    home: u.home,
                    perm: u.perm,
                })
                .collect(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration file. `.json` files use the legacy
    /// flat layout, anything else is read as TOML.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let legacy: LegacyJsonConfig = serde_json::from_str(content)?;
        Ok(legacy.into())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.passive_ports.validate()?;
        if self.server.passive_ports.contains(self.server.port) {
            return Err(ConfigError::ControlPortInPassiveRange(self.server.port));
        }

        let username_re = Regex::new(USERNAME_REGEX)?;
        let mut seen = HashSet::new();
        for user in &self.users {
            if !username_re.is_match(&user.username) {
                return Err(ConfigError::InvalidUsername(user.username.clone()));
            }
            user.permissions()?;
            if !seen.insert(user.username.as_str()) {
                warn!(
                    "Duplicate user entry {}, the last one wins",
                    user.username
                );
            }
        }
        if self.users.is_empty() {
            warn!("No users configured, nobody will be able to log in");
        }
        Ok(())
    }
}
