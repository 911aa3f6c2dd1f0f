use crate::decoder::WireFormat;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_BUS_ENDPOINT: &str = "tcp://127.0.0.1:5555";
const DEFAULT_CAPACITY: usize = 500;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_BACKOFF_MS: u64 = 1000;
const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 500;
const DEFAULT_MAX_MESSAGE_BYTES: u64 = 64 * 1024;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug)]
pub struct Config {
    pub bus_endpoint: String,
    pub wire_format: WireFormat,
    pub capacity: NonZeroUsize,
    pub address: SocketAddr,
    pub poll_interval: Duration,
    pub backoff: Duration,
    pub receive_timeout: Duration,
    pub max_message_size: u64,
    pub log_level: LevelFilter,
    pub log_format: String,
    pub log_to_file: bool,
}

impl Config {
    pub fn from_file() -> Result<Self, ConfigError> {
        let data = match std::fs::read_to_string(CONFIG_FILENAME) {
            Ok(value) => value,
            Err(_) => {
                let dto = ConfigDto::default();
                dto.save_to_file()?;
                return dto.into_config();
            },
        };

        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self, ConfigError> {
        let dto: ConfigDto =
            toml::from_str(data).map_err(ConfigError::TomlDeserializationError)?;
        dto.into_config()
    }
}

/// On-disk shape of the config. Missing keys take their defaults.
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct ConfigDto {
    bus_endpoint: String,
    wire_format: String,
    capacity: usize,
    host: String,
    port: u16,
    poll_interval_ms: u64,
    backoff_ms: u64,
    receive_timeout_ms: u64,
    max_message_bytes: u64,
    log_level: String,
    log_format: String,
    log_to_file: bool,
}

impl Default for ConfigDto {
    fn default() -> Self {
        Self {
            bus_endpoint: DEFAULT_BUS_ENDPOINT.to_string(),
            wire_format: WireFormat::Pmt.to_string(),
            capacity: DEFAULT_CAPACITY,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            backoff_ms: DEFAULT_BACKOFF_MS,
            receive_timeout_ms: DEFAULT_RECEIVE_TIMEOUT_MS,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: common::logging::DEFAULT_FORMAT.to_string(),
            log_to_file: false,
        }
    }
}

impl ConfigDto {
    fn save_to_file(&self) -> Result<(), ConfigError> {
        let data = toml::to_string(&self).map_err(ConfigError::TomlSerializationError)?;

        std::fs::write(CONFIG_FILENAME, data).map_err(ConfigError::IOError)?;

        Ok(())
    }

    fn into_config(self) -> Result<Config, ConfigError> {
        let host = IpAddr::from_str(self.host.trim()).map_err(|_| ConfigError::InvalidHost)?;

        let config = Config {
            bus_endpoint: self.bus_endpoint.trim().to_string(),
            wire_format: WireFormat::from_str(&self.wire_format)
                .map_err(|_| ConfigError::UnknownWireFormat)?,
            capacity: NonZeroUsize::new(self.capacity).ok_or(ConfigError::ZeroCapacity)?,
            address: SocketAddr::new(host, self.port),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            backoff: Duration::from_millis(self.backoff_ms),
            receive_timeout: Duration::from_millis(self.receive_timeout_ms),
            max_message_size: self.max_message_bytes,
            log_level: LevelFilter::from_str(&self.log_level)
                .map_err(|_| ConfigError::WrongLogLevel)?,
            log_format: self.log_format,
            log_to_file: self.log_to_file,
        };

        Ok(config)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("TOML Serialization Error.")]
    TomlSerializationError(#[from] toml::ser::Error),

    #[error("TOML Deserialization Error.")]
    TomlDeserializationError(#[from] toml::de::Error),

    #[error("Wrong log level.")]
    WrongLogLevel,

    #[error("Unknown wire format.")]
    UnknownWireFormat,

    #[error("Host is not an IP address.")]
    InvalidHost,

    #[error("Store capacity must be at least 1.")]
    ZeroCapacity,
}

impl ConfigError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            ConfigError::IOError(err) => Some(err.to_string()),
            ConfigError::TomlSerializationError(err) => Some(err.to_string()),
            ConfigError::TomlDeserializationError(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
