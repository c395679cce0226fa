// ABOUTME: Server configuration loaded from the environment
// ABOUTME: Port, bind host, database and upload paths, CORS origin, and upload limit

use std::env;
use std::net::IpAddr;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use tasklane_api::DEFAULT_MAX_UPLOAD_BYTES;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_DATABASE_PATH: &str = "./todo.db";
pub const DEFAULT_UPLOAD_DIR: &str = "./uploaded_files/uploads";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[source] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid MAX_UPLOAD_BYTES: {0}")]
    InvalidUploadLimit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub host: IpAddr,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub cors_origin: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or blank keys take defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };

        let host_str = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host_str
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_str.clone()))?;

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|limit| *limit > 0)
                .ok_or(ConfigError::InvalidUploadLimit(raw))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            port,
            host,
            database_path: PathBuf::from(
                get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            ),
            upload_dir: PathBuf::from(
                get("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
            ),
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            max_upload_bytes,
        })
    }
}

pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let port = raw.trim().parse::<u16>().map_err(ConfigError::InvalidPort)?;
    if port == 0 {
        return Err(ConfigError::PortOutOfRange(port));
    }
    Ok(port)
}
