//! Environment-driven configuration for the PUT/GET HTTP surface.

use std::env;
use thiserror::Error;

const DEFAULT_PUT_PORT: u16 = 60022;
const DEFAULT_GET_PORT: u16 = 60023;

/// Process configuration loaded once at startup. Invalid environment
/// variables are a launch-time failure, not a runtime one: the process
/// exits with a distinct code per failure category rather than falling
/// back to a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub put_port: u16,
    pub get_port: u16,
    pub tls: Option<TlsFiles>,
    pub debug: bool,
}

/// Paths to a TLS certificate and key. Only constructed when both
/// `SERVER_CRT_FILE` and `SERVER_KEY_FILE` are set; a half-set pair falls
/// back to plain HTTP, per spec.
#[derive(Debug, Clone)]
pub struct TlsFiles {
    pub cert_path: String,
    pub key_path: String,
}

/// Why the environment could not be turned into a [`Config`]. Each variant
/// maps to a distinct, stable process exit code via [`ConfigError::exit_code`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ACCESS_TOKEN is required")]
    MissingAccessToken,
    #[error("LIVELOG_PUT_PORT is not a valid integer: {0:?}")]
    PutPortNotANumber(String),
    #[error("LIVELOG_PUT_PORT is out of range 0-65535: {0}")]
    PutPortOutOfRange(i64),
    #[error("LIVELOG_GET_PORT is not a valid integer: {0:?}")]
    GetPortNotANumber(String),
    #[error("LIVELOG_GET_PORT is out of range 0-65535: {0}")]
    GetPortOutOfRange(i64),
}

impl ConfigError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingAccessToken => 1,
            Self::PutPortNotANumber(_) => 2,
            Self::PutPortOutOfRange(_) => 3,
            Self::GetPortNotANumber(_) => 4,
            Self::GetPortOutOfRange(_) => 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token = env::var("ACCESS_TOKEN").unwrap_or_default();
        if access_token.is_empty() {
            return Err(ConfigError::MissingAccessToken);
        }

        let put_port = parse_port(
            "LIVELOG_PUT_PORT",
            DEFAULT_PUT_PORT,
            ConfigError::PutPortNotANumber,
            ConfigError::PutPortOutOfRange,
        )?;
        let get_port = parse_port(
            "LIVELOG_GET_PORT",
            DEFAULT_GET_PORT,
            ConfigError::GetPortNotANumber,
            ConfigError::GetPortOutOfRange,
        )?;

        let cert = env::var("SERVER_CRT_FILE").ok();
        let key = env::var("SERVER_KEY_FILE").ok();
        let tls = match (cert, key) {
            (Some(cert_path), Some(key_path)) => Some(TlsFiles { cert_path, key_path }),
            _ => None,
        };

        let debug = env::var("DEBUG").map(|v| !v.is_empty()).unwrap_or(false);

        Ok(Self {
            access_token,
            put_port,
            get_port,
            tls,
            debug,
        })
    }
}

fn parse_port(
    var: &str,
    default: u16,
    not_a_number: impl FnOnce(String) -> ConfigError,
    out_of_range: impl FnOnce(i64) -> ConfigError,
) -> Result<u16, ConfigError> {
    let Ok(raw) = env::var(var) else {
        return Ok(default);
    };
    let value: i64 = raw.trim().parse().map_err(|_| not_a_number(raw.clone()))?;
    if value < 0 || value > i64::from(u16::MAX) {
        return Err(out_of_range(value));
    }
    Ok(value as u16)
}
