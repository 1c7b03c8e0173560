//! Process configuration, read once at startup.

use std::fmt;

use thiserror::Error;

use crate::tmdb::DEFAULT_BASE_URL;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub tmdb_token: String,
    pub port: u16,
    pub allowed_origin: String,
    pub tmdb_base_url: String,
}

// The token never reaches logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tmdb_token", &"<redacted>")
            .field("port", &self.port)
            .field("allowed_origin", &self.allowed_origin)
            .field("tmdb_base_url", &self.tmdb_base_url)
            .finish()
    }
}

impl Config {
    /// Reads `TMDB_API_KEY`, `PORT`, `ALLOWED_ORIGIN` and `TMDB_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let tmdb_token = var("TMDB_API_KEY").ok_or(ConfigError::MissingVar("TMDB_API_KEY"))?;

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            tmdb_token,
            port,
            allowed_origin: var("ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_owned()),
            tmdb_base_url: var("TMDB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        })
    }

    /// Address the server binds to: all interfaces on the configured port.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
