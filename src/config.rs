// ⚙️ Configuration - environment variables, optionally from a .env file

use crate::estimate::DEFAULT_VALIDITY_MONTHS;
use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "estimate.db";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:5002";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,

    /// SQLite file shared by the CLI, the terminal browser and the server
    pub db_path: PathBuf,

    pub server_addr: String,

    /// Empty means any origin (local single-user setup)
    pub cors_allow_origins: Vec<String>,

    /// Default 견적유효기간 in months
    pub validity_months: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            env: Environment::Dev,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            cors_allow_origins: Vec::new(),
            validity_months: DEFAULT_VALIDITY_MONTHS,
        }
    }
}

impl Settings {
    /// Read settings from the process environment, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Environment::parse(&lookup("ENV").unwrap_or_else(|| "dev".to_string()));

        let db_path = lookup("ESTIMATE_DB_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let server_addr =
            lookup("SERVER_ADDR").unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());

        let cors_allow_origins = lookup("CORS_ALLOW_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let validity_months = match lookup("ESTIMATE_VALIDITY_MONTHS") {
            None => DEFAULT_VALIDITY_MONTHS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(months) if months > 0 => months,
                _ => bail!("ESTIMATE_VALIDITY_MONTHS must be a positive number, got {:?}", raw),
            },
        };

        Ok(Settings {
            env,
            db_path,
            server_addr,
            cors_allow_origins,
            validity_months,
        })
    }
}
