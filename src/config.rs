//! Environment-driven configuration.
//!
//! `Settings` configures the HTTP API; `ConnectionParams` is what the import
//! script connects with. Both read through a lookup function so tests can
//! supply variables without touching the process environment.

use crate::error::{HrError, Result};
use sqlx::postgres::PgConnectOptions;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub environment: String,
    pub app_name: String,
    pub app_version: String,
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
    pub api_prefix: String,
    pub log_level: String,
    pub cors_origins: Vec<String>,
    pub secret_key: Option<String>,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            app_name: "HR Cloud API".to_string(),
            app_version: "1.0.0".to_string(),
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_name: "hrdb".to_string(),
            db_username: None,
            db_password: None,
            api_prefix: "/api/v1".to_string(),
            log_level: "INFO".to_string(),
            cors_origins: vec!["*".to_string()],
            secret_key: None,
            server_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment. Variable names are
    /// matched case-insensitively.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars()
            .map(|(key, value)| (key.to_uppercase(), value))
            .collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build settings from an upper-case variable lookup, falling back to
    /// defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => defaults.cors_origins.clone(),
        };

        Ok(Self {
            environment: text("ENVIRONMENT", defaults.environment),
            app_name: text("APP_NAME", defaults.app_name),
            app_version: text("APP_VERSION", defaults.app_version),
            db_host: text("DB_HOST", defaults.db_host),
            db_port: parse_var(&lookup, "DB_PORT", defaults.db_port)?,
            db_name: text("DB_NAME", defaults.db_name),
            db_username: lookup("DB_USERNAME"),
            db_password: lookup("DB_PASSWORD"),
            api_prefix: text("API_PREFIX", defaults.api_prefix),
            log_level: text("LOG_LEVEL", defaults.log_level),
            cors_origins,
            secret_key: lookup("SECRET_KEY"),
            server_addr: text("SERVER_ADDR", defaults.server_addr),
        })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        match (self.db_username.as_deref(), self.db_password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Ok((user, password))
            }
            _ => Err(HrError::Config(
                "Database credentials are not set. Set DB_USERNAME and DB_PASSWORD in the \
                 environment or .env before starting the app."
                    .to_string(),
            )),
        }
    }

    /// Connection options; errors when credentials are missing.
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let (user, password) = self.credentials()?;
        Ok(PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(user)
            .password(password)
            .database(&self.db_name))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| HrError::Config(format!("{} must be a valid value ({}): {}", key, raw, e))),
        None => Ok(default),
    }
}

/// Connection parameters for the import script.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionParams {
    /// Apply `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD` and `PGDATABASE`
    /// on top of the command-line values. The environment wins when set.
    pub fn resolve<F>(cli: ConnectionParams, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            host: lookup("PGHOST").unwrap_or(cli.host),
            port: parse_var(&lookup, "PGPORT", cli.port)?,
            user: lookup("PGUSER").unwrap_or(cli.user),
            password: lookup("PGPASSWORD").unwrap_or(cli.password),
            database: lookup("PGDATABASE").unwrap_or(cli.database),
        })
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{} as {}", self.host, self.port, self.database, self.user)
    }
}

// Keep the password out of debug output.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}
