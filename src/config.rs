//! Runtime configuration from environment variables.

use crate::error::ConfigError;
use crate::service::is_identifier;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// Schema whose tables are exposed. Must be a plain identifier.
    pub db_schema: String,
    pub bind_addr: String,
    pub port: u16,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// - `DATABASE_URL`, or `POSTGRES_URL` (host[:port]) + `POSTGRES_USER` + `POSTGRES_PASSWORD` + `POSTGRES_DB`
    /// - `DB_SCHEMA` (default `public`), `BIND_ADDR` (default `0.0.0.0`), `PORT` (default 8080)
    /// - `DB_MAX_CONNECTIONS` (25), `DB_MIN_CONNECTIONS` (5), `DB_MAX_LIFETIME_SECS` (3600),
    ///   `DB_IDLE_TIMEOUT_SECS` (1800), `DB_ACQUIRE_TIMEOUT_SECS` (30)
    /// - `REQUEST_TIMEOUT_SECS` (30), `BODY_LIMIT_BYTES` (2 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |k: &str| vars.get(k).map(|v| v.trim()).filter(|v| !v.is_empty());

        let database_url = match get("DATABASE_URL") {
            Some(url) => url.to_string(),
            None => {
                let host = get("POSTGRES_URL").ok_or(ConfigError::Missing("DATABASE_URL or POSTGRES_URL"))?;
                let user = get("POSTGRES_USER").ok_or(ConfigError::Missing("POSTGRES_USER"))?;
                let db = get("POSTGRES_DB").ok_or(ConfigError::Missing("POSTGRES_DB"))?;
                let password = get("POSTGRES_PASSWORD").unwrap_or("");
                format!("postgres://{}:{}@{}/{}?sslmode=disable", user, password, host, db)
            }
        };

        let db_schema = get("DB_SCHEMA").unwrap_or("public").to_string();
        if !is_identifier(&db_schema) {
            return Err(ConfigError::Invalid {
                key: "DB_SCHEMA",
                value: db_schema,
            });
        }

        let config = AppConfig {
            database_url,
            db_schema,
            bind_addr: get("BIND_ADDR").unwrap_or("0.0.0.0").to_string(),
            port: parse_or(vars, "PORT", 8080)?,
            max_connections: parse_or(vars, "DB_MAX_CONNECTIONS", 25)?,
            min_connections: parse_or(vars, "DB_MIN_CONNECTIONS", 5)?,
            max_lifetime: Duration::from_secs(parse_or(vars, "DB_MAX_LIFETIME_SECS", 3600)?),
            idle_timeout: Duration::from_secs(parse_or(vars, "DB_IDLE_TIMEOUT_SECS", 1800)?),
            acquire_timeout: Duration::from_secs(parse_or(vars, "DB_ACQUIRE_TIMEOUT_SECS", 30)?),
            request_timeout: Duration::from_secs(parse_or(vars, "REQUEST_TIMEOUT_SECS", 30)?),
            body_limit_bytes: parse_or(vars, "BODY_LIMIT_BYTES", 2 * 1024 * 1024)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Validation("DB_MAX_CONNECTIONS must be at least 1".into()));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Validation(format!(
                "DB_MIN_CONNECTIONS ({}) exceeds DB_MAX_CONNECTIONS ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_or<T: FromStr>(vars: &HashMap<String, String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            key,
            value: v.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_with_database_url() {
        let c = AppConfig::from_vars(&vars(&[("DATABASE_URL", "postgres://localhost/shop")])).unwrap();
        assert_eq!(c.database_url, "postgres://localhost/shop");
        assert_eq!(c.db_schema, "public");
        assert_eq!((c.min_connections, c.max_connections), (5, 25));
        assert_eq!(c.max_lifetime, Duration::from_secs(3600));
        assert_eq!(c.idle_timeout, Duration::from_secs(1800));
        assert_eq!(c.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn url_assembled_from_parts() {
        let c = AppConfig::from_vars(&vars(&[
            ("POSTGRES_URL", "db:5432"),
            ("POSTGRES_USER", "app"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "shop"),
        ]))
        .unwrap();
        assert_eq!(c.database_url, "postgres://app:secret@db:5432/shop?sslmode=disable");
    }

    #[test]
    fn missing_database_is_an_error() {
        assert!(matches!(
            AppConfig::from_vars(&vars(&[("POSTGRES_USER", "app")])),
            Err(ConfigError::Missing(_))
        ));
    }

    #[test]
    fn rejects_bad_values() {
        let base = [("DATABASE_URL", "postgres://localhost/shop")];
        let mut v = vars(&base);
        v.insert("PORT".into(), "eighty".into());
        assert!(matches!(AppConfig::from_vars(&v), Err(ConfigError::Invalid { key: "PORT", .. })));

        let mut v = vars(&base);
        v.insert("DB_SCHEMA".into(), "public; drop".into());
        assert!(matches!(AppConfig::from_vars(&v), Err(ConfigError::Invalid { key: "DB_SCHEMA", .. })));

        let mut v = vars(&base);
        v.insert("DB_MIN_CONNECTIONS".into(), "30".into());
        assert!(matches!(AppConfig::from_vars(&v), Err(ConfigError::Validation(_))));
    }
}
