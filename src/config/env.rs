//! Runtime configuration from the environment (load `.env` with `dotenvy` first).

use crate::error::ConfigError;
use crate::security::DEFAULT_SUPER_ADMIN_ROLE;
use crate::state::RouteOptions;
use crate::store::validate_identifier;
use std::net::SocketAddr;

pub const DEFAULT_SCHEMA: &str = "crud";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// `None`: entities are kept in memory.
    pub database_url: Option<String>,
    /// Schema holding the entity tables. From `CRUD_SCHEMA`.
    pub schema: String,
    pub bind_addr: SocketAddr,
    /// Role that bypasses every permission check.
    pub super_admin_role: String,
    pub conceal_denied: bool,
    pub body_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let schema = get("CRUD_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        validate_identifier(&schema)?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let conceal_denied = match get("CONCEAL_DENIED") {
            None => true,
            Some(v) => parse_bool(&v).ok_or(ConfigError::InvalidValue {
                key: "CONCEAL_DENIED",
                value: v,
            })?,
        };

        let body_limit = match get("BODY_LIMIT_BYTES") {
            None => DEFAULT_BODY_LIMIT,
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BODY_LIMIT_BYTES",
                value: v,
            })?,
        };

        Ok(AppConfig {
            database_url: get("DATABASE_URL"),
            schema,
            bind_addr,
            super_admin_role: get("SUPER_ADMIN_ROLE").unwrap_or_else(|| DEFAULT_SUPER_ADMIN_ROLE.into()),
            conceal_denied,
            body_limit,
        })
    }

    pub fn route_options(&self) -> RouteOptions {
        RouteOptions {
            conceal_denied: self.conceal_denied,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c.database_url, None);
        assert_eq!(c.schema, DEFAULT_SCHEMA);
        assert_eq!(c.bind_addr.port(), 3000);
        assert_eq!(c.super_admin_role, DEFAULT_SUPER_ADMIN_ROLE);
        assert!(c.conceal_denied);
        assert_eq!(c.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn overrides() {
        let c = config(&[
            ("DATABASE_URL", "postgres://localhost/app"),
            ("CRUD_SCHEMA", "gis"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SUPER_ADMIN_ROLE", "ROLE_ROOT"),
            ("CONCEAL_DENIED", "off"),
            ("BODY_LIMIT_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(c.database_url.as_deref(), Some("postgres://localhost/app"));
        assert_eq!(c.schema, "gis");
        assert_eq!(c.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(c.super_admin_role, "ROLE_ROOT");
        assert!(!c.route_options().conceal_denied);
        assert_eq!(c.body_limit, 1024);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("BIND_ADDR", "nowhere")]),
            Err(ConfigError::InvalidValue { key: "BIND_ADDR", .. })
        ));
        assert!(matches!(
            config(&[("CONCEAL_DENIED", "maybe")]),
            Err(ConfigError::InvalidValue { key: "CONCEAL_DENIED", .. })
        ));
        assert!(matches!(
            config(&[("CRUD_SCHEMA", "bad-name")]),
            Err(ConfigError::InvalidIdentifier(_))
        ));
    }
}
