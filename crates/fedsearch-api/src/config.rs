//! Server configuration.
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! | variable | field |
//! |---|---|
//! | `FEDSEARCH_BEARER_HASH` | `auth.bearer_hash` |
//! | `FEDSEARCH_ADMIN_USER` | `auth.admin_user` |
//! | `FEDSEARCH_BIND` | `server.bind` |
//! | `FEDSEARCH_ELASTIC_URL` | `search.url` |
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:8080"
//! route = "/customGlobalSearch"
//!
//! [auth]
//! bearer_hash = "$2y$10$..."
//! admin_user = "admin"
//!
//! [search]
//! backend = "elastic"
//! url = "http://localhost:9200"
//! index_prefix = "crm_"
//! timeout_ms = 5000
//!
//! [storage]
//! fixture = "demos/fixture.json"
//! ```

use std::path::{Path, PathBuf};

use fedsearch_auth::AuthConfig;
use fedsearch_fts::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Route the search endpoint is mounted on by default.
pub const DEFAULT_ROUTE: &str = "/customGlobalSearch";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FedsearchConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Credential gate settings.
    pub auth: AuthSettings,
    /// Search engine settings.
    pub search: SearchConfig,
    /// Record and user data.
    pub storage: StorageConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind: String,
    /// Path of the search endpoint.
    pub route: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            route: DEFAULT_ROUTE.to_string(),
        }
    }
}

/// Credential gate settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Enforce the bearer check.
    pub enabled: bool,
    /// Bcrypt hash of the shared bearer secret.
    pub bearer_hash: Option<String>,
    /// Login name of the administrative user requests run as.
    pub admin_user: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let gate = AuthConfig::default();
        Self {
            enabled: gate.enabled,
            bearer_hash: None,
            admin_user: gate.admin_user,
        }
    }
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("enabled", &self.enabled)
            .field("bearer_hash", &self.bearer_hash.as_ref().map(|_| "<redacted>"))
            .field("admin_user", &self.admin_user)
            .finish()
    }
}

/// Where users and records come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON fixture file. Without one the store starts empty.
    pub fixture: Option<PathBuf>,
}

impl FedsearchConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("invalid configuration: {e}")))
    }

    /// Load configuration from `path` (or defaults), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("cannot read {}: {e}", path.display()))
                })?;
                log::debug!("Loaded configuration from {}", path.display());
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(hash) = lookup("FEDSEARCH_BEARER_HASH") {
            self.auth.bearer_hash = Some(hash);
        }
        if let Some(user) = lookup("FEDSEARCH_ADMIN_USER") {
            self.auth.admin_user = user;
        }
        if let Some(bind) = lookup("FEDSEARCH_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = lookup("FEDSEARCH_ELASTIC_URL") {
            self.search.url = Some(url);
        }
    }

    /// Check the settings the server cannot start without.
    pub fn validate(&self) -> Result<()> {
        if self.auth.enabled && self.bearer_hash().is_none() {
            return Err(Error::config(
                "auth.bearer_hash is required while auth is enabled",
            ));
        }
        if self.auth.admin_user.trim().is_empty() {
            return Err(Error::config("auth.admin_user must not be empty"));
        }
        if !self.server.route.starts_with('/') {
            return Err(Error::config(format!(
                "server.route must start with '/': {}",
                self.server.route
            )));
        }
        match self.search.backend.as_str() {
            "memory" => {}
            "elastic" if self.search.url.is_some() => {}
            "elastic" => {
                return Err(Error::config(
                    "search.url is required for the elastic backend",
                ));
            }
            other => {
                return Err(Error::config(format!("unknown search backend '{other}'")));
            }
        }
        Ok(())
    }

    /// Configured bearer hash, if non-blank.
    pub fn bearer_hash(&self) -> Option<&str> {
        self.auth
            .bearer_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    /// Settings for the auth middleware.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            enabled: self.auth.enabled,
            admin_user: self.auth.admin_user.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FedsearchConfig::default();
        assert_eq!(config.server.route, "/customGlobalSearch");
        assert!(config.auth.enabled);
        assert_eq!(config.auth.admin_user, "admin");
        assert_eq!(config.search.backend, "memory");
        assert!(config.storage.fixture.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FedsearchConfig::from_toml_str(
            r#"
            [auth]
            bearer_hash = "$2y$04$abc"

            [search]
            backend = "elastic"
            url = "http://es:9200"
            "#,
        )
        .unwrap();

        assert_eq!(config.bearer_hash(), Some("$2y$04$abc"));
        assert_eq!(config.auth.admin_user, "admin");
        assert_eq!(config.search.scope, "GlobalSearch");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_toml() {
        let err = FedsearchConfig::from_toml_str("[server\nbind = 1").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nroute = \"/search\"").unwrap();

        let config = FedsearchConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.route, "/search");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FedsearchConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FEDSEARCH_BEARER_HASH", "$2b$04$xyz"),
            ("FEDSEARCH_ADMIN_USER", "root"),
            ("FEDSEARCH_BIND", "0.0.0.0:9000"),
            ("FEDSEARCH_ELASTIC_URL", "http://es:9200"),
        ]
        .into_iter()
        .collect();

        let mut config = FedsearchConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bearer_hash(), Some("$2b$04$xyz"));
        assert_eq!(config.auth.admin_user, "root");
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.search.url.as_deref(), Some("http://es:9200"));
    }

    #[test]
    fn test_validate_requires_hash_when_enabled() {
        let mut config = FedsearchConfig::default();
        assert!(config.validate().is_err());

        config.auth.bearer_hash = Some("   ".to_string());
        assert!(config.validate().is_err());

        config.auth.enabled = false;
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_route_and_backend() {
        let mut config = FedsearchConfig::default();
        config.auth.enabled = false;

        config.server.route = "search".to_string();
        assert!(config.validate().is_err());
        config.server.route = DEFAULT_ROUTE.to_string();

        config.search.backend = "elastic".to_string();
        assert!(config.validate().is_err());
        config.search.url = Some("http://es:9200".to_string());
        config.validate().unwrap();

        config.search.backend = "solr".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_demo_config_parses() {
        let config =
            FedsearchConfig::from_toml_str(include_str!("../../../demos/fedsearch.toml")).unwrap();
        assert_eq!(config.search.backend, "memory");
        assert_eq!(
            config.storage.fixture.as_deref(),
            Some(Path::new("demos/fixture.json"))
        );
    }

    #[test]
    fn test_debug_redacts_hash() {
        let mut config = FedsearchConfig::default();
        config.auth.bearer_hash = Some("$2y$10$secret".to_string());
        assert!(!format!("{config:?}").contains("secret"));
    }
}
