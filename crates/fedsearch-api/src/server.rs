//! API server implementation

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use fedsearch_auth::{AuthConfig, AuthLayer, CredentialValidator, SharedSecretValidator};
use fedsearch_core::{IdentityResolver, RecordStore};
use fedsearch_fts::{Dispatcher, StaticEngineProvider, create_search_backend};
use fedsearch_storage::{Fixture, MemoryStore};
use http::{Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::FedsearchConfig;
use crate::routes::{self, AppState};
use crate::{Error, Result};

/// Build the application router.
///
/// The credential gate wraps only the search route; `/health` is open.
pub fn router<V: CredentialValidator>(
    state: AppState,
    validator: Arc<V>,
    auth: AuthConfig,
    route: &str,
) -> Router {
    let search = get(routes::search)
        .post(routes::search)
        .options(routes::preflight);

    Router::new()
        .route(route, search)
        .route_layer(AuthLayer::new(validator, auth))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Fedsearch API server
pub struct Server {
    config: FedsearchConfig,
    state: AppState,
    validator: Arc<SharedSecretValidator>,
}

impl Server {
    /// Assemble the server from configuration.
    ///
    /// Loads the fixture (if any), builds the search backend and the
    /// credential validator. Fails on invalid configuration.
    pub fn from_config(config: FedsearchConfig) -> Result<Self> {
        config.validate()?;

        let fixture = match &config.storage.fixture {
            Some(path) => Fixture::load(path)?,
            None => {
                log::warn!("No storage.fixture configured; starting with an empty store");
                Fixture::default()
            }
        };

        let backend = create_search_backend(&config.search, fixture.records.clone())?;
        let provider = StaticEngineProvider::new().with_engine(&config.search.scope, backend);
        let dispatcher = Dispatcher::new(Arc::new(provider), &config.search.scope)
            .with_timeout(config.search.timeout());

        let store = Arc::new(MemoryStore::from_fixture(&fixture)?);
        let resolver: Arc<dyn IdentityResolver> = store.clone();
        let records: Arc<dyn RecordStore> = store;

        // Disabled auth never verifies, so the hash may be absent there.
        let hash = config.bearer_hash().unwrap_or_default().to_string();
        let validator = Arc::new(SharedSecretValidator::new(hash, resolver));

        Ok(Self {
            state: AppState::new(Arc::new(dispatcher), records),
            validator,
            config,
        })
    }

    /// The configured router.
    pub fn router(&self) -> Router {
        router(
            self.state.clone(),
            self.validator.clone(),
            self.config.auth_config(),
            &self.config.server.route,
        )
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(self) -> Result<()> {
        let app = self.router();
        let bind = &self.config.server.bind;

        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .map_err(Error::Server)?;

        if !self.config.auth.enabled {
            log::warn!("Authentication is DISABLED; every request runs as the admin user");
        }
        tracing::info!(
            bind = %bind,
            route = %self.config.server.route,
            backend = %self.config.search.backend,
            "fedsearch listening"
        );

        axum::serve(listener, app).await.map_err(Error::Server)
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_config_rejects_missing_hash() {
        let err = Server::from_config(FedsearchConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_config_with_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"users": [{{"id": "1", "user_name": "admin", "is_admin": true}}],
                "records": [{{"id": "a1", "module": "Accounts", "fields": {{"name": "Acme"}}}}]}}"#
        )
        .unwrap();

        let mut config = FedsearchConfig::default();
        config.auth.bearer_hash = Some("$2b$04$abcdefghijklmnopqrstuu".to_string());
        config.storage.fixture = Some(file.path().to_path_buf());

        let server = Server::from_config(config).unwrap();
        let _router = server.router();
    }

    #[test]
    fn test_from_config_bad_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FedsearchConfig::default();
        config.auth.enabled = false;
        config.storage.fixture = Some(dir.path().join("missing.json"));

        let err = Server::from_config(config).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
