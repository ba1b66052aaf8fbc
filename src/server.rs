//! Router assembly and backend wiring.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::{AppConfig, IdentityBackend, StoreBackend};
use crate::identity::{
    IdentityGateway, IdentityProvider, IdentityToolkitProvider, InMemoryIdentityProvider,
};
use crate::service::EventService;
use crate::store::{EventStore, InMemoryEventStore, PostgresEventStore};
use crate::ws::handler::ws_handler;

/// Builds the full application router: REST API, WebSocket endpoint,
/// Swagger UI (with the `swagger-ui` feature) and the tower-http layers.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", api::ApiDoc::openapi()),
        )
    };

    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Application state over in-memory backends.
#[must_use]
pub fn in_memory_state(policy: crate::store::RegistrationPolicy) -> AppState {
    let provider: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());
    let store: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
    AppState {
        gateway: Arc::new(IdentityGateway::new(provider)),
        events: Arc::new(EventService::new(store, policy)),
    }
}

/// Connects the configured backends and builds the application state.
///
/// With the PostgreSQL store, pending migrations are applied first.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let provider: Arc<dyn IdentityProvider> = match &config.identity {
        IdentityBackend::Memory => {
            tracing::warn!("using in-memory identity provider; accounts are lost on restart");
            Arc::new(InMemoryIdentityProvider::new())
        }
        IdentityBackend::IdentityToolkit(settings) => {
            tracing::info!(endpoint = %settings.endpoint, "using identity toolkit provider");
            Arc::new(IdentityToolkitProvider::new(settings.clone()))
        }
    };

    let store: Arc<dyn EventStore> = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory event store; data is lost on restart");
            Arc::new(InMemoryEventStore::new())
        }
        StoreBackend::Postgres => {
            let store = PostgresEventStore::connect(&config.database).await?;
            store.migrate().await?;
            tracing::info!("connected to postgres event store");
            Arc::new(store)
        }
    };

    Ok(AppState {
        gateway: Arc::new(IdentityGateway::new(provider)),
        events: Arc::new(EventService::new(store, config.registration_policy)),
    })
}
