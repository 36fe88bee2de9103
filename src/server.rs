use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::Database;
use crate::error::ApiError;
use crate::gate::{Action, AdministratorGate, AuthenticatedUserGate, Gate};
use crate::handlers;
use crate::resource::{GateKind, Registry, ResourceDef};

/// Shared application state. Every dependency a handler needs is carried
/// here and passed explicitly; nothing lives in process globals.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub registry: Arc<Registry>,
    user_gate: Arc<dyn Gate>,
    admin_gate: Arc<dyn Gate>,
}

impl AppState {
    /// Assemble state with the default placeholder gates.
    pub fn new(db: Database, registry: Registry) -> Self {
        Self::with_gates(db, registry, Arc::new(AuthenticatedUserGate), Arc::new(AdministratorGate))
    }

    /// Assemble state with explicit gate implementations. The seam real
    /// authorization plugs into later.
    pub fn with_gates(
        db: Database,
        registry: Registry,
        user_gate: Arc<dyn Gate>,
        admin_gate: Arc<dyn Gate>,
    ) -> Self {
        Self { db, registry: Arc::new(registry), user_gate, admin_gate }
    }

    /// Resolve a URL path segment against the registry.
    pub fn resource(&self, path: &str) -> Result<&ResourceDef, ApiError> {
        self.registry
            .get(path)
            .ok_or_else(|| ApiError::not_found(format!("unknown resource '{}'", path)))
    }

    /// Run the resource's write gate for the given action.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        resource: &ResourceDef,
        action: Action,
    ) -> Result<(), ApiError> {
        let gate = match resource.write_gate {
            GateKind::User => &self.user_gate,
            GateKind::Admin => &self.admin_gate,
        };
        gate.authorize(headers, resource, action).await?;
        Ok(())
    }
}

/// Build the application router. Route bindings are fixed: the collection
/// and item patterns resolve their resource segment against the registry,
/// which never changes after startup.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/:resource/",
            get(handlers::record_list).post(handlers::record_create),
        )
        .route(
            "/:resource/:id",
            get(handlers::record_show)
                .put(handlers::record_update)
                .delete(handlers::record_destroy),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
