use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::AtendimentoRepository;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::storage::ObjectStore;

/// Everything a handler needs, built once in `main` and cloned per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: Arc<dyn AtendimentoRepository>,
    pub storage: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repository: Arc<dyn AtendimentoRepository>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            repository,
            storage,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()));

    if state.config.is_production() {
        app = app.merge(static_routes(&state.config));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(public::login))
        .route("/api/health", get(public::health))
        .route("/arquivos/*path", get(public::get_file))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/contatos", get(protected::list_contatos))
        .route(
            "/api/contatos/:canal_cliente/atendimentos",
            get(protected::list_atendimentos),
        )
        .route("/api/atendimentos/:id", get(protected::get_atendimento))
        .route("/api/atendimentos/:id/mensagens", get(protected::list_mensagens))
        .route("/api/arquivos", get(protected::list_arquivos))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

/// Built frontend with SPA fallback to `index.html` for every unknown path
fn static_routes(config: &AppConfig) -> Router<AppState> {
    let static_dir = &config.server.static_dir;
    let index = ServeFile::new(static_dir.join("index.html"));
    Router::new().fallback_service(ServeDir::new(static_dir).fallback(index))
}
