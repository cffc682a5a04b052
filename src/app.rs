//! Router construction and shared application state.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config, handlers, middleware, store::Store, worker::queue::TaskPublisher,
};

/// State shared with every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub publisher: Arc<dyn TaskPublisher>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, publisher: Arc<dyn TaskPublisher>, config: Config) -> Self {
        Self {
            store,
            publisher,
            config: Arc::new(config),
        }
    }
}

/// Build the HTTP router.
///
/// Public routes: health, registration, login, user list, exchange rate.
/// Everything else sits behind the bearer token middleware.
pub fn router(state: AppState) -> Router {
    let authenticated_routes = Router::new()
        .route("/me", get(handlers::users::me))
        .route("/credit", get(handlers::transactions::credit))
        .route(
            "/transactions",
            post(handlers::transactions::create_transaction)
                .get(handlers::transactions::list_transactions),
        )
        .route(
            "/transactions/{id}",
            get(handlers::transactions::get_transaction),
        )
        .route(
            "/transactions/{id}/process",
            post(handlers::transactions::process_transaction),
        )
        .route(
            "/exchange-rate",
            put(handlers::exchange::update_exchange_rate),
        )
        .route("/predict", post(handlers::generations::predict))
        .route("/predictions", get(handlers::generations::list_predictions))
        .route(
            "/predictions/{id}/status",
            get(handlers::generations::prediction_status),
        )
        .route(
            "/predictions/{id}/audio",
            get(handlers::generations::prediction_audio),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/register", post(handlers::users::register))
        .route("/login", post(handlers::users::login))
        .route("/users", get(handlers::users::list_users))
        .route("/exchange-rate", get(handlers::exchange::get_exchange_rate))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
