//! Webhook server.

mod handlers;
pub mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::bot::{Bot, SharedMessenger};
pub use middleware::{WebhookAuth, SECRET_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub bot: Bot,
    pub messenger: SharedMessenger,
}

pub fn create_router(state: AppState, auth: WebhookAuth) -> Router {
    let webhook = Router::new()
        .route("/telegram/webhook", post(handlers::telegram_webhook))
        .layer(from_fn_with_state(auth, middleware::secret_token_middleware));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
