use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Local;

use super::AppState;
use crate::telegram::{process_update, Update};

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Telegram
// ============================================================

/// Handle one pushed update.
///
/// Replies go out through the Bot API before the request completes. The
/// status is always 200 so Telegram does not redeliver; failures are logged.
pub async fn telegram_webhook(
    State(state): State<AppState>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!("Webhook update {}", update.update_id);
    process_update(
        &state.bot,
        state.messenger.as_ref(),
        &update,
        Local::now().naive_local(),
    )
    .await;
    StatusCode::OK
}
