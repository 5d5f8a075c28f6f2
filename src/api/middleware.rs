//! Webhook authentication.
//!
//! Telegram echoes the secret given to `setWebhook` in the
//! `X-Telegram-Bot-Api-Secret-Token` header of every delivery.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Webhook security settings.
#[derive(Clone, Debug, Default)]
pub struct WebhookAuth {
    /// Expected secret token. `None` accepts every request.
    pub secret: Option<String>,
}

impl WebhookAuth {
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }
}

/// Reject webhook calls that do not carry the configured secret token.
pub async fn secret_token_middleware(
    State(auth): State<WebhookAuth>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = match &auth.secret {
        Some(secret) => secret,
        None => return Ok(next.run(request).await),
    };

    let provided = request
        .headers()
        .get(SECRET_HEADER)
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Invalid webhook secret token");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing webhook secret token header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
