//! API key authentication

use crate::server::AppState;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use tracing::warn;

/// Header carrying the bot credential
pub const API_KEY_HEADER: &str = "API-KEY";

/// API key extractor: the `API-KEY` header must equal the configured key.
pub struct ApiKeyAuth;

#[async_trait::async_trait]
impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok());

        if presented == Some(state.api_key.as_str()) {
            Ok(ApiKeyAuth)
        } else {
            warn!("rejected scenario request with missing or invalid api key");
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}
