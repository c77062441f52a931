use axum::{extract::{Request, State}, middleware::Next, response::Response};
use configs::AuthMode;
use tracing::warn;

use crate::errors::ApiError;
use crate::routes::AppState;

/// Middleware: check `X-API-Key` against the configured secret.
///
/// With no secret configured the check is skipped. On mismatch the configured
/// policy decides: `Enforcing` rejects with 401, `Observing` logs a warning
/// and lets the request through unauthenticated.
pub async fn check_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.auth.key_configured() {
        return Ok(next.run(req).await);
    }

    let provided = req
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    if provided == Some(state.auth.api_key.as_str()) {
        return Ok(next.run(req).await);
    }

    warn!(
        provided_key_masked = %mask(provided),
        mode = ?state.auth.mode,
        "request presented a missing or invalid API key"
    );
    match state.auth.mode {
        AuthMode::Enforcing => Err(ApiError::Unauthorized),
        AuthMode::Observing => Ok(next.run(req).await),
    }
}

/// Keep only the first character of a presented key in logs.
fn mask(key: Option<&str>) -> String {
    match key.and_then(|k| k.chars().next()) {
        Some(first) => format!("{first}***"),
        None => "<none>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_hides_all_but_first_char() {
        assert_eq!(mask(Some("secret")), "s***");
        assert_eq!(mask(Some("")), "<none>");
        assert_eq!(mask(None), "<none>");
    }
}
