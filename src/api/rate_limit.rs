use crate::api::errors::ApiError;
use crate::core::state::AppState;

/// Redis errors never block the request; the limiter only sheds load when it can count.
pub(crate) async fn enforce(
    state: &AppState,
    scope: &str,
    subject: &str,
    per_minute: u64,
    message: &'static str,
) -> Result<(), ApiError> {
    let allowed = match state.redis().allow(scope, subject, per_minute).await {
        Ok(allowed) => allowed,
        Err(err) => {
            tracing::warn!(error = %err, scope, "Rate limiter unavailable");
            true
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::TooManyRequests(message))
    }
}
