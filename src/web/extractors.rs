use chrono::{Duration, Utc};

use crate::error::{AppError, AppResult};
use crate::web::state::AppState;

/// The session token is carried as an ordinary field in the JSON body,
/// query string, or multipart form depending on the endpoint (spec.md §6)
/// rather than a cookie, so there is no single axum extractor that covers
/// every call site. Handlers pull the token out of whichever source fits
/// and call this to authenticate it.
pub async fn authenticate(state: &AppState, token: &str) -> AppResult<i64> {
    let session = state
        .sessions
        .find(token)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::AuthMissing)?;

    let now = Utc::now();
    if session.is_expired(now) {
        state
            .sessions
            .delete(token)
            .await
            .map_err(AppError::Internal)?;
        return Err(AppError::AuthExpired);
    }

    let new_expires_at = now + Duration::hours(state.session_settings.ttl_hours);
    state
        .sessions
        .touch(token, new_expires_at, now)
        .await
        .map_err(AppError::Internal)?;

    Ok(session.user_id)
}
