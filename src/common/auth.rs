use crate::common::error::{AppError, ServiceResult};
use crate::common::state::AppState;
use crate::usecases::sessions;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::str::FromStr;
use uuid::Uuid;

/// The caller of an authenticated endpoint, resolved from
/// `Authorization: Bearer <session id>`.
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub session_id: Uuid,
}

fn bearer_token(parts: &Parts) -> ServiceResult<Uuid> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?;
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;
    Uuid::from_str(token.trim()).map_err(|_| AppError::Unauthorized)
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session_id = bearer_token(parts)?;
        let session = sessions::authenticate(state, session_id).await?;
        Ok(Self {
            user_id: session.user_id,
            session_id: session.session_id,
        })
    }
}
