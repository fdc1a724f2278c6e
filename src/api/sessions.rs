use crate::api::JsonBody;
use crate::common::auth::AuthenticatedUser;
use crate::common::error::ServiceResponse;
use crate::common::state::AppState;
use crate::models::Empty;
use crate::models::sessions::{LoginArgs, TokenResponse};
use crate::usecases::sessions;
use axum::Json;
use axum::extract::State;

pub async fn login(
    State(ctx): State<AppState>,
    JsonBody(args): JsonBody<LoginArgs>,
) -> ServiceResponse<TokenResponse> {
    let session = sessions::login(&ctx, args).await?;
    Ok(Json(TokenResponse {
        token: session.session_id,
    }))
}

pub async fn logout(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
) -> ServiceResponse<Empty> {
    sessions::delete(&ctx, user.session_id).await?;
    Ok(Json(Empty::default()))
}
