use crate::api::JsonBody;
use crate::common::error::ServiceResponse;
use crate::common::state::AppState;
use crate::models::sessions::TokenResponse;
use crate::models::users::RegisterArgs;
use crate::usecases::users;
use axum::Json;
use axum::extract::State;

pub async fn register(
    State(ctx): State<AppState>,
    JsonBody(args): JsonBody<RegisterArgs>,
) -> ServiceResponse<TokenResponse> {
    let session = users::register(&ctx, args).await?;
    Ok(Json(TokenResponse {
        token: session.session_id,
    }))
}
