use crate::api::JsonBody;
use crate::common::auth::AuthenticatedUser;
use crate::common::error::ServiceResponse;
use crate::common::state::AppState;
use crate::models::Empty;
use crate::models::users::{EducationArgs, Profile, ProfileArgs};
use crate::usecases::{profiles, users};
use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

pub async fn fetch_all(State(ctx): State<AppState>) -> ServiceResponse<Vec<Profile>> {
    Ok(Json(profiles::fetch_all(&ctx).await?))
}

pub async fn fetch_me(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
) -> ServiceResponse<Profile> {
    Ok(Json(profiles::fetch_one(&ctx, user.user_id).await?))
}

pub async fn fetch_one(
    State(ctx): State<AppState>,
    Path(user_id): Path<i64>,
) -> ServiceResponse<Profile> {
    Ok(Json(profiles::fetch_one(&ctx, user_id).await?))
}

pub async fn upsert(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(args): JsonBody<ProfileArgs>,
) -> ServiceResponse<Profile> {
    Ok(Json(profiles::upsert(&ctx, user.user_id, args).await?))
}

/// Deletes the caller's account along with everything it owns.
pub async fn delete_account(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
) -> ServiceResponse<Empty> {
    users::delete(&ctx, user.user_id).await?;
    Ok(Json(Empty::default()))
}

pub async fn add_education(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(args): JsonBody<EducationArgs>,
) -> ServiceResponse<Profile> {
    Ok(Json(
        profiles::add_education(&ctx, user.user_id, args).await?,
    ))
}

pub async fn update_education(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(education_id): Path<i64>,
    JsonBody(args): JsonBody<EducationArgs>,
) -> ServiceResponse<Profile> {
    let profile = profiles::update_education(&ctx, user.user_id, education_id, args).await?;
    Ok(Json(profile))
}

pub async fn delete_education(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(education_id): Path<i64>,
) -> ServiceResponse<Profile> {
    let profile = profiles::delete_education(&ctx, user.user_id, education_id).await?;
    Ok(Json(profile))
}

/// Passes the codeforces `user.info` result through untouched.
pub async fn fetch_codeforces(
    State(ctx): State<AppState>,
    Path(handle): Path<String>,
) -> ServiceResponse<Value> {
    Ok(Json(profiles::fetch_codeforces(&ctx, &handle).await?))
}
