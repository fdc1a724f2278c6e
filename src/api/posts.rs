use crate::api::JsonBody;
use crate::common::auth::AuthenticatedUser;
use crate::common::error::ServiceResponse;
use crate::common::state::AppState;
use crate::models::Empty;
use crate::models::posts::{ActivityPost, CommentArgs, Post, PostArgs};
use crate::usecases::{activity, posts};
use axum::Json;
use axum::extract::{Path, State};

pub async fn fetch_all(State(ctx): State<AppState>) -> ServiceResponse<Vec<Post>> {
    Ok(Json(posts::fetch_all(&ctx).await?))
}

pub async fn fetch_one(
    State(ctx): State<AppState>,
    _user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> ServiceResponse<Post> {
    Ok(Json(posts::fetch_one(&ctx, post_id).await?))
}

/// What the friend behind `user_id` has been up to since the caller last
/// checked.
pub async fn fetch_new_activity(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(counterparty): Path<i64>,
) -> ServiceResponse<Vec<ActivityPost>> {
    let activity = activity::fetch_new_activity(&ctx, user.user_id, counterparty).await?;
    Ok(Json(activity))
}

pub async fn create(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(args): JsonBody<PostArgs>,
) -> ServiceResponse<Post> {
    Ok(Json(posts::create(&ctx, user.user_id, args).await?))
}

pub async fn update(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
    JsonBody(args): JsonBody<PostArgs>,
) -> ServiceResponse<Post> {
    Ok(Json(posts::update(&ctx, post_id, user.user_id, args).await?))
}

pub async fn delete(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> ServiceResponse<Empty> {
    posts::delete(&ctx, post_id, user.user_id).await?;
    Ok(Json(Empty::default()))
}

pub async fn like(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> ServiceResponse<Post> {
    Ok(Json(posts::like(&ctx, post_id, user.user_id).await?))
}

pub async fn dislike(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> ServiceResponse<Post> {
    Ok(Json(posts::dislike(&ctx, post_id, user.user_id).await?))
}

pub async fn comment(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
    JsonBody(args): JsonBody<CommentArgs>,
) -> ServiceResponse<Post> {
    Ok(Json(
        posts::comment(&ctx, post_id, user.user_id, &args.text).await?,
    ))
}

pub async fn delete_comment(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
) -> ServiceResponse<Post> {
    let post = posts::delete_comment(&ctx, post_id, comment_id, user.user_id).await?;
    Ok(Json(post))
}
