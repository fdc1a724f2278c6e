use crate::common::auth::AuthenticatedUser;
use crate::common::error::ServiceResponse;
use crate::common::state::AppState;
use crate::models::relationships::{FriendsOverviewResponse, RelationshipResponse};
use crate::usecases::relationships;
use axum::Json;
use axum::extract::{Path, State};

pub async fn fetch_all(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
) -> ServiceResponse<Vec<RelationshipResponse>> {
    let relationships = relationships::fetch_all(&ctx, user.user_id).await?;
    Ok(Json(
        relationships
            .into_iter()
            .map(RelationshipResponse::from)
            .collect(),
    ))
}

pub async fn fetch_overview(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
) -> ServiceResponse<FriendsOverviewResponse> {
    let overview = relationships::fetch_overview(&ctx, user.user_id).await?;
    Ok(Json(FriendsOverviewResponse::from(overview)))
}

pub async fn fetch_between(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(other_user_id): Path<i64>,
) -> ServiceResponse<RelationshipResponse> {
    let relationship = relationships::fetch_between(&ctx, user.user_id, other_user_id).await?;
    Ok(Json(RelationshipResponse::from(relationship)))
}

pub async fn create_request(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(acceptor): Path<i64>,
) -> ServiceResponse<RelationshipResponse> {
    let relationship = relationships::create_request(&ctx, user.user_id, acceptor).await?;
    Ok(Json(RelationshipResponse::from(relationship)))
}

pub async fn accept(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(relationship_id): Path<i64>,
) -> ServiceResponse<RelationshipResponse> {
    let relationship = relationships::respond(&ctx, relationship_id, user.user_id, true).await?;
    Ok(Json(RelationshipResponse::from(relationship)))
}

pub async fn decline(
    State(ctx): State<AppState>,
    user: AuthenticatedUser,
    Path(relationship_id): Path<i64>,
) -> ServiceResponse<RelationshipResponse> {
    let relationship = relationships::respond(&ctx, relationship_id, user.user_id, false).await?;
    Ok(Json(RelationshipResponse::from(relationship)))
}
