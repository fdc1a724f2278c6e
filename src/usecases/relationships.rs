use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::relationships::{CreateOutcome, CreateRelationshipArgs};
use crate::models::relationships::{FriendsOverview, Relationship, RelationshipStatus};
use crate::usecases::{profiles, users};
use tracing::{info, warn};

pub async fn create_request<C: Context>(
    ctx: &C,
    initiator: i64,
    acceptor: i64,
) -> ServiceResult<Relationship> {
    if initiator == acceptor {
        return Err(AppError::RelationshipsSelfRequest);
    }
    profiles::ensure_exists(ctx, initiator).await?;
    profiles::ensure_exists(ctx, acceptor).await?;

    match ctx.relationships().fetch_between(initiator, acceptor).await {
        Ok(Some(_)) => return Err(AppError::RelationshipsAlreadyExists),
        Ok(None) => {}
        Err(e) => return unexpected(e),
    }

    // Names and avatars are snapshotted so friend lists render without a join.
    let initiator_user = users::fetch_one(ctx, initiator).await?;
    let acceptor_user = users::fetch_one(ctx, acceptor).await?;
    let args = CreateRelationshipArgs {
        initiator_id: initiator,
        initiator_name: initiator_user.name,
        initiator_avatar: initiator_user.avatar,
        acceptor_id: acceptor,
        acceptor_name: acceptor_user.name,
        acceptor_avatar: acceptor_user.avatar,
    };
    match ctx.relationships().create(args).await {
        Ok(CreateOutcome::Created(relationship)) => {
            info!(
                relationship_id = relationship.id,
                initiator, acceptor, "Friend request created"
            );
            Relationship::try_from(relationship)
        }
        Ok(CreateOutcome::AlreadyExists) => {
            warn!(
                initiator,
                acceptor, "Friend request collided with a concurrent request"
            );
            Err(AppError::RelationshipsAlreadyExists)
        }
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_one<C: Context>(ctx: &C, relationship_id: i64) -> ServiceResult<Relationship> {
    match ctx.relationships().fetch_one(relationship_id).await {
        Ok(Some(relationship)) => Relationship::try_from(relationship),
        Ok(None) => Err(AppError::RelationshipsNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_between<C: Context>(
    ctx: &C,
    user_id: i64,
    other_user_id: i64,
) -> ServiceResult<Relationship> {
    match ctx.relationships().fetch_between(user_id, other_user_id).await {
        Ok(Some(relationship)) => Relationship::try_from(relationship),
        Ok(None) => Err(AppError::RelationshipsNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_all<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<Vec<Relationship>> {
    match ctx.relationships().fetch_all(user_id).await {
        Ok(relationships) => relationships
            .into_iter()
            .map(Relationship::try_from)
            .collect(),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_overview<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<FriendsOverview> {
    let relationships = fetch_all(ctx, user_id).await?;
    Ok(FriendsOverview::partition(user_id, relationships))
}

/// Accepts or declines a pending request. Only the acceptor may respond,
/// and only once.
pub async fn respond<C: Context>(
    ctx: &C,
    relationship_id: i64,
    acting_user: i64,
    accept: bool,
) -> ServiceResult<Relationship> {
    let relationship = fetch_one(ctx, relationship_id).await?;
    if relationship.acceptor != acting_user {
        warn!(
            relationship_id,
            acting_user, "User tried to respond to a request sent to someone else"
        );
        return Err(AppError::RelationshipsForbidden);
    }
    if relationship.status != RelationshipStatus::Pending {
        return Err(AppError::RelationshipsAlreadyResolved);
    }

    let status = match accept {
        true => RelationshipStatus::Accepted,
        false => RelationshipStatus::Declined,
    };
    match ctx
        .relationships()
        .resolve(relationship_id, status.as_str())
        .await
    {
        Ok(Some(relationship)) => {
            info!(
                relationship_id,
                acting_user,
                status = status.as_str(),
                "Friend request resolved"
            );
            Relationship::try_from(relationship)
        }
        // Someone else resolved it between our read and the conditional update.
        Ok(None) => Err(AppError::RelationshipsAlreadyResolved),
        Err(e) => unexpected(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::state::{AppState, ServiceConfig};
    use crate::entities::users::{
        CreateUserArgs, EducationArgs, Profile, UpsertProfileArgs, User,
    };
    use crate::repositories::memory::InMemoryStore;
    use crate::repositories::users::UsersRepository;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Arc;

    async fn user_with_profile(store: &InMemoryStore, name: &str) -> i64 {
        let user = UsersRepository::create(
            store,
            CreateUserArgs {
                name: name.to_string(),
                email: format!("{name}@example.com"),
                avatar: format!("https://avatars.example.com/{name}"),
                password_hash: String::new(),
            },
        )
        .await
        .unwrap()
        .unwrap();
        store
            .upsert_profile(
                user.id,
                UpsertProfileArgs {
                    country: "PL".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                    codeforces_handle: None,
                    skills: "dp".to_string(),
                    bio: None,
                    youtube: None,
                    twitter: None,
                    facebook: None,
                    linkedin: None,
                    instagram: None,
                },
            )
            .await
            .unwrap();
        user.id
    }

    async fn setup() -> (AppState, i64, i64) {
        let store = Arc::new(InMemoryStore::new());
        let a = user_with_profile(&store, "alice").await;
        let b = user_with_profile(&store, "bob").await;
        (AppState::in_memory(store, ServiceConfig::default()), a, b)
    }

    #[tokio::test]
    async fn request_snapshots_both_users_and_starts_pending() {
        let (ctx, a, b) = setup().await;
        let relationship = create_request(&ctx, a, b).await.unwrap();
        assert_eq!(relationship.initiator, a);
        assert_eq!(relationship.acceptor, b);
        assert_eq!(relationship.initiator_name, "alice");
        assert_eq!(relationship.acceptor_avatar, "https://avatars.example.com/bob");
        assert_eq!(relationship.status, RelationshipStatus::Pending);
        assert_eq!(relationship.initiator_checked_at, relationship.created_at);
        assert_eq!(relationship.acceptor_checked_at, relationship.created_at);
    }

    #[tokio::test]
    async fn second_request_conflicts_in_either_direction() {
        let (ctx, a, b) = setup().await;
        create_request(&ctx, a, b).await.unwrap();
        assert_eq!(
            create_request(&ctx, a, b).await.unwrap_err(),
            AppError::RelationshipsAlreadyExists
        );
        assert_eq!(
            create_request(&ctx, b, a).await.unwrap_err(),
            AppError::RelationshipsAlreadyExists
        );
        assert_eq!(fetch_all(&ctx, a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_requests_create_exactly_one_relationship() {
        let (ctx, a, b) = setup().await;
        let (first, second) = tokio::join!(create_request(&ctx, a, b), create_request(&ctx, b, a));
        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        assert_eq!(fetch_all(&ctx, a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_to_self_or_profileless_user_is_rejected() {
        let (ctx, a, _) = setup().await;
        assert_eq!(
            create_request(&ctx, a, a).await.unwrap_err(),
            AppError::RelationshipsSelfRequest
        );
        assert_eq!(
            create_request(&ctx, a, 9999).await.unwrap_err(),
            AppError::ProfilesNotFound
        );
    }

    #[tokio::test]
    async fn only_the_acceptor_may_respond() {
        let (ctx, a, b) = setup().await;
        let relationship = create_request(&ctx, a, b).await.unwrap();
        assert_eq!(
            respond(&ctx, relationship.relationship_id, a, true)
                .await
                .unwrap_err(),
            AppError::RelationshipsForbidden
        );
        let unchanged = fetch_one(&ctx, relationship.relationship_id).await.unwrap();
        assert_eq!(unchanged.status, RelationshipStatus::Pending);
    }

    #[tokio::test]
    async fn second_response_conflicts_and_keeps_first_outcome() {
        let (ctx, a, b) = setup().await;
        let relationship = create_request(&ctx, a, b).await.unwrap();
        let declined = respond(&ctx, relationship.relationship_id, b, false)
            .await
            .unwrap();
        assert_eq!(declined.status, RelationshipStatus::Declined);

        assert_eq!(
            respond(&ctx, relationship.relationship_id, b, true)
                .await
                .unwrap_err(),
            AppError::RelationshipsAlreadyResolved
        );
        let stored = fetch_between(&ctx, b, a).await.unwrap();
        assert_eq!(stored.status, RelationshipStatus::Declined);
    }

    #[tokio::test]
    async fn responding_to_unknown_relationship_is_not_found() {
        let (ctx, _, b) = setup().await;
        assert_eq!(
            respond(&ctx, 4242, b, true).await.unwrap_err(),
            AppError::RelationshipsNotFound
        );
    }

    #[tokio::test]
    async fn accepted_request_shows_up_as_friend_on_both_sides() {
        let (ctx, a, b) = setup().await;
        let relationship = create_request(&ctx, a, b).await.unwrap();

        let overview = fetch_overview(&ctx, b).await.unwrap();
        assert_eq!(overview.incoming.len(), 1);
        let overview = fetch_overview(&ctx, a).await.unwrap();
        assert_eq!(overview.outgoing.len(), 1);

        respond(&ctx, relationship.relationship_id, b, true)
            .await
            .unwrap();
        for viewer in [a, b] {
            let overview = fetch_overview(&ctx, viewer).await.unwrap();
            assert_eq!(overview.friends.len(), 1);
            assert!(overview.incoming.is_empty());
            assert!(overview.outgoing.is_empty());
        }
    }

    /// A users store whose user lookups fail, while profiles still resolve.
    struct BrokenUsers(Arc<InMemoryStore>);

    #[async_trait]
    impl UsersRepository for BrokenUsers {
        async fn fetch_one(&self, _user_id: i64) -> anyhow::Result<Option<User>> {
            anyhow::bail!("connection reset")
        }

        async fn fetch_one_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            self.0.fetch_one_by_email(email).await
        }

        async fn create(&self, args: CreateUserArgs) -> anyhow::Result<Option<User>> {
            UsersRepository::create(self.0.as_ref(), args).await
        }

        async fn fetch_profile(&self, user_id: i64) -> anyhow::Result<Option<Profile>> {
            self.0.fetch_profile(user_id).await
        }

        async fn fetch_all_profiles(&self) -> anyhow::Result<Vec<Profile>> {
            self.0.fetch_all_profiles().await
        }

        async fn upsert_profile(
            &self,
            user_id: i64,
            args: UpsertProfileArgs,
        ) -> anyhow::Result<Profile> {
            self.0.upsert_profile(user_id, args).await
        }

        async fn add_education(&self, user_id: i64, args: EducationArgs) -> anyhow::Result<i64> {
            self.0.add_education(user_id, args).await
        }

        async fn update_education(
            &self,
            user_id: i64,
            education_id: i64,
            args: EducationArgs,
        ) -> anyhow::Result<bool> {
            self.0.update_education(user_id, education_id, args).await
        }

        async fn delete_education(
            &self,
            user_id: i64,
            education_id: i64,
        ) -> anyhow::Result<bool> {
            self.0.delete_education(user_id, education_id).await
        }

        async fn delete(&self, user_id: i64) -> anyhow::Result<bool> {
            UsersRepository::delete(self.0.as_ref(), user_id).await
        }
    }

    #[tokio::test]
    async fn failed_user_lookup_persists_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let a = user_with_profile(&store, "alice").await;
        let b = user_with_profile(&store, "bob").await;
        let mut ctx = AppState::in_memory(store.clone(), ServiceConfig::default());
        ctx.users = Arc::new(BrokenUsers(store));

        assert_eq!(
            create_request(&ctx, a, b).await.unwrap_err(),
            AppError::Unexpected
        );
        assert_eq!(
            fetch_between(&ctx, a, b).await.unwrap_err(),
            AppError::RelationshipsNotFound
        );
    }
}
