use crate::common::context::Context;
use crate::common::error::{ServiceResult, unexpected};
use crate::models::posts::{ActivityKind, ActivityPost, Post};
use crate::usecases::relationships;

/// Posts that `counterparty` wrote, commented on or liked since `viewer`
/// last checked on them.
///
/// The viewer's check timestamp is read but never moved, so repeated calls
/// keep returning everything since the relationship was created.
pub async fn fetch_new_activity<C: Context>(
    ctx: &C,
    viewer: i64,
    counterparty: i64,
) -> ServiceResult<Vec<ActivityPost>> {
    let relationship = relationships::fetch_between(ctx, viewer, counterparty).await?;
    let cursor = relationship.cursor_for(viewer);

    let threads = match ctx.posts().fetch_active_since(counterparty, cursor).await {
        Ok(threads) => threads,
        Err(e) => return unexpected(e),
    };
    let mut posts: Vec<Post> = threads.into_iter().map(Post::from).collect();
    posts.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    let activity = posts
        .into_iter()
        .map(|post| ActivityPost {
            activity: ActivityKind::classify(&post, counterparty, cursor),
            post,
        })
        .collect();
    Ok(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::AppError;
    use crate::common::state::{AppState, ServiceConfig};
    use crate::entities::posts::{
        CreateCommentArgs, CreatePostArgs, REACTION_DISLIKE, REACTION_LIKE,
    };
    use crate::entities::relationships::{CreateOutcome, CreateRelationshipArgs};
    use crate::repositories::memory::InMemoryStore;
    use crate::repositories::relationships::RelationshipsRepository;
    use chrono::{DateTime, TimeDelta, Utc};
    use std::sync::Arc;

    const ANNA: i64 = 100;
    const BORIS: i64 = 200;
    const CLAIRE: i64 = 300;

    struct Fixture {
        store: Arc<InMemoryStore>,
        ctx: AppState,
        created_at: DateTime<Utc>,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = Arc::new(InMemoryStore::new());
            let args = CreateRelationshipArgs {
                initiator_id: ANNA,
                initiator_name: "anna".to_string(),
                initiator_avatar: String::new(),
                acceptor_id: BORIS,
                acceptor_name: "boris".to_string(),
                acceptor_avatar: String::new(),
            };
            let CreateOutcome::Created(relationship) =
                RelationshipsRepository::create(store.as_ref(), args)
                    .await
                    .unwrap()
            else {
                panic!("relationship should be new");
            };
            let ctx = AppState::in_memory(store.clone(), ServiceConfig::default());
            Self {
                store,
                ctx,
                created_at: relationship.created_at,
            }
        }

        async fn post(&self, author: i64, at: DateTime<Utc>) -> i64 {
            let args = CreatePostArgs {
                user_id: author,
                name: String::new(),
                avatar: String::new(),
                title: None,
                text: format!("post by {author}"),
            };
            self.store.insert_post_at(args, at).await
        }

        async fn comment(&self, post_id: i64, author: i64, at: DateTime<Utc>) {
            let args = CreateCommentArgs {
                user_id: author,
                name: String::new(),
                avatar: String::new(),
                text: "gg".to_string(),
            };
            self.store
                .insert_comment_at(post_id, args, at)
                .await
                .unwrap();
        }

        fn after(&self, minutes: i64) -> DateTime<Utc> {
            self.created_at + TimeDelta::minutes(minutes)
        }
    }

    #[tokio::test]
    async fn digest_is_not_consumed_by_reading_it() {
        let f = Fixture::new().await;
        let post_id = f.post(BORIS, f.after(1)).await;

        for _ in 0..2 {
            let activity = fetch_new_activity(&f.ctx, ANNA, BORIS).await.unwrap();
            assert_eq!(activity.len(), 1);
            assert_eq!(activity[0].post.id, post_id);
            assert_eq!(activity[0].activity, ActivityKind::Posted);
        }
    }

    #[tokio::test]
    async fn classifies_and_orders_newest_first() {
        let f = Fixture::new().await;
        let own = f.post(BORIS, f.after(3)).await;
        let commented = f.post(CLAIRE, f.after(2)).await;
        f.comment(commented, BORIS, f.after(4)).await;
        let liked = f.post(ANNA, f.after(1)).await;
        f.store
            .insert_reaction_at(liked, BORIS, REACTION_LIKE, f.after(5))
            .await;

        let activity = fetch_new_activity(&f.ctx, ANNA, BORIS).await.unwrap();
        let summary: Vec<(i64, ActivityKind)> =
            activity.iter().map(|a| (a.post.id, a.activity)).collect();
        assert_eq!(
            summary,
            vec![
                (own, ActivityKind::Posted),
                (commented, ActivityKind::Commented),
                (liked, ActivityKind::Liked),
            ]
        );
    }

    #[tokio::test]
    async fn ignores_stale_activity_dislikes_and_strangers() {
        let f = Fixture::new().await;
        f.post(BORIS, f.after(-10)).await;
        let old = f.post(CLAIRE, f.after(-5)).await;
        f.comment(old, BORIS, f.after(-4)).await;
        let disliked = f.post(CLAIRE, f.after(1)).await;
        f.store
            .insert_reaction_at(disliked, BORIS, REACTION_DISLIKE, f.after(2))
            .await;
        f.post(CLAIRE, f.after(3)).await;

        let activity = fetch_new_activity(&f.ctx, ANNA, BORIS).await.unwrap();
        assert!(activity.is_empty());
    }

    #[tokio::test]
    async fn activity_at_the_cursor_is_not_new() {
        let f = Fixture::new().await;
        f.post(BORIS, f.after(0)).await;
        let commented = f.post(CLAIRE, f.after(-1)).await;
        f.comment(commented, BORIS, f.after(0)).await;
        let liked = f.post(CLAIRE, f.after(-2)).await;
        f.store
            .insert_reaction_at(liked, BORIS, REACTION_LIKE, f.after(0))
            .await;

        let activity = fetch_new_activity(&f.ctx, ANNA, BORIS).await.unwrap();
        assert!(activity.is_empty());
    }

    #[tokio::test]
    async fn works_from_either_side() {
        let f = Fixture::new().await;
        let post_id = f.post(ANNA, f.after(1)).await;
        let activity = fetch_new_activity(&f.ctx, BORIS, ANNA).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].post.id, post_id);
    }

    #[tokio::test]
    async fn requires_a_relationship() {
        let f = Fixture::new().await;
        assert_eq!(
            fetch_new_activity(&f.ctx, ANNA, CLAIRE).await.unwrap_err(),
            AppError::RelationshipsNotFound
        );
    }
}
