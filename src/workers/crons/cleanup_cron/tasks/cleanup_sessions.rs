use crate::common::context::Context;
use crate::common::error::ServiceResult;
use crate::usecases::sessions;
use tracing::{error, info};

/// Deletes sessions idle for longer than the session TTL. Returns how many
/// were removed.
pub async fn cleanup_sessions<C: Context>(ctx: &C) -> ServiceResult<usize> {
    let ttl = ctx.config().session_ttl;
    let expired = sessions::fetch_all(ctx)
        .await?
        .into_iter()
        .filter(|session| session.is_expired(ttl));

    let mut removed = 0;
    for session in expired {
        info!(
            session_id = session.session_id.to_string(),
            user_id = session.user_id,
            "Session expired"
        );
        match sessions::delete(ctx, session.session_id).await {
            Ok(()) => removed += 1,
            Err(e) => error!(
                session_id = session.session_id.to_string(),
                user_id = session.user_id,
                "Failed to delete expired session: {e:?}",
            ),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::state::{AppState, ServiceConfig};
    use crate::repositories::memory::InMemoryStore;
    use chrono::TimeDelta;
    use std::sync::Arc;

    fn ctx(store: Arc<InMemoryStore>, session_ttl: TimeDelta) -> AppState {
        let config = ServiceConfig {
            session_ttl,
            ..Default::default()
        };
        AppState::in_memory(store, config)
    }

    #[tokio::test]
    async fn removes_only_expired_sessions() {
        let store = Arc::new(InMemoryStore::new());
        let fresh = ctx(store.clone(), TimeDelta::hours(1));
        sessions::start(&fresh, 1).await.unwrap();
        sessions::start(&fresh, 2).await.unwrap();

        assert_eq!(cleanup_sessions(&fresh).await.unwrap(), 0);
        assert_eq!(sessions::fetch_all(&fresh).await.unwrap().len(), 2);

        let stale = ctx(store, TimeDelta::seconds(-1));
        assert_eq!(cleanup_sessions(&stale).await.unwrap(), 2);
        assert!(sessions::fetch_all(&stale).await.unwrap().is_empty());
    }
}
