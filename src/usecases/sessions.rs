use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::models::sessions::{LoginArgs, Session};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub async fn start<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<Session> {
    match ctx.sessions().create(user_id).await {
        Ok(session) => Ok(Session::from(session)),
        Err(e) => unexpected(e),
    }
}

pub async fn login<C: Context>(ctx: &C, args: LoginArgs) -> ServiceResult<Session> {
    let email = args.email.trim().to_lowercase();
    let user = match ctx.users().fetch_one_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::SessionsInvalidCredentials),
        Err(e) => return unexpected(e),
    };

    let password_hash = user.password_hash;
    let password = args.password;
    let verified =
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash)).await?;
    if !matches!(verified, Ok(true)) {
        return Err(AppError::SessionsInvalidCredentials);
    }

    info!(user_id = user.id, "User logged in");
    start(ctx, user.id).await
}

/// Resolves a bearer token to a live session, extending it.
pub async fn authenticate<C: Context>(ctx: &C, session_id: Uuid) -> ServiceResult<Session> {
    let session = match ctx.sessions().fetch_one(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => return Err(AppError::Unauthorized),
        Err(e) => return unexpected(e),
    };
    if session.is_expired(ctx.config().session_ttl) {
        ctx.sessions().delete(session_id).await?;
        return Err(AppError::Unauthorized);
    }

    let mut session = session;
    session.updated_at = Utc::now();
    ctx.sessions().update(&session).await?;
    Ok(Session::from(session))
}

pub async fn delete<C: Context>(ctx: &C, session_id: Uuid) -> ServiceResult<()> {
    match ctx.sessions().delete(session_id).await {
        Ok(()) => Ok(()),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_all<C: Context>(ctx: &C) -> ServiceResult<Vec<Session>> {
    match ctx.sessions().fetch_all().await {
        Ok(sessions) => Ok(sessions.into_iter().map(Session::from).collect()),
        Err(e) => unexpected(e),
    }
}

/// Logs `user_id` out everywhere.
pub async fn delete_by_user<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<()> {
    let sessions = fetch_all(ctx).await?;
    for session in sessions.into_iter().filter(|s| s.user_id == user_id) {
        delete(ctx, session.session_id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::state::{AppState, ServiceConfig};
    use crate::models::users::RegisterArgs;
    use crate::repositories::memory::InMemoryStore;
    use crate::usecases::users;
    use chrono::TimeDelta;
    use std::sync::Arc;

    fn ctx(session_ttl: TimeDelta) -> AppState {
        let config = ServiceConfig {
            session_ttl,
            password_hash_cost: 4,
            ..Default::default()
        };
        AppState::in_memory(Arc::new(InMemoryStore::new()), config)
    }

    async fn register(ctx: &AppState) -> Session {
        let args = RegisterArgs {
            name: "erin".to_string(),
            email: "erin@example.com".to_string(),
            password: "correct horse".to_string(),
        };
        users::register(ctx, args).await.unwrap()
    }

    fn login_args(password: &str) -> LoginArgs {
        LoginArgs {
            email: "ERIN@example.com".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_checks_the_password() {
        let ctx = ctx(TimeDelta::hours(1));
        let registered = register(&ctx).await;

        let session = login(&ctx, login_args("correct horse")).await.unwrap();
        assert_eq!(session.user_id, registered.user_id);
        assert_ne!(session.session_id, registered.session_id);

        assert_eq!(
            login(&ctx, login_args("battery staple")).await.unwrap_err(),
            AppError::SessionsInvalidCredentials
        );
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let ctx = ctx(TimeDelta::hours(1));
        let session = register(&ctx).await;
        assert_eq!(
            authenticate(&ctx, session.session_id)
                .await
                .unwrap()
                .user_id,
            session.user_id
        );

        delete(&ctx, session.session_id).await.unwrap();
        assert_eq!(
            authenticate(&ctx, session.session_id).await.unwrap_err(),
            AppError::Unauthorized
        );
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected() {
        let ctx = ctx(TimeDelta::seconds(-1));
        let session = register(&ctx).await;
        assert_eq!(
            authenticate(&ctx, session.session_id).await.unwrap_err(),
            AppError::Unauthorized
        );
        assert_eq!(
            authenticate(&ctx, Uuid::new_v4()).await.unwrap_err(),
            AppError::Unauthorized
        );
    }
}
