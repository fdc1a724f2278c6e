use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::users::CreateUserArgs;
use crate::models::sessions::Session;
use crate::models::users::{RegisterArgs, User};
use crate::usecases::sessions;
use tracing::info;

const MIN_PASSWORD_LENGTH: usize = 6;
const DEFAULT_AVATAR: &str = "https://www.gravatar.com/avatar/?s=200&r=pg&d=mm";

pub async fn fetch_one<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<User> {
    match ctx.users().fetch_one(user_id).await {
        Ok(Some(user)) => Ok(User::from(user)),
        Ok(None) => Err(AppError::UsersNotFound),
        Err(e) => unexpected(e),
    }
}

/// Registers an account and logs it in.
pub async fn register<C: Context>(ctx: &C, args: RegisterArgs) -> ServiceResult<Session> {
    let name = args.name.trim().to_string();
    let email = args.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(AppError::UsersInvalidName);
    }
    if !is_plausible_email(&email) {
        return Err(AppError::UsersInvalidEmail);
    }
    if args.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::UsersInvalidPassword);
    }

    let cost = ctx.config().password_hash_cost;
    let password = args.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

    let args = CreateUserArgs {
        name,
        email,
        avatar: DEFAULT_AVATAR.to_string(),
        password_hash,
    };
    let user = match ctx.users().create(args).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(AppError::UsersEmailTaken),
        Err(e) => return unexpected(e),
    };
    info!(user_id = user.id, "User registered");
    sessions::start(ctx, user.id).await
}

/// Deletes the account of `user_id` together with its profile, posts,
/// comments, reactions, relationships and sessions.
pub async fn delete<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<()> {
    fetch_one(ctx, user_id).await?;

    if let Err(e) = ctx.posts().delete_by_user(user_id).await {
        return unexpected(e);
    }
    if let Err(e) = ctx.relationships().delete_by_user(user_id).await {
        return unexpected(e);
    }
    match ctx.users().delete(user_id).await {
        Ok(true) => {}
        Ok(false) => return Err(AppError::UsersNotFound),
        Err(e) => return unexpected(e),
    }
    sessions::delete_by_user(ctx, user_id).await?;

    info!(user_id, "Account deleted");
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
