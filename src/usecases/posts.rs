use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unexpected};
use crate::entities::posts::{
    CreateCommentArgs, CreatePostArgs, PostThread, REACTION_DISLIKE, REACTION_LIKE,
};
use crate::models::posts::{Post, PostArgs};
use crate::usecases::users;
use tracing::info;

fn validate_text(text: &str) -> ServiceResult<String> {
    match text.trim() {
        "" => Err(AppError::PostsInvalidText),
        text => Ok(text.to_string()),
    }
}

async fn fetch_thread<C: Context>(ctx: &C, post_id: i64) -> ServiceResult<PostThread> {
    match ctx.posts().fetch_one(post_id).await {
        Ok(Some(thread)) => Ok(thread),
        Ok(None) => Err(AppError::PostsNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_all<C: Context>(ctx: &C) -> ServiceResult<Vec<Post>> {
    match ctx.posts().fetch_all().await {
        Ok(threads) => Ok(threads.into_iter().map(Post::from).collect()),
        Err(e) => unexpected(e),
    }
}

pub async fn fetch_one<C: Context>(ctx: &C, post_id: i64) -> ServiceResult<Post> {
    fetch_thread(ctx, post_id).await.map(Post::from)
}

pub async fn create<C: Context>(ctx: &C, user_id: i64, args: PostArgs) -> ServiceResult<Post> {
    let text = validate_text(&args.text)?;
    let author = users::fetch_one(ctx, user_id).await?;
    let args = CreatePostArgs {
        user_id,
        name: author.name,
        avatar: author.avatar,
        title: args.title,
        text,
    };
    match ctx.posts().create(args).await {
        Ok(thread) => {
            info!(post_id = thread.post.id, user_id, "Post created");
            Ok(Post::from(thread))
        }
        Err(e) => unexpected(e),
    }
}

pub async fn update<C: Context>(
    ctx: &C,
    post_id: i64,
    user_id: i64,
    args: PostArgs,
) -> ServiceResult<Post> {
    let text = validate_text(&args.text)?;
    let thread = fetch_thread(ctx, post_id).await?;
    if thread.post.user_id != user_id {
        return Err(AppError::PostsForbidden);
    }
    match ctx.posts().update(post_id, args.title, text).await {
        Ok(Some(thread)) => Ok(Post::from(thread)),
        Ok(None) => Err(AppError::PostsNotFound),
        Err(e) => unexpected(e),
    }
}

pub async fn delete<C: Context>(ctx: &C, post_id: i64, user_id: i64) -> ServiceResult<()> {
    let thread = fetch_thread(ctx, post_id).await?;
    if thread.post.user_id != user_id {
        return Err(AppError::PostsForbidden);
    }
    match ctx.posts().delete(post_id).await {
        Ok(true) => {
            info!(post_id, user_id, "Post deleted");
            Ok(())
        }
        Ok(false) => Err(AppError::PostsNotFound),
        Err(e) => unexpected(e),
    }
}

/// Votes on a post. Voting against your own opposite vote only retracts it.
async fn vote<C: Context>(
    ctx: &C,
    post_id: i64,
    user_id: i64,
    kind: &'static str,
    opposite: &'static str,
    already_voted: AppError,
) -> ServiceResult<Post> {
    let thread = fetch_thread(ctx, post_id).await?;
    let current = thread.reaction_of(user_id).map(|r| r.kind.as_str());
    let result = match current {
        Some(current) if current == kind => return Err(already_voted),
        Some(current) if current == opposite => {
            ctx.posts().remove_reaction(post_id, user_id).await
        }
        _ => ctx.posts().set_reaction(post_id, user_id, kind).await,
    };
    if let Err(e) = result {
        return unexpected(e);
    }
    fetch_one(ctx, post_id).await
}

pub async fn like<C: Context>(ctx: &C, post_id: i64, user_id: i64) -> ServiceResult<Post> {
    vote(
        ctx,
        post_id,
        user_id,
        REACTION_LIKE,
        REACTION_DISLIKE,
        AppError::PostsAlreadyLiked,
    )
    .await
}

pub async fn dislike<C: Context>(ctx: &C, post_id: i64, user_id: i64) -> ServiceResult<Post> {
    vote(
        ctx,
        post_id,
        user_id,
        REACTION_DISLIKE,
        REACTION_LIKE,
        AppError::PostsAlreadyDisliked,
    )
    .await
}

pub async fn comment<C: Context>(
    ctx: &C,
    post_id: i64,
    user_id: i64,
    text: &str,
) -> ServiceResult<Post> {
    let text = validate_text(text)?;
    fetch_thread(ctx, post_id).await?;
    let author = users::fetch_one(ctx, user_id).await?;
    let args = CreateCommentArgs {
        user_id,
        name: author.name,
        avatar: author.avatar,
        text,
    };
    if let Err(e) = ctx.posts().add_comment(post_id, args).await {
        return unexpected(e);
    }
    fetch_one(ctx, post_id).await
}

pub async fn delete_comment<C: Context>(
    ctx: &C,
    post_id: i64,
    comment_id: i64,
    user_id: i64,
) -> ServiceResult<Post> {
    let thread = fetch_thread(ctx, post_id).await?;
    let Some(comment) = thread.comments.iter().find(|c| c.id == comment_id) else {
        return Err(AppError::PostsCommentNotFound);
    };
    if comment.user_id != user_id {
        return Err(AppError::PostsForbidden);
    }
    match ctx.posts().delete_comment(comment_id).await {
        Ok(true) => fetch_one(ctx, post_id).await,
        Ok(false) => Err(AppError::PostsCommentNotFound),
        Err(e) => unexpected(e),
    }
}
