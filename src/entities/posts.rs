use chrono::{DateTime, Utc};

pub const REACTION_LIKE: &str = "like";
pub const REACTION_DISLIKE: &str = "dislike";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub avatar: String,
    pub title: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub name: String,
    pub avatar: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Reaction {
    pub post_id: i64,
    pub user_id: i64,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

/// A post row together with everything hanging off it.
#[derive(Debug, Clone)]
pub struct PostThread {
    pub post: Post,
    pub comments: Vec<Comment>,
    pub reactions: Vec<Reaction>,
}

impl PostThread {
    pub fn reaction_of(&self, user_id: i64) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.user_id == user_id)
    }

    /// Whether `user_id` authored the post, a comment or a like after `since`.
    pub fn has_activity_since(&self, user_id: i64, since: DateTime<Utc>) -> bool {
        (self.post.user_id == user_id && self.post.created_at > since)
            || self
                .comments
                .iter()
                .any(|c| c.user_id == user_id && c.created_at > since)
            || self
                .reactions
                .iter()
                .any(|r| r.kind == REACTION_LIKE && r.user_id == user_id && r.created_at > since)
    }
}

pub struct CreatePostArgs {
    pub user_id: i64,
    pub name: String,
    pub avatar: String,
    pub title: Option<String>,
    pub text: String,
}

pub struct CreateCommentArgs {
    pub user_id: i64,
    pub name: String,
    pub avatar: String,
    pub text: String,
}
