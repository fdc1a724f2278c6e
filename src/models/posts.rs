use crate::entities::posts::{Comment as CommentEntity, PostThread, REACTION_LIKE, Reaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Vote {
    pub user: i64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: i64,
    pub user: i64,
    pub name: String,
    pub avatar: String,
    pub text: String,
    pub date: DateTime<Utc>,
}

impl From<CommentEntity> for Comment {
    fn from(value: CommentEntity) -> Self {
        Self {
            id: value.id,
            user: value.user_id,
            name: value.name,
            avatar: value.avatar,
            text: value.text,
            date: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    // The author of the post
    pub user: i64,
    pub name: String,
    pub avatar: String,
    pub title: Option<String>,
    pub text: String,
    pub likes: Vec<Vote>,
    pub dislikes: Vec<Vote>,
    pub comments: Vec<Comment>,
    pub date: DateTime<Utc>,
}

impl From<PostThread> for Post {
    fn from(value: PostThread) -> Self {
        let (likes, dislikes): (Vec<_>, Vec<_>) = value
            .reactions
            .into_iter()
            .partition(|reaction| reaction.kind == REACTION_LIKE);
        let votes = |reactions: Vec<Reaction>| -> Vec<Vote> {
            reactions
                .into_iter()
                .map(|reaction| Vote {
                    user: reaction.user_id,
                    date: reaction.created_at,
                })
                .collect()
        };
        Self {
            id: value.post.id,
            user: value.post.user_id,
            name: value.post.name,
            avatar: value.post.avatar,
            title: value.post.title,
            text: value.post.text,
            likes: votes(likes),
            dislikes: votes(dislikes),
            comments: value.comments.into_iter().map(Comment::from).collect(),
            date: value.post.created_at,
        }
    }
}

/// What a friend did to land a post in the activity digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Posted,
    Commented,
    Liked,
}

impl ActivityKind {
    /// Authorship wins over a fresh comment, which wins over a like.
    pub fn classify(post: &Post, subject: i64, since: DateTime<Utc>) -> Self {
        if post.user == subject {
            ActivityKind::Posted
        } else if post
            .comments
            .iter()
            .any(|comment| comment.user == subject && comment.date > since)
        {
            ActivityKind::Commented
        } else {
            ActivityKind::Liked
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityPost {
    pub activity: ActivityKind,
    #[serde(flatten)]
    pub post: Post,
}

#[derive(Debug, Deserialize)]
pub struct PostArgs {
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentArgs {
    pub text: String,
}
