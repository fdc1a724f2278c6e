use crate::entities::posts::{
    Comment, CreateCommentArgs, CreatePostArgs, Post, PostThread, REACTION_LIKE, Reaction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use sqlx::{MySql, Pool, QueryBuilder};

const READ_FIELDS: &str = "p.id, p.user_id, p.name, p.avatar, p.title, p.text, p.created_at";
const COMMENT_FIELDS: &str = "id, post_id, user_id, name, avatar, text, created_at";
const REACTION_FIELDS: &str = "post_id, user_id, kind, created_at";

#[async_trait]
pub trait PostsRepository: Send + Sync {
    async fn fetch_all(&self) -> anyhow::Result<Vec<PostThread>>;

    async fn fetch_one(&self, post_id: i64) -> anyhow::Result<Option<PostThread>>;

    /// Posts that `user_id` wrote, commented on or liked after `since`,
    /// newest post first.
    async fn fetch_active_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PostThread>>;

    async fn create(&self, args: CreatePostArgs) -> anyhow::Result<PostThread>;

    async fn update(
        &self,
        post_id: i64,
        title: Option<String>,
        text: String,
    ) -> anyhow::Result<Option<PostThread>>;

    async fn delete(&self, post_id: i64) -> anyhow::Result<bool>;

    /// Inserts or replaces the reaction of `user_id` on the post.
    async fn set_reaction(
        &self,
        post_id: i64,
        user_id: i64,
        kind: &'static str,
    ) -> anyhow::Result<()>;

    async fn remove_reaction(&self, post_id: i64, user_id: i64) -> anyhow::Result<()>;

    async fn add_comment(&self, post_id: i64, args: CreateCommentArgs) -> anyhow::Result<i64>;

    async fn delete_comment(&self, comment_id: i64) -> anyhow::Result<bool>;

    /// Removes the posts of `user_id` and everything they left on other posts.
    async fn delete_by_user(&self, user_id: i64) -> anyhow::Result<()>;
}

pub struct MySqlPosts {
    db: Pool<MySql>,
}

impl MySqlPosts {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }

    async fn load_threads(&self, posts: Vec<Post>) -> anyhow::Result<Vec<PostThread>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let mut query = QueryBuilder::<MySql>::new(const_str::concat!(
            "SELECT ",
            COMMENT_FIELDS,
            " FROM post_comments WHERE post_id IN ("
        ));
        let mut ids = query.separated(", ");
        for post in &posts {
            ids.push_bind(post.id);
        }
        ids.push_unseparated(") ORDER BY created_at DESC, id DESC");
        let comments: Vec<Comment> = query.build_query_as().fetch_all(&self.db).await?;

        let mut query = QueryBuilder::<MySql>::new(const_str::concat!(
            "SELECT ",
            REACTION_FIELDS,
            " FROM post_reactions WHERE post_id IN ("
        ));
        let mut ids = query.separated(", ");
        for post in &posts {
            ids.push_bind(post.id);
        }
        ids.push_unseparated(") ORDER BY created_at DESC");
        let reactions: Vec<Reaction> = query.build_query_as().fetch_all(&self.db).await?;

        let mut comments_by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for comment in comments {
            comments_by_post
                .entry(comment.post_id)
                .or_default()
                .push(comment);
        }
        let mut reactions_by_post: HashMap<i64, Vec<Reaction>> = HashMap::new();
        for reaction in reactions {
            reactions_by_post
                .entry(reaction.post_id)
                .or_default()
                .push(reaction);
        }

        let threads = posts
            .into_iter()
            .map(|post| PostThread {
                comments: comments_by_post.remove(&post.id).unwrap_or_default(),
                reactions: reactions_by_post.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect();
        Ok(threads)
    }
}

#[async_trait]
impl PostsRepository for MySqlPosts {
    async fn fetch_all(&self) -> anyhow::Result<Vec<PostThread>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM posts p ORDER BY p.created_at DESC, p.id DESC"
        );
        let posts = sqlx::query_as(QUERY).fetch_all(&self.db).await?;
        self.load_threads(posts).await
    }

    async fn fetch_one(&self, post_id: i64) -> anyhow::Result<Option<PostThread>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM posts p WHERE p.id = ?"
        );
        let post: Option<Post> = sqlx::query_as(QUERY)
            .bind(post_id)
            .fetch_optional(&self.db)
            .await?;
        match post {
            Some(post) => Ok(self.load_threads(vec![post]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn fetch_active_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<PostThread>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM posts p WHERE (p.user_id = ? AND p.created_at > ?)",
            " OR EXISTS (SELECT 1 FROM post_comments c",
            " WHERE c.post_id = p.id AND c.user_id = ? AND c.created_at > ?)",
            " OR EXISTS (SELECT 1 FROM post_reactions r",
            " WHERE r.post_id = p.id AND r.user_id = ? AND r.kind = ? AND r.created_at > ?)",
            " ORDER BY p.created_at DESC, p.id DESC"
        );
        let posts = sqlx::query_as(QUERY)
            .bind(user_id)
            .bind(since)
            .bind(user_id)
            .bind(since)
            .bind(user_id)
            .bind(REACTION_LIKE)
            .bind(since)
            .fetch_all(&self.db)
            .await?;
        self.load_threads(posts).await
    }

    async fn create(&self, args: CreatePostArgs) -> anyhow::Result<PostThread> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO posts (user_id, name, avatar, title, text, created_at)",
            " VALUES (?, ?, ?, ?, ?, ?)"
        );
        let result = sqlx::query(QUERY)
            .bind(args.user_id)
            .bind(args.name)
            .bind(args.avatar)
            .bind(args.title)
            .bind(args.text)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        let post_id = result.last_insert_id() as i64;
        match self.fetch_one(post_id).await? {
            Some(post) => Ok(post),
            None => anyhow::bail!("post {post_id} vanished after insert"),
        }
    }

    async fn update(
        &self,
        post_id: i64,
        title: Option<String>,
        text: String,
    ) -> anyhow::Result<Option<PostThread>> {
        const QUERY: &str = "UPDATE posts SET title = COALESCE(?, title), text = ? WHERE id = ?";
        sqlx::query(QUERY)
            .bind(title)
            .bind(text)
            .bind(post_id)
            .execute(&self.db)
            .await?;
        self.fetch_one(post_id).await
    }

    async fn delete(&self, post_id: i64) -> anyhow::Result<bool> {
        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM post_comments WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_reactions WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_reaction(
        &self,
        post_id: i64,
        user_id: i64,
        kind: &'static str,
    ) -> anyhow::Result<()> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO post_reactions (post_id, user_id, kind, created_at) VALUES (?, ?, ?, ?)",
            " ON DUPLICATE KEY UPDATE kind = VALUES(kind), created_at = VALUES(created_at)"
        );
        sqlx::query(QUERY)
            .bind(post_id)
            .bind(user_id)
            .bind(kind)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn remove_reaction(&self, post_id: i64, user_id: i64) -> anyhow::Result<()> {
        const QUERY: &str = "DELETE FROM post_reactions WHERE post_id = ? AND user_id = ?";
        sqlx::query(QUERY)
            .bind(post_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn add_comment(&self, post_id: i64, args: CreateCommentArgs) -> anyhow::Result<i64> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO post_comments (post_id, user_id, name, avatar, text, created_at)",
            " VALUES (?, ?, ?, ?, ?, ?)"
        );
        let result = sqlx::query(QUERY)
            .bind(post_id)
            .bind(args.user_id)
            .bind(args.name)
            .bind(args.avatar)
            .bind(args.text)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        Ok(result.last_insert_id() as i64)
    }

    async fn delete_comment(&self, comment_id: i64) -> anyhow::Result<bool> {
        const QUERY: &str = "DELETE FROM post_comments WHERE id = ?";
        let result = sqlx::query(QUERY)
            .bind(comment_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_user(&self, user_id: i64) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query(const_str::concat!(
            "DELETE FROM post_comments WHERE user_id = ?",
            " OR post_id IN (SELECT id FROM posts WHERE user_id = ?)"
        ))
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(const_str::concat!(
            "DELETE FROM post_reactions WHERE user_id = ?",
            " OR post_id IN (SELECT id FROM posts WHERE user_id = ?)"
        ))
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM posts WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
