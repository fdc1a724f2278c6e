use crate::entities::relationships::{
    CreateOutcome, CreateRelationshipArgs, Relationship, STATUS_PENDING, pair_key,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySql, Pool};

const TABLE_NAME: &str = "relationships";
const READ_FIELDS: &str = r#"
id, initiator_id, initiator_name, initiator_avatar,
acceptor_id, acceptor_name, acceptor_avatar, status,
initiator_checked_at, acceptor_checked_at, created_at"#;

#[async_trait]
pub trait RelationshipsRepository: Send + Sync {
    async fn fetch_one(&self, relationship_id: i64) -> anyhow::Result<Option<Relationship>>;

    /// Looks the pair up regardless of which side initiated.
    async fn fetch_between(
        &self,
        user_id: i64,
        other_user_id: i64,
    ) -> anyhow::Result<Option<Relationship>>;

    async fn fetch_all(&self, user_id: i64) -> anyhow::Result<Vec<Relationship>>;

    async fn create(&self, args: CreateRelationshipArgs) -> anyhow::Result<CreateOutcome>;

    /// Moves a pending relationship to `status`. Returns `None` when the
    /// relationship was no longer pending.
    async fn resolve(
        &self,
        relationship_id: i64,
        status: &'static str,
    ) -> anyhow::Result<Option<Relationship>>;

    async fn delete_by_user(&self, user_id: i64) -> anyhow::Result<()>;
}

pub struct MySqlRelationships {
    db: Pool<MySql>,
}

impl MySqlRelationships {
    pub fn new(db: Pool<MySql>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RelationshipsRepository for MySqlRelationships {
    async fn fetch_one(&self, relationship_id: i64) -> anyhow::Result<Option<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE id = ?"
        );
        let relationship = sqlx::query_as(QUERY)
            .bind(relationship_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(relationship)
    }

    async fn fetch_between(
        &self,
        user_id: i64,
        other_user_id: i64,
    ) -> anyhow::Result<Option<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE user_low = ? AND user_high = ?"
        );
        let (user_low, user_high) = pair_key(user_id, other_user_id);
        let relationship = sqlx::query_as(QUERY)
            .bind(user_low)
            .bind(user_high)
            .fetch_optional(&self.db)
            .await?;
        Ok(relationship)
    }

    async fn fetch_all(&self, user_id: i64) -> anyhow::Result<Vec<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "SELECT ",
            READ_FIELDS,
            " FROM ",
            TABLE_NAME,
            " WHERE initiator_id = ? OR acceptor_id = ?"
        );
        let relationships = sqlx::query_as(QUERY)
            .bind(user_id)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(relationships)
    }

    async fn create(&self, args: CreateRelationshipArgs) -> anyhow::Result<CreateOutcome> {
        const QUERY: &str = const_str::concat!(
            "INSERT INTO ",
            TABLE_NAME,
            " (initiator_id, initiator_name, initiator_avatar,",
            " acceptor_id, acceptor_name, acceptor_avatar, status,",
            " initiator_checked_at, acceptor_checked_at, created_at)",
            " VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        let now = Utc::now();
        let result = sqlx::query(QUERY)
            .bind(args.initiator_id)
            .bind(args.initiator_name)
            .bind(args.initiator_avatar)
            .bind(args.acceptor_id)
            .bind(args.acceptor_name)
            .bind(args.acceptor_avatar)
            .bind(STATUS_PENDING)
            .bind(now)
            .bind(now)
            .bind(now)
            .execute(&self.db)
            .await;
        let relationship_id = match result {
            Ok(result) => result.last_insert_id() as i64,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Ok(CreateOutcome::AlreadyExists);
            }
            Err(e) => return Err(e.into()),
        };
        match self.fetch_one(relationship_id).await? {
            Some(relationship) => Ok(CreateOutcome::Created(relationship)),
            None => anyhow::bail!("relationship {relationship_id} vanished after insert"),
        }
    }

    async fn resolve(
        &self,
        relationship_id: i64,
        status: &'static str,
    ) -> anyhow::Result<Option<Relationship>> {
        const QUERY: &str = const_str::concat!(
            "UPDATE ",
            TABLE_NAME,
            " SET status = ? WHERE id = ? AND status = ?"
        );
        let result = sqlx::query(QUERY)
            .bind(status)
            .bind(relationship_id)
            .bind(STATUS_PENDING)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_one(relationship_id).await
    }

    async fn delete_by_user(&self, user_id: i64) -> anyhow::Result<()> {
        const QUERY: &str = const_str::concat!(
            "DELETE FROM ",
            TABLE_NAME,
            " WHERE initiator_id = ? OR acceptor_id = ?"
        );
        sqlx::query(QUERY)
            .bind(user_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
