use crate::common::redis_json::RedisJson;
use crate::common::redis_pool::RedisPool;
use crate::entities::sessions::Session;
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use uuid::Uuid;

const SESSIONS_KEY: &str = "cpnet:sessions";

#[async_trait]
pub trait SessionsRepository: Send + Sync {
    async fn create(&self, user_id: i64) -> anyhow::Result<Session>;

    async fn fetch_one(&self, session_id: Uuid) -> anyhow::Result<Option<Session>>;

    async fn fetch_all(&self) -> anyhow::Result<Vec<Session>>;

    async fn update(&self, session: &Session) -> anyhow::Result<()>;

    async fn delete(&self, session_id: Uuid) -> anyhow::Result<()>;
}

pub struct RedisSessions {
    redis: RedisPool,
}

impl RedisSessions {
    pub fn new(redis: RedisPool) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionsRepository for RedisSessions {
    async fn create(&self, user_id: i64) -> anyhow::Result<Session> {
        let mut redis = self.redis.get().await?;
        let now = Utc::now();
        let session = Session {
            session_id: Uuid::new_v4(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        let _: () = redis
            .hset(SESSIONS_KEY, session.session_id, RedisJson(&session))
            .await?;
        Ok(session)
    }

    async fn fetch_one(&self, session_id: Uuid) -> anyhow::Result<Option<Session>> {
        let mut redis = self.redis.get().await?;
        let session: Option<RedisJson<Session>> = redis.hget(SESSIONS_KEY, session_id).await?;
        Ok(session.map(RedisJson::into_inner))
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<Session>> {
        let mut redis = self.redis.get().await?;
        let sessions: Vec<RedisJson<Session>> = redis.hvals(SESSIONS_KEY).await?;
        Ok(sessions.into_iter().map(RedisJson::into_inner).collect())
    }

    async fn update(&self, session: &Session) -> anyhow::Result<()> {
        let mut redis = self.redis.get().await?;
        let _: () = redis
            .hset(SESSIONS_KEY, session.session_id, RedisJson(session))
            .await?;
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> anyhow::Result<()> {
        let mut redis = self.redis.get().await?;
        let _: () = redis.hdel(SESSIONS_KEY, session_id).await?;
        Ok(())
    }
}
