use crate::common::context::Context;
use crate::common::redis_pool::RedisPool;
use crate::repositories::memory::InMemoryStore;
use crate::repositories::posts::{MySqlPosts, PostsRepository};
use crate::repositories::relationships::{MySqlRelationships, RelationshipsRepository};
use crate::repositories::sessions::{RedisSessions, SessionsRepository};
use crate::repositories::users::{MySqlUsers, UsersRepository};
use chrono::TimeDelta;
use sqlx::{MySql, Pool};
use std::sync::Arc;

pub const DEFAULT_CODEFORCES_API_URL: &str = "https://codeforces.com/api";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub session_ttl: TimeDelta,
    pub password_hash_cost: u32,
    pub codeforces_api_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session_ttl: TimeDelta::days(7),
            password_hash_cost: bcrypt::DEFAULT_COST,
            codeforces_api_url: DEFAULT_CODEFORCES_API_URL.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub relationships: Arc<dyn RelationshipsRepository>,
    pub posts: Arc<dyn PostsRepository>,
    pub users: Arc<dyn UsersRepository>,
    pub sessions: Arc<dyn SessionsRepository>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(db: Pool<MySql>, redis: RedisPool, config: ServiceConfig) -> Self {
        Self {
            relationships: Arc::new(MySqlRelationships::new(db.clone())),
            posts: Arc::new(MySqlPosts::new(db.clone())),
            users: Arc::new(MySqlUsers::new(db)),
            sessions: Arc::new(RedisSessions::new(redis)),
            config: Arc::new(config),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>, config: ServiceConfig) -> Self {
        Self {
            relationships: store.clone(),
            posts: store.clone(),
            users: store.clone(),
            sessions: store,
            config: Arc::new(config),
        }
    }
}

impl Context for AppState {
    fn relationships(&self) -> &dyn RelationshipsRepository {
        self.relationships.as_ref()
    }

    fn posts(&self) -> &dyn PostsRepository {
        self.posts.as_ref()
    }

    fn users(&self) -> &dyn UsersRepository {
        self.users.as_ref()
    }

    fn sessions(&self) -> &dyn SessionsRepository {
        self.sessions.as_ref()
    }

    fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
