use redis::{FromRedisValue, RedisError, RedisResult, RedisWrite, ToRedisArgs, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Stores a value in redis as its JSON encoding.
#[repr(transparent)]
#[derive(Debug)]
pub struct RedisJson<T>(pub T);

impl<T> RedisJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> ToRedisArgs for RedisJson<T> {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        // Serializing plain structs with string keys cannot fail.
        let encoded = serde_json::to_vec(&self.0).unwrap_or_default();
        out.write_arg(&encoded);
    }
}

impl<T: DeserializeOwned> FromRedisValue for RedisJson<T> {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let encoded = Vec::<u8>::from_redis_value(v)?;
        let decoded: T = serde_json::from_slice(&encoded).map_err(RedisError::from)?;
        Ok(RedisJson(decoded))
    }
}
