use anyhow::Context;
use std::env;
use std::error::Error;
use std::str::FromStr;

pub trait FromEnv: Sized {
    fn from_env(env_var: &str) -> anyhow::Result<Self>;

    /// Like `from_env`, but an unset variable yields `default`.
    fn from_env_or(env_var: &str, default: Self) -> anyhow::Result<Self> {
        match env::var_os(env_var) {
            Some(_) => Self::from_env(env_var),
            None => Ok(default),
        }
    }
}

impl<T: FromStr> FromEnv for T
where
    <T as FromStr>::Err: 'static + Error + Send + Sync,
{
    fn from_env(env_var: &str) -> anyhow::Result<Self> {
        let value = env::var(env_var).with_context(|| format!("{env_var} is not set"))?;
        T::from_str(&value).with_context(|| format!("{env_var} has an invalid value"))
    }
}
