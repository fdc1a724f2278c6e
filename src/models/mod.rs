use serde::Serialize;

pub mod posts;
pub mod relationships;
pub mod sessions;
pub mod users;

/// Body of endpoints that have nothing to return.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}
