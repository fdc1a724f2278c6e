pub mod activity;
pub mod posts;
pub mod profiles;
pub mod relationships;
pub mod sessions;
pub mod users;
