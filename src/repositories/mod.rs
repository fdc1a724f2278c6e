pub mod memory;
pub mod posts;
pub mod relationships;
pub mod sessions;
pub mod users;
