pub mod cleanup_sessions;
