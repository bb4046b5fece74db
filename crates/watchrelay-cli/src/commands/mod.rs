pub mod auth;
pub mod config;
pub mod prompts;
pub mod sync;
