pub mod clans;
pub mod config;
pub mod error;
pub mod input;
pub mod time;
