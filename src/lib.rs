pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod output;
pub mod profile;
