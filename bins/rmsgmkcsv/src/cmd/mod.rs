pub mod config;
pub mod create;
pub mod error;
pub mod output;
