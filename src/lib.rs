pub mod config;
pub mod consts;
pub mod error;
pub mod generator;
pub mod handler;
pub mod prompts;
pub mod server;
pub mod store;
