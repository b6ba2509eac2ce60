pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
mod context;
pub mod server;

pub use context::AppContext;
