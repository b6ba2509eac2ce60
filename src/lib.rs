//! vcmplugin: create, build, serve, preview and package VC Map plugins.

pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;

#[cfg(test)]
pub(crate) mod testing;

pub use app::api;
pub use domain::AppError;
