pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod store;
pub mod testing;

pub use app::{app, AppState};
