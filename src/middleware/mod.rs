pub mod auth;

pub use auth::access_token_middleware;
