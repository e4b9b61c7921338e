pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use auth::{Claims, TokenError, TokenService};
pub use config::AppConfig;
pub use database::{AccountStore, InMemoryStore, PostgresStore, StoreError};
pub use error::{ApiError, ErrorStatusPolicy};
pub use server::{app, AppState};
