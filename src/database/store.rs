use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::database::models::{Account, NewAccount};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account with id {0} not found")]
    NotFound(i32),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence contract for account records.
///
/// Implementations are shared across concurrent requests behind an `Arc`, so
/// every method must be safe to call concurrently.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account and return it with its assigned id.
    /// A duplicate account number fails with `StoreError::Conflict`.
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn delete(&self, id: i32) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: i32) -> Result<Account, StoreError>;

    /// Replace first name, last name and balance. Id and number never change.
    async fn update(&self, account: &Account) -> Result<(), StoreError>;

    /// All accounts, in no guaranteed order
    async fn list(&self) -> Result<Vec<Account>, StoreError>;

    /// Cheap connectivity probe for the health endpoint
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
