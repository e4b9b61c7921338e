use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::models::{Account, NewAccount};
use crate::database::store::{AccountStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    accounts: BTreeMap<i32, Account>,
}

/// Account store kept in process memory. Used by tests and `serve --in-memory`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.accounts.values().any(|a| a.number == account.number) {
            return Err(StoreError::Conflict(format!("account number {} already exists", account.number)));
        }
        inner.next_id += 1;
        let account = account.into_account(inner.next_id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.accounts.remove(&id).map(|_| ()).ok_or(StoreError::NotFound(id))
    }

    async fn get_by_id(&self, id: i32) -> Result<Account, StoreError> {
        let inner = self.inner.read().await;
        inner.accounts.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.accounts.get_mut(&account.id).ok_or(StoreError::NotFound(account.id))?;
        stored.first_name = account.first_name.clone();
        stored.last_name = account.last_name.clone();
        stored.balance = account.balance;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.accounts.values().cloned().collect())
    }
}
