use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `account` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert an account; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub number: i64,
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, number: i64) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            number,
            balance: 0,
            created_at: Utc::now(),
        }
    }

    /// New zero-balance account with a freshly drawn account number
    pub fn generate(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self::new(first_name, last_name, generate_account_number())
    }

    pub fn into_account(self, id: i32) -> Account {
        Account {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            number: self.number,
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

/// Nine-digit account numbers
pub fn generate_account_number() -> i64 {
    rand::thread_rng().gen_range(100_000_000..1_000_000_000)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to_account: i64,
    pub amount: i64,
}
