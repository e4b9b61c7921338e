use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::future::Future;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::models::{Account, NewAccount};
use crate::database::store::{AccountStore, StoreError};

const CREATE_ACCOUNT_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS account (
        id serial PRIMARY KEY,
        first_name varchar(50) NOT NULL,
        last_name varchar(50) NOT NULL,
        number bigint NOT NULL UNIQUE,
        balance bigint NOT NULL DEFAULT 0,
        created_at timestamptz NOT NULL
    )
"#;

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, number, balance, created_at";

/// Account store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout())
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self::from_pool(pool, config.query_timeout()))
    }

    pub fn from_pool(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    /// Create the account table if it does not exist yet
    pub async fn init(&self) -> Result<(), StoreError> {
        self.bounded(sqlx::query(CREATE_ACCOUNT_TABLE).execute(&self.pool)).await?;
        info!("Account table ready");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    async fn bounded<T, F>(&self, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.query_timeout)),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl AccountStore for PostgresStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let query = format!(
            "INSERT INTO account (first_name, last_name, number, balance, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            ACCOUNT_COLUMNS
        );

        let insert = sqlx::query_as::<_, Account>(&query)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(account.number)
            .bind(account.balance)
            .bind(account.created_at)
            .fetch_one(&self.pool);

        match self.bounded(insert).await {
            Err(StoreError::Sqlx(e)) if is_unique_violation(&e) => Err(StoreError::Conflict(format!(
                "account number {} already exists",
                account.number
            ))),
            other => other,
        }
    }

    async fn delete(&self, id: i32) -> Result<(), StoreError> {
        let result = self
            .bounded(sqlx::query("DELETE FROM account WHERE id = $1").bind(id).execute(&self.pool))
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn get_by_id(&self, id: i32) -> Result<Account, StoreError> {
        let query = format!("SELECT {} FROM account WHERE id = $1", ACCOUNT_COLUMNS);
        self.bounded(sqlx::query_as::<_, Account>(&query).bind(id).fetch_optional(&self.pool))
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, account: &Account) -> Result<(), StoreError> {
        let result = self
            .bounded(
                sqlx::query("UPDATE account SET first_name = $1, last_name = $2, balance = $3 WHERE id = $4")
                    .bind(&account.first_name)
                    .bind(&account.last_name)
                    .bind(account.balance)
                    .bind(account.id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(account.id));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let query = format!("SELECT {} FROM account ORDER BY id", ACCOUNT_COLUMNS);
        self.bounded(sqlx::query_as::<_, Account>(&query).fetch_all(&self.pool)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}
