use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::database::models::{Account, CreateAccountRequest, NewAccount};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::server::AppState;

use super::{decode_json, parse_id, read_body, ApiResult};

/// Attempts at drawing an unused account number before giving up
const ACCOUNT_NUMBER_ATTEMPTS: usize = 5;

/// Response body of `POST /account`: the stored account plus its token
#[derive(Debug, Serialize)]
pub struct CreatedAccount {
    #[serde(flatten)]
    pub account: Account,
    pub token: String,
}

/// GET /account - list every account
pub async fn list_accounts(State(state): State<AppState>) -> ApiResult<Vec<Account>> {
    let accounts = state.store.list().await?;
    Ok(Json(accounts))
}

/// POST /account - open an account and issue its token
pub async fn create_account(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<CreatedAccount> {
    let req: CreateAccountRequest = decode_json(&read_body(body)?)?;

    let mut attempt = 0;
    let account = loop {
        attempt += 1;
        let candidate = NewAccount::generate(req.first_name.clone(), req.last_name.clone());
        match state.store.create(candidate).await {
            Ok(account) => break account,
            Err(StoreError::Conflict(msg)) if attempt < ACCOUNT_NUMBER_ATTEMPTS => {
                warn!("Account number collision, drawing again: {}", msg);
            }
            Err(e) => return Err(e.into()),
        }
    };

    let token = state.tokens.issue(&account)?;
    info!("Created account {} (number {})", account.id, account.number);
    debug!("JWT token for account {}: {}", account.id, token);

    Ok(Json(CreatedAccount { account, token }))
}

/// GET /account/:id - show one account (token protected)
pub async fn get_account(State(state): State<AppState>, Path(raw_id): Path<String>) -> ApiResult<Account> {
    let id = parse_id(&raw_id)?;
    let account = state.store.get_by_id(id).await?;
    Ok(Json(account))
}

/// DELETE /account/:id - remove one account (token protected)
pub async fn delete_account(State(state): State<AppState>, Path(raw_id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;

    // Confirm existence first so a missing account reports NotFound
    state.store.get_by_id(id).await?;
    state.store.delete(id).await?;

    info!("Deleted account {}", id);
    Ok(Json(json!({ "account deleted successfully with id": id })))
}
