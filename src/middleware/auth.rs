use axum::{
    extract::{Path, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{Claims, TokenService};
use crate::database::AccountStore;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::server::AppState;

/// Header carrying the account token
pub const TOKEN_HEADER: &str = "x-jwt-token";

/// Why a request was turned away. Only ever logged; callers see one uniform
/// "permission denied" body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    MissingToken,
    InvalidToken,
    MalformedId,
    UnknownAccount,
    AccountMismatch,
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Denial::MissingToken => "missing token",
            Denial::InvalidToken => "invalid token",
            Denial::MalformedId => "malformed account id",
            Denial::UnknownAccount => "account lookup failed",
            Denial::AccountMismatch => "token bound to another account",
        };
        f.write_str(reason)
    }
}

/// Caller context injected into the request once the token matched the account
#[derive(Clone, Debug)]
pub struct AuthorizedAccount {
    pub account_id: i32,
    pub claims: Claims,
}

/// Extract the raw token from the request headers
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Decide whether `token` grants access to the account identified by `raw_id`.
///
/// Steps run in order and stop at the first failure: token present, token
/// valid, id well formed, account exists, account number equals the
/// `accountNumber` claim.
pub async fn authorize(
    store: &dyn AccountStore,
    tokens: &TokenService,
    token: Option<&str>,
    raw_id: &str,
) -> Result<AuthorizedAccount, Denial> {
    let token = token.ok_or(Denial::MissingToken)?;

    let claims = tokens.validate(token).map_err(|e| {
        tracing::debug!("Token rejected: {}", e);
        Denial::InvalidToken
    })?;

    let account_id = parse_id(raw_id).map_err(|_| Denial::MalformedId)?;

    let account = store.get_by_id(account_id).await.map_err(|e| {
        tracing::debug!("Account lookup for authorization failed: {}", e);
        Denial::UnknownAccount
    })?;

    if account.number != claims.account_number {
        return Err(Denial::AccountMismatch);
    }

    Ok(AuthorizedAccount { account_id, claims })
}

/// Middleware guarding single-account routes: only a token issued for the
/// account named in the path gets through to the handler.
pub async fn require_account_token(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    mut request: Request,
    next: Next,
) -> Response {
    let raw_id = path.map(|Path(id)| id).unwrap_or_default();
    let token = extract_token(request.headers());

    match authorize(state.store.as_ref(), &state.tokens, token, &raw_id).await {
        Ok(authorized) => {
            tracing::debug!(
                "Authorized account {} for {} {}",
                authorized.account_id,
                request.method(),
                request.uri().path()
            );
            request.extensions_mut().insert(authorized);
            next.run(request).await
        }
        Err(denial) => {
            tracing::warn!(
                "Permission denied for {} {}: {}",
                request.method(),
                request.uri().path(),
                denial
            );
            ApiError::PermissionDenied.into_response()
        }
    }
}
