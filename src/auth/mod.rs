use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::Account;

/// Algorithms accepted on inbound tokens. Anything outside the HMAC family is
/// rejected before the signature is looked at.
const HMAC_FAMILY: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Claims carried by an account token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub account_number: i64,
    /// Expiry hint for clients, same instant as `exp`
    pub expires_at: i64,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(account_number: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        let exp = (now + lifetime).timestamp();

        Self {
            account_number,
            expires_at: exp,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT signing error: {0}")]
    Signing(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Unexpected signing method: {0}")]
    InvalidSignatureMethod(String),
}

/// Issues and validates account tokens with one symmetric secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithms", &self.validation.algorithms)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_FAMILY.to_vec();
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        })
    }

    pub fn issue(&self, account: &Account) -> Result<String, TokenError> {
        self.issue_for_number(account.number)
    }

    /// Issue a token for a bare account number (used by the CLI)
    pub fn issue_for_number(&self, account_number: i64) -> Result<String, TokenError> {
        let claims = Claims::new(account_number, self.lifetime);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidAlgorithm => TokenError::InvalidSignatureMethod(
                    header_algorithm(token).unwrap_or_else(|| "unknown".to_string()),
                ),
                _ => TokenError::InvalidToken(e.to_string()),
            })
    }
}

fn header_algorithm(token: &str) -> Option<String> {
    jsonwebtoken::decode_header(token)
        .ok()
        .map(|header| format!("{:?}", header.alg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // {"alg":"RS256","typ":"JWT"}
    const RS256_HEADER: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";
    // {"alg":"none","typ":"JWT"}
    const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::hours(1)).unwrap()
    }

    fn account(number: i64) -> Account {
        Account {
            id: 1,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            number,
            balance: 0,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn swap_header(token: &str, header: &str) -> String {
        let (_, rest) = token.split_once('.').unwrap();
        format!("{}.{}", header, rest)
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(matches!(TokenService::new("", Duration::hours(1)), Err(TokenError::InvalidSecret)));
    }

    #[test]
    fn issued_token_round_trips_account_number() {
        let tokens = service();
        let token = tokens.issue(&account(424242)).unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.account_number, 424242);
        assert_eq!(claims.expires_at, claims.exp);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let other = TokenService::new("another-secret", Duration::hours(1)).unwrap();
        let token = other.issue(&account(7)).unwrap();
        assert!(matches!(service().validate(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn rejects_non_hmac_algorithm() {
        let tokens = service();
        let token = tokens.issue(&account(7)).unwrap();
        let forged = swap_header(&token, RS256_HEADER);
        match tokens.validate(&forged) {
            Err(TokenError::InvalidSignatureMethod(alg)) => assert_eq!(alg, "RS256"),
            other => panic!("expected InvalidSignatureMethod, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unsigned_token() {
        let tokens = service();
        let token = tokens.issue(&account(7)).unwrap();
        let forged = swap_header(&token, NONE_HEADER);
        assert!(tokens.validate(&forged).is_err());
    }

    #[test]
    fn accepts_other_hmac_variants() {
        let tokens = service();
        let claims = Claims::new(99, Duration::hours(1));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert_eq!(tokens.validate(&token).unwrap().account_number, 99);
    }

    #[test]
    fn rejects_expired_token() {
        let expired = TokenService::new("test-secret", Duration::hours(-1)).unwrap();
        let token = expired.issue(&account(7)).unwrap();
        assert!(matches!(service().validate(&token), Err(TokenError::InvalidToken(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(service().validate("not-a-token"), Err(TokenError::InvalidToken(_))));
        assert!(matches!(service().validate(""), Err(TokenError::InvalidToken(_))));
    }
}
