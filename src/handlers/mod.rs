// handlers/mod.rs - Route handlers
//
// Public:    /account (GET, POST), /transfer (POST), /health (GET)
// Protected: /account/:id (GET, DELETE), wrapped by the account token middleware
//
// Every handler decodes its input, makes one store call and encodes one
// response. Failures are returned as `ApiError` and rendered as
// `{"error": "<message>"}`.

pub mod accounts;
pub mod health;
pub mod transfer;

use axum::{body::Bytes, extract::rejection::BytesRejection, http::Method, Json};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub use accounts::{create_account, delete_account, get_account, list_accounts, CreatedAccount};
pub use health::health;
pub use transfer::transfer;

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Parse the `:id` path segment
pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>().map_err(|_| ApiError::invalid_id(raw))
}

/// Unwrap a buffered body, reporting axum's rejections (e.g. the body size
/// limit) through the JSON error envelope
pub fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| ApiError::decode(rejection.body_text()))
}

/// Decode a JSON request body, reporting failures as `ApiError::Decode`
pub fn decode_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::decode(e.to_string()))
}

/// Method fallback for every route: names the rejected verb
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

/// Router fallback for unknown paths
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CreateAccountRequest;

    #[test]
    fn parses_integer_ids() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("abc").unwrap_err().message(), "invalid id provided: 'abc'");
        assert!(parse_id("99999999999").is_err());
        assert!(parse_id(" 1").is_err());
        assert!(parse_id("1 ").is_err());
    }

    #[test]
    fn decode_reports_malformed_bodies() {
        let ok: CreateAccountRequest =
            decode_json(&Bytes::from_static(br#"{"firstName":"Ada","lastName":"Lovelace"}"#)).unwrap();
        assert_eq!(ok.first_name, "Ada");

        let err = decode_json::<CreateAccountRequest>(&Bytes::from_static(b"{\"firstName\":")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
