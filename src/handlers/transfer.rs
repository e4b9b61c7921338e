use axum::{body::Bytes, extract::rejection::BytesRejection, Json};

use crate::database::models::TransferRequest;

use super::{decode_json, read_body, ApiResult};

/// POST /transfer - decode the transfer request and echo it back.
/// No balance is touched.
pub async fn transfer(body: Result<Bytes, BytesRejection>) -> ApiResult<TransferRequest> {
    let req: TransferRequest = decode_json(&read_body(body)?)?;
    tracing::debug!("Transfer request for account {} ({})", req.to_account, req.amount);
    Ok(Json(req))
}
