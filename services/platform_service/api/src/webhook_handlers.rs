use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use platform_service_core::domains::billing::dto::billing_dto::XenditInvoiceEvent;
use platform_service_infra::auth::{verify_callback_token, verify_hmac_signature, IdpUserEvent};
use serde_json::json;
use shared_error::ApiError;

use crate::state::AppState;

/// Billing provider callback
///
/// Accepted when either the shared callback token matches or the HMAC
/// signature over the raw body verifies. Invoice transitions are
/// idempotent so the provider's retries stay well-behaved.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/xendit",
    tag = "webhooks",
    request_body(content = String, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Event applied (or already applied)"),
        (status = 401, description = "Bad callback token or signature"),
        (status = 404, description = "Unknown invoice"),
    )
)]
pub async fn xendit_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let secret = state
        .config
        .xendit_callback_token
        .as_deref()
        .ok_or_else(|| ApiError::internal("billing webhook secret not configured"))?;

    let token_ok = headers
        .get("x-callback-token")
        .and_then(|v| v.to_str().ok())
        .map(|presented| verify_callback_token(secret, presented))
        .unwrap_or(false);

    let signature_ok = headers
        .get("x-callback-signature")
        .and_then(|v| v.to_str().ok())
        .map(|signature| verify_hmac_signature(secret, &body, signature))
        .unwrap_or(false);

    if !token_ok && !signature_ok {
        return Err(ApiError::unauthorized("invalid_signature"));
    }

    let event: XenditInvoiceEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("malformed payload: {}", e)))?;

    match event.status.as_str() {
        "PAID" | "SETTLED" => state.billing.apply_invoice_paid(&event.external_id).await?,
        "EXPIRED" | "FAILED" => {
            state
                .billing
                .apply_invoice_failed(&event.external_id, &event.status)
                .await?
        }
        other => {
            tracing::debug!(status = %other, external_id = %event.external_id, "ignored invoice status");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Identity-provider user sync
///
/// Verified by HMAC-SHA256 over the raw body; mirrors INSERT/UPDATE/DELETE
/// of the provider's user table into the local principals.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/idp/auth",
    tag = "webhooks",
    request_body(content = String, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Event applied"),
        (status = 401, description = "Bad signature"),
        (status = 400, description = "Malformed event"),
    )
)]
pub async fn idp_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let secret = state
        .config
        .external_idp_webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::internal("idp webhook secret not configured"))?;

    let signature_ok = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok())
        .map(|signature| verify_hmac_signature(secret, &body, signature))
        .unwrap_or(false);

    if !signature_ok {
        return Err(ApiError::unauthorized("invalid_signature"));
    }

    let sync = state
        .idp_sync
        .as_ref()
        .ok_or_else(|| ApiError::internal("idp sync not configured"))?;

    let event: IdpUserEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("malformed payload: {}", e)))?;

    sync.apply(event).await?;
    Ok(Json(json!({ "received": true })))
}
