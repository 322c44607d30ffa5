// src/api/midtrans.rs

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::midtrans_client::signature_key;
use crate::booking::{self, CommitError, PaymentMetadata};
use crate::{ws, AppState};

/// Server-to-server notification from Midtrans plus the metadata snapshot
/// taken at charge creation. Delivery is at-least-once; the commit is
/// idempotent on `transaction_id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentCallback {
    pub result: MidtransNotification,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MidtransNotification {
    pub order_id: String,
    pub transaction_id: String,
    pub transaction_status: String,
    pub status_code: String,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

pub fn is_settled(status: &str) -> bool {
    matches!(status, "settlement" | "capture")
}

pub fn is_failed(status: &str) -> bool {
    matches!(status, "deny" | "cancel" | "expire" | "failure")
}

fn verify_signature(notification: &MidtransNotification, server_key: &str) -> bool {
    let (Some(gross), Some(signature)) = (
        notification.gross_amount.as_deref(),
        notification.signature_key.as_deref(),
    ) else {
        return false;
    };

    let expected = signature_key(
        &notification.order_id,
        &notification.status_code,
        gross,
        server_key,
    );
    expected == signature
}

fn gross_matches(gross_amount: &str, final_price: i64) -> bool {
    match gross_amount.parse::<f64>() {
        Ok(g) => (g - final_price as f64).abs() < 0.5,
        Err(_) => false,
    }
}

#[utoipa::path(
    post,
    path = "/payments/callback",
    tag = "payments",
    request_body = PaymentCallback,
    responses(
        (status = 200, description = "Notification processed"),
        (status = 400, description = "Malformed metadata or amount mismatch"),
        (status = 403, description = "Bad signature"),
        (status = 409, description = "Slot conflict or exhausted voucher at commit"),
        (status = 500, description = "Commit failed after settled charge")
    )
)]
#[post("/payments/callback")]
pub async fn payment_callback(
    payload: web::Json<PaymentCallback>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let PaymentCallback { result, metadata } = payload.into_inner();

    if !verify_signature(&result, &state.midtrans.server_key) {
        log::warn!(
            "midtrans callback bad signature order_id={} txn_id={}",
            result.order_id,
            result.transaction_id
        );
        return HttpResponse::Forbidden().json(json!({"error": "invalid signature"}));
    }

    let raw = json!({
        "order_id": result.order_id.clone(),
        "transaction_id": result.transaction_id.clone(),
        "transaction_status": result.transaction_status.clone(),
        "status_code": result.status_code.clone(),
        "gross_amount": result.gross_amount.clone(),
        "payment_type": result.payment_type.clone(),
        "extra": result.extra.clone(),
    });

    let status = result.transaction_status.as_str();

    if is_failed(status) {
        // No durable state exists for a charge that never settled; if one
        // does (late expiry, chargeback), record the new status.
        match booking::record_gateway_status(&state.pool, &result.transaction_id, status, &raw)
            .await
        {
            Ok(_) => return HttpResponse::Ok().json(json!({"ok": true})),
            Err(e) => {
                log::error!("midtrans callback status update error: {e}");
                return HttpResponse::InternalServerError().finish();
            }
        }
    }

    if !is_settled(status) {
        // pending / authorize / anything unknown: acknowledge so the
        // gateway stops retrying, commit nothing.
        return HttpResponse::Ok().json(json!({"ok": true, "ignored": true}));
    }

    let Some(gross) = result.gross_amount.as_deref() else {
        return HttpResponse::BadRequest().json(json!({"error": "missing gross_amount"}));
    };
    if !gross_matches(gross, metadata.final_price) {
        log::error!(
            "midtrans callback amount mismatch order_id={} gross={} metadata_final={}",
            result.order_id,
            gross,
            metadata.final_price
        );
        return HttpResponse::BadRequest().json(json!({"error": "amount mismatch"}));
    }

    let outcome = booking::commit_paid_booking(
        &state.pool,
        &result.transaction_id,
        &result.order_id,
        status,
        result.payment_type.as_deref(),
        &raw,
        &metadata,
    )
    .await;

    match outcome {
        Ok(outcome) => {
            if !outcome.idempotent {
                ws::notify_booking_change(
                    &state.ws_hub,
                    metadata.streamer_id,
                    outcome.booking_id,
                    "pending",
                );
            }
            HttpResponse::Ok().json(json!({
                "ok": true,
                "booking_id": outcome.booking_id,
                "idempotent": outcome.idempotent
            }))
        }
        Err(CommitError::SlotConflict) => {
            // The charge settled but the slot is gone. Needs a manual
            // refund; log everything reconciliation will need.
            log::error!(
                "slot conflict after settlement txn_id={} order_id={} metadata={}",
                result.transaction_id,
                result.order_id,
                serde_json::to_string(&metadata).unwrap_or_default()
            );
            HttpResponse::Conflict().json(json!({"error": "slot_conflict"}))
        }
        Err(CommitError::VoucherExhausted) => {
            log::error!(
                "voucher exhausted at commit txn_id={} order_id={} metadata={}",
                result.transaction_id,
                result.order_id,
                serde_json::to_string(&metadata).unwrap_or_default()
            );
            HttpResponse::Conflict().json(json!({"error": "voucher_exhausted"}))
        }
        Err(CommitError::Db(e)) => {
            log::error!(
                "booking commit failed after settlement: {e} txn_id={} order_id={} metadata={}",
                result.transaction_id,
                result.order_id,
                serde_json::to_string(&metadata).unwrap_or_default()
            );
            HttpResponse::InternalServerError().json(json!({"error": "processing error"}))
        }
    }
}
