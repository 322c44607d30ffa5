// src/api/vouchers.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::pricing::{self, VoucherError};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct ValidateVoucherRequest {
    pub code: String,
    /// The quoted total the discount is applied against.
    pub total: i64,
}

/// Read-only voucher check for the checkout form. A failing code is an
/// inline message, not an error status; the booking flow continues
/// without the voucher.
#[post("/vouchers/validate")]
pub async fn validate_voucher(
    state: web::Data<AppState>,
    payload: web::Json<ValidateVoucherRequest>,
) -> impl Responder {
    match pricing::validate_voucher(&state.pool, &payload.code, payload.total).await {
        Ok(v) => HttpResponse::Ok().json(json!({
            "isValid": true,
            "voucher": { "id": v.id, "code": v.code },
            "discountAmount": v.discount_amount
        })),
        Err(VoucherError::Db(e)) => {
            log::error!("validate_voucher db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
        Err(e) => HttpResponse::Ok().json(json!({
            "isValid": false,
            "error": e.message()
        })),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVoucherRequest {
    pub code: String,
    pub description: String,
    pub discount_amount: i64,
    pub total_quantity: i32,
    pub expires_at: DateTime<Utc>,
}

async fn require_admin(state: &AppState, user_id: i32) -> Result<(), HttpResponse> {
    match db::get_user_type(&state.pool, user_id).await {
        Ok(Some(user_type)) if user_type == "admin" => Ok(()),
        Ok(_) => Err(HttpResponse::Forbidden().json(json!({"error": "admin only"}))),
        Err(e) => {
            log::error!("admin check db error: {e}");
            Err(HttpResponse::InternalServerError().finish())
        }
    }
}

#[post("/vouchers")]
pub async fn create_voucher(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    payload: web::Json<CreateVoucherRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, *user_id).await {
        return resp;
    }

    let code = payload.code.trim().to_uppercase();
    if code.len() != 6 {
        return HttpResponse::BadRequest().json(json!({
            "error": "code must be exactly 6 characters"
        }));
    }
    if payload.discount_amount <= 0 {
        return HttpResponse::BadRequest().json(json!({
            "error": "discount amount must be greater than 0"
        }));
    }
    if payload.total_quantity <= 0 {
        return HttpResponse::BadRequest().json(json!({
            "error": "quantity must be greater than 0"
        }));
    }
    if payload.expires_at <= Utc::now() {
        return HttpResponse::BadRequest().json(json!({
            "error": "expiry must be in the future"
        }));
    }

    match db::create_voucher(
        &state.pool,
        &code,
        &payload.description,
        payload.discount_amount,
        payload.total_quantity,
        payload.expires_at,
    )
    .await
    {
        Ok(voucher) => HttpResponse::Ok().json(voucher),
        Err(e) => {
            log::error!("create_voucher db error: {e}");
            HttpResponse::BadRequest().json(json!({
                "error": "voucher code already exists or invalid data"
            }))
        }
    }
}

#[get("/vouchers")]
pub async fn list_vouchers(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, *user_id).await {
        return resp;
    }

    match db::list_vouchers(&state.pool).await {
        Ok(vouchers) => HttpResponse::Ok().json(vouchers),
        Err(e) => {
            log::error!("list_vouchers db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
