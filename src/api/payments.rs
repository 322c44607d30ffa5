// src/api/payments.rs

use actix_web::{post, web, HttpResponse, Responder};
use chrono::Timelike;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::midtrans_client::{
    self, Callbacks, CreditCard, CustomerDetails, SnapTransactionRequest, TransactionDetails,
};
use crate::booking::{PaymentMetadata, VoucherSnapshot};
use crate::models::is_valid_platform;
use crate::pricing::{self, VoucherError};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Client-computed amount; echoed for diagnostics only, the charge is
    /// always based on the server-derived price.
    #[serde(default)]
    pub amount: Option<i64>,
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub metadata: CheckoutRequest,
}

/// What the client selected. Price and voucher amounts are intentionally
/// absent: they are re-derived here from the streamer's rate and the
/// voucher table so a tampered client cannot alter the charge.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub streamer_id: i32,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: chrono::DateTime<chrono::Utc>,
    pub platform: String,
    #[serde(default)]
    pub special_request: Option<String>,
    #[serde(default, rename = "sub_acc_link")]
    pub sub_acc_link: Option<String>,
    #[serde(default, rename = "sub_acc_pass")]
    pub sub_acc_pass: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub voucher_code: Option<String>,
}

fn selection_hours(req: &CheckoutRequest) -> Option<u32> {
    if req.start_time.minute() != 0
        || req.start_time.second() != 0
        || req.end_time.minute() != 0
        || req.end_time.second() != 0
    {
        return None;
    }
    let span = req.end_time - req.start_time;
    let hours = span.num_hours();
    (hours > 0 && span == chrono::Duration::hours(hours)).then_some(hours as u32)
}

/// Creates a Snap charge for a slot selection and returns the checkout
/// token. No durable state is written here: the booking only materializes
/// when the gateway reports settlement on the callback.
#[utoipa::path(
    post,
    path = "/api/payments/create",
    tag = "payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 200, description = "Charge created, token returned"),
        (status = 400, description = "Invalid selection or voucher"),
        (status = 500, description = "Payment gateway failure")
    )
)]
#[post("/payments/create")]
pub async fn create_payment(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
    payload: web::Json<CreatePaymentRequest>,
) -> impl Responder {
    let user_id = *user_id;
    let payload = payload.into_inner();
    let checkout = payload.metadata;

    if !is_valid_platform(&checkout.platform) {
        return HttpResponse::BadRequest().json(json!({"error": "invalid platform"}));
    }

    let Some(hours) = selection_hours(&checkout) else {
        return HttpResponse::BadRequest().json(json!({
            "error": "selection must be a whole hour-aligned range"
        }));
    };

    let streamer = match db::get_streamer(&state.pool, checkout.streamer_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return HttpResponse::BadRequest().json(json!({"error": "unknown streamer"})),
        Err(e) => {
            log::error!("create_payment streamer lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // Quote without the voucher first; validation needs the total to
    // clamp the discount.
    let base_quote = pricing::compute_price(streamer.hourly_rate, hours, None);

    let voucher = match &checkout.voucher_code {
        Some(code) if !code.trim().is_empty() => {
            match pricing::validate_voucher(&state.pool, code, base_quote.total).await {
                Ok(v) => Some(v),
                Err(VoucherError::Db(e)) => {
                    log::error!("create_payment voucher validation error: {e}");
                    return HttpResponse::InternalServerError().finish();
                }
                Err(e) => {
                    return HttpResponse::BadRequest().json(json!({
                        "error": "invalid voucher",
                        "details": e.message()
                    }));
                }
            }
        }
        _ => None,
    };

    let quote = pricing::compute_price(
        streamer.hourly_rate,
        hours,
        voucher.as_ref().map(|v| v.discount_amount),
    );

    if let Some(client_amount) = payload.amount {
        if client_amount != quote.final_price {
            log::warn!(
                "create_payment client amount mismatch user_id={} client={} server={}",
                user_id,
                client_amount,
                quote.final_price
            );
        }
    }

    let metadata = PaymentMetadata {
        streamer_id: streamer.id,
        user_id,
        start_time: checkout.start_time,
        end_time: checkout.end_time,
        platform: checkout.platform,
        special_request: checkout.special_request,
        sub_acc_link: checkout.sub_acc_link,
        sub_acc_pass: checkout.sub_acc_pass,
        first_name: checkout.first_name.unwrap_or_default(),
        last_name: checkout.last_name.unwrap_or_default(),
        price: quote.total,
        voucher: voucher.map(|v| VoucherSnapshot {
            id: v.id,
            code: v.code,
            discount_amount: quote.discount,
        }),
        final_price: quote.final_price,
    };

    let order_id = format!("BOOKING-{}", Uuid::new_v4());

    log::info!(
        "midtrans create transaction user_id={} streamer_id={} order_id={} amount={}",
        user_id,
        streamer.id,
        order_id,
        metadata.final_price
    );

    let snap = match midtrans_client::create_snap_transaction(
        &state.midtrans,
        SnapTransactionRequest {
            transaction_details: TransactionDetails {
                order_id: order_id.clone(),
                gross_amount: metadata.final_price,
            },
            customer_details: CustomerDetails {
                first_name: payload.client_name.clone(),
                email: payload.client_email.clone(),
                phone: payload.client_phone.clone(),
            },
            credit_card: CreditCard { secure: true },
            callbacks: Some(Callbacks {
                finish: format!("{}/client-bookings", state.midtrans.finish_url),
            }),
        },
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            log::error!(
                "midtrans create transaction error: {e} user_id={} order_id={}",
                user_id,
                order_id
            );
            return HttpResponse::InternalServerError().json(json!({
                "error": "failed to create payment"
            }));
        }
    };

    HttpResponse::Ok().json(json!({
        "token": snap.token,
        "redirect_url": snap.redirect_url,
        "order_id": order_id,
        "metadata": metadata
    }))
}
