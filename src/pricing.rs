// src/pricing.rs

use std::fmt;

use chrono::Utc;
use sqlx::{PgPool, Row};

/// Flat platform markup applied to the streamer's base hourly rate.
pub const PLATFORM_FEE_RATE: f64 = 0.30;
/// Flat tax rate applied on the subtotal.
pub const TAX_RATE: f64 = 0.11;

/// Price breakdown for a selection. Amounts are whole rupiah; rounding
/// happens once, when `total` is fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price_with_fee: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub total: i64,
    pub discount: i64,
    pub final_price: i64,
}

pub fn compute_price(base_hourly_rate: i64, hours: u32, discount_amount: Option<i64>) -> Quote {
    let price_with_fee = base_hourly_rate as f64 * (1.0 + PLATFORM_FEE_RATE);
    let subtotal = price_with_fee * hours as f64;
    let tax = subtotal * TAX_RATE;
    let total = (subtotal + tax).round() as i64;

    // The discount can never drive the price negative.
    let discount = discount_amount.map(|d| d.min(total).max(0)).unwrap_or(0);

    Quote {
        price_with_fee,
        subtotal,
        tax,
        total,
        discount,
        final_price: total - discount,
    }
}

#[derive(Debug)]
pub enum VoucherError {
    NotFound,
    Inactive,
    Expired,
    Exhausted,
    Db(sqlx::Error),
}

impl VoucherError {
    /// Inline message shown next to the voucher field; validation failures
    /// never abort the booking flow.
    pub fn message(&self) -> &'static str {
        match self {
            VoucherError::NotFound => "Voucher code not found",
            VoucherError::Inactive => "Voucher is no longer active",
            VoucherError::Expired => "Voucher has expired",
            VoucherError::Exhausted => "Voucher has been fully redeemed",
            VoucherError::Db(_) => "Could not validate voucher",
        }
    }
}

impl fmt::Display for VoucherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoucherError::Db(e) => write!(f, "voucher db error: {e}"),
            other => write!(f, "{}", other.message()),
        }
    }
}

impl From<sqlx::Error> for VoucherError {
    fn from(value: sqlx::Error) -> Self {
        Self::Db(value)
    }
}

/// A voucher that passed validation, with the discount already clamped to
/// the quoted total.
#[derive(Debug, Clone)]
pub struct AppliedVoucher {
    pub id: i32,
    pub code: String,
    pub discount_amount: i64,
}

/// Read-only validation of a voucher code against the quoted total.
/// Matching is case-insensitive; codes are stored upper-cased. The
/// remaining quantity is NOT decremented here. That happens exactly once,
/// at booking-commit time, so an abandoned checkout never burns a voucher.
pub async fn validate_voucher(
    pool: &PgPool,
    code: &str,
    total: i64,
) -> Result<AppliedVoucher, VoucherError> {
    let code = code.trim().to_uppercase();

    let row = sqlx::query(
        r#"SELECT id, code, discount_amount, remaining_quantity, is_active, expires_at
           FROM vouchers
           WHERE code = $1"#,
    )
    .bind(&code)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Err(VoucherError::NotFound);
    };

    let is_active: bool = row.get("is_active");
    if !is_active {
        return Err(VoucherError::Inactive);
    }

    let expires_at: chrono::DateTime<Utc> = row.get("expires_at");
    if Utc::now() > expires_at {
        return Err(VoucherError::Expired);
    }

    let remaining: i32 = row.get("remaining_quantity");
    if remaining <= 0 {
        return Err(VoucherError::Exhausted);
    }

    let discount_amount: i64 = row.get("discount_amount");
    Ok(AppliedVoucher {
        id: row.get("id"),
        code: row.get("code"),
        discount_amount: discount_amount.min(total),
    })
}
