// src/booking.rs
//
// Payment-confirmed booking commit. A booking row only ever comes into
// existence here, after the gateway has reported settlement for the
// charge; nothing durable is written during charge creation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use utoipa::ToSchema;

/// Snapshot carried from charge creation to the settlement callback.
/// Price fields are derived server-side at charge time and are the
/// amounts actually charged; they are never recomputed from client input
/// at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMetadata {
    pub streamer_id: i32,
    pub user_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_request: Option<String>,
    #[serde(default, rename = "sub_acc_link", skip_serializing_if = "Option::is_none")]
    pub sub_acc_link: Option<String>,
    #[serde(default, rename = "sub_acc_pass", skip_serializing_if = "Option::is_none")]
    pub sub_acc_pass: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Total after fee and tax, before voucher discount.
    pub price: i64,
    pub voucher: Option<VoucherSnapshot>,
    pub final_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoucherSnapshot {
    pub id: i32,
    pub code: String,
    pub discount_amount: i64,
}

#[derive(Debug)]
pub enum CommitError {
    /// Another blocking booking was committed for an overlapping range
    /// since the availability read. The charge has already settled, so
    /// this needs manual reconciliation (refund).
    SlotConflict,
    /// The voucher ran out between validation and commit.
    VoucherExhausted,
    Db(sqlx::Error),
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::SlotConflict => write!(f, "overlapping booking already committed"),
            CommitError::VoucherExhausted => write!(f, "voucher has no remaining quantity"),
            CommitError::Db(e) => write!(f, "commit db error: {e}"),
        }
    }
}

impl From<sqlx::Error> for CommitError {
    fn from(value: sqlx::Error) -> Self {
        Self::Db(value)
    }
}

#[derive(Debug)]
pub struct CommitOutcome {
    pub booking_id: i32,
    /// True when this callback had already been committed and the call
    /// was a no-op returning the original booking.
    pub idempotent: bool,
}

fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.constraint().map(str::to_string),
        _ => None,
    }
}

async fn find_committed<'e, E>(
    executor: E,
    transaction_id: &str,
) -> Result<Option<(i32, i32, String)>, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query(
        "SELECT id, booking_id, status FROM payments WHERE transaction_id = $1",
    )
    .bind(transaction_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.map(|r| (r.get("id"), r.get("booking_id"), r.get("status"))))
}

/// Records a later gateway status for an already-committed payment
/// (repeat notification, refund, chargeback). Returns the booking id when
/// a payment exists for the transaction. Identical repeats are no-ops.
pub async fn record_gateway_status(
    pool: &PgPool,
    transaction_id: &str,
    status: &str,
    raw: &serde_json::Value,
) -> Result<Option<i32>, sqlx::Error> {
    let Some((payment_id, booking_id, current)) = find_committed(pool, transaction_id).await?
    else {
        return Ok(None);
    };

    if current != status {
        sqlx::query("UPDATE payments SET status = $1, midtrans_response = $2 WHERE id = $3")
            .bind(status)
            .bind(raw)
            .bind(payment_id)
            .execute(pool)
            .await?;

        sqlx::query(
            r#"INSERT INTO payment_status_history (payment_id, new_status, midtrans_notification)
               VALUES ($1, $2, $3)"#,
        )
        .bind(payment_id)
        .bind(status)
        .bind(raw)
        .execute(pool)
        .await?;
    }

    Ok(Some(booking_id))
}

/// The atomic commit for a settled charge: booking + payment record +
/// optional voucher redemption, all-or-nothing.
///
/// Idempotent on the gateway transaction id: a repeated callback returns
/// the originally committed booking. The overlap re-check runs under a
/// per-streamer advisory lock held for the duration of the transaction,
/// so two settlements racing for the same range serialize and exactly one
/// wins; the bookings exclusion constraint backstops the check.
pub async fn commit_paid_booking(
    pool: &PgPool,
    transaction_id: &str,
    order_id: &str,
    gateway_status: &str,
    payment_method: Option<&str>,
    raw: &serde_json::Value,
    meta: &PaymentMetadata,
) -> Result<CommitOutcome, CommitError> {
    // Fast path: this transaction id has been committed before.
    if let Some(booking_id) = record_gateway_status(pool, transaction_id, gateway_status, raw).await?
    {
        return Ok(CommitOutcome {
            booking_id,
            idempotent: true,
        });
    }

    let mut tx = pool.begin().await?;

    // Serializes all commit attempts for this streamer; released on
    // commit or rollback.
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(BOOKING_LOCK_NAMESPACE)
        .bind(meta.streamer_id)
        .execute(&mut *tx)
        .await?;

    // Re-check under the lock: a concurrent delivery of the same callback
    // may have committed while we waited, and must not be mistaken for a
    // conflicting booking.
    if let Some((_, booking_id, _)) = find_committed(&mut *tx, transaction_id).await? {
        return Ok(CommitOutcome {
            booking_id,
            idempotent: true,
        });
    }

    let conflict = sqlx::query(
        r#"SELECT id FROM bookings
           WHERE streamer_id = $1
             AND status IN ('pending', 'accepted', 'live')
             AND start_time < $2
             AND end_time > $3
           LIMIT 1"#,
    )
    .bind(meta.streamer_id)
    .bind(meta.end_time)
    .bind(meta.start_time)
    .fetch_optional(&mut *tx)
    .await?;

    if conflict.is_some() {
        return Err(CommitError::SlotConflict);
    }

    let (voucher_id, voucher_discount) = match &meta.voucher {
        Some(v) => (Some(v.id), v.discount_amount),
        None => (None, 0),
    };

    let booking_insert = sqlx::query(
        r#"INSERT INTO bookings
               (client_id, streamer_id, start_time, end_time, platform, status,
                special_request, sub_acc_link, sub_acc_pass, price, voucher_id,
                voucher_discount, final_price, client_first_name, client_last_name)
           VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10, $11, $12, $13, $14)
           RETURNING id"#,
    )
    .bind(meta.user_id)
    .bind(meta.streamer_id)
    .bind(meta.start_time)
    .bind(meta.end_time)
    .bind(&meta.platform)
    .bind(meta.special_request.as_deref())
    .bind(meta.sub_acc_link.as_deref())
    .bind(meta.sub_acc_pass.as_deref())
    .bind(meta.price)
    .bind(voucher_id)
    .bind(voucher_discount)
    .bind(meta.final_price)
    .bind(&meta.first_name)
    .bind(&meta.last_name)
    .fetch_one(&mut *tx)
    .await;

    let booking_id: i32 = match booking_insert {
        Ok(row) => row.get("id"),
        Err(e) if violated_constraint(&e).as_deref() == Some("bookings_no_overlap") => {
            return Err(CommitError::SlotConflict);
        }
        Err(e) => return Err(e.into()),
    };

    let payment_insert = sqlx::query(
        r#"INSERT INTO payments
               (booking_id, amount, status, payment_method, order_id,
                transaction_id, midtrans_response)
           VALUES ($1, $2, $3, $4, $5, $6, $7)
           RETURNING id"#,
    )
    .bind(booking_id)
    .bind(meta.final_price)
    .bind(gateway_status)
    .bind(payment_method)
    .bind(order_id)
    .bind(transaction_id)
    .bind(raw)
    .fetch_one(&mut *tx)
    .await;

    let payment_id: i32 = match payment_insert {
        Ok(row) => row.get("id"),
        Err(e) if violated_constraint(&e).as_deref() == Some("payments_transaction_id_key") => {
            // A concurrent delivery of the same callback won the race.
            drop(tx);
            let Some((_, booking_id, _)) = find_committed(pool, transaction_id).await? else {
                return Err(e.into());
            };
            return Ok(CommitOutcome {
                booking_id,
                idempotent: true,
            });
        }
        Err(e) => return Err(e.into()),
    };

    sqlx::query(
        r#"INSERT INTO payment_status_history (payment_id, new_status, midtrans_notification)
           VALUES ($1, $2, $3)"#,
    )
    .bind(payment_id)
    .bind(gateway_status)
    .bind(raw)
    .execute(&mut *tx)
    .await?;

    if let Some(voucher) = &meta.voucher {
        sqlx::query(
            r#"INSERT INTO voucher_usage
                   (voucher_id, booking_id, user_id, discount_applied,
                    original_price, final_price)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(voucher.id)
        .bind(booking_id)
        .bind(meta.user_id)
        .bind(voucher.discount_amount)
        .bind(meta.price)
        .bind(meta.final_price)
        .execute(&mut *tx)
        .await?;

        // Conditional decrement with a floor at zero; zero rows affected
        // means the voucher ran out since validation.
        let decremented = sqlx::query(
            r#"UPDATE vouchers
               SET remaining_quantity = remaining_quantity - 1
               WHERE id = $1 AND remaining_quantity > 0"#,
        )
        .bind(voucher.id)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(CommitError::VoucherExhausted);
        }
    }

    tx.commit().await?;

    Ok(CommitOutcome {
        booking_id,
        idempotent: false,
    })
}

const BOOKING_LOCK_NAMESPACE: i32 = 0x42_4f_4f;
