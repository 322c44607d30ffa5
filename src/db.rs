// src/db.rs

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::{PgPool, Row};

use crate::availability::{BookedRange, WeeklySchedule};
use crate::models::{Booking, Streamer, Voucher};

fn map_streamer(r: sqlx::postgres::PgRow) -> Streamer {
    Streamer {
        id: r.get("id"),
        user_id: r.get("user_id"),
        display_name: r.get("display_name"),
        location: r.get("location"),
        hourly_rate: r.get("hourly_rate"),
        service_start: r.get("service_start"),
        service_end: r.get("service_end"),
        created_at: r.get("created_at"),
    }
}

pub async fn get_streamer(pool: &PgPool, id: i32) -> Result<Option<Streamer>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, user_id, display_name, location, hourly_rate,
                  service_start, service_end, created_at
           FROM streamers
           WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(map_streamer))
}

pub async fn get_streamer_for_user(
    pool: &PgPool,
    user_id: i32,
) -> Result<Option<Streamer>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, user_id, display_name, location, hourly_rate,
                  service_start, service_end, created_at
           FROM streamers
           WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(map_streamer))
}

pub async fn get_streamer_schedule(
    pool: &PgPool,
    streamer_id: i32,
) -> Result<Option<WeeklySchedule>, sqlx::Error> {
    let row = sqlx::query("SELECT schedule FROM streamer_schedules WHERE streamer_id = $1")
        .bind(streamer_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let raw: serde_json::Value = row.get("schedule");
    // A malformed stored template is treated the same as no template at
    // all: the availability engine fails closed.
    Ok(serde_json::from_value(raw).ok())
}

pub async fn upsert_streamer_schedule(
    pool: &PgPool,
    streamer_id: i32,
    schedule: &WeeklySchedule,
) -> Result<(), sqlx::Error> {
    let raw = serde_json::to_value(schedule).unwrap_or_default();

    sqlx::query(
        r#"INSERT INTO streamer_schedules (streamer_id, schedule, updated_at)
           VALUES ($1, $2, NOW())
           ON CONFLICT (streamer_id)
           DO UPDATE SET schedule = EXCLUDED.schedule, updated_at = NOW()"#,
    )
    .bind(streamer_id)
    .bind(raw)
    .execute(pool)
    .await?;

    Ok(())
}

/// Bookings that hold slots (pending/accepted) and overlap the given UTC
/// date. Rejected, cancelled and finished bookings never block.
pub async fn blocking_bookings_for_date(
    pool: &PgPool,
    streamer_id: i32,
    date: NaiveDate,
) -> Result<Vec<BookedRange>, sqlx::Error> {
    let day_start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
    let day_end = day_start + chrono::Duration::days(1);

    let rows = sqlx::query(
        r#"SELECT start_time, end_time
           FROM bookings
           WHERE streamer_id = $1
             AND status IN ('pending', 'accepted')
             AND start_time < $2
             AND end_time > $3"#,
    )
    .bind(streamer_id)
    .bind(day_end)
    .bind(day_start)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| BookedRange {
            start: r.get("start_time"),
            end: r.get("end_time"),
        })
        .collect())
}

fn map_booking(r: sqlx::postgres::PgRow) -> Booking {
    Booking {
        id: r.get("id"),
        client_id: r.get("client_id"),
        streamer_id: r.get("streamer_id"),
        start_time: r.get("start_time"),
        end_time: r.get("end_time"),
        platform: r.get("platform"),
        status: r.get("status"),
        special_request: r.get("special_request"),
        sub_acc_link: r.get("sub_acc_link"),
        sub_acc_pass: r.get("sub_acc_pass"),
        price: r.get("price"),
        voucher_id: r.get("voucher_id"),
        voucher_discount: r.get("voucher_discount"),
        final_price: r.get("final_price"),
        client_first_name: r.get("client_first_name"),
        client_last_name: r.get("client_last_name"),
        created_at: r.get("created_at"),
    }
}

const BOOKING_COLUMNS: &str = r#"id, client_id, streamer_id, start_time, end_time, platform,
    status, special_request, sub_acc_link, sub_acc_pass, price, voucher_id,
    voucher_discount, final_price, client_first_name, client_last_name, created_at"#;

pub async fn get_booking(pool: &PgPool, id: i32) -> Result<Option<Booking>, sqlx::Error> {
    let row = sqlx::query(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(map_booking))
}

pub async fn list_bookings_for_client(
    pool: &PgPool,
    client_id: i32,
) -> Result<Vec<Booking>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE client_id = $1 ORDER BY start_time DESC"
    ))
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_booking).collect())
}

pub async fn list_bookings_for_streamer(
    pool: &PgPool,
    streamer_id: i32,
) -> Result<Vec<Booking>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE streamer_id = $1 ORDER BY start_time DESC"
    ))
    .bind(streamer_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_booking).collect())
}

pub async fn update_booking_status(
    pool: &PgPool,
    booking_id: i32,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(booking_id)
        .execute(pool)
        .await?;

    Ok(())
}

fn map_voucher(r: sqlx::postgres::PgRow) -> Voucher {
    Voucher {
        id: r.get("id"),
        code: r.get("code"),
        description: r.get("description"),
        discount_amount: r.get("discount_amount"),
        total_quantity: r.get("total_quantity"),
        remaining_quantity: r.get("remaining_quantity"),
        is_active: r.get("is_active"),
        expires_at: r.get("expires_at"),
        created_at: r.get("created_at"),
    }
}

pub async fn create_voucher(
    pool: &PgPool,
    code: &str,
    description: &str,
    discount_amount: i64,
    total_quantity: i32,
    expires_at: DateTime<Utc>,
) -> Result<Voucher, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO vouchers
               (code, description, discount_amount, total_quantity,
                remaining_quantity, is_active, expires_at)
           VALUES ($1, $2, $3, $4, $4, true, $5)
           RETURNING id, code, description, discount_amount, total_quantity,
                     remaining_quantity, is_active, expires_at, created_at"#,
    )
    .bind(code)
    .bind(description)
    .bind(discount_amount)
    .bind(total_quantity)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(map_voucher(row))
}

pub async fn list_vouchers(pool: &PgPool) -> Result<Vec<Voucher>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, code, description, discount_amount, total_quantity,
                  remaining_quantity, is_active, expires_at, created_at
           FROM vouchers
           ORDER BY created_at DESC"#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(map_voucher).collect())
}

pub async fn get_user_type(pool: &PgPool, user_id: i32) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT user_type FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.get("user_type")))
}
