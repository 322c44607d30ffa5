// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Streamer {
    pub id: i32,
    pub user_id: i32,
    pub display_name: String,
    pub location: Option<String>,
    /// Base hourly rate in whole rupiah, before platform fee and tax.
    pub hourly_rate: i64,
    /// Daily service window, hour-granular [service_start, service_end).
    pub service_start: i32,
    pub service_end: i32,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Booking {
    pub id: i32,
    pub client_id: i32,
    pub streamer_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub platform: String, // shopee | tiktok
    pub status: String,
    pub special_request: Option<String>,
    pub sub_acc_link: Option<String>,
    pub sub_acc_pass: Option<String>,
    /// Price before voucher discount.
    pub price: i64,
    pub voucher_id: Option<i32>,
    pub voucher_discount: i64,
    pub final_price: i64,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Voucher {
    pub id: i32,
    pub code: String,
    pub description: String,
    pub discount_amount: i64,
    pub total_quantity: i32,
    pub remaining_quantity: i32,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Payment {
    pub id: i32,
    pub booking_id: i32,
    pub amount: i64,
    pub status: String, // pending | settlement | failure | expired
    pub payment_method: Option<String>,
    pub order_id: String,
    pub transaction_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

pub fn is_valid_platform(platform: &str) -> bool {
    matches!(platform, "shopee" | "tiktok")
}

/// Booking lifecycle. `payment_pending` exists only transiently during the
/// external charge step and is never written to the bookings table.
pub mod booking_status {
    pub const PENDING: &str = "pending";
    pub const ACCEPTED: &str = "accepted";
    pub const REJECTED: &str = "rejected";
    pub const LIVE: &str = "live";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";

    /// Statuses that hold a streamer's time range against new bookings.
    pub fn blocks_slot(status: &str) -> bool {
        matches!(status, "pending" | "accepted" | "live")
    }

    pub fn is_terminal(status: &str) -> bool {
        matches!(status, "rejected" | "completed" | "cancelled")
    }

    pub fn can_transition(from: &str, to: &str) -> bool {
        match (from, to) {
            ("pending", "accepted") | ("pending", "rejected") => true,
            ("accepted", "live") => true,
            ("live", "completed") => true,
            (from, "cancelled") => !is_terminal(from),
            _ => false,
        }
    }
}
