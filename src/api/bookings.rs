// src/api/bookings.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::models::booking_status;
use crate::{db, ws, AppState};

/// Bookings where the caller is the client.
#[get("/bookings")]
pub async fn list_my_bookings(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
) -> impl Responder {
    match db::list_bookings_for_client(&state.pool, *user_id).await {
        Ok(bookings) => HttpResponse::Ok().json(bookings),
        Err(e) => {
            log::error!("list_my_bookings db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Bookings addressed to the caller's streamer profile.
#[get("/bookings/incoming")]
pub async fn list_incoming_bookings(
    state: web::Data<AppState>,
    user_id: web::ReqData<i32>,
) -> impl Responder {
    let streamer = match db::get_streamer_for_user(&state.pool, *user_id).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            return HttpResponse::Forbidden().json(json!({"error": "no streamer profile"}));
        }
        Err(e) => {
            log::error!("list_incoming streamer lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match db::list_bookings_for_streamer(&state.pool, streamer.id).await {
        Ok(bookings) => HttpResponse::Ok().json(bookings),
        Err(e) => {
            log::error!("list_incoming db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Moves a booking through its lifecycle. The streamer drives
/// pending -> accepted|rejected, accepted -> live, live -> completed;
/// either party may cancel while the booking is not terminal.
#[post("/bookings/{id}/status")]
pub async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    user_id: web::ReqData<i32>,
    payload: web::Json<StatusUpdateRequest>,
) -> impl Responder {
    let booking_id = path.into_inner();
    let user_id = *user_id;
    let target = payload.status.as_str();

    let booking = match db::get_booking(&state.pool, booking_id).await {
        Ok(Some(b)) => b,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "booking not found"})),
        Err(e) => {
            log::error!("update_status booking lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let streamer = match db::get_streamer(&state.pool, booking.streamer_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return HttpResponse::InternalServerError().finish(),
        Err(e) => {
            log::error!("update_status streamer lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let is_streamer = streamer.user_id == user_id;
    let is_client = booking.client_id == user_id;

    let allowed = match target {
        booking_status::CANCELLED => is_streamer || is_client,
        booking_status::ACCEPTED
        | booking_status::REJECTED
        | booking_status::LIVE
        | booking_status::COMPLETED => is_streamer,
        _ => false,
    };
    if !allowed {
        return HttpResponse::Forbidden().json(json!({"error": "not allowed"}));
    }

    if !booking_status::can_transition(&booking.status, target) {
        return HttpResponse::BadRequest().json(json!({
            "error": format!("cannot move booking from {} to {}", booking.status, target)
        }));
    }

    if let Err(e) = db::update_booking_status(&state.pool, booking_id, target).await {
        log::error!("update_status db error: {e}");
        return HttpResponse::InternalServerError().finish();
    }

    // A status change can free or hold slots; watchers re-fetch.
    ws::notify_booking_change(&state.ws_hub, booking.streamer_id, booking_id, target);

    HttpResponse::Ok().json(json!({"ok": true, "booking_id": booking_id, "status": target}))
}
