// src/api/streamers.rs

use actix_web::{get, put, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::availability::{self, WeeklySchedule};
use crate::{db, ws, AppState};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String, // YYYY-MM-DD
}

#[get("/streamers/{id}")]
pub async fn get_streamer(state: web::Data<AppState>, path: web::Path<i32>) -> impl Responder {
    match db::get_streamer(&state.pool, path.into_inner()).await {
        Ok(Some(streamer)) => HttpResponse::Ok().json(streamer),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "streamer not found"})),
        Err(e) => {
            log::error!("get_streamer db error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Selectable hour slots for one streamer/date. Fails closed: a missing
/// template or a fetch failure yields an empty slot list, never a guess.
#[get("/streamers/{id}/availability")]
pub async fn get_availability(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    query: web::Query<AvailabilityQuery>,
) -> impl Responder {
    let streamer_id = path.into_inner();

    let Ok(date) = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") else {
        return HttpResponse::BadRequest().json(json!({"error": "date must be YYYY-MM-DD"}));
    };

    let streamer = match db::get_streamer(&state.pool, streamer_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "streamer not found"})),
        Err(e) => {
            log::error!("availability streamer lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let empty = || {
        HttpResponse::Ok().json(json!({
            "streamer_id": streamer_id,
            "date": query.date,
            "slots": Vec::<String>::new()
        }))
    };

    let schedule = match db::get_streamer_schedule(&state.pool, streamer_id).await {
        Ok(Some(schedule)) => schedule,
        Ok(None) => return empty(),
        Err(e) => {
            log::error!("availability schedule fetch error: {e}");
            return empty();
        }
    };

    let bookings = match db::blocking_bookings_for_date(&state.pool, streamer_id, date).await {
        Ok(b) => b,
        Err(e) => {
            log::error!("availability bookings fetch error: {e}");
            return empty();
        }
    };

    let slots: Vec<String> = availability::selectable_hours(
        &schedule,
        &bookings,
        date,
        streamer.service_start.max(0) as u32,
        streamer.service_end.max(0) as u32,
    )
    .into_iter()
    .map(availability::format_hour)
    .collect();

    HttpResponse::Ok().json(json!({
        "streamer_id": streamer_id,
        "date": query.date,
        "slots": slots
    }))
}

/// Replaces the streamer's recurring weekly template. Owner only; a
/// schedule change also invalidates cached availability for watchers.
#[put("/streamers/{id}/schedule")]
pub async fn put_schedule(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    user_id: web::ReqData<i32>,
    payload: web::Json<WeeklySchedule>,
) -> impl Responder {
    let streamer_id = path.into_inner();
    let schedule = payload.into_inner();

    let streamer = match db::get_streamer(&state.pool, streamer_id).await {
        Ok(Some(s)) => s,
        Ok(None) => return HttpResponse::NotFound().json(json!({"error": "streamer not found"})),
        Err(e) => {
            log::error!("put_schedule streamer lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if streamer.user_id != *user_id {
        return HttpResponse::Forbidden().json(json!({"error": "not your schedule"}));
    }

    if !availability::schedule_is_well_formed(&schedule) {
        return HttpResponse::BadRequest().json(json!({
            "error": "ranges must be hour-aligned HH:00 with start < end"
        }));
    }

    if let Err(e) = db::upsert_streamer_schedule(&state.pool, streamer_id, &schedule).await {
        log::error!("put_schedule upsert error: {e}");
        return HttpResponse::InternalServerError().finish();
    }

    ws::notify_schedule_change(&state.ws_hub, streamer_id);

    HttpResponse::Ok().json(json!({"ok": true}))
}
