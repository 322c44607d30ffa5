// src/ws.rs
//
// Booking-change notifications, keyed by streamer id. Clients watching a
// streamer's calendar subscribe here and re-fetch availability whenever a
// booking or schedule for that streamer changes out from under them.

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Recipient};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::AppState;

static NEXT_SESSION_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Message)]
#[rtype(result = "()")]
struct WsMessage(pub String);

#[derive(Message)]
#[rtype(result = "()")]
struct Subscribe {
    streamer_id: i32,
    session_id: usize,
    addr: Recipient<WsMessage>,
}

#[derive(Message)]
#[rtype(result = "()")]
struct Unsubscribe {
    streamer_id: i32,
    session_id: usize,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct NotifyStreamer {
    pub streamer_id: i32,
    pub event: BookingEvent,
}

#[derive(Clone, Debug, Serialize)]
pub struct BookingEvent {
    pub event: &'static str,
    pub data: BookingEventData,
}

#[derive(Clone, Debug, Serialize)]
pub struct BookingEventData {
    pub streamer_id: i32,
    pub booking_id: Option<i32>,
    pub status: Option<String>,
}

pub struct BookingHub {
    sessions: HashMap<i32, HashMap<usize, Recipient<WsMessage>>>,
}

impl BookingHub {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }
}

impl Default for BookingHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for BookingHub {
    type Context = actix::Context<Self>;
}

impl Handler<Subscribe> for BookingHub {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Self::Context) -> Self::Result {
        self.sessions
            .entry(msg.streamer_id)
            .or_default()
            .insert(msg.session_id, msg.addr);
    }
}

impl Handler<Unsubscribe> for BookingHub {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _: &mut Self::Context) -> Self::Result {
        if let Some(watchers) = self.sessions.get_mut(&msg.streamer_id) {
            watchers.remove(&msg.session_id);
            if watchers.is_empty() {
                self.sessions.remove(&msg.streamer_id);
            }
        }
    }
}

impl Handler<NotifyStreamer> for BookingHub {
    type Result = ();

    fn handle(&mut self, msg: NotifyStreamer, _: &mut Self::Context) -> Self::Result {
        if let Some(watchers) = self.sessions.get(&msg.streamer_id) {
            if let Ok(payload) = serde_json::to_string(&msg.event) {
                for addr in watchers.values() {
                    let _ = addr.do_send(WsMessage(payload.clone()));
                }
            }
        }
    }
}

struct WsSession {
    streamer_id: i32,
    session_id: usize,
    hub: actix::Addr<BookingHub>,
}

impl WsSession {
    fn new(streamer_id: i32, hub: actix::Addr<BookingHub>) -> Self {
        Self {
            streamer_id,
            session_id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            hub,
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.hub.do_send(Subscribe {
            streamer_id: self.streamer_id,
            session_id: self.session_id,
            addr: ctx.address().recipient(),
        });
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        self.hub.do_send(Unsubscribe {
            streamer_id: self.streamer_id,
            session_id: self.session_id,
        });
    }
}

impl Handler<WsMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: WsMessage, ctx: &mut Self::Context) -> Self::Result {
        ctx.text(msg.0);
    }
}

impl actix::StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, item: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match item {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Text(_)) => {}
            Ok(ws::Message::Binary(_)) => {}
            Ok(ws::Message::Continuation(_)) => {}
            Ok(ws::Message::Nop) => {}
            Err(_) => ctx.stop(),
        }
    }
}

#[derive(Deserialize)]
struct WsQuery {
    token: String,
}

#[derive(Deserialize)]
struct Claims {
    #[allow(dead_code)]
    sub: i32,
    #[allow(dead_code)]
    exp: usize,
}

pub async fn bookings_ws(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<i32>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let token = serde_urlencoded::from_str::<WsQuery>(req.query_string())
        .ok()
        .map(|q| q.token)
        .filter(|t| !t.is_empty());

    let Some(token) = token else {
        return Err(actix_web::error::ErrorUnauthorized("Missing token"));
    };

    verify_token(&token)?;
    let streamer_id = path.into_inner();
    ws::start(
        WsSession::new(streamer_id, state.ws_hub.clone()),
        &req,
        stream,
    )
}

fn verify_token(token: &str) -> Result<(), Error> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| actix_web::error::ErrorInternalServerError("JWT secret not set"))?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|_| ())
    .map_err(|_| actix_web::error::ErrorUnauthorized("Invalid token"))
}

pub fn notify_booking_change(
    hub: &actix::Addr<BookingHub>,
    streamer_id: i32,
    booking_id: i32,
    status: &str,
) {
    hub.do_send(NotifyStreamer {
        streamer_id,
        event: BookingEvent {
            event: "booking.changed",
            data: BookingEventData {
                streamer_id,
                booking_id: Some(booking_id),
                status: Some(status.to_string()),
            },
        },
    });
}

pub fn notify_schedule_change(hub: &actix::Addr<BookingHub>, streamer_id: i32) {
    hub.do_send(NotifyStreamer {
        streamer_id,
        event: BookingEvent {
            event: "schedule.changed",
            data: BookingEventData {
                streamer_id,
                booking_id: None,
                status: None,
            },
        },
    });
}
