// src/main.rs
use actix::Actor;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use salda_booking::{api, docs, ws, AppState, MidtransConfig};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let midtrans = MidtransConfig {
        server_key: env::var("MIDTRANS_SERVER_KEY").expect("MIDTRANS_SERVER_KEY required"),
        client_key: env::var("MIDTRANS_CLIENT_KEY").expect("MIDTRANS_CLIENT_KEY required"),
        snap_base_url: env::var("MIDTRANS_SNAP_BASE_URL")
            .unwrap_or_else(|_| "https://app.sandbox.midtrans.com/snap/v1".to_string()),
        finish_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
    };

    let ws_hub = ws::BookingHub::new().start();

    let state = web::Data::new(AppState {
        pool,
        midtrans,
        ws_hub,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // Public auth routes
            .service(api::auth::register)
            .service(api::auth::login)
            // Authenticated API
            .service(
                web::scope("/api")
                    .wrap(api::auth::JwtMiddleware)
                    .service(api::streamers::get_streamer)
                    .service(api::streamers::get_availability)
                    .service(api::streamers::put_schedule)
                    .service(api::vouchers::validate_voucher)
                    .service(api::vouchers::create_voucher)
                    .service(api::vouchers::list_vouchers)
                    .service(api::bookings::list_my_bookings)
                    .service(api::bookings::list_incoming_bookings)
                    .service(api::bookings::update_status)
                    .service(api::payments::create_payment),
            )
            // Gateway webhook (public, signature-verified)
            .service(api::midtrans::payment_callback)
            // Availability invalidation feed
            .route("/ws/streamers/{id}", web::get().to(ws::bookings_ws))
    })
    .bind(("0.0.0.0", 8065))?
    .run()
    .await
}
