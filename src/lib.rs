pub mod api;
pub mod availability;
pub mod booking;
pub mod db;
pub mod docs;
pub mod models;
pub mod pricing;
pub mod ws;

use sqlx::PgPool;

/// Midtrans Snap credentials and endpoints, loaded once at startup and
/// passed around explicitly instead of living in a module-level client.
#[derive(Clone)]
pub struct MidtransConfig {
    pub server_key: String,
    pub client_key: String,
    pub snap_base_url: String,
    /// Where the hosted checkout redirects after the user finishes paying.
    pub finish_url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub midtrans: MidtransConfig,
    pub ws_hub: actix::Addr<ws::BookingHub>,
}
