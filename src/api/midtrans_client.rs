// src/api/midtrans_client.rs
//
// Minimal client for the Midtrans Snap API (POST /transactions).
// Authorization: HTTP Basic with the server key as username.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fmt;

use crate::MidtransConfig;

#[derive(Debug)]
pub enum MidtransError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    InvalidResponse(String),
}

impl fmt::Display for MidtransError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidtransError::Http(e) => write!(f, "http error: {e}"),
            MidtransError::Api { status, body } => {
                write!(f, "midtrans api error status={status} body={body}")
            }
            MidtransError::InvalidResponse(e) => write!(f, "invalid response: {e}"),
        }
    }
}

impl From<reqwest::Error> for MidtransError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

#[derive(Debug, Serialize)]
pub struct SnapTransactionRequest {
    pub transaction_details: TransactionDetails,
    pub customer_details: CustomerDetails,
    pub credit_card: CreditCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<Callbacks>,
}

#[derive(Debug, Serialize)]
pub struct TransactionDetails {
    pub order_id: String,
    pub gross_amount: i64,
}

#[derive(Debug, Serialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreditCard {
    pub secure: bool,
}

#[derive(Debug, Serialize)]
pub struct Callbacks {
    pub finish: String,
}

#[derive(Debug, Deserialize)]
pub struct SnapTransactionResponse {
    pub token: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Creates a Snap transaction and returns the checkout token the client
/// feeds to the hosted payment widget. Never retried here: a timeout
/// surfaces as an error since retrying could create duplicate charges.
pub async fn create_snap_transaction(
    config: &MidtransConfig,
    req: SnapTransactionRequest,
) -> Result<SnapTransactionResponse, MidtransError> {
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/transactions", config.snap_base_url))
        .basic_auth(&config.server_key, Some(""))
        .json(&req)
        .send()
        .await?;

    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(MidtransError::Api {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<SnapTransactionResponse>(&body)
        .map_err(|e| MidtransError::InvalidResponse(format!("{e}; body={body}")))
}

/// Midtrans notification signature:
/// SHA-512 over order_id + status_code + gross_amount + server_key, hex.
pub fn signature_key(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}
