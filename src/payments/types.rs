//! Payment types and data structures
//!
//! Wire shapes exchanged with the backend's payment endpoints and the
//! in-memory session state exposed to the UI layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for `POST /payment/create-payment-url`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Order being paid; becomes the transaction identifier
    pub order_id: String,
    /// Amount in the smallest currency unit
    pub amount: u64,
}

/// Redirect link returned by order creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    /// Transaction identifier used to query payment status
    pub order_id: String,
    /// URL the customer opens to complete the payment out-of-band
    pub pay_url: String,
}

/// Payment status as reported by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// No outcome recorded yet; the backend's transaction model calls this `pending`
    #[default]
    #[serde(alias = "pending")]
    Draft,
    #[serde(alias = "completed")]
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Draft)
    }
}

/// Payload of `GET /payment/check_payment_status/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusReport {
    pub status: PaymentStatus,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub amount: Option<serde_json::Number>,
    #[serde(default, rename = "payment_method")]
    pub payment_method: Option<String>,
}

impl PaymentStatusReport {
    pub fn with_status(status: PaymentStatus) -> Self {
        Self {
            status,
            order_id: None,
            transaction_id: None,
            amount: None,
            payment_method: None,
        }
    }
}

/// Observable state of a payment attempt
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct PaymentSession {
    pub transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub is_polling: bool,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

impl PaymentSession {
    pub(crate) fn polling(transaction_id: String) -> Self {
        Self {
            transaction_id: Some(transaction_id),
            status: PaymentStatus::Draft,
            is_polling: true,
            error: None,
            started_at: Some(Utc::now()),
        }
    }
}
