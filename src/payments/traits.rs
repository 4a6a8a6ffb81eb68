//! Payment collaborator trait definitions
//!
//! The poller only talks to the backend and the UI through these seams.

use crate::api::ApiResult;
use crate::payments::types::{PaymentLink, PaymentRequest, PaymentStatusReport};
use async_trait::async_trait;
use tracing::info;

/// Backend operations the payment flow depends on
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create the out-of-band payment and return its redirect link.
    ///
    /// The link's `order_id` is the transaction identifier used for polling.
    async fn create_payment_url(&self, request: PaymentRequest) -> ApiResult<PaymentLink>;

    /// Fetch the current status of a payment
    async fn check_payment_status(&self, transaction_id: &str) -> ApiResult<PaymentStatusReport>;
}

/// Why a payment attempt ended without success
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentFailure {
    /// Backend reported the payment as failed
    Declined(PaymentStatusReport),
    /// Order creation, a status check, or the timeout ended the attempt
    Message(String),
}

impl PaymentFailure {
    pub fn message(&self) -> &str {
        match self {
            PaymentFailure::Declined(_) => crate::payments::poller::PAYMENT_FAILED_MESSAGE,
            PaymentFailure::Message(message) => message,
        }
    }
}

/// Receives the outcome of payment attempts.
///
/// Exactly one of `on_success` / `on_failure` is invoked per attempt.
pub trait PaymentObserver: Send + Sync {
    fn on_success(&self, report: PaymentStatusReport);

    fn on_failure(&self, failure: PaymentFailure);

    /// Hand the redirect URL to whatever can open it
    fn open_payment_url(&self, url: &str) {
        info!("Payment URL ready: {}", url);
    }
}

type SuccessFn = Box<dyn Fn(PaymentStatusReport) + Send + Sync>;
type FailureFn = Box<dyn Fn(PaymentFailure) + Send + Sync>;

/// Observer built from a pair of closures
pub struct Callbacks {
    on_success: SuccessFn,
    on_failure: FailureFn,
}

impl Callbacks {
    pub fn new<S, F>(on_success: S, on_failure: F) -> Self
    where
        S: Fn(PaymentStatusReport) + Send + Sync + 'static,
        F: Fn(PaymentFailure) + Send + Sync + 'static,
    {
        Self {
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
        }
    }
}

impl PaymentObserver for Callbacks {
    fn on_success(&self, report: PaymentStatusReport) {
        (self.on_success)(report)
    }

    fn on_failure(&self, failure: PaymentFailure) {
        (self.on_failure)(failure)
    }
}
