//! Checkout payment flow
//!
//! Creates the out-of-band payment, then polls its status until the backend
//! reports a terminal outcome or the polling window closes.

pub mod poller;
pub mod traits;
pub mod types;

pub use poller::{PaymentPoller, PollPhase, PollingConfig, POLL_INTERVAL_MS, POLL_TIMEOUT_MS};
pub use traits::{Callbacks, PaymentFailure, PaymentGateway, PaymentObserver};
pub use types::{PaymentLink, PaymentRequest, PaymentSession, PaymentStatus, PaymentStatusReport};
