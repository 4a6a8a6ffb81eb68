//! Payment status polling
//!
//! After a payment URL is created the customer pays out-of-band, so the
//! storefront learns the outcome by polling the status endpoint. Each attempt
//! runs as a single tokio task owning both the interval ticker and the
//! timeout deadline: aborting the task cancels the pair together.

use crate::payments::traits::{PaymentFailure, PaymentGateway, PaymentObserver};
use crate::payments::types::{PaymentRequest, PaymentSession, PaymentStatus, PaymentStatusReport};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const POLL_INTERVAL_MS: u64 = 2_000;
pub const POLL_TIMEOUT_MS: u64 = 300_000;

pub const PAYMENT_FAILED_MESSAGE: &str = "Payment failed";
pub const PAYMENT_TIMEOUT_MESSAGE: &str = "Payment timeout";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(POLL_INTERVAL_MS),
            timeout: Duration::from_millis(POLL_TIMEOUT_MS),
        }
    }
}

/// Lifecycle of the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
    Errored,
    /// Torn down by the consumer while polling
    Cancelled,
}

impl PollPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollPhase::Idle | PollPhase::Polling)
    }
}

enum Outcome {
    Succeeded(PaymentStatusReport),
    Failed(PaymentStatusReport),
    TimedOut,
    Errored(String),
}

impl Outcome {
    fn phase(&self) -> PollPhase {
        match self {
            Outcome::Succeeded(_) => PollPhase::Succeeded,
            Outcome::Failed(_) => PollPhase::Failed,
            Outcome::TimedOut => PollPhase::TimedOut,
            Outcome::Errored(_) => PollPhase::Errored,
        }
    }
}

struct Attempt {
    /// Generation counter; bumped by every new attempt and every cancel
    id: u64,
    phase: PollPhase,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    attempt: Mutex<Attempt>,
    session: watch::Sender<PaymentSession>,
    observer: Arc<dyn PaymentObserver>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Attempt> {
        self.attempt.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, attempt_id: u64) -> bool {
        self.lock().id == attempt_id
    }

    /// Apply a terminal outcome. Late or superseded outcomes are dropped.
    fn settle(&self, attempt_id: u64, outcome: Outcome) {
        if self.commit(attempt_id, &outcome) {
            self.dispatch(attempt_id, outcome);
        }
    }

    /// Record the terminal phase and session state; false when the attempt is no longer live
    fn commit(&self, attempt_id: u64, outcome: &Outcome) -> bool {
        {
            let mut attempt = self.lock();
            if attempt.id != attempt_id || attempt.phase != PollPhase::Polling {
                debug!("Ignoring outcome for inactive attempt {}", attempt_id);
                return false;
            }
            attempt.phase = outcome.phase();
            attempt.task = None;
        }

        self.session.send_modify(|session| {
            session.is_polling = false;
            match outcome {
                Outcome::Succeeded(report) => session.status = report.status,
                Outcome::Failed(report) => {
                    session.status = report.status;
                    session.error = Some(PAYMENT_FAILED_MESSAGE.to_string());
                }
                Outcome::TimedOut => session.error = Some(PAYMENT_TIMEOUT_MESSAGE.to_string()),
                Outcome::Errored(message) => session.error = Some(message.clone()),
            }
        });
        true
    }

    /// Report a committed outcome unless the consumer tore the attempt down meanwhile
    fn dispatch(&self, attempt_id: u64, outcome: Outcome) {
        if !self.is_current(attempt_id) {
            debug!("Attempt {} torn down before its outcome was reported", attempt_id);
            return;
        }

        match outcome {
            Outcome::Succeeded(report) => {
                info!("Payment succeeded");
                self.observer.on_success(report);
            }
            Outcome::Failed(report) => {
                warn!("Payment failed");
                self.observer.on_failure(PaymentFailure::Declined(report));
            }
            Outcome::TimedOut => {
                warn!("Payment timed out");
                self.observer
                    .on_failure(PaymentFailure::Message(PAYMENT_TIMEOUT_MESSAGE.to_string()));
            }
            Outcome::Errored(message) => {
                warn!("Payment status check failed: {}", message);
                self.observer.on_failure(PaymentFailure::Message(message));
            }
        }
    }
}

/// Drives one payment attempt at a time from creation to a terminal outcome.
///
/// Dropping the poller cancels any attempt still in flight.
pub struct PaymentPoller<G> {
    gateway: Arc<G>,
    config: PollingConfig,
    shared: Arc<Shared>,
}

impl<G> PaymentPoller<G>
where
    G: PaymentGateway + 'static,
{
    pub fn new(gateway: Arc<G>, observer: Arc<dyn PaymentObserver>) -> Self {
        Self::with_config(gateway, observer, PollingConfig::default())
    }

    pub fn with_config(
        gateway: Arc<G>,
        observer: Arc<dyn PaymentObserver>,
        config: PollingConfig,
    ) -> Self {
        let (session, _) = watch::channel(PaymentSession::default());
        Self {
            gateway,
            config,
            shared: Arc::new(Shared {
                attempt: Mutex::new(Attempt {
                    id: 0,
                    phase: PollPhase::Idle,
                    task: None,
                }),
                session,
                observer,
            }),
        }
    }

    /// Start a payment attempt.
    ///
    /// Never fails to the caller: the outcome is reported through the observer
    /// and the session's `error` field. Any attempt already in flight is
    /// cancelled first.
    pub async fn handle_payment(&self, request: PaymentRequest) {
        let attempt_id = self.begin_attempt();
        let trace_id = Uuid::new_v4();
        let span = info_span!("payment_attempt", %trace_id, order_id = %request.order_id);

        let created = self
            .gateway
            .create_payment_url(request)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match created {
            Err(err) => {
                if !self.shared.is_current(attempt_id) {
                    debug!("Payment attempt superseded during creation");
                    return;
                }
                warn!("Failed to create payment URL: {}", err.message);
                self.shared
                    .session
                    .send_modify(|session| session.error = Some(err.message.clone()));
                self.shared
                    .observer
                    .on_failure(PaymentFailure::Message(err.message));
            }
            Ok(link) => {
                if !self.shared.is_current(attempt_id) {
                    debug!("Payment attempt superseded during creation");
                    return;
                }
                self.shared.observer.open_payment_url(&link.pay_url);
                self.start_polling(attempt_id, link.order_id, span.clone());
            }
        }
    }

    /// Stop polling without invoking any callback. Safe to call repeatedly.
    ///
    /// An outcome already committed but not yet reported is dropped. On a
    /// multi-threaded runtime an observer callback that has already started
    /// running on another worker may still be finishing when this returns.
    pub fn cancel(&self) {
        let mut attempt = self.shared.lock();
        attempt.id += 1;
        if let Some(task) = attempt.task.take() {
            task.abort();
        }
        if attempt.phase == PollPhase::Polling {
            attempt.phase = PollPhase::Cancelled;
            self.shared
                .session
                .send_modify(|session| session.is_polling = false);
            info!("Payment polling cancelled");
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.shared.lock().phase
    }

    pub fn session(&self) -> PaymentSession {
        self.shared.session.borrow().clone()
    }

    pub fn is_polling(&self) -> bool {
        self.phase() == PollPhase::Polling
    }

    /// Watch session changes, e.g. to drive a spinner or an error banner
    pub fn subscribe(&self) -> watch::Receiver<PaymentSession> {
        self.shared.session.subscribe()
    }

    fn begin_attempt(&self) -> u64 {
        self.cancel();
        let mut attempt = self.shared.lock();
        attempt.phase = PollPhase::Idle;
        attempt.id
    }

    fn start_polling(&self, attempt_id: u64, transaction_id: String, span: tracing::Span) {
        let mut attempt = self.shared.lock();
        if attempt.id != attempt_id {
            return;
        }

        info!("Polling payment status for {}", transaction_id);
        attempt.phase = PollPhase::Polling;
        self.shared
            .session
            .send_replace(PaymentSession::polling(transaction_id.clone()));

        let gateway = Arc::clone(&self.gateway);
        let shared = Arc::clone(&self.shared);
        let config = self.config;
        attempt.task = Some(tokio::spawn(
            async move {
                let outcome = match tokio::time::timeout(
                    config.timeout,
                    poll_until_settled(&*gateway, &transaction_id, config.interval),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Outcome::TimedOut,
                };
                shared.settle(attempt_id, outcome);
            }
            .instrument(span),
        ));
    }
}

impl<G> Drop for PaymentPoller<G> {
    fn drop(&mut self) {
        let mut attempt = self.shared.lock();
        attempt.id += 1;
        if let Some(task) = attempt.task.take() {
            task.abort();
        }
    }
}

/// Check immediately, then once per interval, until a terminal status or an error.
///
/// Each check is awaited before the next tick is taken, so checks never overlap.
async fn poll_until_settled<G>(gateway: &G, transaction_id: &str, every: Duration) -> Outcome
where
    G: PaymentGateway + ?Sized,
{
    let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match gateway.check_payment_status(transaction_id).await {
            Ok(report) => match report.status {
                PaymentStatus::Draft => debug!("Payment {} still pending", transaction_id),
                PaymentStatus::Success => return Outcome::Succeeded(report),
                PaymentStatus::Failed => return Outcome::Failed(report),
            },
            Err(err) => return Outcome::Errored(err.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiResult};
    use crate::payments::types::PaymentLink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct UnusedGateway;

    #[async_trait]
    impl PaymentGateway for UnusedGateway {
        async fn create_payment_url(&self, _request: PaymentRequest) -> ApiResult<PaymentLink> {
            Err(ApiError::not_sent(None))
        }

        async fn check_payment_status(&self, _id: &str) -> ApiResult<PaymentStatusReport> {
            Err(ApiError::not_sent(None))
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        calls: AtomicUsize,
    }

    impl PaymentObserver for CountingObserver {
        fn on_success(&self, _report: PaymentStatusReport) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failure(&self, _failure: PaymentFailure) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn polling_poller() -> (PaymentPoller<UnusedGateway>, Arc<CountingObserver>, u64) {
        let observer = Arc::new(CountingObserver::default());
        let poller = PaymentPoller::new(Arc::new(UnusedGateway), observer.clone());
        let attempt_id = {
            let mut attempt = poller.shared.lock();
            attempt.phase = PollPhase::Polling;
            attempt.id
        };
        (poller, observer, attempt_id)
    }

    fn success() -> Outcome {
        Outcome::Succeeded(PaymentStatusReport::with_status(PaymentStatus::Success))
    }

    #[test]
    fn test_committed_outcome_is_reported() {
        let (poller, observer, attempt_id) = polling_poller();

        poller.shared.settle(attempt_id, success());

        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.phase(), PollPhase::Succeeded);
    }

    #[test]
    fn test_cancel_between_commit_and_report_silences_callback() {
        let (poller, observer, attempt_id) = polling_poller();

        let outcome = success();
        assert!(poller.shared.commit(attempt_id, &outcome));
        poller.cancel();
        poller.shared.dispatch(attempt_id, outcome);

        assert_eq!(observer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(poller.phase(), PollPhase::Succeeded);
        assert!(!poller.session().is_polling);
    }

    #[test]
    fn test_second_outcome_for_same_attempt_is_dropped() {
        let (poller, observer, attempt_id) = polling_poller();

        poller.shared.settle(attempt_id, success());
        poller.shared.settle(attempt_id, Outcome::TimedOut);

        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.session().error, None);
    }

    #[test]
    fn test_default_polling_config() {
        let config = PollingConfig::default();
        assert_eq!(config.interval, Duration::from_millis(2000));
        assert_eq!(config.timeout, Duration::from_millis(300_000));
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!PollPhase::Idle.is_terminal());
        assert!(!PollPhase::Polling.is_terminal());
        for phase in [
            PollPhase::Succeeded,
            PollPhase::Failed,
            PollPhase::TimedOut,
            PollPhase::Errored,
            PollPhase::Cancelled,
        ] {
            assert!(phase.is_terminal());
        }
    }
}
