use anyhow::{anyhow, Context};
use clap::Parser;
use std::sync::Arc;
use storefront_client::api::ApiClient;
use storefront_client::config::Config;
use storefront_client::payments::{
    PaymentFailure, PaymentObserver, PaymentPoller, PaymentRequest, PaymentStatusReport, PollPhase,
};
use storefront_client::services::OrderService;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Create a checkout payment and wait for its outcome",
    long_about = None
)]
struct Cli {
    /// Order to pay for
    #[arg(long)]
    order_id: String,

    /// Amount in the smallest currency unit
    #[arg(long)]
    amount: u64,

    /// Bearer token; overrides STOREFRONT_API__AUTH_TOKEN
    #[arg(long)]
    token: Option<String>,
}

struct ConsoleObserver;

impl PaymentObserver for ConsoleObserver {
    fn on_success(&self, report: PaymentStatusReport) {
        println!(
            "Payment succeeded (transaction {})",
            report.transaction_id.as_deref().unwrap_or("-")
        );
    }

    fn on_failure(&self, failure: PaymentFailure) {
        eprintln!("Payment did not complete: {}", failure.message());
    }

    fn open_payment_url(&self, url: &str) {
        println!("Complete the payment at: {}", url);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load().context("Failed to load configuration")?;
    if cli.token.is_some() {
        config.api.auth_token = cli.token;
    }

    tracing::info!("Starting storefront-pay");
    tracing::info!("Environment: {}", config.environment);

    let client = ApiClient::new(&config.api).context("Failed to create API client")?;
    let service = Arc::new(OrderService::new(client));
    let poller = PaymentPoller::with_config(
        service,
        Arc::new(ConsoleObserver),
        config.polling_config(),
    );

    let mut session = poller.subscribe();
    poller
        .handle_payment(PaymentRequest {
            order_id: cli.order_id,
            amount: cli.amount,
        })
        .await;

    if poller.is_polling() {
        session
            .wait_for(|s| !s.is_polling)
            .await
            .context("Payment poller stopped unexpectedly")?;
    }

    match poller.phase() {
        PollPhase::Succeeded => Ok(()),
        phase => {
            let error = poller.session().error.unwrap_or_default();
            Err(anyhow!("Payment ended in {:?}: {}", phase, error))
        }
    }
}
