//! Order and payment endpoints of the marketplace backend

use crate::api::{ApiClient, ApiResult, NormalizedResult};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{PaymentLink, PaymentRequest, PaymentStatusReport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Fulfilment status of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Product reference inside an order line; the backend prices lines from it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductRef,
    pub quantity: u32,
}

/// Body of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub address: String,
    pub payment_method: String,
    /// Must equal the sum of `quantity * price` over `items`
    pub total: u64,
    #[serde(rename = "receiverName")]
    pub receiver_name: String,
    #[serde(rename = "receiverPhone")]
    pub receiver_phone: String,
}

impl NewOrder {
    pub fn subtotal(&self) -> u64 {
        self.items
            .iter()
            .map(|line| line.product_id.price * u64::from(line.quantity))
            .sum()
    }
}

/// Payload of `PUT /orders/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderStatusUpdate {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: OrderStatus,
}

/// Client for order management and checkout payment endpoints
#[derive(Debug, Clone)]
pub struct OrderService {
    client: ApiClient,
}

impl OrderService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Place an order from the current cart
    pub async fn create_order(&self, order: &NewOrder) -> ApiResult<NormalizedResult> {
        info!(
            "Creating order: {} lines, total={}",
            order.items.len(),
            order.total
        );
        self.client.post("/orders", order).await
    }

    pub async fn customer_orders(&self) -> ApiResult<NormalizedResult> {
        self.client.get("/orders/customer-orders").await
    }

    pub async fn customer_order_detail(&self, order_id: &str) -> ApiResult<NormalizedResult> {
        self.client
            .get(&format!("/orders/customer-orders/{}", order_id))
            .await
    }

    pub async fn store_orders(&self) -> ApiResult<NormalizedResult> {
        self.client.get("/orders/store-orders").await
    }

    pub async fn store_order_detail(&self, order_id: &str) -> ApiResult<NormalizedResult> {
        self.client
            .get(&format!("/orders/store-orders/{}", order_id))
            .await
    }

    /// Move an order along its fulfilment flow; `reject_reason` accompanies cancellations
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        reject_reason: Option<&str>,
    ) -> ApiResult<OrderStatusUpdate> {
        info!("Updating order {} to {:?}", order_id, status);
        self.client
            .put(
                &format!("/orders/{}/status", order_id),
                &json!({ "status": status, "reject_reason": reject_reason }),
            )
            .await?
            .decode()
    }
}

#[async_trait]
impl PaymentGateway for OrderService {
    async fn create_payment_url(&self, request: PaymentRequest) -> ApiResult<PaymentLink> {
        info!(
            "Creating payment URL: order_id={}, amount={}",
            request.order_id, request.amount
        );

        let link: PaymentLink = self
            .client
            .post("/payment/create-payment-url", &request)
            .await?
            .decode()?;

        info!("Payment URL created for order {}", link.order_id);
        Ok(link)
    }

    async fn check_payment_status(&self, transaction_id: &str) -> ApiResult<PaymentStatusReport> {
        let report: PaymentStatusReport = self
            .client
            .get(&format!("/payment/check_payment_status/{}", transaction_id))
            .await?
            .decode()?;

        debug!(
            "Payment status: transaction_id={}, status={:?}",
            transaction_id, report.status
        );
        Ok(report)
    }
}
