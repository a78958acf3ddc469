use serde_json::{json, Value};
use thiserror::Error;

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::Order;
use crate::shipment::{eligibility, Blocked, ShipmentAction};

#[derive(Debug, Error)]
pub enum ShipmentError {
    #[error("{action} not available: {reason}")]
    Blocked {
        action: ShipmentAction,
        reason: Blocked,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Carrier lifecycle calls, scoped to one order.
///
/// [`ShipmentApi::perform`] re-checks eligibility against the order record
/// before dispatching; the raw per-endpoint methods do not.
#[derive(Clone)]
pub struct ShipmentApi {
    client: HttpClient,
}

impl ShipmentApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, order_id: &str) -> Result<Value, ApiError> {
        self.order_call("/shipments/create", order_id).await
    }

    pub async fn generate_awb(&self, order_id: &str, courier_id: &str) -> Result<Value, ApiError> {
        self.client
            .post::<Value, _>(
                "/shipments/generate-awb",
                &json!({ "orderId": order_id, "courierId": courier_id }),
            )
            .await?
            .into_data()
    }

    pub async fn schedule_pickup(&self, order_id: &str) -> Result<Value, ApiError> {
        self.order_call("/shipments/schedule-pickup", order_id).await
    }

    pub async fn generate_label(&self, order_id: &str) -> Result<Value, ApiError> {
        self.order_call("/shipments/generate-label", order_id).await
    }

    pub async fn generate_manifest(&self, order_id: &str) -> Result<Value, ApiError> {
        self.order_call("/shipments/generate-manifest", order_id).await
    }

    pub async fn mark_delivered(&self, order_id: &str) -> Result<Value, ApiError> {
        self.order_call("/shipments/mark-delivered", order_id).await
    }

    pub async fn track(&self, order_id: &str) -> Result<Value, ApiError> {
        self.client
            .get::<Value>(&format!("/shipments/track/{}", order_id))
            .await?
            .into_data()
    }

    /// Run `action` for `order` if the workflow currently allows it
    pub async fn perform(
        &self,
        order: &Order,
        action: ShipmentAction,
    ) -> Result<Value, ShipmentError> {
        eligibility(order, action).map_err(|reason| ShipmentError::Blocked { action, reason })?;

        tracing::info!(order_id = %order.id, action = %action, "Dispatching shipment action");
        let result = match action {
            ShipmentAction::CreateShipment => self.create(&order.id).await?,
            ShipmentAction::GenerateAwb => {
                // eligibility guarantees a customer-selected courier here
                let courier = order
                    .selected_courier()
                    .map(ToString::to_string)
                    .ok_or(ShipmentError::Blocked {
                        action,
                        reason: Blocked::NoCourierSelected,
                    })?;
                self.generate_awb(&order.id, &courier).await?
            }
            ShipmentAction::SchedulePickup => self.schedule_pickup(&order.id).await?,
            ShipmentAction::DownloadLabel => self.generate_label(&order.id).await?,
            ShipmentAction::DownloadManifest => self.generate_manifest(&order.id).await?,
            ShipmentAction::MarkDelivered => self.mark_delivered(&order.id).await?,
        };

        Ok(result)
    }

    async fn order_call(&self, path: &str, order_id: &str) -> Result<Value, ApiError> {
        self.client
            .post::<Value, _>(path, &json!({ "orderId": order_id }))
            .await?
            .into_optional_data()
            .map(|data| data.unwrap_or(Value::Null))
    }
}
