use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::http::{ApiRequest, HttpClient};
use crate::models::{Order, OrderStatus};

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub pagination: Option<Pagination>,
}

// The list endpoint returns either a bare array or a paginated object
#[derive(Deserialize)]
#[serde(untagged)]
enum OrderListing {
    Paged {
        orders: Vec<Order>,
        #[serde(default)]
        pagination: Option<Pagination>,
    },
    Bare(Vec<Order>),
}

#[derive(Clone)]
pub struct OrderApi {
    client: HttpClient,
}

impl OrderApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: &OrderQuery) -> Result<OrderPage, ApiError> {
        let mut request = ApiRequest::get("/orders");
        if let Some(page) = query.page {
            request = request.query("page", page);
        }
        if let Some(limit) = query.limit {
            request = request.query("limit", limit);
        }
        if let Some(status) = query.status {
            request = request.query("status", status.as_str());
        }

        let listing = self.client.call::<OrderListing>(request).await?.into_data()?;
        Ok(match listing {
            OrderListing::Paged { orders, pagination } => OrderPage { orders, pagination },
            OrderListing::Bare(orders) => OrderPage {
                orders,
                pagination: None,
            },
        })
    }

    pub async fn get(&self, order_id: &str) -> Result<Order, ApiError> {
        self.client
            .get::<Order>(&format!("/orders/{}", order_id))
            .await?
            .into_data()
    }

    pub async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.client
            .patch::<Order, _>(
                &format!("/orders/{}/status", order_id),
                &json!({ "status": status }),
            )
            .await?
            .into_data()
    }
}
