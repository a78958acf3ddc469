use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::HttpClient;
use crate::models::{Permission, User};

/// Body of a successful `POST /auth/login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Auth endpoints the session store depends on
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginPayload, ApiError>;

    async fn current_user(&self) -> Result<User, ApiError>;

    async fn permissions(&self, user_id: &str) -> Result<Vec<Permission>, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct AuthApi {
    client: HttpClient,
}

impl AuthApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthGateway for AuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<LoginPayload, ApiError> {
        self.client
            .post::<LoginPayload, _>(
                "/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await?
            .into_data()
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.client.get::<User>("/auth/me").await?.into_data()
    }

    async fn permissions(&self, user_id: &str) -> Result<Vec<Permission>, ApiError> {
        self.client
            .get::<Vec<Permission>>(&format!("/admin/permissions/{}", user_id))
            .await?
            .into_data()
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.client
            .post::<Value, _>("/auth/logout", &json!({}))
            .await?
            .into_ack()
            .map(|_| ())
    }
}
