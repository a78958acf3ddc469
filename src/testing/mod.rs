use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::api::auth::{AuthGateway, LoginPayload};
use crate::error::{ApiError, ErrorBody};
use crate::http::{ApiRequest, RawResponse, Transport, TransportError};
use crate::models::{CourierId, Order, OrderStatus, Permission, Role, Shipment, ShippingInfo, User};

pub fn user_with_role(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@storefront.test", id),
        first_name: "Test".to_string(),
        last_name: role.as_str().to_lowercase(),
        role,
        is_active: true,
        created_at: None,
        updated_at: None,
    }
}

pub fn admin_user() -> User {
    user_with_role("admin-1", Role::Admin)
}

pub fn super_admin() -> User {
    user_with_role("root-1", Role::SuperAdmin)
}

pub fn customer_user() -> User {
    user_with_role("customer-1", Role::User)
}

pub fn permission(
    module: &str,
    create: bool,
    read: bool,
    update: bool,
    delete: bool,
) -> Permission {
    Permission {
        module: module.to_string(),
        can_create: create,
        can_read: read,
        can_update: update,
        can_delete: delete,
    }
}

pub fn order(status: OrderStatus) -> Order {
    Order {
        id: "ord_1".to_string(),
        order_number: Some("SO-1001".to_string()),
        status,
        total_amount: None,
        shipment: None,
        shipping_info: Some(ShippingInfo {
            selected_courier_company_id: Some(CourierId::Number(24)),
            selected_courier_name: Some("Xpressbees".to_string()),
        }),
        created_at: None,
    }
}

pub fn order_with_shipment(status: OrderStatus, shipment: Shipment) -> Order {
    Order {
        shipment: Some(shipment),
        ..order(status)
    }
}

/// Unique directory under the system temp dir
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("storefront_admin_test_{}", Uuid::new_v4().simple()))
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
    pub retried: bool,
}

type Handler =
    Box<dyn Fn(&ApiRequest, Option<&str>) -> Result<RawResponse, TransportError> + Send + Sync>;

/// Transport answering from a closure and recording every call
pub struct ScriptedTransport {
    handler: Handler,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest, Option<&str>) -> Result<RawResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_path(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: request.path.clone(),
            bearer: bearer.map(str::to_string),
            body: request.body.clone(),
            retried: request.retried,
        });
        // Let concurrent requests interleave like real I/O would
        tokio::task::yield_now().await;
        (self.handler)(request, bearer)
    }
}

/// In-memory stand-in for the auth endpoints used by the session store
#[derive(Default)]
pub struct FakeGateway {
    pub me: Mutex<VecDeque<Result<User, ApiError>>>,
    pub permissions: Mutex<VecDeque<Result<Vec<Permission>, ApiError>>>,
    pub login: Mutex<Option<Result<LoginPayload, ApiError>>>,
    pub fail_logout: bool,
    /// Hold `/auth/me` open this long before answering
    pub me_delay: Option<Duration>,
    pub me_calls: AtomicUsize,
    pub permission_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_logout() -> Self {
        Self {
            fail_logout: true,
            ..Self::default()
        }
    }

    pub fn slow_me(delay: Duration) -> Self {
        Self {
            me_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push_me(&self, result: Result<User, ApiError>) {
        self.me.lock().unwrap().push_back(result);
    }

    pub fn push_permissions(&self, result: Result<Vec<Permission>, ApiError>) {
        self.permissions.lock().unwrap().push_back(result);
    }

    pub fn set_login(&self, result: Result<LoginPayload, ApiError>) {
        *self.login.lock().unwrap() = Some(result);
    }
}

pub fn api_failure(status: u16, message: &str) -> ApiError {
    ApiError::Api {
        status,
        body: ErrorBody::new(message),
    }
}

#[async_trait]
impl AuthGateway for FakeGateway {
    async fn login(&self, _email: &str, _password: &str) -> Result<LoginPayload, ApiError> {
        self.login
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(api_failure(401, "Invalid credentials")))
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.me_delay {
            tokio::time::sleep(delay).await;
        }
        self.me
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::network("no scripted response")))
    }

    async fn permissions(&self, _user_id: &str) -> Result<Vec<Permission>, ApiError> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        self.permissions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_logout {
            Err(ApiError::network("connection reset"))
        } else {
            Ok(())
        }
    }
}
