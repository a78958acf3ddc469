#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use storefront_admin::config::AppConfig;
use storefront_admin::http::{HttpClient, SessionExpiredHook};
use storefront_admin::session::{FileStore, SessionStorage};

pub const ADMIN_EMAIL: &str = "ops@storefront.test";
pub const ADMIN_PASSWORD: &str = "correct-horse";

type Reply = (StatusCode, Json<Value>);

/// Server-side view of the fake storefront API
pub struct MockState {
    access_token: Mutex<String>,
    refresh_token: Mutex<String>,
    generation: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub order_calls: AtomicUsize,
    pub fail_refresh: AtomicBool,
    pub reject_tokens: AtomicBool,
    pub user: Mutex<Value>,
    pub permissions: Mutex<Value>,
    pub orders: Mutex<HashMap<String, Value>>,
}

impl MockState {
    fn new() -> Self {
        let mut orders = HashMap::new();
        orders.insert(
            "ord_100".to_string(),
            json!({
                "id": "ord_100",
                "orderNumber": "SO-100",
                "status": "PENDING",
                "totalAmount": "1299.00",
                "shippingInfo": {
                    "selectedCourierCompanyId": 24,
                    "selectedCourierName": "Xpressbees"
                }
            }),
        );
        orders.insert(
            "ord_200".to_string(),
            json!({
                "id": "ord_200",
                "orderNumber": "SO-200",
                "status": "CANCELLED",
                "shipment": {"id": "shp_200", "awbCode": "AWB200"},
                "shippingInfo": {"selectedCourierCompanyId": "7"}
            }),
        );
        orders.insert(
            "ord_300".to_string(),
            json!({"id": "ord_300", "status": "CONFIRMED", "shippingInfo": {}}),
        );

        Self {
            access_token: Mutex::new("access-1".to_string()),
            refresh_token: Mutex::new("refresh-1".to_string()),
            generation: AtomicUsize::new(1),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            order_calls: AtomicUsize::new(0),
            fail_refresh: AtomicBool::new(false),
            reject_tokens: AtomicBool::new(false),
            user: Mutex::new(json!({
                "id": "usr_admin",
                "email": ADMIN_EMAIL,
                "firstName": "Ops",
                "lastName": "Admin",
                "role": "ADMIN",
                "isActive": true
            })),
            permissions: Mutex::new(json!([
                {
                    "module": "orders",
                    "canCreate": false, "canRead": true, "canUpdate": true, "canDelete": false
                },
                {
                    "module": "shipments",
                    "canCreate": true, "canRead": true, "canUpdate": true, "canDelete": false
                }
            ])),
            orders: Mutex::new(orders),
        }
    }

    pub fn access_token(&self) -> String {
        self.access_token.lock().unwrap().clone()
    }

    pub fn refresh_token(&self) -> String {
        self.refresh_token.lock().unwrap().clone()
    }

    /// Invalidate the issued access token; the refresh token stays valid
    pub fn expire_access_token(&self) {
        *self.access_token.lock().unwrap() = "expired".to_string();
    }

    pub fn set_role(&self, role: &str) {
        self.user.lock().unwrap()["role"] = json!(role);
    }

    pub fn order(&self, id: &str) -> Option<Value> {
        self.orders.lock().unwrap().get(id).cloned()
    }

    fn rotate(&self) -> (String, String) {
        let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{}", n);
        let refresh = format!("refresh-{}", n);
        *self.access_token.lock().unwrap() = access.clone();
        *self.refresh_token.lock().unwrap() = refresh.clone();
        (access, refresh)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        if self.reject_tokens.load(Ordering::SeqCst) {
            return false;
        }
        let current = self.access_token();
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == current)
    }
}

pub struct MockBackend {
    pub state: Arc<MockState>,
    pub base_url: String,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;

        let state = Arc::new(MockState::new());
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            state,
            base_url: format!("http://127.0.0.1:{}/api", port),
        })
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::from_env();
        config.api.base_url = self.base_url.clone();
        config.api.timeout_secs = 5;
        config
    }

    pub fn client(&self, storage: SessionStorage) -> Result<HttpClient> {
        HttpClient::from_config(&self.config(), storage, None)
    }

    pub fn client_with_hook(
        &self,
        storage: SessionStorage,
        hook: SessionExpiredHook,
    ) -> Result<HttpClient> {
        HttpClient::from_config(&self.config(), storage, Some(hook))
    }
}

/// Session storage backed by a fresh directory
pub fn file_storage() -> Result<(SessionStorage, PathBuf)> {
    let dir = std::env::temp_dir()
        .join(format!("storefront_admin_it_{}", uuid::Uuid::new_v4().simple()));
    let store = FileStore::open(&dir)?;
    Ok((SessionStorage::new(Arc::new(store)), dir))
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh-token", post(refresh))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/admin/permissions/:id", get(permissions))
        .route("/api/orders", get(list_orders))
        .route("/api/orders/:id", get(get_order))
        .route("/api/orders/:id/status", patch(update_status))
        .route("/api/shipments/create", post(create_shipment))
        .route("/api/shipments/generate-awb", post(generate_awb))
        .route("/api/shipments/schedule-pickup", post(schedule_pickup))
        .route("/api/shipments/generate-label", post(generate_label))
        .route("/api/shipments/generate-manifest", post(generate_manifest))
        .route("/api/shipments/mark-delivered", post(mark_delivered))
        .route("/api/shipments/track/:id", get(track))
        .with_state(state)
}

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({"success": true, "data": data})))
}

fn ack(message: &str) -> Reply {
    (StatusCode::OK, Json(json!({"success": true, "message": message})))
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({"success": false, "message": message})))
}

fn unauthorized() -> Reply {
    fail(StatusCode::UNAUTHORIZED, "Invalid or expired token")
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    if body["email"] != ADMIN_EMAIL || body["password"] != ADMIN_PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    let (access, refresh) = state.rotate();
    let user = state.user.lock().unwrap().clone();
    ok(json!({"user": user, "accessToken": access, "refreshToken": refresh}))
}

async fn refresh(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Reply {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Slow enough that concurrent 401s overlap with the refresh
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    if state.fail_refresh.load(Ordering::SeqCst) || body["refreshToken"] != state.refresh_token() {
        return fail(StatusCode::UNAUTHORIZED, "Refresh token revoked");
    }
    let (access, refresh) = state.rotate();
    ok(json!({"accessToken": access, "refreshToken": refresh}))
}

async fn me(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Reply {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let user = state.user.lock().unwrap().clone();
    ok(user)
}

async fn logout(State(state): State<Arc<MockState>>) -> Reply {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    ack("Logged out")
}

async fn permissions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> Reply {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let permissions = state.permissions.lock().unwrap().clone();
    ok(permissions)
}

async fn list_orders(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    state.order_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }

    let mut orders: Vec<Value> = state
        .orders
        .lock()
        .unwrap()
        .values()
        .filter(|order| params.get("status").map_or(true, |s| order["status"] == s.as_str()))
        .cloned()
        .collect();
    orders.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));

    let total = orders.len();
    ok(json!({
        "orders": orders,
        "pagination": {"page": 1, "limit": 20, "total": total, "totalPages": 1}
    }))
}

async fn get_order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    state.order_calls.fetch_add(1, Ordering::SeqCst);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    match state.order(&id) {
        Some(order) => ok(order),
        None => fail(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn update_status(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let mut orders = state.orders.lock().unwrap();
    match orders.get_mut(&id) {
        Some(order) => {
            order["status"] = body["status"].clone();
            ok(order.clone())
        }
        None => fail(StatusCode::NOT_FOUND, "Order not found"),
    }
}

/// Apply `change` to the order named in the body
fn with_order(
    state: &MockState,
    headers: &HeaderMap,
    body: &Value,
    change: impl FnOnce(&mut Value) -> Reply,
) -> Reply {
    if !state.authorized(headers) {
        return unauthorized();
    }
    let Some(id) = body["orderId"].as_str() else {
        return fail(StatusCode::BAD_REQUEST, "orderId is required");
    };
    let mut orders = state.orders.lock().unwrap();
    match orders.get_mut(id) {
        Some(order) => change(order),
        None => fail(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn create_shipment(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    with_order(&state, &headers, &body, |order| {
        if !order["shipment"].is_null() {
            return fail(StatusCode::CONFLICT, "Shipment already exists");
        }
        order["shipment"] = json!({"id": format!("shp_{}", order["id"].as_str().unwrap_or("x"))});
        order["status"] = json!("PROCESSING");
        ok(order["shipment"].clone())
    })
}

async fn generate_awb(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let courier = body["courierId"].as_str().unwrap_or_default().to_string();
    with_order(&state, &headers, &body, |order| {
        if courier.is_empty() {
            return fail(StatusCode::BAD_REQUEST, "courierId is required");
        }
        let awb = format!("AWB-{}", courier);
        order["shipment"]["awbCode"] = json!(awb);
        order["shipment"]["courierName"] = json!("Xpressbees");
        ok(json!({"awbCode": awb}))
    })
}

async fn schedule_pickup(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    with_order(&state, &headers, &body, |order| {
        order["shipment"]["shippedAt"] = json!(chrono::Utc::now().to_rfc3339());
        order["status"] = json!("SHIPPED");
        ack("Pickup scheduled")
    })
}

async fn generate_label(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    with_order(&state, &headers, &body, |order| {
        let id = order["id"].as_str().unwrap_or("x").to_string();
        let url = format!("https://cdn.storefront.test/labels/{}.pdf", id);
        order["shipment"]["labelUrl"] = json!(url);
        ok(json!({"labelUrl": url}))
    })
}

async fn generate_manifest(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    with_order(&state, &headers, &body, |order| {
        let id = order["id"].as_str().unwrap_or("x").to_string();
        let url = format!("https://cdn.storefront.test/manifests/{}.pdf", id);
        order["shipment"]["manifestUrl"] = json!(url);
        ok(json!({"manifestUrl": url}))
    })
}

async fn mark_delivered(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    with_order(&state, &headers, &body, |order| {
        order["shipment"]["deliveredAt"] = json!(chrono::Utc::now().to_rfc3339());
        order["status"] = json!("DELIVERED");
        ack("Order marked as delivered")
    })
}

async fn track(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    match state.order(&id) {
        Some(order) => ok(json!({
            "awbCode": order["shipment"]["awbCode"],
            "events": [{"status": "PICKED_UP", "location": "Bengaluru Hub"}]
        })),
        None => fail(StatusCode::NOT_FOUND, "Order not found"),
    }
}
