use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::{ApiError, ErrorBody};
use crate::http::{ApiRequest, RawResponse, ReqwestTransport, Transport};
use crate::session::storage::{SessionStorage, TokenPair};
use crate::types::ApiResponse;

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh-token";

/// Invoked after an unrecoverable 401 has cleared the stored session.
/// Front ends use it to send the operator back to the login entry point.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
    access_token: String,
    refresh_token: String,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    storage: SessionStorage,
    refresh_path: String,
    refresh_gate: Mutex<()>,
    on_session_expired: Option<SessionExpiredHook>,
}

/// Single entry point for every REST call.
///
/// Attaches the stored bearer token, normalizes failures into [`ApiError`],
/// and recovers from an expired access token with at most one
/// refresh-and-replay per request. Refreshes are single-flight: concurrent
/// requests that hit 401 together share one refresh call.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

pub struct HttpClientBuilder {
    transport: Arc<dyn Transport>,
    storage: SessionStorage,
    refresh_path: String,
    on_session_expired: Option<SessionExpiredHook>,
}

impl HttpClientBuilder {
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn on_session_expired(mut self, hook: SessionExpiredHook) -> Self {
        self.on_session_expired = Some(hook);
        self
    }

    pub fn build(self) -> HttpClient {
        HttpClient {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                storage: self.storage,
                refresh_path: self.refresh_path,
                refresh_gate: Mutex::new(()),
                on_session_expired: self.on_session_expired,
            }),
        }
    }
}

impl HttpClient {
    pub fn builder(transport: Arc<dyn Transport>, storage: SessionStorage) -> HttpClientBuilder {
        HttpClientBuilder {
            transport,
            storage,
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            on_session_expired: None,
        }
    }

    pub fn new(transport: Arc<dyn Transport>, storage: SessionStorage) -> Self {
        Self::builder(transport, storage).build()
    }

    /// reqwest-backed client for the configured API
    pub fn from_config(
        config: &AppConfig,
        storage: SessionStorage,
        on_session_expired: Option<SessionExpiredHook>,
    ) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(&config.api)?;
        let mut builder = Self::builder(Arc::new(transport), storage)
            .refresh_path(config.api.refresh_path.clone());
        if let Some(hook) = on_session_expired {
            builder = builder.on_session_expired(hook);
        }
        Ok(builder.build())
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.inner.storage
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = self.execute(request).await?;
        decode_envelope(&response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.call(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.call(with_json(ApiRequest::post(path), body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.call(with_json(ApiRequest::put(path), body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.call(with_json(ApiRequest::patch(path), body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.call(ApiRequest::delete(path)).await
    }

    /// Send a request and return the raw successful response
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let token = self.inner.storage.access_token();
        let response = self.dispatch(&request, token.as_deref()).await?;

        if response.status == 401 && !request.retried {
            return self
                .refresh_and_replay(request.mark_retried(), token, response)
                .await;
        }

        into_result(response)
    }

    /// Rotate the stored token pair without waiting for a 401
    pub async fn refresh_tokens(&self) -> Result<(), ApiError> {
        let _gate = self.inner.refresh_gate.lock().await;
        let missing = RawResponse::new(
            401,
            json!({ "success": false, "message": "No refresh token stored" }).to_string(),
        );
        self.rotate_tokens(missing).await.map(|_| ())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse, ApiError> {
        tracing::debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            retried = request.retried,
            authenticated = bearer.is_some(),
            "dispatching API request"
        );

        let response = self
            .inner
            .transport
            .send(request, bearer)
            .await
            .map_err(|e| {
                tracing::debug!(request_id = %request.id, "transport failure: {}", e);
                ApiError::network(e.0)
            })?;

        tracing::debug!(request_id = %request.id, status = response.status, "API response");
        Ok(response)
    }

    async fn refresh_and_replay(
        &self,
        request: ApiRequest,
        stale_token: Option<String>,
        unauthorized: RawResponse,
    ) -> Result<RawResponse, ApiError> {
        let access_token = {
            let _gate = self.inner.refresh_gate.lock().await;
            match self.inner.storage.access_token() {
                Some(current) if stale_token.as_deref() != Some(current.as_str()) => {
                    tracing::debug!(
                        request_id = %request.id,
                        "access token rotated by a concurrent refresh, replaying"
                    );
                    current
                }
                // An earlier holder of the gate already ended the session
                None if stale_token.is_some() => {
                    tracing::debug!(
                        request_id = %request.id,
                        "session already cleared, not refreshing"
                    );
                    return Err(normalize_error(unauthorized));
                }
                _ => self.rotate_tokens(unauthorized).await?,
            }
        };

        let response = self.dispatch(&request, Some(&access_token)).await?;
        into_result(response)
    }

    /// Exchange the stored refresh token for a new pair and persist both.
    /// Runs with the refresh gate held.
    async fn rotate_tokens(&self, unauthorized: RawResponse) -> Result<String, ApiError> {
        let Some(refresh_token) = self.inner.storage.refresh_token() else {
            tracing::warn!("Received 401 without a stored refresh token, ending session");
            self.expire_session();
            return Err(normalize_error(unauthorized));
        };

        let tokens = match self.request_refresh(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!("Token refresh failed, ending session: {}", e);
                self.expire_session();
                return Err(e);
            }
        };

        if let Err(e) = self.inner.storage.save_tokens(&tokens) {
            tracing::error!("Failed to persist refreshed tokens: {}", e);
            self.expire_session();
            return Err(ApiError::unknown(
                None,
                format!("failed to persist refreshed tokens: {}", e),
            ));
        }

        tracing::info!("Access token refreshed");
        Ok(tokens.access_token)
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        // The refresh token travels in the body; no bearer header
        let request = ApiRequest::post(self.inner.refresh_path.clone())
            .with_body(json!({ "refreshToken": refresh_token }));
        let response = into_result(self.dispatch(&request, None).await?)?;
        let payload: RefreshPayload = decode_envelope(&response)?.into_data()?;

        Ok(TokenPair {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
        })
    }

    fn expire_session(&self) {
        if let Err(e) = self.inner.storage.clear() {
            tracing::error!("Failed to clear session storage: {}", e);
        }
        if let Some(hook) = &self.inner.on_session_expired {
            hook();
        }
    }
}

fn with_json<B: Serialize>(request: ApiRequest, body: &B) -> Result<ApiRequest, ApiError> {
    request
        .json(body)
        .map_err(|e| ApiError::unknown(None, format!("failed to encode request body: {}", e)))
}

fn into_result(response: RawResponse) -> Result<RawResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(normalize_error(response))
    }
}

/// The API's own failure envelopes are surfaced as-is, everything else is unknown
fn normalize_error(response: RawResponse) -> ApiError {
    match serde_json::from_str::<Value>(&response.body) {
        Ok(value) if ErrorBody::is_envelope(&value) => {
            match serde_json::from_value::<ErrorBody>(value) {
                Ok(body) => ApiError::Api {
                    status: response.status,
                    body,
                },
                Err(e) => ApiError::unknown(Some(response.status), e.to_string()),
            }
        }
        _ => ApiError::unknown(Some(response.status), response.body),
    }
}

fn decode_envelope<T: DeserializeOwned>(
    response: &RawResponse,
) -> Result<ApiResponse<T>, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(ApiResponse {
            success: true,
            message: None,
            data: None,
        });
    }

    serde_json::from_str(&response.body).map_err(|e| {
        tracing::warn!("Undecodable API response (status {}): {}", response.status, e);
        ApiError::unknown(Some(response.status), e.to_string())
    })
}
