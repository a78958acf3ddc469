use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::api::auth::AuthGateway;
use crate::error::ApiError;
use crate::models::{Permission, User};
use crate::session::storage::{SessionStorage, StorageError, TokenPair};

/// Read-only snapshot of who is signed in
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub user: Option<User>,
    pub permissions: Option<Vec<Permission>>,
    /// True while a restored session is still being validated
    pub loading: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// Nothing usable was persisted
    NoSession,
    /// Cached user confirmed by the server
    Restored,
    /// Server rejected the cached session; storage was cleared
    Invalidated,
    /// A previous call already ran the hydration pass
    AlreadyHydrated,
    /// A login or logout finished while validation was in flight; its
    /// result was kept and the validation discarded
    Superseded,
}

/// Single source of truth for the signed-in admin.
///
/// The store owns the in-memory [`Session`] and writes the persisted token
/// triple; the HTTP client only touches storage when rotating tokens.
pub struct SessionStore {
    storage: SessionStorage,
    gateway: Arc<dyn AuthGateway>,
    state: RwLock<Session>,
    hydrated: AtomicBool,
    // login / logout / update_user never interleave
    mutation: Mutex<()>,
    // bumped by every login / logout / update_user
    generation: AtomicU64,
}

impl SessionStore {
    pub fn new(storage: SessionStorage, gateway: Arc<dyn AuthGateway>) -> Self {
        Self {
            storage,
            gateway,
            state: RwLock::new(Session::default()),
            hydrated: AtomicBool::new(false),
            mutation: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> Session {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Synchronous half of hydration: adopt the cached user if the full
    /// triple is persisted. Returns whether a session was restored.
    pub fn restore(&self) -> bool {
        let access = self.storage.access_token();
        let refresh = self.storage.refresh_token();
        let user = self.storage.user();

        match (access, refresh, user) {
            (Some(_), Some(_), Some(user)) => {
                self.replace(|state| {
                    state.user = Some(user);
                    state.permissions = None;
                    state.loading = true;
                });
                true
            }
            (None, None, None) => false,
            (access, refresh, _) => {
                if access.is_some() != refresh.is_some() {
                    tracing::warn!("Persisted session has only one token, clearing it");
                    self.clear_storage();
                } else {
                    tracing::debug!("Persisted session incomplete, not restoring");
                }
                false
            }
        }
    }

    /// Restore the persisted session and validate it against the server.
    /// Only the first call per store does any work.
    pub async fn hydrate(&self) -> HydrationOutcome {
        if self.hydrated.swap(true, Ordering::SeqCst) {
            return HydrationOutcome::AlreadyHydrated;
        }

        let generation = {
            let _guard = self.mutation.lock().await;
            if !self.restore() {
                return HydrationOutcome::NoSession;
            }
            self.generation.load(Ordering::SeqCst)
        };

        let validated = self.gateway.current_user().await;

        let _guard = self.mutation.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Session changed during validation, discarding result");
            return HydrationOutcome::Superseded;
        }

        match validated {
            Ok(user) => {
                if let Err(e) = self.storage.save_user(&user) {
                    tracing::warn!("Failed to cache refreshed profile: {}", e);
                }
                let permissions = self.load_permissions(&user).await;
                self.replace(|state| {
                    state.user = Some(user);
                    state.permissions = permissions;
                    state.loading = false;
                });
                tracing::info!("Session restored");
                HydrationOutcome::Restored
            }
            Err(e) => {
                tracing::warn!("Stored session rejected, signing out: {}", e);
                self.clear_storage();
                self.replace(|state| *state = Session::default());
                HydrationOutcome::Invalidated
            }
        }
    }

    pub async fn login(
        &self,
        user: User,
        access_token: String,
        refresh_token: String,
    ) -> Result<Session, StorageError> {
        let _guard = self.mutation.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);

        let tokens = TokenPair {
            access_token,
            refresh_token,
        };
        self.storage.save_session(&user, &tokens)?;
        self.replace(|state| {
            state.user = Some(user.clone());
            state.permissions = None;
            state.loading = false;
        });

        let permissions = self.load_permissions(&user).await;
        self.replace(|state| state.permissions = permissions);

        tracing::info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(self.session())
    }

    /// Authenticate against the API and start a session
    pub async fn login_with_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Session> {
        let payload = self.gateway.login(email, password).await?;
        let session = self
            .login(payload.user, payload.access_token, payload.refresh_token)
            .await?;
        Ok(session)
    }

    /// Always leaves storage and memory empty, whatever the server says
    pub async fn logout(&self) {
        let _guard = self.mutation.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.gateway.logout().await {
            tracing::warn!("Server-side logout failed, clearing local session anyway: {}", e);
        }

        self.clear_storage();
        self.replace(|state| *state = Session::default());
        tracing::info!("Signed out");
    }

    pub async fn update_user(&self, user: User) -> Result<Session, StorageError> {
        let _guard = self.mutation.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.adopt_user(user).await
    }

    pub async fn refresh_permissions(&self) -> Session {
        let _guard = self.mutation.lock().await;
        let Some(user) = self.session().user else {
            return self.session();
        };

        let permissions = self.load_permissions(&user).await;
        self.replace(|state| state.permissions = permissions);
        self.session()
    }

    /// Re-fetch the profile from the server and adopt it, unless the
    /// session was replaced or ended while the request was in flight
    pub async fn refresh_profile(&self) -> anyhow::Result<Session> {
        let generation = self.generation.load(Ordering::SeqCst);
        let user: User = self.gateway.current_user().await?;

        let _guard = self.mutation.lock().await;
        let superseded = self.generation.load(Ordering::SeqCst) != generation;
        if superseded || !self.session().is_authenticated() {
            tracing::debug!("Session changed during profile refresh, discarding result");
            return Ok(self.session());
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(self.adopt_user(user).await?)
    }

    // Caller holds the mutation lock
    async fn adopt_user(&self, user: User) -> Result<Session, StorageError> {
        self.storage.save_user(&user)?;
        let permissions = self.load_permissions(&user).await;
        self.replace(|state| {
            state.user = Some(user);
            state.permissions = permissions;
        });
        Ok(self.session())
    }

    /// Permissions for admins; `None` for everyone else or on failure
    async fn load_permissions(&self, user: &User) -> Option<Vec<Permission>> {
        if !user.needs_permissions() {
            return None;
        }

        match self.gateway.permissions(&user.id).await {
            Ok(permissions) => Some(dedupe_modules(permissions)),
            Err(e) => {
                log_permission_failure(&user.id, &e);
                None
            }
        }
    }

    fn clear_storage(&self) {
        if let Err(e) = self.storage.clear() {
            tracing::error!("Failed to clear session storage: {}", e);
        }
    }

    fn replace(&self, update: impl FnOnce(&mut Session)) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        update(&mut state);
    }
}

fn log_permission_failure(user_id: &str, error: &ApiError) {
    tracing::warn!(user_id = %user_id, "Failed to load admin permissions: {}", error);
}

/// First record per module wins
fn dedupe_modules(permissions: Vec<Permission>) -> Vec<Permission> {
    let mut seen = HashSet::new();
    permissions
        .into_iter()
        .filter(|permission| {
            let first = seen.insert(permission.module.clone());
            if !first {
                tracing::warn!(module = %permission.module, "Dropping duplicate permission record");
            }
            first
        })
        .collect()
}
