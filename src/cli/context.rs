use std::sync::Arc;

use anyhow::bail;

use crate::api::{AuthApi, OrderApi, ShipmentApi};
use crate::auth::{authorize, AdminSection, Decision};
use crate::config::AppConfig;
use crate::http::{HttpClient, SessionExpiredHook};
use crate::models::CrudPermission;
use crate::session::{FileStore, Session, SessionStorage, SessionStore};

/// Everything a command needs, wired from configuration
pub struct CliContext {
    pub client: HttpClient,
    pub session: SessionStore,
    pub orders: OrderApi,
    pub shipments: ShipmentApi,
}

impl CliContext {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let dir = config.storage_dir()?;
        let store = FileStore::open(&dir)?;
        tracing::debug!(path = %store.path().display(), "Using session file");

        let on_expired: SessionExpiredHook = Arc::new(|| {
            eprintln!("Not signed in. Run `storefront-admin auth login <email>` to sign in.");
        });
        let storage = SessionStorage::new(Arc::new(store));
        let client = HttpClient::from_config(config, storage, Some(on_expired))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: HttpClient) -> Self {
        let gateway = Arc::new(AuthApi::new(client.clone()));
        Self {
            session: SessionStore::new(client.storage().clone(), gateway),
            orders: OrderApi::new(client.clone()),
            shipments: ShipmentApi::new(client.clone()),
            client,
        }
    }

    /// Validate the stored session and check it against a section's requirement
    pub async fn require(
        &self,
        section: AdminSection,
        permission: Option<CrudPermission>,
    ) -> anyhow::Result<Session> {
        self.session.hydrate().await;
        let session = self.session.session();

        match authorize(&session, &section.requirement(permission)) {
            Decision::Allowed => Ok(session),
            Decision::RedirectToLogin => {
                bail!("Not signed in. Run `storefront-admin auth login <email>` first")
            }
            Decision::RedirectToUnauthorized => {
                let role = session.user.as_ref().map(|u| u.role.as_str()).unwrap_or("unknown");
                bail!("Permission denied: {} cannot access {}", role, section)
            }
            Decision::Pending => bail!("Session is still being validated, try again"),
        }
    }
}
