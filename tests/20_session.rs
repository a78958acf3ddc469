mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;

use storefront_admin::api::AuthApi;
use storefront_admin::auth::{authorize, AdminSection, Decision};
use storefront_admin::models::{CrudPermission, Role};
use storefront_admin::session::{HydrationOutcome, SessionStorage, SessionStore};

fn store_for(backend: &common::MockBackend, storage: SessionStorage) -> Result<SessionStore> {
    let client = backend.client(storage.clone())?;
    Ok(SessionStore::new(storage, Arc::new(AuthApi::new(client))))
}

#[tokio::test]
async fn login_persists_and_a_new_process_restores_it() -> Result<()> {
    let backend = common::MockBackend::start().await?;
    let (storage, dir) = common::file_storage()?;

    let first = store_for(&backend, storage)?;
    let session = first
        .login_with_credentials(common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
        .await?;
    let user = session.user.clone().expect("signed in");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(session.permissions.as_ref().map(Vec::len), Some(2));

    // Same directory, fresh store: what a second CLI invocation sees
    let reopened = SessionStorage::new(Arc::new(storefront_admin::session::FileStore::open(&dir)?));
    let second = store_for(&backend, reopened)?;
    assert_eq!(second.hydrate().await, HydrationOutcome::Restored);

    let restored = second.session();
    assert_eq!(restored.user, Some(user));
    let update_orders = AdminSection::Orders.requirement(Some(CrudPermission::Update));
    assert!(authorize(&restored, &update_orders).is_allowed());
    assert_eq!(
        authorize(&restored, &AdminSection::Banners.requirement(None)),
        Decision::RedirectToUnauthorized
    );
    Ok(())
}

#[tokio::test]
async fn wrong_password_leaves_nothing_behind() -> Result<()> {
    let backend = common::MockBackend::start().await?;
    let (storage, _dir) = common::file_storage()?;
    let store = store_for(&backend, storage.clone())?;

    let err = store
        .login_with_credentials(common::ADMIN_EMAIL, "nope")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert!(storage.access_token().is_none());
    assert!(!store.session().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn hydrate_refreshes_an_expired_access_token() -> Result<()> {
    let backend = common::MockBackend::start().await?;
    let (storage, _dir) = common::file_storage()?;
    let store = store_for(&backend, storage.clone())?;
    store
        .login_with_credentials(common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
        .await?;

    backend.state.expire_access_token();
    let fresh = store_for(&backend, storage.clone())?;

    assert_eq!(fresh.hydrate().await, HydrationOutcome::Restored);
    assert_eq!(backend.state.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(storage.access_token(), Some(backend.state.access_token()));
    Ok(())
}

#[tokio::test]
async fn hydrate_signs_out_when_refresh_is_revoked() -> Result<()> {
    let backend = common::MockBackend::start().await?;
    let (storage, _dir) = common::file_storage()?;
    let store = store_for(&backend, storage.clone())?;
    store
        .login_with_credentials(common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
        .await?;

    backend.state.expire_access_token();
    backend.state.fail_refresh.store(true, Ordering::SeqCst);
    let fresh = store_for(&backend, storage.clone())?;

    assert_eq!(fresh.hydrate().await, HydrationOutcome::Invalidated);
    assert!(storage.user().is_none());
    assert_eq!(
        authorize(&fresh.session(), &AdminSection::Orders.requirement(None)),
        Decision::RedirectToLogin
    );
    Ok(())
}

#[tokio::test]
async fn logout_is_idempotent() -> Result<()> {
    let backend = common::MockBackend::start().await?;
    let (storage, _dir) = common::file_storage()?;
    let store = store_for(&backend, storage.clone())?;
    store
        .login_with_credentials(common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
        .await?;

    store.logout().await;
    store.logout().await;

    assert_eq!(backend.state.logout_calls.load(Ordering::SeqCst), 2);
    assert!(storage.access_token().is_none());
    assert!(storage.refresh_token().is_none());
    assert!(storage.user().is_none());
    assert!(!store.session().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn super_admin_skips_permission_lookup() -> Result<()> {
    let backend = common::MockBackend::start().await?;
    backend.state.set_role("SUPER_ADMIN");
    let (storage, _dir) = common::file_storage()?;
    let store = store_for(&backend, storage)?;

    let session = store
        .login_with_credentials(common::ADMIN_EMAIL, common::ADMIN_PASSWORD)
        .await?;

    assert!(session.permissions.is_none());
    for section in AdminSection::ALL {
        let requirement = section.requirement(Some(CrudPermission::Delete));
        assert_eq!(authorize(&session, &requirement), Decision::Allowed);
    }
    Ok(())
}
