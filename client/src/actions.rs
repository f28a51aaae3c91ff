//! Access-module flows that span several calls and end with a profile reload.

use futures_util::future::try_join_all;
use workbench_access::{
    ALL_INITIAL_MODULES, AccessContext, PageMode, eligible_modules, incomplete_modules,
    sync_endpoints,
};
use workbench_types::{AccessModule, Profile, ServerConfig};

use crate::{ApiError, ProfileStore, WorkbenchClient};

/// Pull external status for `modules`, concurrently, one call per sync endpoint.
///
/// Modules without an external system of record are skipped. The two trainings share
/// an endpoint and are synced once.
pub async fn sync_modules_external(
    client: &WorkbenchClient,
    modules: &[AccessModule],
) -> Result<(), ApiError> {
    let endpoints = sync_endpoints(modules);
    if endpoints.is_empty() {
        return Ok(());
    }
    tracing::info!(count = endpoints.len(), "Syncing external access modules");
    try_join_all(endpoints.into_iter().map(|endpoint| client.sync(endpoint))).await?;
    Ok(())
}

/// Sync every eligible initial-registration module that is not yet compliant, then
/// reload the profile.
pub async fn sync_incomplete_modules(
    client: &WorkbenchClient,
    store: &ProfileStore,
    config: &ServerConfig,
    now_millis: i64,
) -> Result<Profile, ApiError> {
    let profile = store.get_or_load(client).await?;
    let ctx = AccessContext::new(&profile, config, now_millis);
    let eligible = eligible_modules(ALL_INITIAL_MODULES, &ctx);
    let incomplete = incomplete_modules(&eligible, &ctx, PageMode::InitialRegistration);

    sync_modules_external(client, &incomplete).await?;
    store.reload(client).await
}

/// Bypass `modules` for the calling user, then reload.
///
/// Requests are sequential; the server rejects them all unless it allows self-bypass.
pub async fn self_bypass(
    client: &WorkbenchClient,
    store: &ProfileStore,
    modules: &[AccessModule],
) -> Result<Profile, ApiError> {
    for &module in modules {
        tracing::info!(module = %module, "Self-bypassing access module");
        client.unsafe_self_bypass(module, true).await?;
    }
    store.reload(client).await
}

/// [`self_bypass`] over every initial-registration module.
pub async fn self_bypass_all(
    client: &WorkbenchClient,
    store: &ProfileStore,
) -> Result<Profile, ApiError> {
    self_bypass(client, store, ALL_INITIAL_MODULES).await
}

pub async fn confirm_publications(
    client: &WorkbenchClient,
    store: &ProfileStore,
) -> Result<Profile, ApiError> {
    client.confirm_publications().await?;
    store.reload(client).await
}

pub async fn confirm_profile(
    client: &WorkbenchClient,
    store: &ProfileStore,
) -> Result<Profile, ApiError> {
    client.confirm_profile().await?;
    store.reload(client).await
}
