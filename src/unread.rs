//! Unread-conversation check, run once per successful connection.

use crate::alert::{Notifier, UNREAD_TABS_ALERT};
use crate::api::ChatApi;
use crate::error::WatchError;
use crate::store::Store;
use chatwire::tabs::{self, TabState};
use tracing::info;

/// Query the service's tab state and surface unread conversations as one
/// combined alert.
pub async fn check(
    api: &dyn ChatApi,
    organization: &str,
    store: &dyn Store,
    notifier: &Notifier,
) -> Result<(), WatchError> {
    let state = api.fetch_tab_state(organization).await?;
    publish(tabs::unread_tabs(state), store, notifier).await;
    Ok(())
}

/// Replace the unread-tabs alert with the given unread set.
///
/// Clear-then-create keeps the check idempotent: re-running it with the
/// same unread set never stacks duplicate alerts, and an empty set leaves
/// nothing on screen.
pub async fn publish(unread: Vec<TabState>, store: &dyn Store, notifier: &Notifier) {
    if unread.is_empty() {
        notifier.clear_unread_tabs();
        store.put_unread_tabs(&[], None).await;
        return;
    }

    let descriptors = unread
        .iter()
        .map(|tab| tab.entity.descriptor.as_str())
        .collect::<Vec<_>>()
        .join(" • ");
    info!(count = unread.len(), tabs = %descriptors, "Unread conversations");

    store.put_unread_tabs(&unread, Some(UNREAD_TABS_ALERT)).await;
    notifier.unread_tabs(unread.len(), &descriptors);
}
