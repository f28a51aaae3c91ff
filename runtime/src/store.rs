use std::sync::Arc;

use tokio::sync::watch;
use workbench_types::{Runtime, WorkspaceNamespace};

/// What the store last heard, and for which workspace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeSnapshot {
    pub workspace_namespace: Option<WorkspaceNamespace>,
    pub runtime: Option<Runtime>,
}

/// Shared, subscribable view of the runtime for the workspace the user is in.
///
/// Pollers write through [`RuntimeStore::record`], which refuses to overwrite a
/// snapshot that belongs to a different workspace.
#[derive(Debug, Clone)]
pub struct RuntimeStore {
    tx: Arc<watch::Sender<RuntimeSnapshot>>,
}

impl Default for RuntimeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RuntimeSnapshot::default());
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn get(&self) -> RuntimeSnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RuntimeSnapshot> {
        self.tx.subscribe()
    }

    /// Point the store at a workspace, dropping whatever runtime it held.
    pub fn switch_workspace(&self, namespace: Option<WorkspaceNamespace>) {
        self.tx.send_replace(RuntimeSnapshot {
            workspace_namespace: namespace,
            runtime: None,
        });
    }

    /// Write a poll result. Applied only when the store is unclaimed or already
    /// tracks `namespace`; returns whether it was applied.
    pub fn record(&self, namespace: &WorkspaceNamespace, runtime: Option<Runtime>) -> bool {
        self.tx.send_if_modified(|snapshot| match &snapshot.workspace_namespace {
            Some(current) if current != namespace => false,
            _ => {
                snapshot.workspace_namespace = Some(namespace.clone());
                snapshot.runtime = runtime;
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workbench_types::RuntimeStatus;

    fn ns(value: &str) -> WorkspaceNamespace {
        WorkspaceNamespace::new(value).unwrap()
    }

    fn running() -> Runtime {
        Runtime {
            status: Some(RuntimeStatus::Running),
            ..Runtime::default()
        }
    }

    #[test]
    fn unclaimed_store_accepts_first_writer() {
        let store = RuntimeStore::new();
        assert!(store.record(&ns("a"), Some(running())));

        let snapshot = store.get();
        assert_eq!(snapshot.workspace_namespace, Some(ns("a")));
        assert_eq!(snapshot.runtime, Some(running()));
    }

    #[test]
    fn other_workspace_cannot_overwrite() {
        let store = RuntimeStore::new();
        store.switch_workspace(Some(ns("a")));
        let mut rx = store.subscribe();

        assert!(!store.record(&ns("b"), Some(running())));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(store.get().runtime, None);

        assert!(store.record(&ns("a"), None));
        assert!(rx.has_changed().unwrap());
    }
}
