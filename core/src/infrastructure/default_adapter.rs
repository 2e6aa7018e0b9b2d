// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Process-wide default adapter
//!
//! Collaborators that cannot be handed a registry (table gateways, legacy
//! helpers) read the ambient default from here. The registry writes it through
//! [`GlobalDefaultAdapter`] every time it promotes a connection.

use parking_lot::{const_rwlock, RwLock};
use tracing::debug;

use crate::domain::adapter::{AdapterHandle, DefaultAdapterRegistrar};

static DEFAULT_ADAPTER: RwLock<Option<AdapterHandle>> = const_rwlock(None);

/// Registrar backed by the process-wide default slot
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalDefaultAdapter;

impl GlobalDefaultAdapter {
    pub fn set(adapter: AdapterHandle) {
        debug!("Setting process-wide default adapter ({})", adapter.driver_kind());
        *DEFAULT_ADAPTER.write() = Some(adapter);
    }

    pub fn get() -> Option<AdapterHandle> {
        DEFAULT_ADAPTER.read().clone()
    }

    pub fn clear() {
        DEFAULT_ADAPTER.write().take();
    }
}

impl DefaultAdapterRegistrar for GlobalDefaultAdapter {
    fn set_default(&self, adapter: AdapterHandle) {
        Self::set(adapter);
    }
}

/// Registrar that ignores promotions
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegistrar;

impl DefaultAdapterRegistrar for NoopRegistrar {
    fn set_default(&self, _adapter: AdapterHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adapter::{same_adapter, AdapterError, DatabaseAdapter};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StubAdapter;

    #[async_trait]
    impl DatabaseAdapter for StubAdapter {
        fn driver_kind(&self) -> &str {
            "stub"
        }

        async fn health_check(&self) -> Result<(), AdapterError> {
            Ok(())
        }
    }

    #[test]
    fn test_global_slot_tracks_latest_default() {
        let first: AdapterHandle = Arc::new(StubAdapter);
        let second: AdapterHandle = Arc::new(StubAdapter);

        GlobalDefaultAdapter.set_default(first.clone());
        assert!(same_adapter(&GlobalDefaultAdapter::get().unwrap(), &first));

        GlobalDefaultAdapter.set_default(second.clone());
        assert!(same_adapter(&GlobalDefaultAdapter::get().unwrap(), &second));

        NoopRegistrar.set_default(first);
        assert!(same_adapter(&GlobalDefaultAdapter::get().unwrap(), &second));

        GlobalDefaultAdapter::clear();
        assert!(GlobalDefaultAdapter::get().is_none());
    }
}
