// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Connection Registry - Application Layer
//!
//! Builds one adapter per configured connection and tracks which one is the
//! default. The registry is populated once by [`ConnectionRegistry::initialize`]
//! and is read-only afterwards, so it can be shared behind an `Arc` by any
//! number of readers.
//!
//! Default selection:
//! - an entry is promoted when `default` or `isDefaultTableAdapter` is truthy
//! - several promoted entries: the last one in configuration order wins
//! - no promoted entry: lookups without an id fall back to the first
//!   configured connection
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Named connection lookup and default-connection policy

use futures::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::domain::adapter::{
    same_adapter, AdapterError, AdapterFactory, AdapterHandle, DefaultAdapterRegistrar,
};
use crate::domain::config::DatabaseConfigManifest;
use crate::domain::connection::{ConnectionId, ConnectionTree};

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Connection '{0}' is missing the 'adapter' key")]
    MissingAdapter(ConnectionId),

    /// The factory's own error, unchanged
    #[error("{source}")]
    Adapter {
        id: ConnectionId,
        #[source]
        source: AdapterError,
    },

    #[error("A database connection was requested, but '{0}' is not configured")]
    NotConfigured(String),

    #[error("No database connections are configured")]
    Empty,
}

impl RegistryError {
    /// Raised while building the registry
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::MissingAdapter(_) | Self::Adapter { .. })
    }

    /// Raised by a lookup on a built registry
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, Self::NotConfigured(_) | Self::Empty)
    }
}

/// Either a handle or the id it was configured under
#[derive(Clone, Copy)]
pub enum AdapterRef<'a> {
    Handle(&'a AdapterHandle),
    Id(&'a str),
}

impl<'a> From<&'a AdapterHandle> for AdapterRef<'a> {
    fn from(handle: &'a AdapterHandle) -> Self {
        AdapterRef::Handle(handle)
    }
}

impl<'a> From<&'a str> for AdapterRef<'a> {
    fn from(id: &'a str) -> Self {
        AdapterRef::Id(id)
    }
}

impl<'a> From<&'a ConnectionId> for AdapterRef<'a> {
    fn from(id: &'a ConnectionId) -> Self {
        AdapterRef::Id(id.as_str())
    }
}

/// Named database connections plus the default one
pub struct ConnectionRegistry {
    connections: IndexMap<ConnectionId, AdapterHandle>,
    default_id: Option<ConnectionId>,
}

impl ConnectionRegistry {
    /// Build every configured connection, in configuration order.
    ///
    /// The first failing entry aborts the whole initialization. Adapters that
    /// were already built are dropped with the partial map, and the registrar
    /// only hears about promotions once every entry has been built.
    pub async fn initialize(
        tree: &ConnectionTree,
        factory: &dyn AdapterFactory,
        registrar: &dyn DefaultAdapterRegistrar,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self {
            connections: IndexMap::with_capacity(tree.len()),
            default_id: None,
        };

        let mut promotions: Vec<AdapterHandle> = Vec::new();

        info!("Initializing connection registry ({} connections)", tree.len());

        for (id, spec) in tree {
            let driver_kind = spec
                .adapter()
                .ok_or_else(|| RegistryError::MissingAdapter(id.clone()))?;

            debug!("Creating connection '{}' with driver '{}'", id, driver_kind);

            let adapter = factory
                .create(driver_kind, spec.params())
                .await
                .map_err(|source| RegistryError::Adapter {
                    id: id.clone(),
                    source,
                })?;

            registry.connections.insert(id.clone(), adapter.clone());

            if spec.is_default() {
                registry.set_default(id);
                promotions.push(adapter);
            }
        }

        // Replayed in configuration order, so the registrar ends on the winner
        for adapter in promotions {
            registrar.set_default(adapter);
        }

        match &registry.default_id {
            Some(id) => info!("Connection registry ready, default connection: {}", id),
            None => info!("Connection registry ready, no explicit default connection"),
        }

        Ok(registry)
    }

    /// Build the registry from a loaded manifest
    pub async fn from_config(
        config: &DatabaseConfigManifest,
        factory: &dyn AdapterFactory,
        registrar: &dyn DefaultAdapterRegistrar,
    ) -> Result<Self, RegistryError> {
        Self::initialize(config.connections(), factory, registrar).await
    }

    fn set_default(&mut self, id: &ConnectionId) {
        if let Some(previous) = &self.default_id {
            debug!("Default connection '{}' replaced by '{}'", previous, id);
        }
        self.default_id = Some(id.clone());
    }

    /// Look up a connection by id, or the default connection when `id` is
    /// `None`. Unknown ids never fall back to the default.
    pub fn get_connection(&self, id: Option<&str>) -> Result<AdapterHandle, RegistryError> {
        match id {
            None => self.default_connection(true).ok_or(RegistryError::Empty),
            Some(id) => self
                .connections
                .get(id)
                .cloned()
                .ok_or_else(|| RegistryError::NotConfigured(id.to_string())),
        }
    }

    /// The default connection.
    ///
    /// Without an explicit default, `pick_any` returns the first configured
    /// connection instead of `None`. Returns `None` on an empty registry.
    pub fn default_connection(&self, pick_any: bool) -> Option<AdapterHandle> {
        if let Some(id) = &self.default_id {
            return self.connections.get(id).cloned();
        }

        if pick_any {
            return self.connections.first().map(|(_, adapter)| adapter.clone());
        }

        None
    }

    /// Whether the given handle, or the connection configured under the given
    /// id, is the explicit default
    pub fn is_default<'a>(&self, target: impl Into<AdapterRef<'a>>) -> Result<bool, RegistryError> {
        let handle = match target.into() {
            AdapterRef::Handle(handle) => handle.clone(),
            AdapterRef::Id(id) => self.get_connection(Some(id))?,
        };

        Ok(self
            .default_connection(false)
            .is_some_and(|default| same_adapter(&handle, &default)))
    }

    /// Id of the explicit default connection, if one was configured
    pub fn default_id(&self) -> Option<&ConnectionId> {
        self.default_id.as_ref()
    }

    /// Configured ids in configuration order
    pub fn ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.connections.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ConnectionId, &AdapterHandle)> {
        self.connections.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Check health of all connections, in configuration order
    pub async fn health_check_all(&self) -> IndexMap<ConnectionId, Result<(), AdapterError>> {
        let checks = self.connections.iter().map(|(id, adapter)| async move {
            debug!("Health checking connection: {}", id);
            (id.clone(), adapter.health_check().await)
        });

        join_all(checks).await.into_iter().collect()
    }
}
