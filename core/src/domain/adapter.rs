// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Adapter
//!
//! Ports the connection registry depends on.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Database adapter, factory and default-registrar interfaces

// Database Adapter Domain Interface (Anti-Corruption Layer)
//
// The registry never talks to a driver directly. It asks an AdapterFactory for
// an opaque handle and compares handles by identity only.
//
// Implementations in infrastructure/db.rs and infrastructure/default_adapter.rs.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::connection::ConnectionParams;

/// A live, already-constructed database connection
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Driver kind this adapter was created for (e.g. "postgres")
    fn driver_kind(&self) -> &str;

    /// Check that the database is reachable
    async fn health_check(&self) -> Result<(), AdapterError>;
}

/// Shared reference to an adapter; identity is `Arc` pointer identity
pub type AdapterHandle = Arc<dyn DatabaseAdapter>;

/// Same adapter instance, not merely an equal one
pub fn same_adapter(a: &AdapterHandle, b: &AdapterHandle) -> bool {
    Arc::ptr_eq(a, b)
}

/// Builds adapters from a driver kind and the remaining connection parameters
#[async_trait]
pub trait AdapterFactory: Send + Sync {
    async fn create(
        &self,
        driver_kind: &str,
        params: &ConnectionParams,
    ) -> Result<AdapterHandle, AdapterError>;
}

/// Receives every adapter promoted to default, so collaborators relying on an
/// ambient default observe the same choice as the registry
pub trait DefaultAdapterRegistrar: Send + Sync {
    fn set_default(&self, adapter: AdapterHandle);
}

/// Errors raised while building or probing an adapter
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    #[error("Missing connection parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid connection parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Connection error: {0}")]
    Connection(String),
}

impl From<sqlx::Error> for AdapterError {
    fn from(err: sqlx::Error) -> Self {
        AdapterError::Connection(err.to_string())
    }
}
