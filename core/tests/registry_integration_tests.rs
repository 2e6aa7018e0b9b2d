// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use multidb_core::application::connection_registry::{ConnectionRegistry, RegistryError};
use multidb_core::domain::adapter::{same_adapter, AdapterError, DatabaseAdapter};
use multidb_core::domain::config::DatabaseConfigManifest;
use multidb_core::infrastructure::db::{DatabasePool, SqlxAdapter, SqlxAdapterFactory};
use multidb_core::infrastructure::default_adapter::{GlobalDefaultAdapter, NoopRegistrar};

fn manifest(connections: &str) -> DatabaseConfigManifest {
    let yaml = format!(
        "apiVersion: multidb/v1\nkind: DatabaseConfig\nmetadata:\n  name: integration\nspec:\n  connections:\n{}",
        connections
    );
    DatabaseConfigManifest::from_yaml_str(&yaml).expect("manifest should parse")
}

#[tokio::test]
async fn test_sqlite_registry_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let file_db = dir.path().join("reports.db");

    let config = manifest(&format!(
        r#"
    cache:
      adapter: pdo_sqlite
      dbname: ":memory:"
    reports:
      adapter: sqlite
      dbname: "{}"
      max_connections: 2
      default: true
    analytics:
      adapter: pdo_pgsql
      host: analytics.invalid
      dbname: analytics
      lazy: true
"#,
        file_db.display()
    ));
    config.validate().unwrap();

    let registry = ConnectionRegistry::from_config(&config, &SqlxAdapterFactory::new(), &GlobalDefaultAdapter)
        .await
        .unwrap();

    assert_eq!(registry.len(), 3);
    let ids: Vec<&str> = registry.ids().map(|id| id.as_str()).collect();
    assert_eq!(ids, vec!["cache", "reports", "analytics"]);

    let reports = registry.get_connection(Some("reports")).unwrap();
    assert!(same_adapter(&registry.get_connection(None).unwrap(), &reports));
    assert!(registry.is_default("reports").unwrap());
    assert!(!registry.is_default("analytics").unwrap());
    assert!(same_adapter(&GlobalDefaultAdapter::get().unwrap(), &reports));

    // Creating the pool eagerly created the file
    assert!(file_db.exists());

    reports.health_check().await.unwrap();
    registry
        .get_connection(Some("cache"))
        .unwrap()
        .health_check()
        .await
        .unwrap();

    assert!(matches!(
        registry.get_connection(Some("missing")),
        Err(RegistryError::NotConfigured(_))
    ));
}

#[tokio::test]
async fn test_sqlx_adapter_exposes_its_pool() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    let adapter = SqlxAdapter::new("sqlite", DatabasePool::Sqlite(pool));

    assert_eq!(adapter.driver_kind(), "sqlite");
    adapter.health_check().await.unwrap();

    match adapter.pool() {
        DatabasePool::Sqlite(sqlite) => {
            let row: (i64,) = sqlx::query_as("SELECT 40 + 2").fetch_one(sqlite).await.unwrap();
            assert_eq!(row.0, 42);
        }
        _ => panic!("expected a sqlite pool"),
    }

    adapter.close().await;
    assert!(adapter.health_check().await.is_err());
}

#[tokio::test]
async fn test_bad_entry_aborts_initialization() {
    let config = manifest(
        r#"
    good:
      adapter: sqlite
      dbname: ":memory:"
    bad:
      adapter: oracle
      host: localhost
"#,
    );

    let err = ConnectionRegistry::from_config(&config, &SqlxAdapterFactory::new(), &NoopRegistrar)
        .await
        .err()
        .expect("initialization should fail");

    assert!(err.is_configuration_error());
    match err {
        RegistryError::Adapter { id, source } => {
            assert_eq!(id.as_str(), "bad");
            assert!(matches!(source, AdapterError::UnsupportedDriver(kind) if kind == "oracle"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_env_override_changes_default() {
    let mut config = manifest(
        r#"
    first:
      adapter: sqlite
      dbname: ":memory:"
      default: true
    second:
      adapter: sqlite
      dbname: ":memory:"
"#,
    );
    assert!(config.override_default("second"));

    let registry = ConnectionRegistry::from_config(&config, &SqlxAdapterFactory::new(), &NoopRegistrar)
        .await
        .unwrap();

    assert_eq!(registry.default_id().map(|id| id.as_str()), Some("second"));
    assert!(!registry.is_default("first").unwrap());

    let results = registry.health_check_all().await;
    assert!(results.values().all(|result| result.is_ok()));
}

#[tokio::test]
async fn test_failed_initialization_publishes_no_default() {
    let config = manifest(
        r#"
    staging:
      adapter: SQLite
      dbname: ":memory:"
      default: true
    legacy:
      adapter: oracle
      host: localhost
"#,
    );

    let result =
        ConnectionRegistry::from_config(&config, &SqlxAdapterFactory::new(), &GlobalDefaultAdapter)
            .await;
    assert!(result.is_err());

    // Other tests in this binary may publish their own default, never this one
    let published = GlobalDefaultAdapter::get();
    assert!(published.is_none_or(|adapter| adapter.driver_kind() != "SQLite"));
}
