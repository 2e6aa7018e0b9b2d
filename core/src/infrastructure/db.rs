// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # sqlx Adapter Factory
//!
//! Turns a driver kind plus connection parameters into a pooled sqlx
//! connection wrapped as a [`DatabaseAdapter`].
//!
//! | Driver kinds | Backend |
//! |--------------|---------|
//! | `postgres`, `postgresql`, `pgsql`, `pdo_pgsql` | PostgreSQL |
//! | `mysql`, `mariadb`, `mysqli`, `pdo_mysql` | MySQL / MariaDB |
//! | `sqlite`, `pdo_sqlite` | SQLite |
//!
//! Recognized parameters: `url`, `host`, `port`, `username` (`user`),
//! `password` (supports `env:VAR_NAME`), `dbname` (`database`), `charset`
//! (MySQL), `create_if_missing` (SQLite), and the pool settings
//! `max_connections`, `min_connections`, `acquire_timeout_secs` and `lazy`.
//! When `url` is present it wins over the individual fields.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool};
use sqlx::pool::PoolOptions;
use sqlx::postgres::{PgConnectOptions, PgPool};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::domain::adapter::{AdapterError, AdapterFactory, AdapterHandle, DatabaseAdapter};
use crate::domain::connection::{is_truthy, ConnectionParams};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const KNOWN_PARAMS: &[&str] = &[
    "url",
    "host",
    "port",
    "username",
    "user",
    "password",
    "dbname",
    "database",
    "charset",
    "create_if_missing",
    "max_connections",
    "min_connections",
    "acquire_timeout_secs",
    "lazy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
    MySql,
    Sqlite,
}

impl Driver {
    pub fn parse(kind: &str) -> Result<Self, AdapterError> {
        match kind.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" | "pdo_pgsql" => Ok(Driver::Postgres),
            "mysql" | "mariadb" | "mysqli" | "pdo_mysql" => Ok(Driver::MySql),
            "sqlite" | "pdo_sqlite" => Ok(Driver::Sqlite),
            _ => Err(AdapterError::UnsupportedDriver(kind.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::MySql => "mysql",
            Driver::Sqlite => "sqlite",
        }
    }
}

/// Pool backing an adapter
#[derive(Clone)]
pub enum DatabasePool {
    Postgres(PgPool),
    MySql(MySqlPool),
    Sqlite(SqlitePool),
}

/// A sqlx pool exposed as a [`DatabaseAdapter`]
pub struct SqlxAdapter {
    driver_kind: String,
    pool: DatabasePool,
}

impl SqlxAdapter {
    pub fn new(driver_kind: impl Into<String>, pool: DatabasePool) -> Self {
        Self {
            driver_kind: driver_kind.into(),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub fn driver(&self) -> Driver {
        match self.pool {
            DatabasePool::Postgres(_) => Driver::Postgres,
            DatabasePool::MySql(_) => Driver::MySql,
            DatabasePool::Sqlite(_) => Driver::Sqlite,
        }
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        match &self.pool {
            DatabasePool::Postgres(pool) => pool.close().await,
            DatabasePool::MySql(pool) => pool.close().await,
            DatabasePool::Sqlite(pool) => pool.close().await,
        }
    }
}

#[async_trait]
impl DatabaseAdapter for SqlxAdapter {
    fn driver_kind(&self) -> &str {
        &self.driver_kind
    }

    async fn health_check(&self) -> Result<(), AdapterError> {
        match &self.pool {
            DatabasePool::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ())?,
            DatabasePool::MySql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ())?,
            DatabasePool::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ())?,
        }
        Ok(())
    }
}

/// Pool sizing shared by every driver
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Option<Duration>,
    /// Build the pool without opening a connection
    pub lazy: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: 0,
            acquire_timeout: None,
            lazy: false,
        }
    }
}

impl PoolSettings {
    pub fn from_params(params: &ConnectionParams) -> Result<Self, AdapterError> {
        let mut settings = Self::default();
        if let Some(max) = parse_param::<u32>(params, "max_connections")? {
            settings.max_connections = max;
        }
        if let Some(min) = parse_param::<u32>(params, "min_connections")? {
            settings.min_connections = min;
        }
        settings.acquire_timeout =
            parse_param::<u64>(params, "acquire_timeout_secs")?.map(Duration::from_secs);
        settings.lazy = params.get("lazy").is_some_and(is_truthy);

        if settings.min_connections > settings.max_connections {
            return Err(AdapterError::InvalidParameter {
                name: "min_connections".to_string(),
                reason: format!(
                    "{} exceeds max_connections ({})",
                    settings.min_connections, settings.max_connections
                ),
            });
        }

        Ok(settings)
    }

    fn pool_options<DB: sqlx::Database>(&self) -> PoolOptions<DB> {
        let options = PoolOptions::<DB>::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections);
        match self.acquire_timeout {
            Some(timeout) => options.acquire_timeout(timeout),
            None => options,
        }
    }

    async fn open<DB: sqlx::Database>(
        &self,
        connect_options: <DB::Connection as sqlx::Connection>::Options,
    ) -> Result<sqlx::Pool<DB>, AdapterError> {
        let options = self.pool_options::<DB>();
        if self.lazy {
            Ok(options.connect_lazy_with(connect_options))
        } else {
            Ok(options.connect_with(connect_options).await?)
        }
    }
}

/// Creates [`SqlxAdapter`]s for PostgreSQL, MySQL and SQLite
#[derive(Debug, Clone, Default)]
pub struct SqlxAdapterFactory;

impl SqlxAdapterFactory {
    pub fn new() -> Self {
        Self
    }

    async fn connect(
        &self,
        driver: Driver,
        params: &ConnectionParams,
    ) -> Result<DatabasePool, AdapterError> {
        let settings = PoolSettings::from_params(params)?;

        let pool = match driver {
            Driver::Postgres => DatabasePool::Postgres(
                settings
                    .open::<sqlx::Postgres>(postgres_options(params)?)
                    .await?,
            ),
            Driver::MySql => {
                DatabasePool::MySql(settings.open::<sqlx::MySql>(mysql_options(params)?).await?)
            }
            Driver::Sqlite => {
                DatabasePool::Sqlite(settings.open::<sqlx::Sqlite>(sqlite_options(params)?).await?)
            }
        };

        Ok(pool)
    }
}

#[async_trait]
impl AdapterFactory for SqlxAdapterFactory {
    async fn create(
        &self,
        driver_kind: &str,
        params: &ConnectionParams,
    ) -> Result<AdapterHandle, AdapterError> {
        let driver = Driver::parse(driver_kind)?;

        for key in params.keys().filter(|key| !KNOWN_PARAMS.contains(key)) {
            debug!("Ignoring unknown {} connection parameter '{}'", driver.name(), key);
        }

        info!(
            "Opening {} connection pool{}",
            driver.name(),
            params
                .get_str("host")
                .map(|host| format!(" to {}", host))
                .unwrap_or_default()
        );

        let pool = self.connect(driver, params).await?;
        Ok(Arc::new(SqlxAdapter::new(driver_kind, pool)))
    }
}

fn postgres_options(params: &ConnectionParams) -> Result<PgConnectOptions, AdapterError> {
    if let Some(url) = params.get_str("url") {
        return PgConnectOptions::from_str(&url).map_err(|e| invalid("url", e));
    }

    let mut options = PgConnectOptions::new().host(&required(params, "host")?);
    if let Some(port) = parse_param::<u16>(params, "port")? {
        options = options.port(port);
    }
    if let Some(username) = username(params) {
        options = options.username(&username);
    }
    if let Some(password) = password(params)? {
        options = options.password(&password);
    }
    if let Some(dbname) = dbname(params) {
        options = options.database(&dbname);
    }
    Ok(options)
}

fn mysql_options(params: &ConnectionParams) -> Result<MySqlConnectOptions, AdapterError> {
    if let Some(url) = params.get_str("url") {
        return MySqlConnectOptions::from_str(&url).map_err(|e| invalid("url", e));
    }

    let mut options = MySqlConnectOptions::new().host(&required(params, "host")?);
    if let Some(port) = parse_param::<u16>(params, "port")? {
        options = options.port(port);
    }
    if let Some(username) = username(params) {
        options = options.username(&username);
    }
    if let Some(password) = password(params)? {
        options = options.password(&password);
    }
    if let Some(dbname) = dbname(params) {
        options = options.database(&dbname);
    }
    if let Some(charset) = params.get_str("charset") {
        options = options.charset(&charset);
    }
    Ok(options)
}

fn sqlite_options(params: &ConnectionParams) -> Result<SqliteConnectOptions, AdapterError> {
    if let Some(url) = params.get_str("url") {
        return SqliteConnectOptions::from_str(&url).map_err(|e| invalid("url", e));
    }

    let path = dbname(params).ok_or_else(|| AdapterError::MissingParameter("dbname".to_string()))?;
    if path == ":memory:" {
        return SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| invalid("dbname", e));
    }

    let create_if_missing = params.get("create_if_missing").map_or(true, is_truthy);
    Ok(SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create_if_missing))
}

fn required(params: &ConnectionParams, name: &str) -> Result<String, AdapterError> {
    params
        .get_str(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AdapterError::MissingParameter(name.to_string()))
}

fn username(params: &ConnectionParams) -> Option<String> {
    params.get_str("username").or_else(|| params.get_str("user"))
}

fn dbname(params: &ConnectionParams) -> Option<String> {
    params.get_str("dbname").or_else(|| params.get_str("database"))
}

/// Resolve the password (supports "env:VAR_NAME" syntax)
fn password(params: &ConnectionParams) -> Result<Option<String>, AdapterError> {
    match params.get_str("password") {
        Some(p) => match p.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name).map(Some).map_err(|_| {
                AdapterError::InvalidParameter {
                    name: "password".to_string(),
                    reason: format!("environment variable not set: {}", var_name),
                }
            }),
            None => Ok(Some(p)),
        },
        None => Ok(None),
    }
}

fn parse_param<T>(params: &ConnectionParams, name: &str) -> Result<Option<T>, AdapterError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    params
        .get_str(name)
        .map(|raw| raw.trim().parse::<T>().map_err(|e| invalid(name, e)))
        .transpose()
}

fn invalid(name: &str, reason: impl std::fmt::Display) -> AdapterError {
    AdapterError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
