// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Connection registry commands
//!
//! Commands: list, check

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use multidb_core::application::connection_registry::ConnectionRegistry;
use multidb_core::domain::config::DatabaseConfigManifest;
use multidb_core::infrastructure::db::SqlxAdapterFactory;
use multidb_core::infrastructure::default_adapter::GlobalDefaultAdapter;

#[derive(Subcommand)]
pub enum ConnectionsCommand {
    /// Build every connection and list them
    List,

    /// Build every connection and run a health check against each
    Check,
}

pub async fn handle_command(
    command: ConnectionsCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    let registry = build_registry(config_override).await?;

    match command {
        ConnectionsCommand::List => list(&registry),
        ConnectionsCommand::Check => check(&registry).await,
    }
}

async fn build_registry(config_override: Option<PathBuf>) -> Result<ConnectionRegistry> {
    let config = DatabaseConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    ConnectionRegistry::from_config(&config, &SqlxAdapterFactory::new(), &GlobalDefaultAdapter)
        .await
        .context("Failed to initialize connections")
}

fn list(registry: &ConnectionRegistry) -> Result<()> {
    for line in list_lines(registry)? {
        println!("{}", line);
    }
    Ok(())
}

/// One line per connection, the default marked
fn list_lines(registry: &ConnectionRegistry) -> Result<Vec<String>> {
    if registry.is_empty() {
        return Ok(vec!["No connections configured".yellow().to_string()]);
    }

    let mut lines = vec!["Connections:".bold().to_string()];
    for (id, adapter) in registry.iter() {
        let marker = if registry.is_default(id)? {
            " (default)".green().to_string()
        } else {
            String::new()
        };
        lines.push(format!(
            "  {} [{}]{}",
            id.as_str().bold(),
            adapter.driver_kind(),
            marker
        ));
    }

    if registry.default_id().is_none() {
        if let Some(first) = registry.ids().next() {
            lines.push(String::new());
            lines.push(
                format!("No explicit default; '{}' is used when no name is given", first)
                    .dimmed()
                    .to_string(),
            );
        }
    }

    Ok(lines)
}

async fn check(registry: &ConnectionRegistry) -> Result<()> {
    let results = registry.health_check_all().await;
    let mut failed = 0;

    for (id, result) in &results {
        match result {
            Ok(()) => println!("  {} {}", "✓".green(), id),
            Err(e) => {
                failed += 1;
                println!("  {} {}: {}", "✗".red(), id, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} connections failed the health check", failed, results.len());
    }

    println!("{}", "✓ All connections healthy".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use multidb_core::infrastructure::default_adapter::NoopRegistrar;

    async fn registry(connections: &str) -> ConnectionRegistry {
        let yaml = format!(
            "apiVersion: multidb/v1\nkind: DatabaseConfig\nmetadata:\n  name: cli\nspec:\n  connections:\n{}",
            connections
        );
        let config = DatabaseConfigManifest::from_yaml_str(&yaml).unwrap();
        ConnectionRegistry::from_config(&config, &SqlxAdapterFactory::new(), &NoopRegistrar)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_marks_default() {
        let registry = registry(
            r#"
    cache:
      adapter: sqlite
      dbname: ":memory:"
    main:
      adapter: pdo_sqlite
      dbname: ":memory:"
      default: true
"#,
        )
        .await;

        let lines = list_lines(&registry).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("cache") && !lines[1].contains("(default)"));
        assert!(lines[2].contains("main") && lines[2].contains("(default)"));
    }

    #[tokio::test]
    async fn test_list_notes_first_configured_fallback() {
        let registry = registry(
            r#"
    primary:
      adapter: sqlite
      dbname: ":memory:"
"#,
        )
        .await;

        let lines = list_lines(&registry).unwrap();
        assert!(!lines.iter().any(|line| line.contains("(default)")));
        assert!(lines.last().unwrap().contains("'primary' is used"));
    }

    #[tokio::test]
    async fn test_check_passes_when_all_healthy() {
        let registry = registry(
            r#"
    cache:
      adapter: sqlite
      dbname: ":memory:"
"#,
        )
        .await;

        assert!(check(&registry).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_fails_on_unreachable_connection() {
        let registry = registry(
            r#"
    cache:
      adapter: sqlite
      dbname: ":memory:"
    analytics:
      adapter: pdo_pgsql
      host: analytics.invalid
      dbname: analytics
      lazy: true
      acquire_timeout_secs: 2
"#,
        )
        .await;

        let err = check(&registry).await.err().unwrap();
        assert!(err.to_string().contains("1 of 2"));
    }
}
