// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use multidb_core::domain::config::DatabaseConfigManifest;
use multidb_core::domain::connection::ConnectionSpec;

const SECRET_PARAMS: &[&str] = &["password", "url"];

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./multidb.yaml)
        #[arg(short, long, default_value = "./multidb.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(&output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = DatabaseConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. MULTIDB_CONFIG_PATH: {}",
            std::env::var("MULTIDB_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./multidb.yaml");
        println!("  4. ~/.multidb/config.yaml");
        println!("  5. /etc/multidb/config.yaml");
        println!();
    }

    println!("{} {}", "Configuration:".bold(), config.metadata.name);
    println!();

    println!("{}", "Connections:".bold());
    if config.connections().is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (id, spec) in config.connections() {
        let marker = if spec.is_default() { " (default)".green().to_string() } else { String::new() };
        println!(
            "  {} [{}]{}",
            id.as_str().bold(),
            spec.adapter().unwrap_or("?"),
            marker
        );
        for line in describe_params(spec) {
            println!("    {}", line);
        }
    }
    println!();

    Ok(())
}

/// Parameter lines for display, with secrets masked
fn describe_params(spec: &ConnectionSpec) -> Vec<String> {
    spec.params()
        .iter()
        .map(|(key, value)| {
            let shown = if SECRET_PARAMS.contains(&key) {
                "****".to_string()
            } else {
                match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }
            };
            format!("{}: {}", key, shown)
        })
        .collect()
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = DatabaseConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path) -> Result<()> {
    let sample = include_str!("../../templates/config-minimal.yaml");

    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
