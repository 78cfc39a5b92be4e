pub mod catalog;
pub mod chat;
pub mod config;
pub mod doctor;

use std::path::PathBuf;

use detailbook_core::catalog::{CatalogError, ServiceCatalog};
use detailbook_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[derive(Debug)]
pub(crate) enum LoadFailure {
    Config(ConfigError),
    Catalog(CatalogError),
}

impl LoadFailure {
    pub(crate) fn into_result(self, command: &str) -> CommandResult {
        match self {
            Self::Config(error) => {
                CommandResult::failure(command, "config_validation", error.to_string(), 2)
            }
            Self::Catalog(error) => {
                CommandResult::failure(command, "catalog_invalid", error.to_string(), 3)
            }
        }
    }
}

/// Loads offline config, letting an explicit catalog path win over the configured one.
pub(crate) fn load_catalog(
    catalog_path: Option<PathBuf>,
) -> Result<(AppConfig, ServiceCatalog), LoadFailure> {
    let config = AppConfig::load(LoadOptions {
        overrides: ConfigOverrides { catalog_path, ..ConfigOverrides::default() },
        ..LoadOptions::default()
    })
    .map_err(LoadFailure::Config)?;

    let catalog = match &config.catalog.path {
        Some(path) => ServiceCatalog::load(path).map_err(LoadFailure::Catalog)?,
        None => ServiceCatalog::standard(),
    };
    Ok((config, catalog))
}
