use std::sync::Arc;
use std::time::Duration;

use detailbook_core::catalog::{CatalogError, ServiceCatalog};
use detailbook_core::config::AppConfig;
use detailbook_core::flows::DialogEngine;
use detailbook_core::service::DialogService;
use detailbook_core::stores::StoreSet;
use detailbook_line::reply::TransportError;
use detailbook_line::{
    default_dispatcher, HttpReplyTransport, ReplyTransport, SignatureVerifier, WebhookIngestor,
};
use thiserror::Error;
use tracing::info;

use crate::audit::TracingAuditSink;

pub struct Application {
    pub config: AppConfig,
    pub stores: StoreSet,
    pub ingestor: Arc<WebhookIngestor>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("reply transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let transport = HttpReplyTransport::new(
        &config.line.api_base_url,
        config.line.channel_access_token.clone(),
        Duration::from_secs(config.line.reply_timeout_secs),
    )?;
    bootstrap_with_transport(config, Arc::new(transport))
}

pub fn bootstrap_with_transport(
    config: AppConfig,
    transport: Arc<dyn ReplyTransport>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = match &config.catalog.path {
        Some(path) => ServiceCatalog::load(path)?,
        None => ServiceCatalog::standard(),
    };
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        source = %config
            .catalog
            .path
            .as_ref()
            .map_or_else(|| "built-in".to_owned(), |path| path.display().to_string()),
        categories = catalog.categories().len(),
        "service catalog loaded"
    );

    let stores = StoreSet::in_memory();
    let service = DialogService::new(
        DialogEngine::new(Arc::new(catalog)),
        stores.clone(),
        Arc::new(TracingAuditSink),
    );
    let ingestor = WebhookIngestor::new(
        SignatureVerifier::new(config.line.channel_secret.clone()),
        default_dispatcher(Arc::new(service)),
        transport,
    );

    Ok(Application { config, stores, ingestor: Arc::new(ingestor) })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use detailbook_core::config::AppConfig;
    use detailbook_line::NoopReplyTransport;
    use tempfile::TempDir;

    use crate::bootstrap::{bootstrap_with_transport, BootstrapError};

    #[test]
    fn bootstrap_rejects_invalid_catalog_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, "category = []\n").expect("catalog written");

        let mut config = AppConfig::default();
        config.catalog.path = Some(path);
        let result = bootstrap_with_transport(config, Arc::new(NoopReplyTransport));
        assert!(matches!(result, Err(BootstrapError::Catalog(_))));
    }

    #[test]
    fn bootstrap_starts_with_built_in_catalog_and_empty_stores() {
        let app = bootstrap_with_transport(AppConfig::default(), Arc::new(NoopReplyTransport))
            .expect("bootstrap should succeed");
        assert_eq!(app.stores.sessions.active_count(), 0);
        assert_eq!(app.stores.bookings.count(), 0);
    }
}
