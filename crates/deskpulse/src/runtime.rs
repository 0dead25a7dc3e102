//! Shared wiring for commands: config, stores, helpdesk connectors

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use deskpulse_config::{Config, NotifyConfig, RawConnectorConfig, StoreConfig};
use deskpulse_connectors::{
    BulkReload, FreshdeskConnectorConfig, IncrementalSync, LabelDirectory, LogChannel,
    NotificationChannel, SyncRunner, TicketingClient, WebhookChannel,
};
use deskpulse_control::{ControlPlane, MemoryStore, SnapshotStore, TicketStore, WatermarkStore};
use tracing::{info, warn};

/// Config file locations tried when none is given
const DEFAULT_CONFIG_PATHS: &[&str] = &["deskpulse.toml", "configs/deskpulse.toml"];

/// Load configuration
///
/// An explicit path must exist. Without one, the default locations are
/// tried and built-in defaults used when none exists.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
        return Config::from_file(path).context("failed to load configuration");
    }

    for candidate in DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from) {
        if candidate.exists() {
            info!(config = %candidate.display(), "using config file");
            return Config::from_file(&candidate).context("failed to load configuration");
        }
    }

    info!("no config file found, using defaults");
    Ok(Config::default())
}

/// The three store seams, backed by one store
#[derive(Clone)]
pub struct Stores {
    pub snapshots: Arc<dyn SnapshotStore>,
    pub tickets: Arc<dyn TicketStore>,
    pub watermarks: Arc<dyn WatermarkStore>,
}

impl Stores {
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        if config.memory {
            warn!("using in-memory store, nothing survives a restart");
            return Ok(Self::shared(Arc::new(MemoryStore::new())));
        }

        let plane = ControlPlane::new(&config.path)
            .await
            .with_context(|| format!("failed to open store at {}", config.path.display()))?;
        info!(path = %config.path.display(), "store opened");
        Ok(Self::shared(Arc::new(plane)))
    }

    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: SnapshotStore + TicketStore + WatermarkStore + 'static,
    {
        Self {
            snapshots: store.clone(),
            tickets: store.clone(),
            watermarks: store,
        }
    }
}

/// One configured helpdesk and everything built on its client
pub struct Helpdesk {
    pub name: String,
    pub schedule: String,
    pub config: FreshdeskConnectorConfig,
    pub client: Arc<TicketingClient>,
    pub labels: Arc<LabelDirectory>,
    pub runner: Arc<SyncRunner>,
}

impl Helpdesk {
    pub fn from_raw(name: &str, raw: &RawConnectorConfig, stores: &Stores) -> Result<Self> {
        let config = FreshdeskConnectorConfig::from_toml(&raw.config)
            .with_context(|| format!("invalid connector '{}'", name))?;
        let client = Arc::new(
            TicketingClient::with_reqwest(config.credentials_provider(), config.resilience_config())
                .with_context(|| format!("failed to create client for '{}'", name))?,
        );
        let labels = Arc::new(LabelDirectory::new(client.clone(), config.label_ttl()));
        let runner = Arc::new(SyncRunner::new(
            name,
            BulkReload::new(client.clone(), config.bulk_page_delay()),
            IncrementalSync::new(client.clone(), config.incremental_page_delay()),
            stores.tickets.clone(),
            stores.watermarks.clone(),
        ));

        Ok(Self {
            name: name.to_string(),
            schedule: raw.schedule.clone(),
            config,
            client,
            labels,
            runner,
        })
    }
}

/// Every enabled Freshdesk connector
pub fn helpdesks(config: &Config, stores: &Stores) -> Result<Vec<Helpdesk>> {
    config
        .connectors
        .enabled_by_type("freshdesk")
        .map(|(name, raw)| Helpdesk::from_raw(name, raw, stores))
        .collect()
}

/// The connector named `name`, or the only one configured
pub fn select_helpdesk(config: &Config, stores: &Stores, name: Option<&str>) -> Result<Helpdesk> {
    let mut all = helpdesks(config, stores)?;
    match name {
        Some(name) => {
            let index = all
                .iter()
                .position(|h| h.name == name)
                .with_context(|| format!("no enabled connector named '{}'", name))?;
            Ok(all.swap_remove(index))
        }
        None => match all.len() {
            0 => bail!("no enabled freshdesk connector configured"),
            1 => Ok(all.remove(0)),
            _ => bail!("several connectors configured, pick one with --connector"),
        },
    }
}

/// Webhook channel when configured, the log otherwise
pub fn notification_channel(config: &NotifyConfig) -> Result<Arc<dyn NotificationChannel>> {
    match &config.webhook_url {
        Some(url) => Ok(Arc::new(
            WebhookChannel::new(url.clone(), config.timeout())
                .context("failed to create webhook channel")?,
        )),
        None => {
            warn!("no webhook configured, urgent notifications go to the log");
            Ok(Arc::new(LogChannel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn config(s: &str) -> Config {
        Config::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store() {
        let stores = Stores::open(&config("[store]\nmemory = true").store)
            .await
            .unwrap();
        assert!(stores.tickets.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = StoreConfig {
            path: dir.path().join("nested/deskpulse.db"),
            memory: false,
        };
        let stores = Stores::open(&store).await.unwrap();
        assert!(stores.snapshots.get("weekly_20240101").await.unwrap().is_none());
    }

    #[test]
    fn test_missing_explicit_config() {
        assert!(load_config(Some(Path::new("/nonexistent/deskpulse.toml"))).is_err());
    }

    #[tokio::test]
    async fn test_select_helpdesk() {
        let config = config(
            r#"
[store]
memory = true

[connectors.eu]
type = "freshdesk"
domain = "eu.freshdesk.com"
api_key = "k"

[connectors.us]
type = "freshdesk"
domain = "us.freshdesk.com"
api_key = "k"
"#,
        );
        let stores = Stores::open(&config.store).await.unwrap();

        assert!(select_helpdesk(&config, &stores, None).is_err());
        let us = select_helpdesk(&config, &stores, Some("us")).unwrap();
        assert_eq!(us.name, "us");
        assert_eq!(us.schedule, deskpulse_config::DEFAULT_SYNC_SCHEDULE);
        assert!(select_helpdesk(&config, &stores, Some("apac")).is_err());
    }

    #[test]
    fn test_log_channel_without_webhook() {
        assert!(notification_channel(&NotifyConfig::default()).is_ok());
    }
}
