//! Configuration validation
//!
//! Validates config consistency:
//! - Connector types are known and schedules parse
//! - The store has a path unless it is in-memory
//! - The webhook URL is an http(s) URL
//! - The weekly snapshot schedule parses

use std::str::FromStr;

use cron::Schedule;

use crate::Config;
use crate::connectors::is_known_connector_type;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_connectors(config)?;
    validate_store(config)?;
    validate_notify(config)?;
    validate_snapshots(config)?;
    Ok(())
}

fn validate_connectors(config: &Config) -> Result<()> {
    for (name, connector) in config.connectors.iter() {
        if !is_known_connector_type(&connector.connector_type) {
            return Err(ConfigError::invalid_value(
                "connector",
                name,
                "type",
                format!("unknown connector type '{}'", connector.connector_type),
            ));
        }
        if !connector.enabled {
            continue;
        }
        validate_schedule("connector", name, "schedule", &connector.schedule)?;
    }
    Ok(())
}

fn validate_store(config: &Config) -> Result<()> {
    if !config.store.memory && config.store.path.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("store", "store", "path"));
    }
    Ok(())
}

fn validate_notify(config: &Config) -> Result<()> {
    if let Some(url) = &config.notify.webhook_url
        && !(url.starts_with("https://") || url.starts_with("http://"))
    {
        return Err(ConfigError::invalid_value(
            "notify",
            "notify",
            "webhook_url",
            "must start with http:// or https://",
        ));
    }
    if config.notify.timeout_secs == 0 {
        return Err(ConfigError::invalid_value(
            "notify",
            "notify",
            "timeout_secs",
            "must be positive",
        ));
    }
    Ok(())
}

fn validate_snapshots(config: &Config) -> Result<()> {
    if config.snapshots.enabled {
        validate_schedule(
            "snapshots",
            "snapshots",
            "weekly_schedule",
            &config.snapshots.weekly_schedule,
        )?;
    }
    Ok(())
}

fn validate_schedule(
    component: &'static str,
    name: &str,
    field: &'static str,
    expr: &str,
) -> Result<()> {
    Schedule::from_str(expr)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid_value(component, name, field, format!("{}: {}", expr, e)))
}
