//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use crate::domain::error::ExplorerError;
use crate::domain::explorer_config::OutputFormat;
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 3] = ["json", "csv", "http"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), ExplorerError> {
    validate_source(config)?;
    validate_threshold(config)?;
    validate_output(config)?;
    Ok(())
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), ExplorerError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "json".to_string())
        .to_lowercase();

    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(ExplorerError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("source must be one of {}", DATA_SOURCES.join(", ")),
        });
    }

    if source != "http" && config.get_string("data", "path").is_none() {
        return Err(ExplorerError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        });
    }

    if source == "http" {
        if let Some(url) = config.get_string("data", "url") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ExplorerError::ConfigInvalid {
                    section: "data".to_string(),
                    key: "url".to_string(),
                    reason: "url must start with http:// or https://".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), ExplorerError> {
    let Some(raw) = config.get_string("explorer", "threshold") else {
        return Ok(());
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(()),
        _ => Err(ExplorerError::ConfigInvalid {
            section: "explorer".to_string(),
            key: "threshold".to_string(),
            reason: "threshold must be a positive integer".to_string(),
        }),
    }
}

fn validate_output(config: &dyn ConfigPort) -> Result<(), ExplorerError> {
    if let Some(format) = config.get_string("output", "format") {
        format
            .parse::<OutputFormat>()
            .map_err(|reason| ExplorerError::ConfigInvalid {
                section: "output".to_string(),
                key: "format".to_string(),
                reason,
            })?;
    }
    Ok(())
}
