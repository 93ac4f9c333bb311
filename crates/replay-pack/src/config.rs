// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Build configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.

use crate::chunk::ChunkType;
use crate::plan::{SegmentPlan, DEFAULT_ORDER};
use crate::source::EventSource;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Replay build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Maximum data files (unset = all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_limit: Option<usize>,

    /// Maximum event records (unset = all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_limit: Option<usize>,

    /// Maximum checkpoint records (unset = all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_limit: Option<usize>,

    /// Document array backing event chunks.
    #[serde(default = "default_event_source")]
    pub event_source: EventSource,

    /// Document array backing checkpoint chunks.
    #[serde(default = "default_checkpoint_source")]
    pub checkpoint_source: EventSource,

    /// Category order in the output.
    #[serde(default = "default_order")]
    pub order: Vec<ChunkType>,

    /// Drop zero-length data files.
    #[serde(default = "default_true")]
    pub skip_empty_data: bool,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_event_source() -> EventSource {
    EventSource::EventsPavlov
}

fn default_checkpoint_source() -> EventSource {
    EventSource::Events
}

fn default_order() -> Vec<ChunkType> {
    DEFAULT_ORDER.to_vec()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            data_limit: None,
            event_limit: None,
            checkpoint_limit: None,
            event_source: default_event_source(),
            checkpoint_source: default_checkpoint_source(),
            order: default_order(),
            skip_empty_data: true,
            log_level: default_log_level(),
        }
    }
}

impl BuildConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.order.contains(&ChunkType::Header) {
            return Err(ConfigError::Invalid(
                "order must include the header category".into(),
            ));
        }

        for (i, kind) in self.order.iter().enumerate() {
            if self.order[..i].contains(kind) {
                return Err(ConfigError::Invalid(format!(
                    "category {} appears more than once in order",
                    kind
                )));
            }
        }

        Ok(())
    }

    /// Selection plan described by this configuration.
    pub fn plan(&self) -> SegmentPlan {
        SegmentPlan {
            order: self.order.clone(),
            data_limit: self.data_limit,
            event_limit: self.event_limit,
            checkpoint_limit: self.checkpoint_limit,
            event_source: self.event_source,
            checkpoint_source: self.checkpoint_source,
            skip_empty_data: self.skip_empty_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_matches_default_plan() {
        let config = BuildConfig::default();
        config.validate().expect("default is valid");
        assert_eq!(config.plan(), SegmentPlan::default());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = BuildConfig::from_toml_str(
            r#"
            data_limit = 10
            checkpoint_source = "events_pavlov"
            order = ["header", "checkpoint", "data"]
            "#,
        )
        .expect("parse");

        assert_eq!(config.data_limit, Some(10));
        assert_eq!(config.event_limit, None);
        assert_eq!(config.checkpoint_source, EventSource::EventsPavlov);
        assert_eq!(config.event_source, EventSource::EventsPavlov);
        assert_eq!(
            config.order,
            vec![ChunkType::Header, ChunkType::Checkpoint, ChunkType::Data]
        );
        assert!(config.skip_empty_data);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_order_without_header_rejected() {
        let err = BuildConfig::from_toml_str(r#"order = ["data", "event"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let config = BuildConfig {
            order: vec![ChunkType::Header, ChunkType::Data, ChunkType::Data],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: category data appears more than once in order"
        );
    }

    #[test]
    fn test_unknown_category_rejected() {
        let err = BuildConfig::from_toml_str(r#"order = ["header", "index"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("replay-pack.toml");

        let config = BuildConfig {
            event_limit: Some(3),
            ..Default::default()
        };
        std::fs::write(&path, config.to_toml_string().expect("serialize")).expect("write");

        let loaded = BuildConfig::from_file(&path).expect("load");
        assert_eq!(loaded, config);
    }
}
