// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session metadata document.
//!
//! The capture tooling writes a JSON document next to the raw chunk files:
//!
//! ```json
//! {
//!   "meta": {
//!     "gameMode": "SND", "friendlyName": "Dust Run", "competitive": true,
//!     "workshop_mods": "0", "live": false, "totalTime": 1800, "__v": 42,
//!     "created": "2024-03-09T00:00:00Z", "bCompressed": 0
//!   },
//!   "events":        { "events": [ { "id": "...", "group": "...", ... } ] },
//!   "events_pavlov": { "events": [ ... ] }
//! }
//! ```
//!
//! Event payloads use the Node buffer JSON shape
//! `{ "type": "Buffer", "data": [1, 2, 3] }`.

use crate::chunk::EventChunk;
use crate::error::EncodeError;
use crate::meta::SessionMetadata;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Metadata document errors.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid metadata: missing \"meta\" field")]
    MissingMeta,

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Which event array of the document backs a segment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// `events.events`
    Events,
    /// `events_pavlov.events`
    EventsPavlov,
}

/// Parsed metadata document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub meta: Option<RawSessionMeta>,

    #[serde(default)]
    pub events: Option<EventList>,

    #[serde(default)]
    pub events_pavlov: Option<EventList>,
}

/// Wrapper object around an event array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

/// Session fields as they appear in the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSessionMeta {
    #[serde(rename = "gameMode", default)]
    pub game_mode: Option<String>,

    #[serde(rename = "friendlyName", default)]
    pub friendly_name: Option<String>,

    #[serde(default)]
    pub competitive: Value,

    /// `Some(Value::Null)` for an explicit `null`, `None` when absent.
    #[serde(default, deserialize_with = "present")]
    pub workshop_mods: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub live: Option<Value>,

    #[serde(rename = "totalTime", default)]
    pub total_time: i64,

    /// Network version.
    #[serde(rename = "__v", default)]
    pub network_version: i32,

    #[serde(default)]
    pub created: Option<CreatedAt>,

    #[serde(rename = "bCompressed", default)]
    pub compressed: i32,
}

/// Creation time: RFC 3339 text or Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    Millis(i64),
    Text(String),
}

impl CreatedAt {
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, EncodeError> {
        match self {
            CreatedAt::Millis(ms) => {
                Utc.timestamp_millis_opt(*ms)
                    .single()
                    .ok_or_else(|| EncodeError::Validation {
                        field: "created",
                        reason: format!("{} ms is out of range", ms),
                    })
            }
            CreatedAt::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| EncodeError::Validation {
                    field: "created",
                    reason: format!("{:?}: {}", text, e),
                }),
        }
    }
}

/// One checkpoint/event record from the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub meta: Option<String>,

    #[serde(default)]
    pub time1: Option<i32>,

    #[serde(default)]
    pub time2: Option<i32>,

    #[serde(default)]
    pub data: Value,
}

impl RawEvent {
    /// Convert into an encoder record. Empty ids/groups count as missing.
    pub fn to_chunk(&self) -> EventChunk {
        EventChunk {
            id: self.id.clone().filter(|s| !s.is_empty()),
            group: self.group.clone().filter(|s| !s.is_empty()),
            meta: self.meta.clone(),
            time1: self.time1.unwrap_or(0),
            time2: self.time2.unwrap_or(0),
            data: buffer_bytes(&self.data),
        }
    }
}

impl RawSessionMeta {
    /// Validate required fields and build [`SessionMetadata`].
    pub fn to_session(&self) -> Result<SessionMetadata, EncodeError> {
        let game_mode = self
            .game_mode
            .clone()
            .ok_or_else(|| EncodeError::missing("gameMode"))?;
        let friendly_name = self
            .friendly_name
            .clone()
            .ok_or_else(|| EncodeError::missing("friendlyName"))?;
        let created = self
            .created
            .as_ref()
            .ok_or_else(|| EncodeError::missing("created"))?
            .to_datetime()?;

        let total_time = i32::try_from(self.total_time)
            .ok()
            .filter(|t| *t >= 0)
            .ok_or_else(|| EncodeError::Validation {
                field: "totalTime",
                reason: format!("{} is not a non-negative 32-bit integer", self.total_time),
            })?;

        let workshop_mods = self
            .workshop_mods
            .as_ref()
            .map(label_text)
            .unwrap_or_else(|| "0".into());

        let mut session = SessionMetadata::new(game_mode, friendly_name, created)
            .competitive(truthy(&self.competitive))
            .workshop_mods(workshop_mods)
            .live(self.live.as_ref().is_some_and(truthy))
            .total_time(total_time)
            .network_version(self.network_version)
            .compressed_flag(self.compressed);
        if let Some(live) = self.live.as_ref().filter(|v| !v.is_boolean()) {
            session.live_label = Some(label_text(live));
        }
        Ok(session)
    }
}

impl MetadataDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SourceError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Session metadata from the `meta` object.
    pub fn session(&self) -> Result<SessionMetadata, SourceError> {
        let meta = self.meta.as_ref().ok_or(SourceError::MissingMeta)?;
        Ok(meta.to_session()?)
    }

    /// Records of one event array (empty when the array is absent).
    pub fn events(&self, source: EventSource) -> &[RawEvent] {
        let list = match source {
            EventSource::Events => self.events.as_ref(),
            EventSource::EventsPavlov => self.events_pavlov.as_ref(),
        };
        list.map(|l| l.events.as_slice()).unwrap_or(&[])
    }
}

/// Bytes of a `{ "type": "Buffer", "data": [...] }` value; empty otherwise.
pub fn buffer_bytes(value: &Value) -> Vec<u8> {
    let is_buffer = value.get("type").and_then(Value::as_str) == Some("Buffer");
    match value.get("data").and_then(Value::as_array) {
        Some(items) if is_buffer => items
            .iter()
            .map(|v| v.as_u64().map(|n| (n & 0xFF) as u8).unwrap_or(0))
            .collect(),
        _ => Vec::new(),
    }
}

/// Keep an explicit `null` as `Some(Value::Null)`; absent fields fall back to
/// `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Truthiness of a loosely typed JSON flag.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text of a JSON value as it is embedded in the display label.
fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
