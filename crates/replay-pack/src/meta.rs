// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session meta block (562 bytes, fixed).
//!
//! # Layout
//!
//! ```text
//! +---------------------------------------------------------+
//! | magic (4) | version (4) | total_time (4) | net_ver (4)  |
//! | reserved (4) = 0 | sentinel (4) = -257                  |
//! +---------------------------------------------------------+
//! | friendly name (514): UTF-16LE label, space padded,      |
//! | last two bytes always zero                              |
//! +---------------------------------------------------------+
//! | live (4) | timestamp ticks (8) | compressed (4)         |
//! | chunk count (4) = 0 | extra count (4) = 0 | extra[]     |
//! +---------------------------------------------------------+
//! ```
//!
//! All integers are little-endian. The trailing extra array is always empty
//! in this encoder; only its element count is written.

use crate::error::{EncodeError, EncodeResult};
use crate::writer::{encode_sized, BinaryWriter};
use chrono::{DateTime, Utc};

/// Meta block magic number.
pub const META_MAGIC: i32 = 0x1CA2_E27F;

/// Meta block format version.
pub const META_VERSION: i32 = 6;

/// Bytes taken by everything except the friendly name field.
pub const FIXED_FIELDS_SIZE: usize = 48;

/// Reserved bytes for the friendly name field.
pub const FRIENDLY_NAME_SIZE: usize = 514;

/// Total meta block size.
pub const META_BLOCK_SIZE: usize = FIXED_FIELDS_SIZE + FRIENDLY_NAME_SIZE;

/// Fixed value written right before the friendly name field.
pub const NAME_SENTINEL: i32 = -257;

/// Ticks (100 ns) between 0001-01-01T00:00:00Z and the Unix epoch.
pub const TICKS_AT_UNIX_EPOCH: i64 = 621_355_968_000_000_000;

/// Ticks per millisecond.
pub const TICKS_PER_MILLISECOND: i64 = 10_000;

/// Session-level metadata for one recorded game session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionMetadata {
    /// Game mode label.
    pub game_mode: String,

    /// User-facing display name.
    pub friendly_name: String,

    /// Competitive (true) or casual (false) session.
    pub competitive: bool,

    /// Workshop mod identifiers, or "0".
    pub workshop_mods: String,

    /// Whether the session was live.
    pub live: bool,

    /// Raw text of the live value as it appears in the display label.
    /// `None` renders the boolean (`true`/`false`).
    pub live_label: Option<String>,

    /// Session length in seconds.
    pub total_time: i32,

    /// Network protocol version.
    pub network_version: i32,

    /// Session creation time.
    pub created: DateTime<Utc>,

    /// Compression flag, passed through verbatim.
    pub compressed_flag: i32,
}

impl SessionMetadata {
    /// Create metadata with the required fields; the rest default to a
    /// casual, non-live, uncompressed session with no workshop mods.
    pub fn new(
        game_mode: impl Into<String>,
        friendly_name: impl Into<String>,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            game_mode: game_mode.into(),
            friendly_name: friendly_name.into(),
            competitive: false,
            workshop_mods: "0".into(),
            live: false,
            live_label: None,
            total_time: 0,
            network_version: 0,
            created,
            compressed_flag: 0,
        }
    }

    pub fn competitive(mut self, competitive: bool) -> Self {
        self.competitive = competitive;
        self
    }

    pub fn workshop_mods(mut self, mods: impl Into<String>) -> Self {
        self.workshop_mods = mods.into();
        self
    }

    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn total_time(mut self, seconds: i32) -> Self {
        self.total_time = seconds;
        self
    }

    pub fn network_version(mut self, version: i32) -> Self {
        self.network_version = version;
        self
    }

    pub fn compressed_flag(mut self, flag: i32) -> Self {
        self.compressed_flag = flag;
        self
    }

    /// Display label: `gameMode,friendlyName,competitive|casual,0,workshopMods,live`.
    pub fn display_label(&self) -> String {
        let competitive = if self.competitive {
            "competitive"
        } else {
            "casual"
        };
        let live = match &self.live_label {
            Some(raw) => raw.clone(),
            None => self.live.to_string(),
        };
        format!(
            "{},{},{},0,{},{}",
            self.game_mode, self.friendly_name, competitive, self.workshop_mods, live
        )
    }

    /// Creation time as 100 ns ticks since 0001-01-01T00:00:00Z.
    pub fn timestamp_ticks(&self) -> EncodeResult<i64> {
        unix_millis_to_ticks(self.created.timestamp_millis())
    }
}

/// Convert Unix milliseconds to 100 ns ticks since year 1.
pub fn unix_millis_to_ticks(millis: i64) -> EncodeResult<i64> {
    millis
        .checked_mul(TICKS_PER_MILLISECOND)
        .and_then(|ticks| ticks.checked_add(TICKS_AT_UNIX_EPOCH))
        .ok_or_else(|| EncodeError::Validation {
            field: "created",
            reason: format!("{} ms since epoch does not fit 64-bit ticks", millis),
        })
}

/// Build the fixed friendly name field for `label`.
///
/// The first 512 bytes are UTF-16LE spaces, the last two are zero, and the
/// encoded label is copied over the start, truncated to the field width.
pub fn friendly_name_field(label: &str) -> [u8; FRIENDLY_NAME_SIZE] {
    let mut field = [0u8; FRIENDLY_NAME_SIZE];
    for pair in field[..FRIENDLY_NAME_SIZE - 2].chunks_exact_mut(2) {
        pair[0] = 0x20;
        pair[1] = 0x00;
    }

    let encoded: Vec<u8> = label.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let len = encoded.len().min(FRIENDLY_NAME_SIZE);
    field[..len].copy_from_slice(&encoded[..len]);
    field
}

/// Encode the session meta block.
pub fn encode_meta_block(meta: &SessionMetadata) -> EncodeResult<Vec<u8>> {
    let timestamp = meta.timestamp_ticks()?;
    let name_field = friendly_name_field(&meta.display_label());
    let extra: [u8; 0] = [];

    encode_sized(META_BLOCK_SIZE, |w: &mut BinaryWriter| {
        w.write_i32(META_MAGIC)?;
        w.write_i32(META_VERSION)?;
        w.write_i32(meta.total_time)?;
        w.write_i32(meta.network_version)?;
        w.write_i32(0)?;
        w.write_i32(NAME_SENTINEL)?;
        w.write_bytes(&name_field)?;
        w.write_i32(i32::from(meta.live))?;
        w.write_i64(timestamp)?;
        w.write_i32(meta.compressed_flag)?;
        // Chunk count placeholder
        w.write_i32(0)?;
        w.write_i32(extra.len() as i32)?;
        w.write_array(&extra, |w, b| w.write_u8(*b))
    })
}
