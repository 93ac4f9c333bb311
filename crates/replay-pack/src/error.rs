// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoding errors.
//!
//! Fatal conditions abort the encode and no bytes escape. Non-fatal
//! conditions ([`SkippedSegment`]) are returned next to the output so the
//! caller decides how to report them.

use std::fmt;
use thiserror::Error;

/// Fatal encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A required metadata field is missing or unusable.
    #[error("invalid metadata field `{field}`: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    /// A write would overflow the declared buffer capacity.
    #[error("write of {needed} bytes at offset {offset} exceeds capacity {capacity}")]
    CapacityExceeded {
        offset: usize,
        needed: usize,
        capacity: usize,
    },

    /// The cursor did not land exactly on the declared capacity.
    #[error("size mismatch: declared {expected} bytes, wrote {written}")]
    SizeMismatch { expected: usize, written: usize },

    /// A length does not fit the format's signed 32-bit length fields.
    #[error("segment {index} has a field of {len} bytes, larger than i32::MAX")]
    SegmentTooLarge { index: usize, len: usize },
}

impl EncodeError {
    pub(crate) fn missing(field: &'static str) -> Self {
        EncodeError::Validation {
            field,
            reason: "required field is missing".into(),
        }
    }
}

/// Result alias used by the encoding layer.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Why a segment was left out of the chunk stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Checkpoint/event record without an id.
    MissingId,
    /// Checkpoint/event record without a group.
    MissingGroup,
    /// Chunk type tag outside 0..=3.
    UnknownTag,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingId => write!(f, "missing id"),
            SkipReason::MissingGroup => write!(f, "missing group"),
            SkipReason::UnknownTag => write!(f, "unknown chunk type"),
        }
    }
}

/// A segment excluded from the output (non-fatal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSegment {
    /// Position of the segment in the caller's input list.
    pub index: usize,
    /// Chunk type tag the segment carried.
    pub tag: i32,
    /// Why it was skipped.
    pub reason: SkipReason,
}

impl fmt::Display for SkippedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "segment {} (type {}) skipped: {}",
            self.index, self.tag, self.reason
        )
    }
}
