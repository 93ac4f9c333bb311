// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Replay container assembly.
//!
//! ```text
//! +---------------------------------------------------------+
//! |                    Meta Block (562 bytes)                |
//! +---------------------------------------------------------+
//! |                    Chunk 0 (type | len | body)           |
//! +---------------------------------------------------------+
//! |                    Chunk 1 ...                           |
//! +---------------------------------------------------------+
//! ```
//!
//! No trailing index or checksum; readers parse the stream sequentially.

use crate::chunk::{encode_chunks, Segment};
use crate::error::{EncodeResult, SkippedSegment};
use crate::meta::{encode_meta_block, SessionMetadata, META_BLOCK_SIZE};

/// A fully encoded replay container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    bytes: Vec<u8>,
    frames: usize,
    skipped: Vec<SkippedSegment>,
}

impl Replay {
    /// Container bytes: meta block followed by the chunk stream.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The meta block prefix.
    pub fn meta_block(&self) -> &[u8] {
        &self.bytes[..META_BLOCK_SIZE]
    }

    /// The chunk stream that follows the meta block.
    pub fn chunk_stream(&self) -> &[u8] {
        &self.bytes[META_BLOCK_SIZE..]
    }

    /// Number of chunk frames written.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Segments left out of the chunk stream.
    pub fn skipped(&self) -> &[SkippedSegment] {
        &self.skipped
    }
}

/// Encode `meta` and `segments` into a replay container.
///
/// Either the whole container is produced or an error is returned; fatal
/// errors never yield partial output.
pub fn build_replay(meta: &SessionMetadata, segments: &[Segment]) -> EncodeResult<Replay> {
    let meta_block = encode_meta_block(meta)?;
    let stream = encode_chunks(segments)?;

    let mut bytes = Vec::with_capacity(meta_block.len() + stream.bytes.len());
    bytes.extend_from_slice(&meta_block);
    bytes.extend_from_slice(&stream.bytes);

    Ok(Replay {
        bytes,
        frames: stream.frames,
        skipped: stream.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{DataChunk, EventChunk};
    use crate::error::SkipReason;
    use chrono::{TimeZone, Utc};

    fn meta() -> SessionMetadata {
        let created = Utc
            .with_ymd_and_hms(2023, 11, 2, 18, 30, 0)
            .single()
            .expect("valid date");
        SessionMetadata::new("TDM", "Evening scrim", created).total_time(600)
    }

    #[test]
    fn test_meta_only_container() {
        let replay = build_replay(&meta(), &[]).expect("build");
        assert_eq!(replay.len(), META_BLOCK_SIZE);
        assert!(replay.chunk_stream().is_empty());
        assert_eq!(replay.frames(), 0);
    }

    #[test]
    fn test_container_is_meta_then_stream() {
        let segments = vec![
            Segment::Header(vec![0x11; 10]),
            Segment::Data(DataChunk::new(5, 9, vec![1, 2, 3, 4])),
        ];
        let replay = build_replay(&meta(), &segments).expect("build");

        assert_eq!(replay.meta_block(), encode_meta_block(&meta()).expect("meta"));
        assert_eq!(
            replay.chunk_stream(),
            encode_chunks(&segments).expect("chunks").bytes
        );
        assert_eq!(replay.frames(), 2);
    }

    #[test]
    fn test_skipped_segments_reported() {
        let segments = vec![
            Segment::Header(vec![]),
            Segment::Checkpoint(EventChunk {
                id: Some("cp".into()),
                ..Default::default()
            }),
        ];
        let replay = build_replay(&meta(), &segments).expect("build");
        assert_eq!(replay.frames(), 1);
        assert_eq!(replay.skipped().len(), 1);
        assert_eq!(replay.skipped()[0].reason, SkipReason::MissingGroup);
        assert_eq!(replay.len(), META_BLOCK_SIZE + 8);
    }

    #[test]
    fn test_build_is_idempotent() {
        let segments = vec![
            Segment::Header(vec![1, 2, 3]),
            Segment::Event(EventChunk::new("kill", "combat", vec![4]).meta("hs")),
        ];
        let first = build_replay(&meta(), &segments).expect("first");
        let second = build_replay(&meta(), &segments).expect("second");
        assert_eq!(first, second);
        assert_eq!(first.into_bytes(), second.as_bytes());
    }
}
