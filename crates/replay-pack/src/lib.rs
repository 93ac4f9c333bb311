// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Replay container assembly.
//!
//! Builds a single binary replay file from session metadata and pre-captured
//! chunk files:
//! - Fixed 562-byte meta block (magic, version, session fields, UTF-16LE
//!   display name, tick timestamp)
//! - Length-framed, type-tagged chunk stream (header, data, checkpoint,
//!   event)
//!
//! # Quick Start
//!
//! ```bash
//! replay-pack --metadata metadata.json --header replay.header \
//!     --stream stream.0 --stream stream.1 --output session.replay
//! ```
//!
//! The encoding layer ([`writer`], [`meta`], [`chunk`], [`container`]) is
//! pure: it takes in-memory values and returns bytes. Loading, selection,
//! progress and persistence live in [`source`], [`plan`], [`progress`] and
//! [`pipeline`].
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use replay_pack::{build_replay, DataChunk, Segment, SessionMetadata};
//!
//! let created = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();
//! let meta = SessionMetadata::new("SND", "Dust Run", created);
//! let segments = vec![
//!     Segment::Header(vec![0; 10]),
//!     Segment::Data(DataChunk::new(5, 9, vec![1, 2, 3, 4])),
//! ];
//! let replay = build_replay(&meta, &segments).unwrap();
//! assert_eq!(replay.len(), 562 + (8 + 10) + (8 + 16 + 4));
//! ```

pub mod chunk;
pub mod config;
pub mod container;
pub mod error;
pub mod meta;
pub mod pipeline;
pub mod plan;
pub mod progress;
pub mod source;
pub mod writer;

pub use chunk::{encode_chunks, ChunkStream, ChunkType, DataChunk, EventChunk, Segment};
pub use config::{BuildConfig, ConfigError};
pub use container::{build_replay, Replay};
pub use error::{EncodeError, EncodeResult, SkipReason, SkippedSegment};
pub use meta::{encode_meta_block, SessionMetadata, META_BLOCK_SIZE};
pub use pipeline::{Assembler, BuildSummary, FileSink, InputFiles, PipelineError, ReplaySink};
pub use plan::{SegmentPlan, StreamFile};
pub use progress::{Counter, NoopProgress, Progress, ProgressSink, TracingProgress};
pub use source::{EventSource, MetadataDocument, SourceError};
pub use writer::{encode_sized, BinaryWriter};
