// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Chunk stream encoding.
//!
//! # Frame Format
//!
//! ```text
//! +---------------------------------------------------------+
//! | chunk_type (4) | body_len (4) | body (body_len)          |
//! +---------------------------------------------------------+
//! ```
//!
//! # Body Format
//!
//! ```text
//! Header (0):       raw
//! Data (1):         time1 (4) | time2 (4) | raw_len (4) | size_in_bytes (4) | raw
//! Checkpoint (2),
//! Event (3):        id_len (4) | id | group_len (4) | group | meta_len (4) | meta
//!                   | time1 (4) | time2 (4) | raw_len (4) | raw
//! ```
//!
//! Text fields are UTF-8 with byte-count prefixes. Frames appear in input
//! order; skipped segments leave no trace in the output.

use crate::error::{EncodeError, EncodeResult, SkipReason, SkippedSegment};
use crate::writer::{encode_sized, BinaryWriter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outer frame size: chunk type + body length.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Data chunk sub-header size.
pub const DATA_SUBHEADER_SIZE: usize = 16;

/// Checkpoint/event sub-header size (after the text fields).
pub const EVENT_SUBHEADER_SIZE: usize = 12;

/// Byte-length prefix of each checkpoint/event text field.
const TEXT_PREFIX_SIZE: usize = 4;

/// Chunk type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Header,
    Data,
    Checkpoint,
    Event,
}

impl ChunkType {
    /// Tag written in the frame header.
    pub fn tag(self) -> i32 {
        match self {
            ChunkType::Header => 0,
            ChunkType::Data => 1,
            ChunkType::Checkpoint => 2,
            ChunkType::Event => 3,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(ChunkType::Header),
            1 => Some(ChunkType::Data),
            2 => Some(ChunkType::Checkpoint),
            3 => Some(ChunkType::Event),
            _ => None,
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChunkType::Header => "header",
            ChunkType::Data => "data",
            ChunkType::Checkpoint => "checkpoint",
            ChunkType::Event => "event",
        };
        f.write_str(name)
    }
}

/// Replay data segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataChunk {
    pub time1: i32,
    pub time2: i32,
    /// Declared size; defaults to the payload length.
    pub size_in_bytes: Option<i32>,
    pub data: Vec<u8>,
}

impl DataChunk {
    pub fn new(time1: i32, time2: i32, data: Vec<u8>) -> Self {
        Self {
            time1,
            time2,
            size_in_bytes: None,
            data,
        }
    }

    pub fn size_in_bytes(mut self, size: i32) -> Self {
        self.size_in_bytes = Some(size);
        self
    }
}

/// Checkpoint or event record.
///
/// `id` and `group` are optional here because records come from loosely
/// structured sources; a record missing either is skipped at encode time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventChunk {
    pub id: Option<String>,
    pub group: Option<String>,
    pub meta: Option<String>,
    pub time1: i32,
    pub time2: i32,
    pub data: Vec<u8>,
}

impl EventChunk {
    pub fn new(id: impl Into<String>, group: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Some(id.into()),
            group: Some(group.into()),
            meta: None,
            time1: 0,
            time2: 0,
            data,
        }
    }

    pub fn meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    pub fn times(mut self, time1: i32, time2: i32) -> Self {
        self.time1 = time1;
        self.time2 = time2;
        self
    }
}

/// One input segment for the chunk stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Header(Vec<u8>),
    Data(DataChunk),
    Checkpoint(EventChunk),
    Event(EventChunk),
    /// Segment carrying a tag this format does not define. Always skipped.
    Unknown { tag: i32, data: Vec<u8> },
}

impl Segment {
    pub fn tag(&self) -> i32 {
        match self {
            Segment::Header(_) => ChunkType::Header.tag(),
            Segment::Data(_) => ChunkType::Data.tag(),
            Segment::Checkpoint(_) => ChunkType::Checkpoint.tag(),
            Segment::Event(_) => ChunkType::Event.tag(),
            Segment::Unknown { tag, .. } => *tag,
        }
    }

    pub fn chunk_type(&self) -> Option<ChunkType> {
        ChunkType::from_tag(self.tag())
    }

    /// Raw payload bytes.
    pub fn payload(&self) -> &[u8] {
        match self {
            Segment::Header(data) | Segment::Unknown { data, .. } => data,
            Segment::Data(chunk) => &chunk.data,
            Segment::Checkpoint(chunk) | Segment::Event(chunk) => &chunk.data,
        }
    }
}

/// Encoded chunk stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkStream {
    /// Concatenated frames.
    pub bytes: Vec<u8>,
    /// Number of frames written.
    pub frames: usize,
    /// Segments left out of the stream.
    pub skipped: Vec<SkippedSegment>,
}

/// Frame resolved from a segment, with every length already checked.
enum Frame<'a> {
    Raw {
        data: &'a [u8],
    },
    Data {
        chunk: &'a DataChunk,
        raw_len: i32,
    },
    Event {
        tag: i32,
        id: &'a str,
        group: &'a str,
        meta: &'a str,
        chunk: &'a EventChunk,
    },
}

impl Frame<'_> {
    fn tag(&self) -> i32 {
        match self {
            Frame::Raw { .. } => ChunkType::Header.tag(),
            Frame::Data { .. } => ChunkType::Data.tag(),
            Frame::Event { tag, .. } => *tag,
        }
    }

    fn body_len(&self) -> usize {
        match self {
            Frame::Raw { data } => data.len(),
            Frame::Data { chunk, .. } => DATA_SUBHEADER_SIZE + chunk.data.len(),
            Frame::Event {
                id,
                group,
                meta,
                chunk,
                ..
            } => {
                3 * TEXT_PREFIX_SIZE
                    + id.len()
                    + group.len()
                    + meta.len()
                    + EVENT_SUBHEADER_SIZE
                    + chunk.data.len()
            }
        }
    }

    fn write_body(&self, w: &mut BinaryWriter) -> EncodeResult<()> {
        match self {
            Frame::Raw { data } => w.write_bytes(data),
            Frame::Data { chunk, raw_len } => {
                w.write_i32(chunk.time1)?;
                w.write_i32(chunk.time2)?;
                w.write_i32(*raw_len)?;
                w.write_i32(chunk.size_in_bytes.unwrap_or(*raw_len))?;
                w.write_bytes(&chunk.data)
            }
            Frame::Event {
                id,
                group,
                meta,
                chunk,
                ..
            } => {
                write_text(w, id)?;
                write_text(w, group)?;
                write_text(w, meta)?;
                w.write_i32(chunk.time1)?;
                w.write_i32(chunk.time2)?;
                w.write_i32(chunk.data.len() as i32)?;
                w.write_bytes(&chunk.data)
            }
        }
    }
}

/// `[i32 byte length][utf-8 bytes]`
fn write_text(w: &mut BinaryWriter, text: &str) -> EncodeResult<()> {
    w.write_i32(text.len() as i32)?;
    w.write_bytes(text.as_bytes())
}

fn check_len(index: usize, len: usize) -> EncodeResult<i32> {
    i32::try_from(len).map_err(|_| EncodeError::SegmentTooLarge { index, len })
}

fn resolve(index: usize, segment: &Segment) -> EncodeResult<Result<Frame<'_>, SkipReason>> {
    let frame = match segment {
        Segment::Header(data) => Frame::Raw { data },
        Segment::Data(chunk) => Frame::Data {
            chunk,
            raw_len: check_len(index, chunk.data.len())?,
        },
        Segment::Checkpoint(chunk) | Segment::Event(chunk) => {
            let Some(id) = chunk.id.as_deref() else {
                return Ok(Err(SkipReason::MissingId));
            };
            let Some(group) = chunk.group.as_deref() else {
                return Ok(Err(SkipReason::MissingGroup));
            };
            let meta = chunk.meta.as_deref().unwrap_or("");
            for len in [id.len(), group.len(), meta.len(), chunk.data.len()] {
                check_len(index, len)?;
            }
            Frame::Event {
                tag: segment.tag(),
                id,
                group,
                meta,
                chunk,
            }
        }
        Segment::Unknown { .. } => return Ok(Err(SkipReason::UnknownTag)),
    };
    check_len(index, frame.body_len())?;
    Ok(Ok(frame))
}

/// Encode `segments` into a length-framed, type-tagged chunk stream.
///
/// Segments are emitted in input order. Checkpoint/event records missing an
/// id or group, and segments with unknown tags, are reported in
/// [`ChunkStream::skipped`] and left out. Length overflows are fatal and
/// detected before anything is written.
pub fn encode_chunks(segments: &[Segment]) -> EncodeResult<ChunkStream> {
    let mut frames = Vec::with_capacity(segments.len());
    let mut skipped = Vec::new();
    let mut capacity = 0usize;

    for (index, segment) in segments.iter().enumerate() {
        match resolve(index, segment)? {
            Ok(frame) => {
                capacity += FRAME_HEADER_SIZE + frame.body_len();
                frames.push(frame);
            }
            Err(reason) => skipped.push(SkippedSegment {
                index,
                tag: segment.tag(),
                reason,
            }),
        }
    }

    let bytes = encode_sized(capacity, |w| {
        w.write_array(&frames, |w, frame| {
            w.write_i32(frame.tag())?;
            w.write_i32(frame.body_len() as i32)?;
            frame.write_body(w)
        })
    })?;

    Ok(ChunkStream {
        bytes,
        frames: frames.len(),
        skipped,
    })
}
