// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Assembly progress reporting.
//!
//! Purely observational: sinks see counters per segment category and have
//! no effect on the produced bytes.

use crate::chunk::ChunkType;
use std::fmt;

/// Progress of one segment category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub current: usize,
    pub max: usize,
}

impl Counter {
    pub fn new(max: usize) -> Self {
        Self { current: 0, max }
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.max
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

/// Progress snapshot across all segment categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub header: Counter,
    pub data_chunks: Counter,
    pub event_chunks: Counter,
    pub checkpoint_chunks: Counter,
}

impl Progress {
    pub fn counter(&self, kind: ChunkType) -> &Counter {
        match kind {
            ChunkType::Header => &self.header,
            ChunkType::Data => &self.data_chunks,
            ChunkType::Event => &self.event_chunks,
            ChunkType::Checkpoint => &self.checkpoint_chunks,
        }
    }

    pub fn counter_mut(&mut self, kind: ChunkType) -> &mut Counter {
        match kind {
            ChunkType::Header => &mut self.header,
            ChunkType::Data => &mut self.data_chunks,
            ChunkType::Event => &mut self.event_chunks,
            ChunkType::Checkpoint => &mut self.checkpoint_chunks,
        }
    }

    /// Advance the counter of `kind` by one.
    pub fn advance(&mut self, kind: ChunkType) {
        self.counter_mut(kind).current += 1;
    }

    pub fn is_complete(&self) -> bool {
        self.header.is_done()
            && self.data_chunks.is_done()
            && self.event_chunks.is_done()
            && self.checkpoint_chunks.is_done()
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "header {} data {} events {} checkpoints {}",
            self.header, self.data_chunks, self.event_chunks, self.checkpoint_chunks
        )
    }
}

/// Receives progress snapshots.
pub trait ProgressSink {
    fn update(&mut self, progress: &Progress);
}

impl<F> ProgressSink for F
where
    F: FnMut(&Progress),
{
    fn update(&mut self, progress: &Progress) {
        self(progress)
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn update(&mut self, _progress: &Progress) {}
}

/// Logs progress through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn update(&mut self, progress: &Progress) {
        tracing::info!("Progress: {}", progress);
    }
}
