// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Replay assembly pipeline.
//!
//! Loads explicitly named input files, applies a [`SegmentPlan`], reports
//! progress, encodes the container, and hands the bytes to a [`ReplaySink`].

use crate::chunk::{ChunkType, Segment};
use crate::container::{build_replay, Replay};
use crate::error::{EncodeError, SkippedSegment};
use crate::plan::{SegmentPlan, StreamFile};
use crate::progress::{Progress, ProgressSink, TracingProgress};
use crate::source::{MetadataDocument, SourceError};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("cannot persist replay: {0}")]
    Sink(#[source] io::Error),
}

/// Destination for the finished container.
pub trait ReplaySink {
    fn persist(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Writes the container to a file, replacing any previous content.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ReplaySink for FileSink {
    fn persist(&mut self, bytes: &[u8]) -> io::Result<()> {
        std::fs::write(&self.path, bytes)
    }
}

impl ReplaySink for Vec<u8> {
    fn persist(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.clear();
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Paths of the files making up one capture.
#[derive(Debug, Clone, Default)]
pub struct InputFiles {
    /// Session metadata JSON document.
    pub metadata: PathBuf,
    /// Raw replay header chunk.
    pub header: PathBuf,
    /// Raw data chunks, in output order.
    pub streams: Vec<PathBuf>,
}

/// Input contents, loaded and parsed.
#[derive(Debug, Clone, Default)]
pub struct LoadedInputs {
    pub document: MetadataDocument,
    pub header: Vec<u8>,
    pub streams: Vec<StreamFile>,
}

impl LoadedInputs {
    pub fn load(files: &InputFiles) -> Result<Self, PipelineError> {
        let document = MetadataDocument::from_slice(&read_input(&files.metadata)?)?;
        let header = read_input(&files.header)?;
        let streams = files
            .streams
            .iter()
            .map(|path| Ok(StreamFile::new(display_name(path), read_input(path)?)))
            .collect::<Result<Vec<_>, PipelineError>>()?;

        Ok(Self {
            document,
            header,
            streams,
        })
    }
}

/// Outcome of one assembly.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    /// Container size in bytes.
    pub bytes: usize,
    /// Chunk frames written.
    pub frames: usize,
    /// Segments the encoder left out.
    pub skipped: Vec<SkippedSegment>,
    /// Data files dropped for being empty.
    pub empty_streams: Vec<String>,
    /// Final progress snapshot.
    pub progress: Progress,
}

/// Drives one replay build.
pub struct Assembler<P = TracingProgress> {
    plan: SegmentPlan,
    progress: P,
}

impl Assembler<TracingProgress> {
    pub fn new(plan: SegmentPlan) -> Self {
        Self {
            plan,
            progress: TracingProgress,
        }
    }
}

impl<P: ProgressSink> Assembler<P> {
    /// Replace the progress sink.
    pub fn with_progress<Q: ProgressSink>(self, progress: Q) -> Assembler<Q> {
        Assembler {
            plan: self.plan,
            progress,
        }
    }

    /// Encode loaded inputs into a container.
    pub fn assemble(
        &mut self,
        inputs: LoadedInputs,
    ) -> Result<(Replay, BuildSummary), PipelineError> {
        let session = inputs.document.session()?;
        debug!("Session label: {}", session.display_label());

        let planned = self
            .plan
            .build(inputs.header, inputs.streams, &inputs.document);
        for name in &planned.empty_streams {
            warn!("Skipping empty stream file: {}", name);
        }

        let replay = build_replay(&session, &planned.segments)?;

        // Only frames that made it into the container count towards progress.
        let mut progress = planned.progress;
        let mut skipped_indices = HashSet::new();
        for skipped in replay.skipped() {
            warn!("{}", skipped);
            skipped_indices.insert(skipped.index);
            if let Some(kind) = ChunkType::from_tag(skipped.tag) {
                let counter = progress.counter_mut(kind);
                counter.max = counter.max.saturating_sub(1);
            }
        }
        self.progress.update(&progress);

        for (index, segment) in planned.segments.iter().enumerate() {
            if skipped_indices.contains(&index) {
                continue;
            }
            debug!(
                "Chunk {} ({}): payload {} bytes",
                index,
                describe(segment),
                segment.payload().len()
            );
            if let Some(kind) = segment.chunk_type() {
                progress.advance(kind);
                self.progress.update(&progress);
            }
        }

        let summary = BuildSummary {
            bytes: replay.len(),
            frames: replay.frames(),
            skipped: replay.skipped().to_vec(),
            empty_streams: planned.empty_streams,
            progress,
        };
        info!(
            "Replay built: {} bytes, {} chunks, {} skipped",
            summary.bytes,
            summary.frames,
            summary.skipped.len()
        );

        Ok((replay, summary))
    }

    /// Load `files`, assemble, and persist through `sink`.
    pub fn run<S: ReplaySink>(
        &mut self,
        files: &InputFiles,
        sink: &mut S,
    ) -> Result<BuildSummary, PipelineError> {
        let inputs = LoadedInputs::load(files)?;
        let (replay, summary) = self.assemble(inputs)?;
        sink.persist(replay.as_bytes()).map_err(PipelineError::Sink)?;
        Ok(summary)
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>, PipelineError> {
    std::fs::read(path).map_err(|source| PipelineError::Input {
        path: path.to_path_buf(),
        source,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn describe(segment: &Segment) -> String {
    match segment.chunk_type() {
        Some(kind) => kind.to_string(),
        None => format!("type {}", segment.tag()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkipReason;
    use crate::meta::META_BLOCK_SIZE;
    use crate::progress::Counter;
    use serde_json::json;
    use tempfile::tempdir;

    fn write_capture(dir: &Path) -> InputFiles {
        let document = json!({
            "meta": {
                "gameMode": "SND",
                "friendlyName": "Dust Run",
                "competitive": false,
                "workshop_mods": "0",
                "live": false,
                "totalTime": 90,
                "__v": 3,
                "created": "1970-01-01T00:00:00Z",
                "bCompressed": 0
            },
            "events": { "events": [
                { "id": "cp0", "group": "checkpoint",
                  "data": { "type": "Buffer", "data": [9, 9] } }
            ]},
            "events_pavlov": { "events": [
                { "id": "kill", "group": "combat", "time1": 1, "time2": 2,
                  "data": { "type": "Buffer", "data": [1, 2, 3] } },
                { "id": "orphan" }
            ]}
        });
        std::fs::write(dir.join("metadata.json"), document.to_string()).expect("metadata");
        std::fs::write(dir.join("replay.header"), [0x11; 10]).expect("header");
        std::fs::write(dir.join("stream.0"), [1, 2, 3, 4]).expect("stream.0");
        std::fs::write(dir.join("stream.1"), []).expect("stream.1");

        InputFiles {
            metadata: dir.join("metadata.json"),
            header: dir.join("replay.header"),
            streams: vec![dir.join("stream.0"), dir.join("stream.1")],
        }
    }

    #[test]
    fn test_run_to_file() {
        let dir = tempdir().expect("tempdir");
        let files = write_capture(dir.path());
        let out = dir.path().join("processed.replay");

        let mut sink = FileSink::new(&out);
        let summary = Assembler::new(SegmentPlan::default())
            .run(&files, &mut sink)
            .expect("run");

        let written = std::fs::read(&out).expect("read output");
        assert_eq!(written.len(), summary.bytes);
        // header + data + event + checkpoint; the orphan event is skipped
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].reason, SkipReason::MissingGroup);
        assert_eq!(summary.empty_streams, vec!["stream.1".to_string()]);

        let expected = META_BLOCK_SIZE
            + (8 + 10)
            + (8 + 16 + 4)
            + (8 + 4 + 4 + 4 + 6 + 4 + 12 + 3)
            + (8 + 4 + 3 + 4 + 10 + 4 + 12 + 2);
        assert_eq!(written.len(), expected);
    }

    #[test]
    fn test_progress_reports() {
        let dir = tempdir().expect("tempdir");
        let files = write_capture(dir.path());

        let mut reports: Vec<Progress> = Vec::new();
        let mut out = Vec::new();
        let summary = Assembler::new(SegmentPlan::default())
            .with_progress(|p: &Progress| reports.push(*p))
            .run(&files, &mut out)
            .expect("run");

        assert_eq!(out.len(), summary.bytes);
        let first = reports.first().expect("initial report");
        assert_eq!(first.header, Counter::new(1));
        assert_eq!(first.data_chunks, Counter::new(1));
        // the orphan event is skipped by the encoder and never counted
        assert_eq!(first.event_chunks, Counter::new(1));
        assert_eq!(first.checkpoint_chunks, Counter::new(1));

        // initial report plus one per written frame
        assert_eq!(reports.len(), 1 + 4);
        for pair in reports.windows(2) {
            for kind in [
                ChunkType::Header,
                ChunkType::Data,
                ChunkType::Event,
                ChunkType::Checkpoint,
            ] {
                assert!(pair[1].counter(kind).current >= pair[0].counter(kind).current);
            }
        }
        assert!(summary.progress.is_complete());
        assert_eq!(
            summary.progress.event_chunks,
            Counter { current: 1, max: 1 }
        );
    }

    #[test]
    fn test_missing_input_file() {
        let dir = tempdir().expect("tempdir");
        let mut files = write_capture(dir.path());
        files.streams.push(dir.path().join("stream.9"));

        let mut out = Vec::new();
        let err = Assembler::new(SegmentPlan::default())
            .run(&files, &mut out)
            .unwrap_err();
        match err {
            PipelineError::Input { path, .. } => assert!(path.ends_with("stream.9")),
            other => panic!("expected input error, got {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_metadata_produces_nothing() {
        let dir = tempdir().expect("tempdir");
        let files = write_capture(dir.path());
        std::fs::write(&files.metadata, r#"{ "meta": { "gameMode": "SND" } }"#)
            .expect("rewrite metadata");

        let mut out = Vec::new();
        let err = Assembler::new(SegmentPlan::default())
            .run(&files, &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Source(SourceError::Encode(EncodeError::Validation {
                field: "friendlyName",
                ..
            }))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_meta_object() {
        let inputs = LoadedInputs::default();
        let err = Assembler::new(SegmentPlan::default())
            .assemble(inputs)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::MissingMeta)));
    }
}
