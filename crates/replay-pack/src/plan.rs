// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Segment selection and ordering.
//!
//! The encoder emits segments exactly as given. Which segments go in, and in
//! what order, is decided here from loaded inputs and a [`SegmentPlan`].

use crate::chunk::{ChunkType, DataChunk, Segment};
use crate::progress::{Counter, Progress};
use crate::source::{EventSource, MetadataDocument};

/// Default category order: header, data, events, checkpoints.
pub const DEFAULT_ORDER: [ChunkType; 4] = [
    ChunkType::Header,
    ChunkType::Data,
    ChunkType::Event,
    ChunkType::Checkpoint,
];

/// A loaded replay data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFile {
    /// Display name (usually the file name).
    pub name: String,
    pub data: Vec<u8>,
}

impl StreamFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Selection and ordering policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentPlan {
    /// Category order in the output.
    pub order: Vec<ChunkType>,

    /// Maximum data files considered (None = all).
    pub data_limit: Option<usize>,

    /// Maximum event records considered (None = all).
    pub event_limit: Option<usize>,

    /// Maximum checkpoint records considered (None = all).
    pub checkpoint_limit: Option<usize>,

    /// Document array backing event chunks.
    pub event_source: EventSource,

    /// Document array backing checkpoint chunks.
    pub checkpoint_source: EventSource,

    /// Drop zero-length data files.
    pub skip_empty_data: bool,
}

impl Default for SegmentPlan {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER.to_vec(),
            data_limit: None,
            event_limit: None,
            checkpoint_limit: None,
            event_source: EventSource::EventsPavlov,
            checkpoint_source: EventSource::Events,
            skip_empty_data: true,
        }
    }
}

/// Ordered segments ready for encoding.
#[derive(Debug, Clone, Default)]
pub struct PlannedSegments {
    pub segments: Vec<Segment>,

    /// Initial progress: every counter at zero, `max` = planned count.
    pub progress: Progress,

    /// Names of data files dropped for being empty.
    pub empty_streams: Vec<String>,
}

impl SegmentPlan {
    pub fn data_limit(mut self, limit: usize) -> Self {
        self.data_limit = Some(limit);
        self
    }

    pub fn event_limit(mut self, limit: usize) -> Self {
        self.event_limit = Some(limit);
        self
    }

    pub fn checkpoint_limit(mut self, limit: usize) -> Self {
        self.checkpoint_limit = Some(limit);
        self
    }

    pub fn checkpoint_source(mut self, source: EventSource) -> Self {
        self.checkpoint_source = source;
        self
    }

    pub fn order(mut self, order: Vec<ChunkType>) -> Self {
        self.order = order;
        self
    }

    /// Select and order segments.
    ///
    /// Limits count positions in the source list, so a dropped record (empty
    /// data file) still uses up one position.
    pub fn build(
        &self,
        header: Vec<u8>,
        streams: Vec<StreamFile>,
        document: &MetadataDocument,
    ) -> PlannedSegments {
        let mut planned = PlannedSegments::default();
        let mut header = Some(header);
        let mut streams = Some(streams);

        for kind in &self.order {
            let before = planned.segments.len();
            match kind {
                ChunkType::Header => {
                    if let Some(data) = header.take() {
                        planned.segments.push(Segment::Header(data));
                    }
                }
                ChunkType::Data => {
                    let files = streams.take().unwrap_or_default();
                    for file in take_limit(files, self.data_limit) {
                        if self.skip_empty_data && file.data.is_empty() {
                            planned.empty_streams.push(file.name);
                            continue;
                        }
                        planned
                            .segments
                            .push(Segment::Data(DataChunk::new(0, 0, file.data)));
                    }
                }
                ChunkType::Event => {
                    let records = document.events(self.event_source);
                    for raw in take_limit(records.iter(), self.event_limit) {
                        planned.segments.push(Segment::Event(raw.to_chunk()));
                    }
                }
                ChunkType::Checkpoint => {
                    let records = document.events(self.checkpoint_source);
                    for raw in take_limit(records.iter(), self.checkpoint_limit) {
                        planned.segments.push(Segment::Checkpoint(raw.to_chunk()));
                    }
                }
            }
            let added = planned.segments.len() - before;
            *planned.progress.counter_mut(*kind) = Counter::new(added);
        }

        planned
    }
}

fn take_limit<I: IntoIterator>(items: I, limit: Option<usize>) -> impl Iterator<Item = I::Item> {
    items.into_iter().take(limit.unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> MetadataDocument {
        let value = json!({
            "meta": {},
            "events": { "events": [
                { "id": "cp0", "group": "checkpoint" },
                { "id": "cp1", "group": "checkpoint" }
            ]},
            "events_pavlov": { "events": [
                { "id": "e0", "group": "combat" },
                { "group": "combat" },
                { "id": "e2", "group": "combat" }
            ]}
        });
        MetadataDocument::from_slice(value.to_string().as_bytes()).expect("parse")
    }

    fn streams() -> Vec<StreamFile> {
        vec![
            StreamFile::new("stream.0", vec![1, 2]),
            StreamFile::new("stream.1", vec![]),
            StreamFile::new("stream.2", vec![3]),
        ]
    }

    fn kinds(planned: &PlannedSegments) -> Vec<i32> {
        planned.segments.iter().map(Segment::tag).collect()
    }

    #[test]
    fn test_default_order() {
        let planned = SegmentPlan::default().build(vec![0xAA], streams(), &document());
        assert_eq!(kinds(&planned), vec![0, 1, 1, 3, 3, 3, 2, 2]);
        assert_eq!(planned.empty_streams, vec!["stream.1".to_string()]);

        assert_eq!(planned.progress.header, Counter::new(1));
        assert_eq!(planned.progress.data_chunks, Counter::new(2));
        assert_eq!(planned.progress.event_chunks, Counter::new(3));
        assert_eq!(planned.progress.checkpoint_chunks, Counter::new(2));
    }

    #[test]
    fn test_records_missing_fields_are_kept_for_encoder() {
        let planned = SegmentPlan::default().build(vec![], vec![], &document());
        match &planned.segments[2] {
            Segment::Event(chunk) => assert_eq!(chunk.id, None),
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_limits_count_positions() {
        let plan = SegmentPlan::default()
            .data_limit(2)
            .event_limit(1)
            .checkpoint_limit(0);
        let planned = plan.build(vec![], streams(), &document());
        // stream.1 is empty but still consumes one of the two data positions
        assert_eq!(kinds(&planned), vec![0, 1, 3]);
        assert_eq!(planned.progress.checkpoint_chunks, Counter::new(0));
    }

    #[test]
    fn test_keep_empty_data() {
        let plan = SegmentPlan {
            skip_empty_data: false,
            ..Default::default()
        };
        let planned = plan.build(vec![], streams(), &document());
        assert_eq!(planned.progress.data_chunks, Counter::new(3));
        assert!(planned.empty_streams.is_empty());
    }

    #[test]
    fn test_custom_order_and_sources() {
        let plan = SegmentPlan::default()
            .order(vec![ChunkType::Header, ChunkType::Checkpoint, ChunkType::Data])
            .checkpoint_source(EventSource::EventsPavlov);
        let planned = plan.build(vec![], streams(), &document());
        assert_eq!(kinds(&planned), vec![0, 2, 2, 2, 1, 1]);
        assert_eq!(planned.progress.event_chunks, Counter::new(0));
    }
}
