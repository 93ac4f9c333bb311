// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-capacity little-endian binary writer.
//!
//! Every block in a replay container has a size that is known before the
//! first byte is written. [`BinaryWriter`] allocates exactly that many bytes
//! and refuses to grow; [`BinaryWriter::finish`] then asserts that the cursor
//! landed exactly on the declared capacity. Use [`encode_sized`] rather than
//! driving the writer by hand so the check cannot be forgotten.

use crate::error::{EncodeError, EncodeResult};
use byteorder::{ByteOrder, LittleEndian};

/// Generate bounds-checked little-endian write methods.
///
/// Each generated method reserves `$size` bytes at the cursor (returning
/// `EncodeError::CapacityExceeded` on overflow), encodes the value through
/// `byteorder`, and advances the cursor.
macro_rules! impl_write_le {
    ($name:ident, $type:ty, $size:expr, $put:ident) => {
        pub fn $name(&mut self, value: $type) -> EncodeResult<()> {
            let at = self.reserve($size)?;
            LittleEndian::$put(&mut self.buffer[at..at + $size], value);
            Ok(())
        }
    };
}

/// Cursor-based writer over a buffer of fixed, pre-declared capacity.
#[derive(Debug)]
pub struct BinaryWriter {
    buffer: Vec<u8>,
    offset: usize,
}

impl BinaryWriter {
    /// Allocate a zero-filled buffer of exactly `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity],
            offset: 0,
        }
    }

    impl_write_le!(write_i32, i32, 4, write_i32);
    impl_write_le!(write_u32, u32, 4, write_u32);
    impl_write_le!(write_i64, i64, 8, write_i64);
    impl_write_le!(write_u64, u64, 8, write_u64);

    pub fn write_u8(&mut self, value: u8) -> EncodeResult<()> {
        let at = self.reserve(1)?;
        self.buffer[at] = value;
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> EncodeResult<()> {
        let at = self.reserve(data.len())?;
        self.buffer[at..at + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Write each item in order through `write_item`. Empty input writes nothing.
    pub fn write_array<T, F>(&mut self, items: &[T], mut write_item: F) -> EncodeResult<()>
    where
        F: FnMut(&mut Self, &T) -> EncodeResult<()>,
    {
        for item in items {
            write_item(self, item)?;
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Validate the cursor against the declared capacity and release the bytes.
    pub fn finish(self) -> EncodeResult<Vec<u8>> {
        if self.offset != self.buffer.len() {
            return Err(EncodeError::SizeMismatch {
                expected: self.buffer.len(),
                written: self.offset,
            });
        }
        Ok(self.buffer)
    }

    fn reserve(&mut self, len: usize) -> EncodeResult<usize> {
        let start = self.offset;
        match start.checked_add(len) {
            Some(end) if end <= self.buffer.len() => {
                self.offset = end;
                Ok(start)
            }
            _ => Err(EncodeError::CapacityExceeded {
                offset: start,
                needed: len,
                capacity: self.buffer.len(),
            }),
        }
    }
}

/// Run `body` against a writer of exactly `capacity` bytes.
///
/// The size check runs whether or not `body` succeeds. The buffer only
/// escapes when both pass; otherwise it is dropped here and the body's error
/// takes precedence over the size check's.
pub fn encode_sized<F>(capacity: usize, body: F) -> EncodeResult<Vec<u8>>
where
    F: FnOnce(&mut BinaryWriter) -> EncodeResult<()>,
{
    let mut writer = BinaryWriter::with_capacity(capacity);
    let written = body(&mut writer);
    let checked = writer.finish();
    written.and(checked)
}
