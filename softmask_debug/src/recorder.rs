// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`MaskSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Element handles are stored as their slot index and generation, so a
//! decoded handle compares equal to the one that was recorded.

use softmask_core::element::ElementId;
use softmask_core::registry::MaterialId;
use softmask_core::trace::{
    AcquireEvent, AttachEvent, BindEvent, DetachEvent, DetachReason, MaskSink, PruneEvent,
    ReleaseEvent, UnsupportedEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_ATTACH: u8 = 1;
const TAG_DETACH: u8 = 2;
const TAG_BIND: u8 = 3;
const TAG_ACQUIRE: u8 = 4;
const TAG_RELEASE: u8 = 5;
const TAG_UNSUPPORTED: u8 = 6;
const TAG_PRUNE: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`MaskSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_id(&mut self, id: ElementId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_option_id(&mut self, id: Option<ElementId>) {
        match id {
            Some(id) => {
                self.write_u8(1);
                self.write_id(id);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
                self.write_u32(0);
            }
        }
    }

    fn write_option_material(&mut self, m: Option<MaterialId>) {
        match m {
            Some(m) => {
                self.write_u8(1);
                self.write_u64(m.0);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_reason(&mut self, r: DetachReason) {
        self.write_u8(match r {
            DetachReason::Pruned => 0,
            DetachReason::Destroyed => 1,
            DetachReason::Explicit => 2,
        });
    }
}

impl MaskSink for RecorderSink {
    fn on_attach(&mut self, e: &AttachEvent) {
        self.write_u8(TAG_ATTACH);
        self.write_id(e.element);
    }

    fn on_detach(&mut self, e: &DetachEvent) {
        self.write_u8(TAG_DETACH);
        self.write_id(e.element);
        self.write_reason(e.reason);
    }

    fn on_bind(&mut self, e: &BindEvent) {
        self.write_u8(TAG_BIND);
        self.write_id(e.element);
        self.write_option_id(e.previous);
        self.write_option_id(e.current);
    }

    fn on_acquire(&mut self, e: &AcquireEvent) {
        self.write_u8(TAG_ACQUIRE);
        self.write_id(e.element);
        self.write_id(e.mask);
        self.write_u64(e.base.0);
        self.write_option_material(e.replacement);
    }

    fn on_release(&mut self, e: &ReleaseEvent) {
        self.write_u8(TAG_RELEASE);
        self.write_id(e.element);
        self.write_id(e.mask);
        self.write_u64(e.replacement.0);
    }

    fn on_unsupported(&mut self, e: &UnsupportedEvent) {
        self.write_u8(TAG_UNSUPPORTED);
        self.write_id(e.element);
        self.write_id(e.mask);
        self.write_u64(e.base.0);
    }

    fn on_prune(&mut self, e: &PruneEvent) {
        self.write_u8(TAG_PRUNE);
        self.write_u64(e.tick);
        self.write_u32(e.checked);
        self.write_u32(e.pruned);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// An [`AttachEvent`].
    Attach(AttachEvent),
    /// A [`DetachEvent`].
    Detach(DetachEvent),
    /// A [`BindEvent`].
    Bind(BindEvent),
    /// An [`AcquireEvent`].
    Acquire(AcquireEvent),
    /// A [`ReleaseEvent`].
    Release(ReleaseEvent),
    /// An [`UnsupportedEvent`].
    Unsupported(UnsupportedEvent),
    /// A [`PruneEvent`].
    Prune(PruneEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Stops at the first unknown tag or truncated record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_id(&mut self) -> Option<ElementId> {
        let index = self.read_u32()?;
        let generation = self.read_u32()?;
        Some(ElementId::from_parts(index, generation))
    }

    fn read_option_id(&mut self) -> Option<Option<ElementId>> {
        let present = self.read_u8()?;
        let id = self.read_id()?;
        Some((present != 0).then_some(id))
    }

    fn read_material(&mut self) -> Option<MaterialId> {
        self.read_u64().map(MaterialId)
    }

    fn read_option_material(&mut self) -> Option<Option<MaterialId>> {
        let present = self.read_u8()?;
        let m = self.read_material()?;
        Some((present != 0).then_some(m))
    }

    fn read_reason(&mut self) -> Option<DetachReason> {
        Some(match self.read_u8()? {
            0 => DetachReason::Pruned,
            1 => DetachReason::Destroyed,
            _ => DetachReason::Explicit,
        })
    }

    fn decode_detach(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Detach(DetachEvent {
            element: self.read_id()?,
            reason: self.read_reason()?,
        }))
    }

    fn decode_bind(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Bind(BindEvent {
            element: self.read_id()?,
            previous: self.read_option_id()?,
            current: self.read_option_id()?,
        }))
    }

    fn decode_acquire(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Acquire(AcquireEvent {
            element: self.read_id()?,
            mask: self.read_id()?,
            base: self.read_material()?,
            replacement: self.read_option_material()?,
        }))
    }

    fn decode_release(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Release(ReleaseEvent {
            element: self.read_id()?,
            mask: self.read_id()?,
            replacement: self.read_material()?,
        }))
    }

    fn decode_unsupported(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Unsupported(UnsupportedEvent {
            element: self.read_id()?,
            mask: self.read_id()?,
            base: self.read_material()?,
        }))
    }

    fn decode_prune(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Prune(PruneEvent {
            tick: self.read_u64()?,
            checked: self.read_u32()?,
            pruned: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_ATTACH => Some(RecordedEvent::Attach(AttachEvent {
                element: self.read_id()?,
            })),
            TAG_DETACH => self.decode_detach(),
            TAG_BIND => self.decode_bind(),
            TAG_ACQUIRE => self.decode_acquire(),
            TAG_RELEASE => self.decode_release(),
            TAG_UNSUPPORTED => self.decode_unsupported(),
            TAG_PRUNE => self.decode_prune(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
