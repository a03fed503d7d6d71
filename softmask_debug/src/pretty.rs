// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`MaskSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::fmt;
use std::io::Write;

use softmask_core::element::ElementId;
use softmask_core::trace::{
    AcquireEvent, AttachEvent, BindEvent, DetachEvent, DetachReason, MaskSink, PruneEvent,
    ReleaseEvent, UnsupportedEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    quiet_prune: bool,
}

impl<W: Write> fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("quiet_prune", &self.quiet_prune)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            quiet_prune: false,
        }
    }

    /// Skips liveness passes that removed nothing.
    #[must_use]
    pub fn quiet_prune(mut self, quiet: bool) -> Self {
        self.quiet_prune = quiet;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

/// Short form of an element handle: `#index` or `#index@generation`.
struct Id(ElementId);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.generation() {
            0 => write!(f, "#{}", self.0.index()),
            g => write!(f, "#{}@{g}", self.0.index()),
        }
    }
}

struct MaybeId(Option<ElementId>);

impl fmt::Display for MaybeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => fmt::Display::fmt(&Id(id), f),
            None => f.write_str("-"),
        }
    }
}

fn reason_name(reason: DetachReason) -> &'static str {
    match reason {
        DetachReason::Pruned => "pruned",
        DetachReason::Destroyed => "destroyed",
        DetachReason::Explicit => "explicit",
    }
}

impl<W: Write> MaskSink for PrettyPrintSink<W> {
    fn on_attach(&mut self, e: &AttachEvent) {
        let _ = writeln!(self.writer, "[attach] element={}", Id(e.element));
    }

    fn on_detach(&mut self, e: &DetachEvent) {
        let _ = writeln!(
            self.writer,
            "[detach] element={} reason={}",
            Id(e.element),
            reason_name(e.reason),
        );
    }

    fn on_bind(&mut self, e: &BindEvent) {
        let _ = writeln!(
            self.writer,
            "[bind] element={} mask={} -> {}",
            Id(e.element),
            MaybeId(e.previous),
            MaybeId(e.current),
        );
    }

    fn on_acquire(&mut self, e: &AcquireEvent) {
        let replacement = match e.replacement {
            Some(r) => r.0.to_string(),
            None => "none".to_string(),
        };
        let _ = writeln!(
            self.writer,
            "[acquire] element={} mask={} base={} replacement={replacement}",
            Id(e.element),
            Id(e.mask),
            e.base.0,
        );
    }

    fn on_release(&mut self, e: &ReleaseEvent) {
        let _ = writeln!(
            self.writer,
            "[release] element={} mask={} replacement={}",
            Id(e.element),
            Id(e.mask),
            e.replacement.0,
        );
    }

    fn on_unsupported(&mut self, e: &UnsupportedEvent) {
        let _ = writeln!(
            self.writer,
            "[warn] element={} is under mask={} but material {} does not support masking; \
             masking will not work",
            Id(e.element),
            Id(e.mask),
            e.base.0,
        );
    }

    fn on_prune(&mut self, e: &PruneEvent) {
        if self.quiet_prune && e.pruned == 0 {
            return;
        }
        let _ = writeln!(
            self.writer,
            "[prune] tick={} checked={} pruned={}",
            e.tick, e.checked, e.pruned,
        );
    }
}
