// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for mask bindings.
//!
//! This module provides a [`MaskSink`] trait with per-event methods that
//! [`Maskables`](crate::maskables::Maskables) calls as bindings attach, bind,
//! acquire, release, and get pruned. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! The "masking will not work" warning is also delivered here, as
//! [`UnsupportedEvent`]. It fires once per run of unsupported resolutions,
//! never once per frame.
//!
//! [`Tracer`] wraps an optional `&mut dyn MaskSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::element::ElementId;
use crate::registry::MaterialId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a binding was removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetachReason {
    /// The liveness pass found no masking ancestor.
    Pruned,
    /// The owning element was destroyed.
    Destroyed,
    /// The host removed the binding explicitly.
    Explicit,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a binding is created for an element.
#[derive(Clone, Copy, Debug)]
pub struct AttachEvent {
    /// The owning element.
    pub element: ElementId,
}

/// Emitted when a binding is removed.
#[derive(Clone, Copy, Debug)]
pub struct DetachEvent {
    /// The owning element. May already be dead.
    pub element: ElementId,
    /// Why the binding went away.
    pub reason: DetachReason,
}

/// Emitted when a binding's masking ancestor changes.
#[derive(Clone, Copy, Debug)]
pub struct BindEvent {
    /// The owning element.
    pub element: ElementId,
    /// The mask bound before the change.
    pub previous: Option<ElementId>,
    /// The mask bound after the change.
    pub current: Option<ElementId>,
}

/// Emitted after a binding asked the registry for a replacement.
#[derive(Clone, Copy, Debug)]
pub struct AcquireEvent {
    /// The owning element.
    pub element: ElementId,
    /// The mask the replacement was requested from.
    pub mask: ElementId,
    /// The base material.
    pub base: MaterialId,
    /// The replacement handed out, or `None` if unsupported.
    pub replacement: Option<MaterialId>,
}

/// Emitted when a binding gives back a replacement claim.
#[derive(Clone, Copy, Debug)]
pub struct ReleaseEvent {
    /// The owning element. May already be dead.
    pub element: ElementId,
    /// The mask the replacement came from.
    pub mask: ElementId,
    /// The released replacement.
    pub replacement: MaterialId,
}

/// Masking will not work on an element because its base material does not
/// support it.
#[derive(Clone, Copy, Debug)]
pub struct UnsupportedEvent {
    /// The element drawn without masking.
    pub element: ElementId,
    /// The mask that could not apply.
    pub mask: ElementId,
    /// The incompatible base material.
    pub base: MaterialId,
}

/// Summary of one liveness pass.
#[derive(Clone, Copy, Debug)]
pub struct PruneEvent {
    /// Liveness tick counter.
    pub tick: u64,
    /// Bindings examined.
    pub checked: u32,
    /// Bindings removed.
    pub pruned: u32,
}

// ---------------------------------------------------------------------------
// MaskSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from mask bindings.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait MaskSink {
    /// Called when a binding is created.
    fn on_attach(&mut self, e: &AttachEvent) {
        _ = e;
    }

    /// Called when a binding is removed.
    fn on_detach(&mut self, e: &DetachEvent) {
        _ = e;
    }

    /// Called when a binding's mask changes.
    fn on_bind(&mut self, e: &BindEvent) {
        _ = e;
    }

    /// Called after each registry acquire.
    fn on_acquire(&mut self, e: &AcquireEvent) {
        _ = e;
    }

    /// Called after each registry release.
    fn on_release(&mut self, e: &ReleaseEvent) {
        _ = e;
    }

    /// Called on the first unsupported resolution of a streak.
    fn on_unsupported(&mut self, e: &UnsupportedEvent) {
        _ = e;
    }

    /// Called after each liveness pass.
    fn on_prune(&mut self, e: &PruneEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`MaskSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl MaskSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`MaskSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn MaskSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn MaskSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn MaskSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits an [`AttachEvent`].
    #[inline]
    pub fn attach(&mut self, e: &AttachEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_attach(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DetachEvent`].
    #[inline]
    pub fn detach(&mut self, e: &DetachEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_detach(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BindEvent`].
    #[inline]
    pub fn bind(&mut self, e: &BindEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_bind(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`AcquireEvent`].
    #[inline]
    pub fn acquire(&mut self, e: &AcquireEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_acquire(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ReleaseEvent`].
    #[inline]
    pub fn release(&mut self, e: &ReleaseEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_release(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`UnsupportedEvent`].
    #[inline]
    pub fn unsupported(&mut self, e: &UnsupportedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_unsupported(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PruneEvent`].
    #[inline]
    pub fn prune(&mut self, e: &PruneEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_prune(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn element(idx: u32) -> ElementId {
        ElementId::from_parts(idx, 0)
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_attach(&AttachEvent {
            element: element(1),
        });
        sink.on_unsupported(&UnsupportedEvent {
            element: element(1),
            mask: element(0),
            base: MaterialId(7),
        });
        sink.on_prune(&PruneEvent {
            tick: 3,
            checked: 2,
            pruned: 1,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.bind(&BindEvent {
            element: element(1),
            previous: None,
            current: Some(element(0)),
        });
        tracer.release(&ReleaseEvent {
            element: element(1),
            mask: element(0),
            replacement: MaterialId(9),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            warnings: Vec<MaterialId>,
        }
        impl MaskSink for RecordingSink {
            fn on_unsupported(&mut self, e: &UnsupportedEvent) {
                self.warnings.push(e.base);
            }
        }

        let mut sink = RecordingSink {
            warnings: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.unsupported(&UnsupportedEvent {
            element: element(2),
            mask: element(0),
            base: MaterialId(42),
        });
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.warnings, &[MaterialId(42)]);
    }
}
