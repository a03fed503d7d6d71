// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The acquire/release contract between bindings and masking ancestors.

use core::fmt;

use crate::element::ElementId;

/// An opaque handle to a backend-managed material.
///
/// Material handles are assigned by the rendering backend and passed through
/// bindings without interpretation. Both base materials and the replacement
/// materials produced by a [`MaskRegistry`] use this type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub u64);

impl fmt::Debug for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaterialId({})", self.0)
    }
}

/// Produces replacement materials that apply a mask's effect.
///
/// A registry serves every masking element in a tree. Each successful
/// [`acquire`](Self::acquire) hands out one claim on the returned material;
/// the holder gives the claim back with exactly one
/// [`release`](Self::release). Registries are expected to pool or
/// reference-count replacements, so the same [`MaterialId`] may be handed to
/// many holders at once.
///
/// Callers check that `mask` is active and enabled before acquiring; a
/// registry does not need to re-check it. Releasing is allowed regardless of
/// the mask's current state, since claims must be returned even after the
/// mask was disabled or destroyed.
pub trait MaskRegistry {
    /// Returns a replacement for `base` that applies `mask`'s effect, or
    /// `None` if `base` cannot support masking.
    ///
    /// May be called speculatively and may return the same handle for
    /// repeated identical inputs.
    fn acquire(&mut self, mask: ElementId, base: MaterialId) -> Option<MaterialId>;

    /// Gives back one claim on `replacement`, previously obtained from
    /// [`acquire`](Self::acquire) with the same `mask`.
    fn release(&mut self, mask: ElementId, replacement: MaterialId);
}

impl<R: MaskRegistry + ?Sized> MaskRegistry for &mut R {
    fn acquire(&mut self, mask: ElementId, base: MaterialId) -> Option<MaterialId> {
        (**self).acquire(mask, base)
    }

    fn release(&mut self, mask: ElementId, replacement: MaterialId) {
        (**self).release(mask, replacement);
    }
}
