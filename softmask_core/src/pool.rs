// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-counted replacement materials.
//!
//! [`ReplacementPool`] is a ready-made [`MaskRegistry`]. It keeps one entry
//! per (mask, base material) pair, hands the same replacement to every
//! binding that asks for it, and destroys the replacement when the last claim
//! comes back. Creating and destroying the actual material is delegated to a
//! [`MaterialReplacer`] supplied by the rendering backend.

use alloc::vec::Vec;

use crate::element::ElementId;
use crate::registry::{MaskRegistry, MaterialId};

/// Creates and destroys replacement materials on behalf of a
/// [`ReplacementPool`].
pub trait MaterialReplacer {
    /// Builds a replacement of `base` that applies `mask`, or returns `None`
    /// if `base` cannot be masked.
    fn create(&mut self, mask: ElementId, base: MaterialId) -> Option<MaterialId>;

    /// Destroys a replacement returned by [`create`](Self::create) once no
    /// one uses it anymore.
    fn destroy(&mut self, replacement: MaterialId);
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    mask: ElementId,
    base: MaterialId,
    replacement: MaterialId,
    use_count: u32,
}

/// A [`MaskRegistry`] that shares replacements by use count.
#[derive(Debug)]
pub struct ReplacementPool<F> {
    replacer: F,
    entries: Vec<Entry>,
}

impl<F: MaterialReplacer> ReplacementPool<F> {
    /// Creates an empty pool around `replacer`.
    #[must_use]
    pub fn new(replacer: F) -> Self {
        Self {
            replacer,
            entries: Vec::new(),
        }
    }

    /// Returns the number of live replacements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no replacement is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns how many claims are outstanding on the replacement for
    /// `base` under `mask`.
    #[must_use]
    pub fn use_count(&self, mask: ElementId, base: MaterialId) -> u32 {
        self.entries
            .iter()
            .find(|e| e.mask == mask && e.base == base)
            .map_or(0, |e| e.use_count)
    }

    /// Returns the replacer.
    #[must_use]
    pub fn replacer(&self) -> &F {
        &self.replacer
    }

    /// Consumes the pool and returns the replacer.
    ///
    /// Replacements still in use are not destroyed.
    #[must_use]
    pub fn into_replacer(self) -> F {
        self.replacer
    }
}

impl<F: MaterialReplacer> MaskRegistry for ReplacementPool<F> {
    fn acquire(&mut self, mask: ElementId, base: MaterialId) -> Option<MaterialId> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.mask == mask && e.base == base)
        {
            entry.use_count += 1;
            return Some(entry.replacement);
        }
        let replacement = self.replacer.create(mask, base)?;
        self.entries.push(Entry {
            mask,
            base,
            replacement,
            use_count: 1,
        });
        Some(replacement)
    }

    fn release(&mut self, mask: ElementId, replacement: MaterialId) {
        let pos = self
            .entries
            .iter()
            .position(|e| e.mask == mask && e.replacement == replacement);
        debug_assert!(pos.is_some(), "released unknown replacement {replacement:?}");
        let Some(pos) = pos else {
            return;
        };
        let entry = &mut self.entries[pos];
        entry.use_count -= 1;
        if entry.use_count == 0 {
            let entry = self.entries.swap_remove(pos);
            self.replacer.destroy(entry.replacement);
        }
    }
}
