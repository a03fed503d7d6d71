// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by unit tests.

use alloc::vec::Vec;

use crate::element::ElementId;
use crate::registry::{MaskRegistry, MaterialId};

/// A registry call, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    Acquire(ElementId, MaterialId),
    Release(ElementId, MaterialId),
}

/// The replacement [`CountingRegistry`] hands out for `base` under `mask`.
pub(crate) fn replacement_for(mask: ElementId, base: MaterialId) -> MaterialId {
    MaterialId(1_000 * (u64::from(mask.index()) + 1) + base.0)
}

/// A [`MaskRegistry`] that records every call and checks pairing.
///
/// Supports masking only for the base materials it was built with.
#[derive(Debug, Default)]
pub(crate) struct CountingRegistry {
    supported: Vec<MaterialId>,
    claims: Vec<(ElementId, MaterialId)>,
    pub(crate) ops: Vec<Op>,
    pub(crate) acquires: u32,
    pub(crate) acquires_ok: u32,
    pub(crate) releases: u32,
}

impl CountingRegistry {
    pub(crate) fn supporting(bases: &[MaterialId]) -> Self {
        Self {
            supported: bases.to_vec(),
            ..Self::default()
        }
    }

    /// Claims handed out and not yet released.
    pub(crate) fn outstanding(&self) -> usize {
        self.claims.len()
    }
}

impl MaskRegistry for CountingRegistry {
    fn acquire(&mut self, mask: ElementId, base: MaterialId) -> Option<MaterialId> {
        self.ops.push(Op::Acquire(mask, base));
        self.acquires += 1;
        if !self.supported.contains(&base) {
            return None;
        }
        self.acquires_ok += 1;
        let replacement = replacement_for(mask, base);
        self.claims.push((mask, replacement));
        Some(replacement)
    }

    fn release(&mut self, mask: ElementId, replacement: MaterialId) {
        self.ops.push(Op::Release(mask, replacement));
        self.releases += 1;
        let pos = self
            .claims
            .iter()
            .position(|&c| c == (mask, replacement))
            .unwrap_or_else(|| panic!("release without acquire: {replacement:?} from {mask:?}"));
        self.claims.swap_remove(pos);
    }
}
