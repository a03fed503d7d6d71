// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame evaluation and change tracking.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **ACTIVE**: Drain dirty indices, recompute each element's effective
//!    activity as `parent_effective_active && !flags.inactive`, and record
//!    the transitions.
//! 2. **HIERARCHY**: Drain dirty indices (every element whose ancestor chain
//!    changed).
//! 3. **MASK**: Drain dirty indices (elements whose mask role changed).
//! 4. **RENDERABLE**: Drain dirty indices (elements that gained a material).
//! 5. **TOPOLOGY**: Drain and discard.
//!
//! The MATERIAL channel is left alone; renderers drain it with
//! [`drain_invalidated`](ElementTree::drain_invalidated) once bindings have
//! reacted to the frame's changes.
//!
//! [`FrameChanges`] uses raw slot indices (`u32`) rather than
//! [`ElementId`](super::ElementId) handles. Convert them back with
//! [`id_at`](ElementTree::id_at).

use alloc::vec::Vec;

use super::id::INVALID;
use super::store::ElementTree;
use crate::dirty;

/// The set of changes produced by a single [`ElementTree::evaluate`] call.
///
/// Each field contains the raw slot indices of elements that changed in the
/// corresponding category. Destroyed slots never appear outside
/// [`removed`](Self::removed).
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Elements that transitioned from inactive to active in hierarchy.
    pub activated: Vec<u32>,
    /// Elements that transitioned from active to inactive in hierarchy.
    pub deactivated: Vec<u32>,
    /// Elements whose ancestor chain changed.
    pub reparented: Vec<u32>,
    /// Elements whose mask role was added, removed, enabled, or disabled.
    pub masks: Vec<u32>,
    /// Elements that gained a base material.
    pub renderable: Vec<u32>,
    /// Elements created since the last evaluate.
    pub added: Vec<u32>,
    /// Elements destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether the tree topology changed.
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.activated.clear();
        self.deactivated.clear();
        self.reparented.clear();
        self.masks.clear();
        self.renderable.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activated.is_empty()
            && self.deactivated.is_empty()
            && self.reparented.is_empty()
            && self.masks.is_empty()
            && self.renderable.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl ElementTree {
    /// Evaluates the element tree, recomputing effective activity and
    /// returning the set of changes.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn evaluate_into(&mut self, changes: &mut FrameChanges) {
        changes.clear();

        // Drain ACTIVE in parent-before-child order and recompute.
        let dirty_active: Vec<u32> = self
            .dirty
            .drain(dirty::ACTIVE)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in dirty_active {
            if !self.is_slot_alive(idx) {
                continue;
            }
            let parent_idx = self.parent[idx as usize];
            let parent_active = if parent_idx != INVALID {
                self.effective_active[parent_idx as usize]
            } else {
                true
            };
            let new_active = parent_active && !self.flags[idx as usize].inactive;
            if new_active != self.effective_active[idx as usize] {
                if new_active {
                    changes.activated.push(idx);
                } else {
                    changes.deactivated.push(idx);
                }
                self.effective_active[idx as usize] = new_active;
            }
        }

        // Drain HIERARCHY.
        changes.reparented = self
            .dirty
            .drain(dirty::HIERARCHY)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();

        // Drain MASK, local-only.
        changes.masks = self
            .dirty
            .drain(dirty::MASK)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();

        // Drain RENDERABLE, local-only.
        changes.renderable = self
            .dirty
            .drain(dirty::RENDERABLE)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();

        // Drain TOPOLOGY (just consume, changes are structural).
        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // Move lifecycle lists.
        core::mem::swap(&mut self.pending_added, &mut changes.added);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Drains the MATERIAL channel and returns the raw indices of live
    /// elements whose effective material must be re-resolved.
    pub fn drain_invalidated(&mut self) -> Vec<u32> {
        self.dirty
            .drain(dirty::MATERIAL)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect()
    }
}
