// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays element storage with allocation, topology, and property management.

use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{ElementId, INVALID};
use super::traverse::{Ancestors, Children};
use crate::dirty;
use crate::registry::MaterialId;

/// Per-element boolean flags.
///
/// Setting [`inactive`](Self::inactive) deactivates the element and its
/// entire subtree. Bindings under an inactive element drop their mask and
/// release whatever replacement they held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ElementFlags {
    /// Whether the element (and its subtree) is switched off.
    pub inactive: bool,
}

/// A masking role carried by an element.
///
/// Descendants of an element with a mask role bind to it. A disabled role
/// still counts for ancestor discovery, but yields no replacements until it
/// is enabled again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaskRole {
    /// Whether the mask currently applies its effect.
    pub enabled: bool,
}

impl MaskRole {
    /// An enabled mask.
    pub const ENABLED: Self = Self { enabled: true };
    /// A mask that is present but switched off.
    pub const DISABLED: Self = Self { enabled: false };
}

impl Default for MaskRole {
    fn default() -> Self {
        Self::ENABLED
    }
}

/// Struct-of-arrays storage for all elements.
///
/// Elements are addressed by [`ElementId`] handles. Internally, each element
/// occupies a slot in parallel arrays. Destroyed elements are recycled via a
/// free list, and generation counters prevent stale handle access.
#[derive(Debug)]
pub struct ElementTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties (set by the host) --
    pub(crate) flags: Vec<ElementFlags>,
    pub(crate) mask_role: Vec<Option<MaskRole>>,
    pub(crate) material: Vec<Option<MaterialId>>,

    // -- Computed properties (written by evaluate) --
    pub(crate) effective_active: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<u32>,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    /// Creates an empty element tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            flags: Vec::new(),
            mask_role: Vec::new(),
            material: Vec::new(),
            effective_active: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new element and returns its handle.
    ///
    /// The element starts active, with no mask role, no material, and no
    /// parent.
    pub fn create_element(&mut self) -> ElementId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot. The generation was bumped on destroy.
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.flags[idx as usize] = ElementFlags::default();
            self.mask_role[idx as usize] = None;
            self.material[idx as usize] = None;
            self.effective_active[idx as usize] = true;
            self.alive[idx as usize] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.flags.push(ElementFlags::default());
            self.mask_role.push(None);
            self.material.push(None);
            self.effective_active.push(true);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        ElementId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys an element, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the element has children (remove them first) or if the
    /// handle is stale.
    pub fn destroy_element(&mut self, id: ElementId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy element with children"
        );

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::TOPOLOGY);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.alive[idx as usize] = false;

        self.free_list.push(idx);
        self.pending_removed.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live element.
    #[must_use]
    pub fn is_alive(&self, id: ElementId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Returns the live handle occupying raw slot `idx`, if any.
    ///
    /// Use this to turn indices reported by [`FrameChanges`](super::FrameChanges)
    /// back into handles.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> Option<ElementId> {
        if !self.is_slot_alive(idx) {
            return None;
        }
        Some(ElementId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// Marks HIERARCHY and ACTIVE for `child`'s subtree so its bindings re-run
    /// ancestor discovery and its activity is recomputed under the new
    /// ancestry.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        self.link_last(parent.idx, child.idx);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the element has no parent.
    pub fn remove_from_parent(&mut self, child: ElementId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "element has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::ACTIVE);
        self.dirty.remove_dependency(c, p, dirty::HIERARCHY);

        self.mark_subtree_moved(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to be the last child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: ElementId, new_parent: ElementId) {
        self.validate(child);
        self.validate(new_parent);

        let c = child.idx;
        if self.parent[c as usize] != INVALID {
            let old_p = self.parent[c as usize];
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old_p, dirty::ACTIVE);
            self.dirty.remove_dependency(c, old_p, dirty::HIERARCHY);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }

        self.link_last(new_parent.idx, c);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or
    /// `sibling` has no parent.
    pub fn insert_before(&mut self, child: ElementId, sibling: ElementId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `sibling` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        let _ = self.dirty.add_dependency(c, p, dirty::ACTIVE);
        let _ = self.dirty.add_dependency(c, p, dirty::HIERARCHY);

        self.mark_subtree_moved(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Returns the parent of an element, if any.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.validate(id);
        self.id_of_parent(id.idx)
    }

    /// Returns an iterator over the direct children of an element.
    #[must_use]
    pub fn children(&self, id: ElementId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over the ancestors of an element, nearest first.
    ///
    /// The element itself is not included.
    #[must_use]
    pub fn ancestors(&self, id: ElementId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, self.parent[id.idx as usize])
    }

    /// Returns whether `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: ElementId, id: ElementId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// Returns the nearest strict ancestor of `id` that carries a mask role,
    /// enabled or not.
    #[must_use]
    pub fn nearest_mask(&self, id: ElementId) -> Option<ElementId> {
        self.ancestors(id)
            .find(|a| self.mask_role[a.idx as usize].is_some())
    }

    // -- Property getters --

    /// Returns the flags of an element.
    #[must_use]
    pub fn flags(&self, id: ElementId) -> ElementFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the mask role of an element, if it carries one.
    #[must_use]
    pub fn mask_role(&self, id: ElementId) -> Option<MaskRole> {
        self.validate(id);
        self.mask_role[id.idx as usize]
    }

    /// Returns the base material of an element.
    #[must_use]
    pub fn material(&self, id: ElementId) -> Option<MaterialId> {
        self.validate(id);
        self.material[id.idx as usize]
    }

    /// Returns whether the element and all of its ancestors are active.
    ///
    /// Walks the ancestor chain, so the answer is current even before
    /// [`evaluate`](Self::evaluate) runs.
    #[must_use]
    pub fn is_active_in_hierarchy(&self, id: ElementId) -> bool {
        self.validate(id);
        let mut idx = id.idx;
        while idx != INVALID {
            if self.flags[idx as usize].inactive {
                return false;
            }
            idx = self.parent[idx as usize];
        }
        true
    }

    /// Returns whether `mask` is alive, carries an enabled mask role, and is
    /// active in hierarchy.
    ///
    /// Unlike most accessors this accepts stale handles and answers `false`,
    /// since bindings may outlive the mask they were bound to.
    #[must_use]
    pub fn is_mask_active(&self, mask: ElementId) -> bool {
        self.is_alive(mask)
            && self.mask_role[mask.idx as usize].is_some_and(|role| role.enabled)
            && self.is_active_in_hierarchy(mask)
    }

    /// Returns the activity computed by the last [`evaluate`](Self::evaluate).
    #[must_use]
    pub fn effective_active(&self, id: ElementId) -> bool {
        self.validate(id);
        self.effective_active[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the flags of an element.
    ///
    /// Marks the ACTIVE channel dirty with eager propagation to descendants.
    pub fn set_flags(&mut self, id: ElementId, flags: ElementFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        self.dirty.mark_with(id.idx, dirty::ACTIVE, &EagerPolicy);
    }

    /// Shorthand for toggling [`ElementFlags::inactive`].
    pub fn set_active(&mut self, id: ElementId, active: bool) {
        self.set_flags(id, ElementFlags { inactive: !active });
    }

    /// Adds, removes, or updates the mask role of an element.
    ///
    /// Marks the MASK channel if the role actually changed.
    pub fn set_mask_role(&mut self, id: ElementId, role: Option<MaskRole>) {
        self.validate(id);
        if self.mask_role[id.idx as usize] != role {
            self.mask_role[id.idx as usize] = role;
            self.dirty.mark(id.idx, dirty::MASK);
        }
    }

    /// Sets the base material of an element.
    ///
    /// Marks the MATERIAL channel if the material actually changed, and the
    /// RENDERABLE channel if the element had no material before.
    pub fn set_material(&mut self, id: ElementId, material: Option<MaterialId>) {
        self.validate(id);
        let previous = self.material[id.idx as usize];
        if previous != material {
            self.material[id.idx as usize] = material;
            self.dirty.mark(id.idx, dirty::MATERIAL);
            if previous.is_none() {
                self.dirty.mark(id.idx, dirty::RENDERABLE);
            }
        }
    }

    /// Requests that the element's effective material be re-resolved before
    /// its next draw.
    pub fn invalidate_material(&mut self, id: ElementId) {
        self.validate(id);
        self.dirty.mark(id.idx, dirty::MATERIAL);
    }

    // -- Internal helpers --

    /// Returns whether raw slot `idx` holds a live element.
    pub(crate) fn is_slot_alive(&self, idx: u32) -> bool {
        self.alive.get(idx as usize).copied().unwrap_or(false)
    }

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: ElementId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale ElementId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn id_of_parent(&self, idx: u32) -> Option<ElementId> {
        let p = self.parent[idx as usize];
        if p == INVALID {
            None
        } else {
            Some(ElementId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Appends `c` to `p`'s child list and wires its dependency edges.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for ACTIVE and HIERARCHY.
        let _ = self.dirty.add_dependency(c, p, dirty::ACTIVE);
        let _ = self.dirty.add_dependency(c, p, dirty::HIERARCHY);

        self.mark_subtree_moved(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree rooted at `idx` as moved: new ancestry, possibly new
    /// activity.
    fn mark_subtree_moved(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::HIERARCHY, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::ACTIVE, &EagerPolicy);
    }
}
