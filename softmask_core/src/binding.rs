// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element mask binding.
//!
//! A [`MaskableBinding`] is attached to one renderable element. It remembers
//! which masking ancestor currently applies and which replacement material it
//! holds a claim on, and it is the place where the renderer's base material
//! is turned into the material actually drawn.
//!
//! # State machine
//!
//! ```text
//!              enable / reparent (mask found)
//!   Unbound ─────────────────────────────────► Bound
//!      ▲                                        │  ▲
//!      │ disable / no mask / owner destroyed    │  │ resolve
//!      └────────────────────────────────────────┘  ▼
//!                                              Holding
//! ```
//!
//! Every change of the bound mask goes through [`MaskableBinding::set_mask`]:
//! the held claim is released first, then the new mask is stored, then the
//! owner's material is invalidated.
//!
//! # Claim ordering
//!
//! [`resolve`](MaskableBinding::resolve) acquires the new replacement
//! *before* releasing the previous claim. A pooled registry can then hand
//! back the same replacement without destroying and recreating it in
//! between.

use crate::element::{ElementId, ElementTree};
use crate::registry::{MaskRegistry, MaterialId};

/// Outcome of resolving a base material through a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// No active mask applies; draw the base material.
    Unmasked(MaterialId),
    /// Draw this replacement material.
    Replaced(MaterialId),
    /// A mask applies but the base material cannot support it; draw the base.
    Unsupported {
        /// The base material, drawn unmasked.
        base: MaterialId,
        /// `true` on the first unsupported resolution of a streak. Callers
        /// surface a warning only when this is set.
        warn: bool,
    },
}

impl Resolution {
    /// Returns the material the renderer should draw with.
    #[must_use]
    pub const fn material(self) -> MaterialId {
        match self {
            Self::Unmasked(m) | Self::Replaced(m) | Self::Unsupported { base: m, .. } => m,
        }
    }

    /// Returns whether this resolution asks for a warning.
    #[must_use]
    pub const fn should_warn(self) -> bool {
        matches!(self, Self::Unsupported { warn: true, .. })
    }
}

/// Coarse binding state, as seen from outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// No mask is bound.
    Unbound,
    /// A mask is bound but no replacement is held.
    Bound,
    /// A mask is bound and a replacement claim is held.
    Holding,
}

/// One outstanding acquisition: the replacement and the base it was
/// acquired for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Claim {
    base: MaterialId,
    replacement: MaterialId,
}

/// Mask state for one renderable element.
///
/// Holds at most one replacement claim at a time, and only while bound to a
/// mask that was active when the claim was acquired. The owner and mask are
/// non-owning [`ElementId`] handles; the binding never creates or destroys
/// elements.
#[derive(Debug)]
pub struct MaskableBinding {
    owner: ElementId,
    mask: Option<ElementId>,
    held: Option<Claim>,
    warned: bool,
}

impl MaskableBinding {
    /// Creates an unbound binding for `owner`.
    #[must_use]
    pub fn new(owner: ElementId) -> Self {
        Self {
            owner,
            mask: None,
            held: None,
            warned: false,
        }
    }

    /// Returns the element this binding belongs to.
    #[must_use]
    pub fn owner(&self) -> ElementId {
        self.owner
    }

    /// Returns the currently bound mask.
    #[must_use]
    pub fn mask(&self) -> Option<ElementId> {
        self.mask
    }

    /// Returns the replacement currently held, if any.
    #[must_use]
    pub fn replacement(&self) -> Option<MaterialId> {
        self.held.map(|c| c.replacement)
    }

    /// Returns whether the current unsupported streak was already reported.
    #[must_use]
    pub fn is_warned(&self) -> bool {
        self.warned
    }

    /// Returns the coarse state of the binding.
    #[must_use]
    pub fn state(&self) -> BindingState {
        match (self.mask, self.held) {
            (None, _) => BindingState::Unbound,
            (Some(_), None) => BindingState::Bound,
            (Some(_), Some(_)) => BindingState::Holding,
        }
    }

    /// Resolves the material to draw for `base`.
    ///
    /// With no active mask bound, any held claim is released and `base` comes
    /// back unchanged. Otherwise a claim acquired earlier for the same `base`
    /// is reused as is; for a new `base` the registry is asked first, and
    /// only then is the previous claim released.
    pub fn resolve<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &ElementTree,
        registry: &mut R,
        base: MaterialId,
    ) -> Resolution {
        let Some(mask) = self.mask.filter(|&m| tree.is_mask_active(m)) else {
            self.set_claim(None, registry);
            return Resolution::Unmasked(base);
        };

        if let Some(claim) = self.held
            && claim.base == base
        {
            return Resolution::Replaced(claim.replacement);
        }

        let replacement = registry.acquire(mask, base);
        self.set_claim(
            replacement.map(|replacement| Claim { base, replacement }),
            registry,
        );
        match replacement {
            Some(replacement) => {
                self.warned = false;
                Resolution::Replaced(replacement)
            }
            None => {
                let warn = !self.warned;
                self.warned = true;
                Resolution::Unsupported { base, warn }
            }
        }
    }

    /// Returns the nearest masking ancestor of the owner.
    ///
    /// # Panics
    ///
    /// Panics if the owner is no longer alive.
    #[must_use]
    pub fn find_mask(&self, tree: &ElementTree) -> Option<ElementId> {
        tree.nearest_mask(self.owner)
    }

    /// Rebinds to `mask`.
    ///
    /// If the mask actually changes, the held claim is released, the new mask
    /// is stored, the warning streak is reset, and the owner's material is
    /// invalidated. Returns whether anything changed.
    pub fn set_mask<R: MaskRegistry + ?Sized>(
        &mut self,
        mask: Option<ElementId>,
        tree: &mut ElementTree,
        registry: &mut R,
    ) -> bool {
        if self.mask == mask {
            return false;
        }
        if self.mask.is_some() {
            self.set_claim(None, registry);
        }
        self.mask = mask;
        self.warned = false;
        self.invalidate(tree);
        true
    }

    /// Marks the owner's material dirty so the renderer resolves it again.
    ///
    /// Does nothing if the owner is gone.
    pub fn invalidate(&self, tree: &mut ElementTree) {
        if tree.is_alive(self.owner) {
            tree.invalidate_material(self.owner);
        }
    }

    /// Handles the owner becoming active: rebinds to the nearest mask.
    pub fn on_enable<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
    ) -> bool {
        let found = self.find_mask(tree);
        self.set_mask(found, tree, registry)
    }

    /// Handles the owner becoming inactive: drops the mask and its claim.
    pub fn on_disable<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
    ) -> bool {
        self.set_mask(None, tree, registry)
    }

    /// Handles a change in the owner's ancestor chain.
    pub fn on_reparent<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
    ) -> bool {
        let found = self.find_mask(tree);
        self.set_mask(found, tree, registry)
    }

    /// Handles the owner's destruction: gives back the held claim and
    /// forgets the mask without touching the tree.
    pub fn teardown<R: MaskRegistry + ?Sized>(&mut self, registry: &mut R) {
        self.set_claim(None, registry);
        self.mask = None;
        self.warned = false;
    }

    /// Replaces the held claim, releasing the previous one exactly once.
    fn set_claim<R: MaskRegistry + ?Sized>(&mut self, claim: Option<Claim>, registry: &mut R) {
        if let Some(old) = self.held.take() {
            debug_assert!(self.mask.is_some(), "replacement held without a mask");
            if let Some(mask) = self.mask {
                registry.release(mask, old.replacement);
            }
        }
        self.held = claim;
    }
}
