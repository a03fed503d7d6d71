// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry of live mask bindings.
//!
//! [`Maskables`] owns one [`MaskableBinding`] per bound element and is the
//! only thing a host needs to talk to:
//!
//! - [`apply`](Maskables::apply) turns the [`FrameChanges`] of one
//!   [`ElementTree::evaluate`] call into binding lifecycle notifications:
//!   destroy, disable, enable, reparent, and mask-role changes.
//! - [`tick`](Maskables::tick) / [`prune`](Maskables::prune) is the liveness
//!   pass that removes bindings whose element no longer sits under a mask.
//! - [`resolve`](Maskables::resolve) and [`refresh`](Maskables::refresh) are
//!   the renderer-facing entry points.
//!
//! Bindings are stored by the owner's raw slot index, in the same
//! struct-of-arrays spirit as the tree itself.

use alloc::vec::Vec;

use crate::binding::{MaskableBinding, Resolution};
use crate::config::MaskableConfig;
use crate::element::{ElementId, ElementTree, FrameChanges};
use crate::registry::{MaskRegistry, MaterialId};
use crate::render::Renderer;
use crate::trace::{
    AcquireEvent, AttachEvent, BindEvent, DetachEvent, DetachReason, PruneEvent, ReleaseEvent,
    Tracer, UnsupportedEvent,
};

/// All mask bindings of one element tree.
#[derive(Debug, Default)]
pub struct Maskables {
    config: MaskableConfig,
    bindings: Vec<Option<MaskableBinding>>,
    ticks: u64,
}

impl Maskables {
    /// Creates an empty binding set.
    #[must_use]
    pub fn new(config: MaskableConfig) -> Self {
        Self {
            config,
            bindings: Vec::new(),
            ticks: 0,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> MaskableConfig {
        self.config
    }

    /// Returns the number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.iter().flatten().count()
    }

    /// Returns `true` if there are no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.iter().all(Option::is_none)
    }

    /// Returns the number of liveness ticks seen so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Returns the binding attached to `element`, if any.
    #[must_use]
    pub fn binding(&self, element: ElementId) -> Option<&MaskableBinding> {
        self.bindings
            .get(element.idx as usize)?
            .as_ref()
            .filter(|b| b.owner() == element)
    }

    /// Returns an iterator over all bindings, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &MaskableBinding> {
        self.bindings.iter().flatten()
    }

    // -- Attachment --

    /// Attaches a binding to `element` unless it already has one.
    ///
    /// An element that is active in hierarchy binds to its nearest mask
    /// right away. Returns whether a binding was created.
    ///
    /// # Panics
    ///
    /// Panics if `element` is stale.
    pub fn attach<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        element: ElementId,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        tree.validate(element);
        let slot = element.idx as usize;
        if self.bindings.len() <= slot {
            self.bindings.resize_with(slot + 1, || None);
        }
        match self.bindings[slot].take() {
            Some(existing) if existing.owner() == element => {
                self.bindings[slot] = Some(existing);
                return false;
            }
            // Left behind by a destroyed owner whose removal was not applied yet.
            Some(mut stale) => {
                stale_teardown(&mut stale, registry, tracer);
            }
            None => {}
        }

        let mut binding = MaskableBinding::new(element);
        tracer.attach(&AttachEvent { element });
        if tree.is_active_in_hierarchy(element) {
            let found = binding.find_mask(tree);
            rebind(&mut binding, found, tree, registry, tracer);
        }
        self.bindings[slot] = Some(binding);
        true
    }

    /// Attaches bindings to every renderable descendant of `mask` that lacks
    /// one. Returns how many were created.
    pub fn attach_renderables<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        mask: ElementId,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        let mut attached = 0;
        for element in tree.descendants(mask) {
            if tree.material(element).is_some() && self.attach(tree, registry, element, tracer) {
                attached += 1;
            }
        }
        attached
    }

    /// Removes the binding of `element`, releasing whatever it holds.
    ///
    /// Returns whether a binding was removed.
    pub fn detach<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        element: ElementId,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        let Some(slot) = self.bindings.get_mut(element.idx as usize) else {
            return false;
        };
        if slot.as_ref().is_none_or(|b| b.owner() != element) {
            return false;
        }
        let Some(mut binding) = slot.take() else {
            return false;
        };
        if tree.is_alive(element) {
            rebind(&mut binding, None, tree, registry, tracer);
        } else {
            teardown_traced(&mut binding, registry, tracer);
        }
        tracer.detach(&DetachEvent {
            element,
            reason: DetachReason::Explicit,
        });
        true
    }

    // -- Lifecycle dispatch --

    /// Delivers one frame's worth of tree changes to the bindings.
    ///
    /// Order matters: destroyed owners are torn down first, then bindings
    /// whose mask was destroyed look for a new one, then disable, enable,
    /// reparent, and mask-role notifications run. With auto-attach on, an
    /// element with no binding gets one when it becomes active, gains a
    /// material, or is moved while it sits under a mask.
    pub fn apply<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        changes: &FrameChanges,
        tracer: &mut Tracer<'_>,
    ) {
        if !changes.removed.is_empty() {
            self.apply_removed(tree, registry, &changes.removed, tracer);
        }

        for &idx in &changes.deactivated {
            if let Some(binding) = self.live_slot(tree, idx) {
                rebind(binding, None, tree, registry, tracer);
            }
        }

        for &idx in &changes.activated {
            if let Some(binding) = self.live_slot(tree, idx) {
                let found = binding.find_mask(tree);
                rebind(binding, found, tree, registry, tracer);
            } else {
                self.auto_attach(tree, registry, idx, tracer);
            }
        }

        for &idx in &changes.renderable {
            self.auto_attach(tree, registry, idx, tracer);
        }

        for &idx in &changes.reparented {
            self.apply_reparented(tree, registry, idx, tracer);
        }

        for &idx in &changes.masks {
            self.apply_mask_changed(tree, registry, idx, tracer);
        }
    }

    fn apply_removed<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        removed: &[u32],
        tracer: &mut Tracer<'_>,
    ) {
        for &idx in removed {
            let Some(slot) = self.bindings.get_mut(idx as usize) else {
                continue;
            };
            if let Some(binding) = slot
                && !tree.is_alive(binding.owner())
            {
                stale_teardown(binding, registry, tracer);
                *slot = None;
            }
        }

        // Bindings bound to a destroyed mask fall back to the next one up.
        for binding in self.bindings.iter_mut().flatten() {
            let Some(mask) = binding.mask() else {
                continue;
            };
            if tree.is_alive(mask) {
                continue;
            }
            let found = if tree.is_active_in_hierarchy(binding.owner()) {
                binding.find_mask(tree)
            } else {
                None
            };
            rebind(binding, found, tree, registry, tracer);
        }
    }

    fn apply_reparented<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        idx: u32,
        tracer: &mut Tracer<'_>,
    ) {
        let Some(element) = tree.id_at(idx) else {
            return;
        };
        if !tree.is_active_in_hierarchy(element) {
            return;
        }
        if let Some(binding) = self.live_slot(tree, idx) {
            let found = binding.find_mask(tree);
            rebind(binding, found, tree, registry, tracer);
        } else {
            self.auto_attach(tree, registry, idx, tracer);
        }
    }

    fn apply_mask_changed<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        idx: u32,
        tracer: &mut Tracer<'_>,
    ) {
        let Some(mask) = tree.id_at(idx) else {
            return;
        };
        for binding in self.bindings.iter_mut().flatten() {
            let owner = binding.owner();
            if !tree.is_alive(owner) || !tree.is_active_in_hierarchy(owner) {
                continue;
            }
            if binding.mask() != Some(mask) && !tree.is_ancestor_of(mask, owner) {
                continue;
            }
            let found = binding.find_mask(tree);
            // Same mask, different state: the material still has to be redone.
            if !rebind(binding, found, tree, registry, tracer) {
                binding.invalidate(tree);
            }
        }

        if self.config.auto_attach
            && tree.mask_role(mask).is_some()
            && tree.is_active_in_hierarchy(mask)
        {
            self.attach_renderables(tree, registry, mask, tracer);
        }
    }

    // -- Liveness --

    /// Advances the liveness counter and runs [`prune`](Self::prune) when the
    /// configured interval is reached. Returns how many bindings were
    /// removed.
    pub fn tick<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        self.ticks += 1;
        let interval = u64::from(self.config.prune_interval);
        if interval == 0 || !self.ticks.is_multiple_of(interval) {
            return 0;
        }
        self.prune(tree, registry, tracer)
    }

    /// Removes bindings that are no longer needed.
    ///
    /// A binding is removed when its owner is gone, or when its owner is
    /// active in hierarchy and no masking ancestor exists anymore. Bindings
    /// of inactive owners are left alone; they rebind when re-enabled.
    /// Returns how many bindings were removed.
    pub fn prune<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        let mut checked = 0_u32;
        let mut pruned = 0_u32;
        for slot in &mut self.bindings {
            let Some(binding) = slot else {
                continue;
            };
            checked += 1;
            let owner = binding.owner();
            if !tree.is_alive(owner) {
                stale_teardown(binding, registry, tracer);
                *slot = None;
                pruned += 1;
                continue;
            }
            if !tree.is_active_in_hierarchy(owner) {
                continue;
            }
            let found = binding.find_mask(tree);
            rebind(binding, found, tree, registry, tracer);
            if found.is_none() {
                tracer.detach(&DetachEvent {
                    element: owner,
                    reason: DetachReason::Pruned,
                });
                *slot = None;
                pruned += 1;
            }
        }
        tracer.prune(&PruneEvent {
            tick: self.ticks,
            checked,
            pruned,
        });
        pruned as usize
    }

    // -- Rendering --

    /// Resolves the material `element` should be drawn with, given its
    /// current `base` material.
    ///
    /// Elements without a binding get `base` back without touching the
    /// registry. The first unsupported resolution of a streak is reported as
    /// an [`UnsupportedEvent`].
    pub fn resolve<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &ElementTree,
        registry: &mut R,
        element: ElementId,
        base: MaterialId,
        tracer: &mut Tracer<'_>,
    ) -> Resolution {
        let Some(binding) = self
            .bindings
            .get_mut(element.idx as usize)
            .and_then(Option::as_mut)
            .filter(|b| b.owner() == element)
        else {
            return Resolution::Unmasked(base);
        };

        let mut traced = TracedRegistry {
            inner: registry,
            tracer,
            element,
        };
        let resolution = binding.resolve(tree, &mut traced, base);
        if resolution.should_warn()
            && let Some(mask) = binding.mask()
        {
            traced.tracer.unsupported(&UnsupportedEvent {
                element,
                mask,
                base,
            });
        }
        resolution
    }

    /// Re-resolves every element whose material was invalidated and hands
    /// the result to `renderer`. Returns how many elements were updated.
    pub fn refresh<R: MaskRegistry + ?Sized, D: Renderer + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        renderer: &mut D,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        let mut updated = 0;
        for idx in tree.drain_invalidated() {
            let Some(element) = tree.id_at(idx) else {
                continue;
            };
            let Some(base) = tree.material(element) else {
                continue;
            };
            let material = self.resolve(tree, registry, element, base, tracer).material();
            renderer.apply_material(element, material);
            updated += 1;
        }
        updated
    }

    // -- Internal helpers --

    /// Attaches slot `idx` if auto-attach is on and its element is active,
    /// renderable, unbound, and under a mask. Returns whether it attached.
    fn auto_attach<R: MaskRegistry + ?Sized>(
        &mut self,
        tree: &mut ElementTree,
        registry: &mut R,
        idx: u32,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if !self.config.auto_attach {
            return false;
        }
        let Some(element) = tree.id_at(idx) else {
            return false;
        };
        if self.binding(element).is_some()
            || !tree.is_active_in_hierarchy(element)
            || tree.material(element).is_none()
            || tree.nearest_mask(element).is_none()
        {
            return false;
        }
        self.attach(tree, registry, element, tracer)
    }

    /// Returns the binding in slot `idx` if its owner is still alive.
    fn live_slot(&mut self, tree: &ElementTree, idx: u32) -> Option<&mut MaskableBinding> {
        self.bindings
            .get_mut(idx as usize)?
            .as_mut()
            .filter(|b| tree.is_alive(b.owner()))
    }
}

/// Rebinds `binding` to `mask`, tracing registry traffic and the bind
/// itself. Returns whether the mask changed.
fn rebind<R: MaskRegistry + ?Sized>(
    binding: &mut MaskableBinding,
    mask: Option<ElementId>,
    tree: &mut ElementTree,
    registry: &mut R,
    tracer: &mut Tracer<'_>,
) -> bool {
    let element = binding.owner();
    let previous = binding.mask();
    let mut traced = TracedRegistry {
        inner: registry,
        tracer,
        element,
    };
    if !binding.set_mask(mask, tree, &mut traced) {
        return false;
    }
    traced.tracer.bind(&BindEvent {
        element,
        previous,
        current: mask,
    });
    true
}

/// Tears down a binding whose owner is gone and reports it.
fn stale_teardown<R: MaskRegistry + ?Sized>(
    binding: &mut MaskableBinding,
    registry: &mut R,
    tracer: &mut Tracer<'_>,
) {
    teardown_traced(binding, registry, tracer);
    tracer.detach(&DetachEvent {
        element: binding.owner(),
        reason: DetachReason::Destroyed,
    });
}

fn teardown_traced<R: MaskRegistry + ?Sized>(
    binding: &mut MaskableBinding,
    registry: &mut R,
    tracer: &mut Tracer<'_>,
) {
    let element = binding.owner();
    binding.teardown(&mut TracedRegistry {
        inner: registry,
        tracer,
        element,
    });
}

/// Forwards to a registry and traces each call on behalf of `element`.
struct TracedRegistry<'a, 't, R: ?Sized> {
    inner: &'a mut R,
    tracer: &'a mut Tracer<'t>,
    element: ElementId,
}

impl<R: MaskRegistry + ?Sized> MaskRegistry for TracedRegistry<'_, '_, R> {
    fn acquire(&mut self, mask: ElementId, base: MaterialId) -> Option<MaterialId> {
        let replacement = self.inner.acquire(mask, base);
        self.tracer.acquire(&AcquireEvent {
            element: self.element,
            mask,
            base,
            replacement,
        });
        replacement
    }

    fn release(&mut self, mask: ElementId, replacement: MaterialId) {
        self.inner.release(mask, replacement);
        self.tracer.release(&ReleaseEvent {
            element: self.element,
            mask,
            replacement,
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::binding::BindingState;
    use crate::element::MaskRole;
    use crate::pool::{MaterialReplacer, ReplacementPool};
    use crate::testing::{CountingRegistry, Op, replacement_for};

    const M1: MaterialId = MaterialId(1);
    const M2: MaterialId = MaterialId(2);

    #[derive(Debug, Default)]
    struct RecordingRenderer {
        applied: Vec<(ElementId, MaterialId)>,
    }

    impl Renderer for RecordingRenderer {
        fn apply_material(&mut self, element: ElementId, material: MaterialId) {
            self.applied.push((element, material));
        }
    }

    /// A tree, its bindings, and a counting registry, driven one frame at a
    /// time.
    struct Harness {
        tree: ElementTree,
        maskables: Maskables,
        registry: CountingRegistry,
        renderer: RecordingRenderer,
    }

    impl Harness {
        fn new(config: MaskableConfig, supported: &[MaterialId]) -> Self {
            Self {
                tree: ElementTree::new(),
                maskables: Maskables::new(config),
                registry: CountingRegistry::supporting(supported),
                renderer: RecordingRenderer::default(),
            }
        }

        /// Evaluate, dispatch, prune, and push materials. Returns the
        /// materials pushed this frame.
        fn frame(&mut self) -> Vec<(ElementId, MaterialId)> {
            let mut tracer = Tracer::none();
            let changes = self.tree.evaluate();
            self.maskables
                .apply(&mut self.tree, &mut self.registry, &changes, &mut tracer);
            self.maskables
                .tick(&mut self.tree, &mut self.registry, &mut tracer);
            self.renderer.applied.clear();
            self.maskables.refresh(
                &mut self.tree,
                &mut self.registry,
                &mut self.renderer,
                &mut tracer,
            );
            core::mem::take(&mut self.renderer.applied)
        }

        fn resolve(&mut self, element: ElementId, base: MaterialId) -> Resolution {
            self.maskables.resolve(
                &self.tree,
                &mut self.registry,
                element,
                base,
                &mut Tracer::none(),
            )
        }

        /// mask → leaf, leaf drawn with `base`.
        fn masked_leaf(&mut self, base: MaterialId) -> (ElementId, ElementId) {
            let mask = self.tree.create_element();
            let leaf = self.tree.create_element();
            self.tree.add_child(mask, leaf);
            self.tree.set_mask_role(mask, Some(MaskRole::ENABLED));
            self.tree.set_material(leaf, Some(base));
            (mask, leaf)
        }
    }

    #[test]
    fn element_without_mask_keeps_base_material() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let leaf = h.tree.create_element();
        h.tree.set_material(leaf, Some(M1));

        assert_eq!(h.frame(), vec![(leaf, M1)]);
        assert_eq!(h.resolve(leaf, M1), Resolution::Unmasked(M1));
        assert!(h.maskables.is_empty());
        assert!(h.registry.ops.is_empty());
    }

    #[test]
    fn element_under_mask_gets_replacement_once() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (mask, leaf) = h.masked_leaf(M1);
        let r1 = replacement_for(mask, M1);

        assert_eq!(h.frame(), vec![(leaf, r1)]);
        assert_eq!(h.maskables.binding(leaf).map(MaskableBinding::mask), Some(Some(mask)));
        assert_eq!(h.registry.acquires, 1);

        // Repeated resolution with the same inputs is served from the claim.
        assert_eq!(h.resolve(leaf, M1), Resolution::Replaced(r1));
        assert_eq!(h.resolve(leaf, M1), Resolution::Replaced(r1));
        assert!(h.frame().is_empty(), "nothing was invalidated");
        assert_eq!(h.registry.acquires, 1);
    }

    #[test]
    fn disabling_mask_role_releases_once() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (mask, leaf) = h.masked_leaf(M1);
        let _ = h.frame();

        h.tree.set_mask_role(mask, Some(MaskRole::DISABLED));
        assert_eq!(h.frame(), vec![(leaf, M1)]);
        assert_eq!(h.resolve(leaf, M1), Resolution::Unmasked(M1));
        assert_eq!(
            h.registry.ops,
            vec![Op::Acquire(mask, M1), Op::Release(mask, replacement_for(mask, M1))]
        );

        // Re-enabling the role brings the replacement back.
        h.tree.set_mask_role(mask, Some(MaskRole::ENABLED));
        assert_eq!(h.frame(), vec![(leaf, replacement_for(mask, M1))]);
        assert_eq!(h.registry.outstanding(), 1);
    }

    #[test]
    fn deactivating_subtree_unbinds_without_detaching() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (mask, leaf) = h.masked_leaf(M1);
        let _ = h.frame();

        h.tree.set_active(mask, false);
        assert_eq!(h.frame(), vec![(leaf, M1)]);
        let binding = h.maskables.binding(leaf).expect("binding survives disable");
        assert_eq!(binding.state(), BindingState::Unbound);
        assert_eq!(h.registry.releases, 1);

        h.tree.set_active(mask, true);
        assert_eq!(h.frame(), vec![(leaf, replacement_for(mask, M1))]);
        assert_eq!(h.registry.acquires, 2);
        assert_eq!(h.registry.releases, 1);
    }

    #[test]
    fn unsupported_material_warns_once() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (_, leaf) = h.masked_leaf(M2);
        assert_eq!(h.frame(), vec![(leaf, M2)]);
        assert!(h.maskables.binding(leaf).is_some_and(MaskableBinding::is_warned));

        assert_eq!(h.resolve(leaf, M2), Resolution::Unsupported { base: M2, warn: false });
        assert_eq!(h.registry.outstanding(), 0);

        // Switching to a supported base ends the streak.
        h.tree.set_material(leaf, Some(M1));
        let _ = h.frame();
        assert!(h.resolve(leaf, M2).should_warn());
    }

    #[test]
    fn destroying_owner_releases_held_replacement() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (_, leaf) = h.masked_leaf(M1);
        let _ = h.frame();

        h.tree.remove_from_parent(leaf);
        h.tree.destroy_element(leaf);
        let _ = h.frame();

        assert_eq!(h.registry.releases, 1);
        assert_eq!(h.registry.outstanding(), 0);
        assert!(h.maskables.binding(leaf).is_none());
        assert!(h.maskables.is_empty());
    }

    #[test]
    fn destroyed_owner_slot_reuse_tears_down_first() {
        let mut h = Harness::new(MaskableConfig::manual(), &[M1]);
        let (_, leaf) = h.masked_leaf(M1);
        let mut tracer = Tracer::none();
        assert!(h.maskables.attach(&mut h.tree, &mut h.registry, leaf, &mut tracer));
        let _ = h.resolve(leaf, M1);

        // Destroy and reuse the slot before the removal is applied.
        h.tree.remove_from_parent(leaf);
        h.tree.destroy_element(leaf);
        let reused = h.tree.create_element();
        assert_eq!(reused.index(), leaf.index());
        assert!(h.maskables.attach(&mut h.tree, &mut h.registry, reused, &mut tracer));

        assert_eq!(h.registry.releases, 1);
        assert!(h.maskables.binding(leaf).is_none());
        assert!(h.maskables.binding(reused).is_some());
    }

    #[test]
    fn moving_out_of_mask_unbinds_then_prunes() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (_, leaf) = h.masked_leaf(M1);
        let root = h.tree.create_element();
        let _ = h.frame();

        h.tree.reparent(leaf, root);
        assert_eq!(h.frame(), vec![(leaf, M1)]);
        assert_eq!(h.registry.releases, 1);
        assert!(h.maskables.binding(leaf).is_none(), "pruned on tick");
    }

    #[test]
    fn moving_between_masks_rebinds() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (first, leaf) = h.masked_leaf(M1);
        let second = h.tree.create_element();
        h.tree.set_mask_role(second, Some(MaskRole::ENABLED));
        let _ = h.frame();

        h.tree.reparent(leaf, second);
        assert_eq!(h.frame(), vec![(leaf, replacement_for(second, M1))]);
        assert_eq!(
            h.registry.ops,
            vec![
                Op::Acquire(first, M1),
                Op::Release(first, replacement_for(first, M1)),
                Op::Acquire(second, M1),
            ]
        );
    }

    #[test]
    fn nested_mask_wins() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (outer, inner_host) = h.masked_leaf(M1);
        let leaf = h.tree.create_element();
        h.tree.add_child(inner_host, leaf);
        h.tree.set_material(leaf, Some(M1));
        let _ = h.frame();
        assert_eq!(h.maskables.binding(leaf).and_then(MaskableBinding::mask), Some(outer));

        h.tree.set_mask_role(inner_host, Some(MaskRole::ENABLED));
        let _ = h.frame();
        assert_eq!(
            h.maskables.binding(leaf).and_then(MaskableBinding::mask),
            Some(inner_host)
        );
        assert_eq!(h.registry.outstanding(), 2, "inner host and leaf each hold one");
    }

    #[test]
    fn removing_mask_role_prunes_bindings() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (mask, leaf) = h.masked_leaf(M1);
        let _ = h.frame();

        h.tree.set_mask_role(mask, None);
        assert_eq!(h.frame(), vec![(leaf, M1)]);
        assert!(h.maskables.is_empty());
        assert_eq!(h.registry.outstanding(), 0);
    }

    #[test]
    fn new_mask_role_attaches_existing_renderables() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let panel = h.tree.create_element();
        let a = h.tree.create_element();
        let b = h.tree.create_element();
        let plain = h.tree.create_element();
        h.tree.add_child(panel, a);
        h.tree.add_child(a, b);
        h.tree.add_child(panel, plain);
        h.tree.set_material(a, Some(M1));
        h.tree.set_material(b, Some(M1));
        let _ = h.frame();
        assert!(h.maskables.is_empty());

        h.tree.set_mask_role(panel, Some(MaskRole::ENABLED));
        let _ = h.frame();
        assert_eq!(h.maskables.len(), 2);
        assert!(h.maskables.binding(plain).is_none(), "not renderable");
    }

    #[test]
    fn gaining_material_under_mask_attaches() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let mask = h.tree.create_element();
        let leaf = h.tree.create_element();
        h.tree.add_child(mask, leaf);
        h.tree.set_mask_role(mask, Some(MaskRole::ENABLED));
        let _ = h.frame();
        assert!(h.maskables.binding(leaf).is_none(), "nothing to draw yet");

        h.tree.set_material(leaf, Some(M1));
        assert_eq!(h.frame(), vec![(leaf, replacement_for(mask, M1))]);
        assert_eq!(h.maskables.binding(leaf).and_then(MaskableBinding::mask), Some(mask));

        // Swapping one material for another is not a new renderable.
        h.tree.set_material(leaf, Some(M2));
        let _ = h.frame();
        assert_eq!(h.maskables.len(), 1);
    }

    #[test]
    fn activating_leaf_under_mask_attaches() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let mask = h.tree.create_element();
        h.tree.set_mask_role(mask, Some(MaskRole::ENABLED));
        let _ = h.frame();

        let leaf = h.tree.create_element();
        h.tree.set_active(leaf, false);
        h.tree.add_child(mask, leaf);
        h.tree.set_material(leaf, Some(M1));
        let _ = h.frame();
        assert!(h.maskables.binding(leaf).is_none());
        assert_eq!(h.registry.acquires, 0);

        h.tree.set_active(leaf, true);
        assert_eq!(h.frame(), vec![(leaf, replacement_for(mask, M1))]);
        assert_eq!(h.maskables.binding(leaf).and_then(MaskableBinding::mask), Some(mask));
        assert_eq!(h.registry.outstanding(), 1);
    }

    #[test]
    fn activating_inactive_mask_attaches_renderables() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let mask = h.tree.create_element();
        let leaf = h.tree.create_element();
        h.tree.add_child(mask, leaf);
        h.tree.set_material(leaf, Some(M1));
        let _ = h.frame();

        h.tree.set_active(mask, false);
        h.tree.set_mask_role(mask, Some(MaskRole::ENABLED));
        let _ = h.frame();
        assert!(h.maskables.is_empty());

        h.tree.set_active(mask, true);
        assert_eq!(h.frame(), vec![(leaf, replacement_for(mask, M1))]);
        assert_eq!(h.maskables.binding(leaf).and_then(MaskableBinding::mask), Some(mask));
        assert!(h.maskables.binding(mask).is_none(), "mask has no material");
    }

    #[test]
    fn manual_config_never_attaches_or_prunes() {
        let mut h = Harness::new(MaskableConfig::manual(), &[M1]);
        let (_, leaf) = h.masked_leaf(M1);
        assert_eq!(h.frame(), vec![(leaf, M1)]);
        assert!(h.maskables.is_empty());

        let mut tracer = Tracer::none();
        assert!(h.maskables.attach(&mut h.tree, &mut h.registry, leaf, &mut tracer));
        assert!(!h.maskables.attach(&mut h.tree, &mut h.registry, leaf, &mut tracer));
        let root = h.tree.create_element();
        h.tree.reparent(leaf, root);
        let _ = h.frame();
        assert!(h.maskables.binding(leaf).is_some(), "no automatic prune");

        assert_eq!(h.maskables.prune(&mut h.tree, &mut h.registry, &mut tracer), 1);
        assert!(h.maskables.is_empty());
    }

    #[test]
    fn prune_interval_counts_ticks() {
        let config = MaskableConfig {
            auto_attach: false,
            prune_interval: 3,
        };
        let mut h = Harness::new(config, &[M1]);
        let orphan = h.tree.create_element();
        let mut tracer = Tracer::none();
        assert!(h.maskables.attach(&mut h.tree, &mut h.registry, orphan, &mut tracer));

        let mut removed = 0;
        for _ in 0..2 {
            removed += h.maskables.tick(&mut h.tree, &mut h.registry, &mut tracer);
        }
        assert_eq!(removed, 0);
        assert_eq!(h.maskables.tick(&mut h.tree, &mut h.registry, &mut tracer), 1);
        assert_eq!(h.maskables.ticks(), 3);
    }

    #[test]
    fn inactive_bindings_survive_prune() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let (_, leaf) = h.masked_leaf(M1);
        let _ = h.frame();

        h.tree.set_active(leaf, false);
        let _ = h.frame();
        let _ = h.frame();
        assert!(h.maskables.binding(leaf).is_some());
    }

    #[test]
    fn explicit_detach_releases_and_invalidates() {
        let mut h = Harness::new(MaskableConfig::manual(), &[M1]);
        let (_, leaf) = h.masked_leaf(M1);
        let mut tracer = Tracer::none();
        h.maskables.attach(&mut h.tree, &mut h.registry, leaf, &mut tracer);
        let _ = h.frame();
        assert_eq!(h.registry.outstanding(), 1);

        assert!(h.maskables.detach(&mut h.tree, &mut h.registry, leaf, &mut tracer));
        assert!(!h.maskables.detach(&mut h.tree, &mut h.registry, leaf, &mut tracer));
        assert_eq!(h.registry.outstanding(), 0);
        assert_eq!(h.frame(), vec![(leaf, M1)]);
    }

    #[test]
    fn destroyed_mask_hands_bindings_to_next_mask() {
        let mut h = Harness::new(MaskableConfig::new(), &[M1]);
        let outer = h.tree.create_element();
        h.tree.set_mask_role(outer, Some(MaskRole::ENABLED));
        let (inner, leaf) = h.masked_leaf(M1);
        h.tree.add_child(outer, inner);
        let _ = h.frame();
        assert_eq!(h.maskables.binding(leaf).and_then(MaskableBinding::mask), Some(inner));

        h.tree.reparent(leaf, outer);
        h.tree.remove_from_parent(inner);
        h.tree.destroy_element(inner);
        let _ = h.frame();
        assert_eq!(h.maskables.binding(leaf).and_then(MaskableBinding::mask), Some(outer));
        assert_eq!(h.registry.outstanding(), 1);
    }

    #[test]
    fn siblings_share_pooled_replacement() {
        #[derive(Debug, Default)]
        struct Replacer {
            live: u32,
        }
        impl MaterialReplacer for Replacer {
            fn create(&mut self, mask: ElementId, base: MaterialId) -> Option<MaterialId> {
                self.live += 1;
                Some(replacement_for(mask, base))
            }
            fn destroy(&mut self, _replacement: MaterialId) {
                self.live -= 1;
            }
        }

        let mut tree = ElementTree::new();
        let mut maskables = Maskables::new(MaskableConfig::new());
        let mut pool = ReplacementPool::new(Replacer::default());
        let mut renderer = RecordingRenderer::default();
        let mut tracer = Tracer::none();

        let mask = tree.create_element();
        tree.set_mask_role(mask, Some(MaskRole::ENABLED));
        let a = tree.create_element();
        let b = tree.create_element();
        for leaf in [a, b] {
            tree.add_child(mask, leaf);
            tree.set_material(leaf, Some(M1));
        }

        let changes = tree.evaluate();
        maskables.apply(&mut tree, &mut pool, &changes, &mut tracer);
        maskables.refresh(&mut tree, &mut pool, &mut renderer, &mut tracer);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.use_count(mask, M1), 2);
        assert_eq!(renderer.applied.len(), 2);

        tree.remove_from_parent(a);
        tree.destroy_element(a);
        let changes = tree.evaluate();
        maskables.apply(&mut tree, &mut pool, &changes, &mut tracer);
        assert_eq!(pool.use_count(mask, M1), 1);

        tree.set_active(b, false);
        let changes = tree.evaluate();
        maskables.apply(&mut tree, &mut pool, &changes, &mut tracer);
        assert!(pool.is_empty());
        assert_eq!(pool.replacer().live, 0);
    }

    #[cfg(feature = "trace")]
    #[test]
    fn traced_frame_reports_each_step() {
        use crate::trace::MaskSink;

        #[derive(Default)]
        struct Log {
            attached: u32,
            binds: u32,
            acquires: u32,
            warnings: Vec<MaterialId>,
            detached: Vec<DetachReason>,
        }
        impl MaskSink for Log {
            fn on_attach(&mut self, _: &AttachEvent) {
                self.attached += 1;
            }
            fn on_bind(&mut self, _: &BindEvent) {
                self.binds += 1;
            }
            fn on_acquire(&mut self, _: &AcquireEvent) {
                self.acquires += 1;
            }
            fn on_unsupported(&mut self, e: &UnsupportedEvent) {
                self.warnings.push(e.base);
            }
            fn on_detach(&mut self, e: &DetachEvent) {
                self.detached.push(e.reason);
            }
        }

        let mut tree = ElementTree::new();
        let mut maskables = Maskables::new(MaskableConfig::new());
        let mut registry = CountingRegistry::supporting(&[]);
        let mut renderer = RecordingRenderer::default();
        let mut log = Log::default();

        let mask = tree.create_element();
        let leaf = tree.create_element();
        tree.add_child(mask, leaf);
        tree.set_mask_role(mask, Some(MaskRole::ENABLED));
        tree.set_material(leaf, Some(M2));

        for _ in 0..3 {
            let mut tracer = Tracer::new(&mut log);
            let changes = tree.evaluate();
            maskables.apply(&mut tree, &mut registry, &changes, &mut tracer);
            maskables.tick(&mut tree, &mut registry, &mut tracer);
            maskables.refresh(&mut tree, &mut registry, &mut renderer, &mut tracer);
            tree.invalidate_material(leaf);
        }

        assert_eq!(log.attached, 1);
        assert_eq!(log.binds, 1);
        assert_eq!(log.acquires, 3);
        assert_eq!(log.warnings, vec![M2], "one warning per streak");

        tree.set_mask_role(mask, None);
        let mut tracer = Tracer::new(&mut log);
        let changes = tree.evaluate();
        maskables.apply(&mut tree, &mut registry, &changes, &mut tracer);
        maskables.tick(&mut tree, &mut registry, &mut tracer);
        drop(tracer);
        assert_eq!(log.detached, vec![DetachReason::Pruned]);
    }
}
