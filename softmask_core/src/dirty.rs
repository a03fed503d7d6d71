// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Softmask uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! turn element-tree mutations into the lifecycle notifications that drive
//! mask bindings. Each channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`ACTIVE`] and [`HIERARCHY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent. Deactivating an element deactivates its
//!   whole subtree, and moving an element moves its whole subtree, so every
//!   descendant must hear about it.
//!
//! - **Local-only**: [`MASK`] and [`MATERIAL`] are marked with the default
//!   policy. A mask-role change is reported once, at the element that
//!   carries the role; [`Maskables`](crate::maskables::Maskables) fans it
//!   out to the bindings underneath. A material invalidation concerns only
//!   the element whose effective material must be re-resolved.
//!
//! - **Local-only, reported**: [`RENDERABLE`] is marked when an element
//!   gains a base material, so an element that becomes drawable under an
//!   existing mask can be picked up.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on element creation and
//!   destruction and on child-list edits. It is drained and discarded by
//!   evaluation.
//!
//! # Consumption
//!
//! [`ElementTree::evaluate`](crate::element::ElementTree::evaluate) drains
//! every channel except [`MATERIAL`] and surfaces the results as
//! [`FrameChanges`](crate::element::FrameChanges). [`MATERIAL`] is drained
//! separately by
//! [`ElementTree::drain_invalidated`](crate::element::ElementTree::drain_invalidated),
//! after bindings had a chance to react to the frame's changes.

use understory_dirty::Channel;

/// Self-active flag changed: effective activity must be recomputed for the
/// subtree.
pub const ACTIVE: Channel = Channel::new(0);

/// Parent changed: descendants must re-run ancestor discovery.
pub const HIERARCHY: Channel = Channel::new(1);

/// Mask role added, removed, enabled, or disabled: no propagation needed.
pub const MASK: Channel = Channel::new(2);

/// Effective material must be re-resolved: no propagation needed.
pub const MATERIAL: Channel = Channel::new(3);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(4);

/// Element gained a base material and became renderable.
pub const RENDERABLE: Channel = Channel::new(5);
