// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element tree data model.
//!
//! An *element* is a node in a UI scene graph. Each element has:
//!
//! - An identity ([`ElementId`]): a generational handle that becomes stale
//!   when the element is destroyed, so bindings holding a handle to a dead
//!   owner or mask can detect it instead of aliasing a reused slot.
//! - Topology: parent, first-child, and sibling links forming an ordered tree.
//! - **Properties** set by the host: [`flags`](ElementTree::set_flags) (the
//!   self-active switch), an optional [`mask role`](ElementTree::set_mask_role),
//!   and an optional base [`material`](ElementTree::set_material). An element
//!   with a material is *renderable*.
//! - **Computed activity** produced by [`evaluate`](ElementTree::evaluate):
//!   whether the element is active once every ancestor is taken into account.
//!
//! # Dirty tracking
//!
//! Mutations mark the corresponding dirty channel (see [`dirty`](crate::dirty)):
//!
//! - **ACTIVE** / **HIERARCHY**: propagate to all descendants, since activity
//!   is inherited and a moved subtree has a new ancestor chain.
//! - **MASK** / **MATERIAL**: local-only.
//! - **RENDERABLE**: local-only, marked when an element goes from no material
//!   to some material.
//! - **TOPOLOGY**: creation, destruction, and child-list edits.

mod evaluate;
mod id;
mod store;
mod traverse;

pub use evaluate::FrameChanges;
pub use id::{ElementId, INVALID};
pub use store::{ElementFlags, ElementTree, MaskRole};
pub use traverse::{Ancestors, Children};
