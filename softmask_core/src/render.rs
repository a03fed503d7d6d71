// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer contract.
//!
//! The renderer owns base materials and draws elements; softmask only tells
//! it which material each element should be drawn with. It does so through
//! two paths:
//!
//! - **Pull**: [`Maskables::resolve`](crate::maskables::Maskables::resolve)
//!   answers "which material for this element and this base?" whenever the
//!   renderer recomputes an element's material on its own.
//! - **Push**: [`Maskables::refresh`](crate::maskables::Maskables::refresh)
//!   drains every element whose material was invalidated (by a rebind, a
//!   mask toggle, or a base-material change) and hands the freshly resolved
//!   material to a [`Renderer`].
//!
//! # Frame loop pseudocode
//!
//! ```rust,ignore
//! fn on_frame() {
//!     // Host mutations: enable/disable elements, move them, toggle masks.
//!     tree.set_active(panel, false);
//!
//!     // Evaluate: drain structural channels, recompute activity.
//!     let changes = tree.evaluate();
//!
//!     // Bindings react: rebind, release, attach, tear down.
//!     maskables.apply(&mut tree, &mut pool, &changes, &mut tracer);
//!
//!     // Liveness: drop bindings that no longer have a mask.
//!     maskables.tick(&mut tree, &mut pool, &mut tracer);
//!
//!     // Present: push effective materials for invalidated elements.
//!     maskables.refresh(&mut tree, &mut pool, &mut renderer, &mut tracer);
//! }
//! ```

use crate::element::ElementId;
use crate::registry::MaterialId;

/// Receives the effective material of elements whose material was
/// invalidated.
///
/// Real backends and test doubles both implement this trait.
pub trait Renderer {
    /// Draw `element` with `material` from now on.
    fn apply_material(&mut self, element: ElementId, material: MaterialId);
}
