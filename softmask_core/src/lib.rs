// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mask-aware material resolution for trees of renderable UI elements.
//!
//! `softmask_core` decides, for every renderable element nested under a
//! masking ancestor, which material the renderer should draw it with, and
//! owns the lifetime of the derived *replacement* material obtained from that
//! ancestor. It is `no_std` compatible (with `alloc`) and stores the element
//! tree in struct-of-arrays layout with generational index handles.
//!
//! # Architecture
//!
//! A host drives everything from its frame loop; nothing here polls or owns a
//! timer:
//!
//! ```text
//!   host mutations (enable, disable, reparent, set_mask_role, destroy)
//!       │
//!       ▼
//!   ElementTree::evaluate() ──► FrameChanges ──► Maskables::apply()
//!                                                      │
//!                 ┌────────────────────────────────────┘
//!                 ▼
//!   Maskables::tick() (liveness prune)
//!                 │
//!                 ▼
//!   Maskables::refresh() ──► Maskables::resolve() ──► Renderer::apply_material()
//!                                   │
//!                                   ▼
//!                     MaskRegistry::acquire / release
//! ```
//!
//! **[`element`]**: Struct-of-arrays element tree with generational handles.
//! Elements carry a self-active flag, an optional [`MaskRole`], and an
//! optional base material.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! ACTIVE and HIERARCHY propagate to descendants; MASK, MATERIAL and
//! RENDERABLE are local-only; TOPOLOGY records structural churn.
//!
//! **[`binding`]**: [`MaskableBinding`], the per-element state machine that
//! tracks the current masking ancestor and the held replacement claim.
//!
//! **[`maskables`]**: [`Maskables`], the registry of live bindings. It turns
//! [`FrameChanges`] into lifecycle notifications, prunes bindings that lost
//! their mask, and is the renderer-facing resolution adapter.
//!
//! **[`registry`]**: The [`MaskRegistry`] acquire/release contract and the
//! [`MaterialId`] handle type.
//!
//! **[`pool`]**: [`ReplacementPool`], a reference-counted [`MaskRegistry`].
//!
//! **[`render`]**: The [`Renderer`](render::Renderer) trait that receives
//! effective materials.
//!
//! **[`trace`]**: [`MaskSink`](trace::MaskSink) trait and event types, with a
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//!
//! [`MaskRole`]: element::MaskRole
//! [`MaskableBinding`]: binding::MaskableBinding
//! [`Maskables`]: maskables::Maskables
//! [`FrameChanges`]: element::FrameChanges
//! [`MaskRegistry`]: registry::MaskRegistry
//! [`MaterialId`]: registry::MaterialId
//! [`ReplacementPool`]: pool::ReplacementPool

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod binding;
pub mod config;
pub mod dirty;
pub mod element;
pub mod maskables;
pub mod pool;
pub mod registry;
pub mod render;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;
