// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for [`Maskables`](crate::maskables::Maskables).

/// Controls how [`Maskables`](crate::maskables::Maskables) creates and prunes
/// bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaskableConfig {
    /// Create bindings automatically for renderable elements that appear
    /// under a mask, and for the renderable descendants of a newly added
    /// mask role.
    ///
    /// When off, the host calls [`attach`](crate::maskables::Maskables::attach)
    /// itself.
    pub auto_attach: bool,
    /// Run the liveness pass every `prune_interval` calls to
    /// [`tick`](crate::maskables::Maskables::tick). `0` disables automatic
    /// pruning; [`prune`](crate::maskables::Maskables::prune) still works.
    pub prune_interval: u32,
}

impl MaskableConfig {
    /// Attach automatically and prune on every tick.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            auto_attach: true,
            prune_interval: 1,
        }
    }

    /// Leave attaching and pruning entirely to the host.
    #[must_use]
    pub const fn manual() -> Self {
        Self {
            auto_attach: false,
            prune_interval: 0,
        }
    }
}

impl Default for MaskableConfig {
    fn default() -> Self {
        Self::new()
    }
}
