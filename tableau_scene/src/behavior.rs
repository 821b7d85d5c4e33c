// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node update hooks.

use crate::scene::Scene;
use crate::timer::TickInfo;
use crate::types::NodeId;

/// Context handed to a [`Behavior`] once per tick.
///
/// The behavior is detached from its node while it runs, so it may freely mutate
/// the scene, including its own node.
#[derive(Debug)]
pub struct UpdateCx<'a> {
    /// The whole scene.
    pub scene: &'a mut Scene,
    /// The node being updated.
    pub node: NodeId,
    /// Timing for this tick.
    pub tick: &'a TickInfo,
}

/// Logic run for a node after its children have been updated.
pub trait Behavior {
    /// Run one tick. The return value is reserved for the implementor; the scene
    /// ignores it.
    fn update(&mut self, cx: &mut UpdateCx<'_>) -> bool;
}

/// Adapter turning a closure into a [`Behavior`].
///
/// Built by [`Scene::on_update`].
pub struct FnBehavior<F>(pub F);

impl<F> core::fmt::Debug for FnBehavior<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("FnBehavior").finish_non_exhaustive()
    }
}

impl<F> Behavior for FnBehavior<F>
where
    F: FnMut(&mut UpdateCx<'_>) -> bool,
{
    fn update(&mut self, cx: &mut UpdateCx<'_>) -> bool {
        (self.0)(cx)
    }
}
