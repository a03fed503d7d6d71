// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{ElementId, INVALID};
use super::store::ElementTree;

/// An iterator over the direct children of an element.
///
/// Created by [`ElementTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a ElementTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a ElementTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(ElementId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}

/// An iterator over the ancestors of an element, nearest first.
///
/// Created by [`ElementTree::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'a> {
    tree: &'a ElementTree,
    current: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(tree: &'a ElementTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.parent[idx as usize];
        Some(ElementId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}

impl ElementTree {
    /// Returns the strict descendants of an element in depth-first pre-order.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(id).collect();
        stack.reverse();
        while let Some(next) = stack.pop() {
            out.push(next);
            // Push children in reverse so the first child pops first.
            let mark = stack.len();
            stack.extend(self.children(next));
            stack[mark..].reverse();
        }
        out
    }
}
