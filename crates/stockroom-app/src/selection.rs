// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::ItemId;

/// Checked rows, keyed by identity. Rows may be selected even after the
/// cache has evicted them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<ItemId>,
}

impl SelectionSet {
    pub fn select(&mut self, id: ItemId) {
        self.ids.insert(id);
    }

    pub fn deselect(&mut self, id: ItemId) {
        self.ids.remove(&id);
    }

    pub fn set(&mut self, id: ItemId, selected: bool) {
        if selected {
            self.select(id);
        } else {
            self.deselect(id);
        }
    }

    /// Returns the new selection state of `id`.
    pub fn toggle(&mut self, id: ItemId) -> bool {
        let selected = !self.contains(id);
        self.set(id, selected);
        selected
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.ids.iter().copied().collect()
    }
}
