//! # Keyed Collections
//!
//! Every level of a course tree is an ordered mapping from id to child.
//! [`Keyed`] keeps entries in authoring order and indexes them by id. Ids
//! are expected to be unique; when a raw list carries a duplicate, both
//! entries are kept (so the invariant validator can report it) and lookups
//! resolve to the first occurrence.

use std::collections::HashMap;

use crate::identity::EntityId;

/// A node addressed by an id in its parent scope.
pub trait Identified {
    /// The node's id.
    fn id(&self) -> &EntityId;
}

/// Insertion-ordered collection of identified nodes.
#[derive(Debug, Clone)]
pub struct Keyed<T> {
    entries: Vec<T>,
    index: HashMap<EntityId, usize>,
}

impl<T: Identified> Keyed<T> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append an entry, keeping authoring order.
    pub fn push(&mut self, entry: T) {
        let position = self.entries.len();
        self.index.entry(entry.id().clone()).or_insert(position);
        self.entries.push(entry);
    }

    /// Look up an entry by id (first occurrence on duplicates).
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Returns true if an entry with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of the first entry with this id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Iterate entries in authoring order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Iterate ids in authoring order, duplicates included.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.iter().map(Identified::id)
    }

    /// Iterate entries in authoring order, skipping repeated ids.
    pub fn unique(&self) -> impl Iterator<Item = &T> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, e)| self.index.get(e.id()) == Some(i))
            .map(|(_, e)| e)
    }

    /// Ids that occur more than once, each reported once, in first-seen order.
    pub fn duplicate_ids(&self) -> Vec<&EntityId> {
        let mut counts: HashMap<&EntityId, usize> = HashMap::new();
        for id in self.ids() {
            *counts.entry(id).or_default() += 1;
        }
        let mut dups = Vec::new();
        for entry in self.unique() {
            if counts.get(entry.id()).copied().unwrap_or(0) > 1 {
                dups.push(entry.id());
            }
        }
        dups
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Identified> Default for Keyed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified> FromIterator<T> for Keyed<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut keyed = Self::new();
        for entry in iter {
            keyed.push(entry);
        }
        keyed
    }
}

impl<'a, T: Identified> IntoIterator for &'a Keyed<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T: Identified + PartialEq> PartialEq for Keyed<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
