//! # Entity Paths
//!
//! An [`EntityPath`] is the dot-joined chain of ids from a course down to
//! the addressed node: `course.module.lesson.block[.question|.step]`.
//! Terminal steps and explorer array elements have no id and are addressed
//! by their zero-based position; explorer props hang off a literal `props`
//! segment.
//!
//! Entity ids can never contain `.`, but explorer prop keys are arbitrary
//! strings. [`EntityPath::key`] percent-escapes `%` and `.` in a prop key,
//! so `{"a.b": 1}` and `{"a": {"b": 1}}` never share a path.
//!
//! Paths order lexicographically by their string form. Report ordering
//! depends on this, so the derive on the inner `String` is load-bearing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Segment under which explorer props are addressed.
pub const PROPS_SEGMENT: &str = "props";

/// Dot-joined address of a node in a course tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityPath(String);

impl EntityPath {
    /// The tree root. Courses are its direct children.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Returns true for the tree root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Build the path of a child node.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        let segment = segment.as_ref();
        if self.0.is_empty() {
            Self(segment.to_string())
        } else {
            Self(format!("{}.{}", self.0, segment))
        }
    }

    /// Build the path of a child addressed by a free-form map key.
    ///
    /// `%` becomes `%25` and `.` becomes `%2E`; everything else is kept.
    pub fn key(&self, key: &str) -> Self {
        if !key.contains(|c| c == '%' || c == '.') {
            return self.child(key);
        }
        let mut escaped = String::with_capacity(key.len() + 4);
        for c in key.chars() {
            match c {
                '%' => escaped.push_str("%25"),
                '.' => escaped.push_str("%2E"),
                c => escaped.push(c),
            }
        }
        self.child(escaped)
    }

    /// Build the path of a positional child (terminal step, array element).
    pub fn index(&self, position: usize) -> Self {
        self.child(position.to_string())
    }

    /// Path of the parent node, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        match self.0.rfind('.') {
            Some(pos) => Some(Self(self.0[..pos].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Number of segments (0 for the root).
    pub fn depth(&self) -> usize {
        if self.0.is_empty() {
            0
        } else {
            self.0.split('.').count()
        }
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Returns true if `self` equals `ancestor` or lies underneath it.
    pub fn is_within(&self, ancestor: &EntityPath) -> bool {
        if ancestor.is_root() || self.0 == ancestor.0 {
            return true;
        }
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(&ancestor.0)
            && self.0.as_bytes()[ancestor.0.len()] == b'.'
    }

    /// Access the dot-joined form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for EntityPath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
