//! Categorical tags attached to lines, groups and conclusions.
//!
//! A [`TagSet`] is a sorted, deduplicated set of atomic tags written as
//! `"A|B|C"`. Atomic tags are interned by a [`TagContext`]; a set can only be
//! combined with sets of the same context. The empty set belongs to no
//! context and combines with anything.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Separator between atomic tags in the text form.
pub const SEPARATOR: char = '|';

#[derive(Debug)]
struct ContextInner {
    name: String,
    atoms: Mutex<HashMap<String, Arc<str>>>,
}

/// Interning registry for atomic tags.
#[derive(Debug, Clone)]
pub struct TagContext {
    inner: Arc<ContextInner>,
}

impl TagContext {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                name: name.into(),
                atoms: Mutex::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Parses `"A|B"` into a set, interning every atomic tag.
    ///
    /// Empty segments are skipped, so `""` and `"|"` both give the empty set.
    #[must_use]
    pub fn find_or_create(&self, text: &str) -> TagSet {
        let mut atoms: Vec<Arc<str>> = {
            let mut registry = self.inner.atoms.lock().unwrap_or_else(PoisonError::into_inner);
            text.split(SEPARATOR)
                .map(str::trim)
                .filter(|atom| !atom.is_empty())
                .map(|atom| {
                    registry
                        .entry(atom.to_string())
                        .or_insert_with(|| Arc::from(atom))
                        .clone()
                })
                .collect()
        };
        self.make(&mut atoms)
    }

    /// Single atomic tag; rejects text containing the separator.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidTag`] for blank text or text containing `|`.
    pub fn atomic(&self, tag: &str) -> Result<TagSet, crate::Error> {
        if tag.trim().is_empty() || tag.contains(SEPARATOR) {
            return Err(crate::Error::InvalidTag(tag.to_string()));
        }
        Ok(self.find_or_create(tag))
    }

    /// Number of distinct atomic tags interned so far.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.inner
            .atoms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn make(&self, atoms: &mut Vec<Arc<str>>) -> TagSet {
        if atoms.is_empty() {
            return TagSet::default();
        }
        atoms.sort();
        atoms.dedup();
        TagSet {
            context: Some(self.inner.clone()),
            atoms: Arc::from(std::mem::take(atoms)),
        }
    }

    /// Whether `set` can be used by monitors of this context.
    #[must_use]
    pub fn accepts(&self, set: &TagSet) -> bool {
        set.context
            .as_ref()
            .is_none_or(|ctx| Arc::ptr_eq(ctx, &self.inner))
    }
}

/// Immutable, cheaply cloneable set of atomic tags.
#[derive(Clone, Default)]
pub struct TagSet {
    context: Option<Arc<ContextInner>>,
    atoms: Arc<[Arc<str>]>,
}

impl TagSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// Atomic tags in sorted order.
    pub fn atoms(&self) -> impl Iterator<Item = &str> {
        self.atoms.iter().map(|atom| &**atom)
    }

    #[must_use]
    pub fn contains(&self, atom: &str) -> bool {
        self.atoms.binary_search_by(|a| (**a).cmp(atom)).is_ok()
    }

    /// Whether both sets come from the same context (or one of them is empty).
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        match (&self.context, &other.context) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => true,
        }
    }

    /// # Errors
    /// Returns [`crate::Error::ForeignTags`] if the sets come from different contexts.
    pub fn union(&self, other: &Self) -> Result<Self, crate::Error> {
        self.merge(other, |a, b| a.iter().chain(b).cloned().collect())
    }

    /// # Errors
    /// Returns [`crate::Error::ForeignTags`] if the sets come from different contexts.
    pub fn intersect(&self, other: &Self) -> Result<Self, crate::Error> {
        self.merge(other, |a, b| {
            a.iter()
                .filter(|atom| b.binary_search(*atom).is_ok())
                .cloned()
                .collect()
        })
    }

    /// # Errors
    /// Returns [`crate::Error::ForeignTags`] if the sets come from different contexts.
    pub fn except(&self, other: &Self) -> Result<Self, crate::Error> {
        self.merge(other, |a, b| {
            a.iter()
                .filter(|atom| b.binary_search(*atom).is_err())
                .cloned()
                .collect()
        })
    }

    /// At least one atomic tag in common.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.atoms.iter().any(|atom| other.contains(atom))
    }

    /// Every atomic tag of `other` is in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        other.atoms.iter().all(|atom| self.contains(atom))
    }

    fn merge(
        &self,
        other: &Self,
        op: impl FnOnce(&[Arc<str>], &[Arc<str>]) -> Vec<Arc<str>>,
    ) -> Result<Self, crate::Error> {
        if !self.is_compatible(other) {
            return Err(crate::Error::ForeignTags(other.to_string()));
        }
        let Some(context) = self.context.clone().or_else(|| other.context.clone()) else {
            return Ok(Self::default());
        };
        let mut atoms = op(&self.atoms, &other.atoms);
        Ok(TagContext { inner: context }.make(&mut atoms))
    }
}

impl PartialEq for TagSet {
    fn eq(&self, other: &Self) -> bool {
        self.is_compatible(other) && self.atoms == other.atoms
    }
}

impl Eq for TagSet {}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, atom) in self.atoms.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(atom)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagSet({self})")
    }
}
