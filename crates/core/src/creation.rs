//! Outcome of create-if-absent writes.

use std::ops::Deref;

/// An entity returned by a create-if-absent write, tagged with whether the
/// write inserted it or found it already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creation<T> {
    Created(T),
    Existing(T),
}

impl<T> Creation<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Creation::Created(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Creation::Created(entity) | Creation::Existing(entity) => entity,
        }
    }
}

impl<T> Deref for Creation<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Creation::Created(entity) | Creation::Existing(entity) => entity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_exposes_entity_and_flag() {
        let created = Creation::Created(7);
        let existing = Creation::Existing(7);

        assert!(created.is_created());
        assert!(!existing.is_created());
        assert_eq!(*existing, 7);
        assert_eq!(created.into_inner(), existing.into_inner());
    }
}
