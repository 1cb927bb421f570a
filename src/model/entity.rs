use std::fmt;

use super::{AnnotationId, ItemId, ProductId, ShapeId};

/// Stable, non-zero identifier of an entity in the source model.
///
/// This is the number written after `#` in the source file and after `id`
/// in output reference tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Wraps a raw identifier, rejecting the reserved value zero.
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// Wraps a raw identifier without checking it.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Returns the output reference token, e.g. `id42`.
    #[must_use]
    pub fn token(self) -> String {
        format!("id{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an entity id resolves to inside a [`Document`](super::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Product(ProductId),
    /// A child usage, by parent product and position in its usage list.
    Usage(ProductId, usize),
    Shape(ShapeId),
    /// A structural link, by parent shape and position in its link list.
    Link(ShapeId, usize),
    Item(ItemId),
    Annotation(AnnotationId),
    /// A face inside a B-rep item.
    Face(ItemId, usize),
}
