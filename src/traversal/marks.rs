use slotmap::{Key, SparseSecondaryMap};

use crate::model::{AnnotationId, ItemId, ProductId, ShapeId};

/// Visited set over one kind of arena key.
#[derive(Debug)]
pub struct MarkSet<K: Key> {
    marks: SparseSecondaryMap<K, ()>,
}

impl<K: Key> Default for MarkSet<K> {
    fn default() -> Self {
        Self {
            marks: SparseSecondaryMap::new(),
        }
    }
}

impl<K: Key> MarkSet<K> {
    #[must_use]
    pub fn is_marked(&self, key: K) -> bool {
        self.marks.contains_key(key)
    }

    /// Marks `key`, returning `true` if it was not marked before.
    pub fn mark(&mut self, key: K) -> bool {
        self.marks.insert(key, ()).is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }
}

/// Arena keys that can be marked by a [`VisitTracker`].
pub trait Markable: Key {
    fn marks(tracker: &VisitTracker) -> &MarkSet<Self>;
    fn marks_mut(tracker: &mut VisitTracker) -> &mut MarkSet<Self>;
}

/// Pass-scoped visited sets, one namespace per entity kind.
///
/// Item marks record solids already submitted for meshing, so a solid
/// shared by several shapes is requested once.
#[derive(Debug, Default)]
pub struct VisitTracker {
    products: MarkSet<ProductId>,
    shapes: MarkSet<ShapeId>,
    items: MarkSet<ItemId>,
    annotations: MarkSet<AnnotationId>,
}

impl VisitTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a pass with every mark cleared.
    pub fn begin_pass(&mut self) {
        self.clear();
    }

    /// Ends the pass and discards its marks.
    pub fn end_pass(&mut self) {
        self.clear();
    }

    #[must_use]
    pub fn is_marked<K: Markable>(&self, key: K) -> bool {
        K::marks(self).is_marked(key)
    }

    /// Marks `key`, returning `true` on the first visit of this pass.
    pub fn mark<K: Markable>(&mut self, key: K) -> bool {
        K::marks_mut(self).mark(key)
    }

    /// Number of marked keys of one kind.
    #[must_use]
    pub fn count<K: Markable>(&self) -> usize {
        K::marks(self).len()
    }

    fn clear(&mut self) {
        self.products.clear();
        self.shapes.clear();
        self.items.clear();
        self.annotations.clear();
    }
}

macro_rules! markable {
    ($key:ty, $field:ident) => {
        impl Markable for $key {
            fn marks(tracker: &VisitTracker) -> &MarkSet<Self> {
                &tracker.$field
            }
            fn marks_mut(tracker: &mut VisitTracker) -> &mut MarkSet<Self> {
                &mut tracker.$field
            }
        }
    };
}

markable!(ProductId, products);
markable!(ShapeId, shapes);
markable!(ItemId, items);
markable!(AnnotationId, annotations);
