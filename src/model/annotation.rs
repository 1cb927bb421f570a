use super::entity::EntityId;
use super::item::ItemId;

slotmap::new_key_type! {
    /// Unique identifier for an annotation representation in the document.
    pub struct AnnotationId;
}

/// Kind of auxiliary representation attached to a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Draughting (PMI) model: annotation planes and geometric sets.
    DraughtingModel,
    /// Constructive geometry: reference curves outside the solid model.
    ConstructiveGeometry,
}

impl AnnotationKind {
    /// File name prefix used for this kind in split output.
    #[must_use]
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::DraughtingModel => "annotation",
            Self::ConstructiveGeometry => "constructive",
        }
    }
}

/// An annotation representation and its items.
#[derive(Debug, Clone)]
pub struct AnnotationData {
    pub entity_id: EntityId,
    pub kind: AnnotationKind,
    pub items: Vec<ItemId>,
}
