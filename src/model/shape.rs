use crate::math::Matrix4;

use super::annotation::AnnotationId;
use super::entity::EntityId;
use super::item::ItemId;
use super::unit::LengthUnit;

slotmap::new_key_type! {
    /// Unique identifier for a shape node in the document.
    pub struct ShapeId;
}

/// How a child shape is attached to its parent.
///
/// Both kinds place the child identically during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A shape representation relationship.
    Relationship,
    /// A mapped (instanced) item.
    MappedItem,
}

/// A directed, transform-carrying edge from a shape to a child shape.
#[derive(Debug, Clone)]
pub struct ShapeLink {
    pub entity_id: EntityId,
    pub kind: LinkKind,
    pub child: ShapeId,
    /// Child frame expressed in the parent frame.
    pub placement: Matrix4,
}

/// Geometry attached to a product at one assembly level.
///
/// A shape without items but with links is a pure placement node.
#[derive(Debug, Clone)]
pub struct ShapeData {
    pub entity_id: EntityId,
    pub unit: Option<LengthUnit>,
    /// Items (solids, shells, curves) in declaration order.
    pub items: Vec<ItemId>,
    /// Child shapes in declaration order.
    pub links: Vec<ShapeLink>,
    /// Draughting models and constructive geometry attached to the shape.
    pub annotations: Vec<AnnotationId>,
}

impl ShapeData {
    /// Creates an empty shape.
    #[must_use]
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            unit: None,
            items: Vec::new(),
            links: Vec::new(),
            annotations: Vec::new(),
        }
    }
}
