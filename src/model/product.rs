use super::entity::EntityId;
use super::shape::ShapeId;

slotmap::new_key_type! {
    /// Unique identifier for a product in the document.
    pub struct ProductId;
}

/// A child usage of another product inside an assembly.
#[derive(Debug, Clone)]
pub struct ProductUsage {
    /// Identifier of the usage occurrence itself.
    pub entity_id: EntityId,
    /// The product that is used as a subcomponent.
    pub child: ProductId,
}

/// A named part or assembly definition.
///
/// The placement of a subcomponent is carried by the structural link between
/// the shapes of the two products, not by the usage.
#[derive(Debug, Clone)]
pub struct ProductData {
    pub entity_id: EntityId,
    pub name: Option<String>,
    /// Shapes owned directly by this product.
    pub shapes: Vec<ShapeId>,
    /// Subcomponent usages in declaration order.
    pub usages: Vec<ProductUsage>,
}

impl ProductData {
    /// Creates a product with no shapes and no children.
    #[must_use]
    pub fn new(entity_id: EntityId, name: Option<String>) -> Self {
        Self {
            entity_id,
            name,
            shapes: Vec::new(),
            usages: Vec::new(),
        }
    }
}
