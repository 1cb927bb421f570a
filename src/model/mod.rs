pub mod annotation;
pub mod entity;
pub mod item;
pub mod product;
pub mod shape;
pub mod unit;

pub use annotation::{AnnotationData, AnnotationId, AnnotationKind};
pub use entity::{EntityId, EntityRef};
pub use item::{BoundaryLoop, Brep, BrepFace, Color, Curve, ItemData, ItemId, ItemKind};
pub use product::{ProductData, ProductId, ProductUsage};
pub use shape::{LinkKind, ShapeData, ShapeId, ShapeLink};
pub use unit::LengthUnit;

use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;

use crate::error::ModelError;
use crate::math::Matrix4;

/// Central arena that owns every entity of a loaded assembly.
///
/// Entities reference each other through typed slotmap keys. Each one also
/// carries a stable [`EntityId`], indexed here so output references and
/// command-line selectors can be resolved back to arena keys.
#[derive(Debug, Default)]
pub struct Document {
    products: SlotMap<ProductId, ProductData>,
    shapes: SlotMap<ShapeId, ShapeData>,
    items: SlotMap<ItemId, ItemData>,
    annotations: SlotMap<AnnotationId, AnnotationData>,
    product_order: Vec<ProductId>,
    index: HashMap<EntityId, EntityRef>,
}

impl Document {
    /// Creates a new, empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, id: EntityId, entity: EntityRef) -> Result<(), ModelError> {
        if self.index.contains_key(&id) {
            return Err(ModelError::DuplicateEntity(id));
        }
        self.index.insert(id, entity);
        Ok(())
    }

    /// Looks up what a stable entity id refers to.
    #[must_use]
    pub fn find_by_entity(&self, id: EntityId) -> Option<EntityRef> {
        self.index.get(&id).copied()
    }

    // --- Product operations ---

    /// Inserts a product definition.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateEntity`] if `entity_id` is already used.
    pub fn add_product(
        &mut self,
        entity_id: EntityId,
        name: Option<String>,
    ) -> Result<ProductId, ModelError> {
        if self.index.contains_key(&entity_id) {
            return Err(ModelError::DuplicateEntity(entity_id));
        }
        let id = self.products.insert(ProductData::new(entity_id, name));
        self.product_order.push(id);
        self.register(entity_id, EntityRef::Product(id))?;
        Ok(id)
    }

    /// Records that `child` is used as a subcomponent of `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if either product is missing or the usage id is
    /// already used.
    pub fn add_usage(
        &mut self,
        parent: ProductId,
        entity_id: EntityId,
        child: ProductId,
    ) -> Result<(), ModelError> {
        self.product(child)?;
        let position = self.product(parent)?.usages.len();
        self.register(entity_id, EntityRef::Usage(parent, position))?;
        self.product_mut(parent)?
            .usages
            .push(ProductUsage { entity_id, child });
        Ok(())
    }

    /// Returns a reference to the product data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the document.
    pub fn product(&self, id: ProductId) -> Result<&ProductData, ModelError> {
        self.products
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("product".into()))
    }

    /// Returns a mutable reference to the product data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the document.
    pub fn product_mut(&mut self, id: ProductId) -> Result<&mut ProductData, ModelError> {
        self.products
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("product".into()))
    }

    /// All products in declaration order.
    pub fn products(&self) -> impl Iterator<Item = (ProductId, &ProductData)> + '_ {
        self.product_order
            .iter()
            .filter_map(|&id| self.products.get(id).map(|p| (id, p)))
    }

    /// Products never used as a subcomponent, in declaration order.
    #[must_use]
    pub fn root_products(&self) -> Vec<ProductId> {
        let used: HashSet<ProductId> = self
            .products
            .values()
            .flat_map(|p| p.usages.iter().map(|u| u.child))
            .collect();
        self.product_order
            .iter()
            .copied()
            .filter(|id| !used.contains(id))
            .collect()
    }

    /// Resolves a root selector to a product.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnresolvedRoot`] if nothing has that id, or
    /// [`ModelError::NotAProduct`] if the id names some other entity.
    pub fn resolve_root(&self, id: EntityId) -> Result<ProductId, ModelError> {
        match self.find_by_entity(id) {
            Some(EntityRef::Product(product)) => Ok(product),
            Some(_) => Err(ModelError::NotAProduct(id)),
            None => Err(ModelError::UnresolvedRoot(id)),
        }
    }

    // --- Shape operations ---

    /// Inserts a shape node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateEntity`] if `entity_id` is already used.
    pub fn add_shape(
        &mut self,
        entity_id: EntityId,
        unit: Option<LengthUnit>,
    ) -> Result<ShapeId, ModelError> {
        if self.index.contains_key(&entity_id) {
            return Err(ModelError::DuplicateEntity(entity_id));
        }
        let mut data = ShapeData::new(entity_id);
        data.unit = unit;
        let id = self.shapes.insert(data);
        self.register(entity_id, EntityRef::Shape(id))?;
        Ok(id)
    }

    /// Makes `shape` one of the shapes owned by `product`.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is not found.
    pub fn attach_shape(&mut self, product: ProductId, shape: ShapeId) -> Result<(), ModelError> {
        self.shape(shape)?;
        self.product_mut(product)?.shapes.push(shape);
        Ok(())
    }

    /// Adds a placed link from `parent` to `child`.
    ///
    /// # Errors
    ///
    /// Returns an error if either shape is missing or the link id is
    /// already used.
    pub fn add_link(
        &mut self,
        parent: ShapeId,
        entity_id: EntityId,
        kind: LinkKind,
        child: ShapeId,
        placement: Matrix4,
    ) -> Result<(), ModelError> {
        self.shape(child)?;
        let position = self.shape(parent)?.links.len();
        self.register(entity_id, EntityRef::Link(parent, position))?;
        self.shape_mut(parent)?.links.push(ShapeLink {
            entity_id,
            kind,
            child,
            placement,
        });
        Ok(())
    }

    /// Returns a reference to the shape data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the document.
    pub fn shape(&self, id: ShapeId) -> Result<&ShapeData, ModelError> {
        self.shapes
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("shape".into()))
    }

    /// Returns a mutable reference to the shape data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the document.
    pub fn shape_mut(&mut self, id: ShapeId) -> Result<&mut ShapeData, ModelError> {
        self.shapes
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("shape".into()))
    }

    /// Length unit of a shape's coordinate space, if declared.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is not found.
    pub fn shape_unit(&self, shape: ShapeId) -> Result<Option<LengthUnit>, ModelError> {
        Ok(self.shape(shape)?.unit)
    }

    // --- Item operations ---

    /// Inserts a representation item, registering its face ids too.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateEntity`] if the item or one of its
    /// faces reuses an existing id.
    pub fn add_item(&mut self, data: ItemData) -> Result<ItemId, ModelError> {
        let mut ids = vec![data.entity_id];
        if let Some(brep) = data.brep() {
            ids.extend(brep.faces.iter().map(|f| f.entity_id));
        }
        let mut seen = HashSet::new();
        for id in &ids {
            if self.index.contains_key(id) || !seen.insert(*id) {
                return Err(ModelError::DuplicateEntity(*id));
            }
        }
        let entity_id = data.entity_id;
        let item = self.items.insert(data);
        self.register(entity_id, EntityRef::Item(item))?;
        for (position, face) in ids.into_iter().skip(1).enumerate() {
            self.register(face, EntityRef::Face(item, position))?;
        }
        Ok(item)
    }

    /// Appends an existing item to a shape's item list.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is not found.
    pub fn add_shape_item(&mut self, shape: ShapeId, item: ItemId) -> Result<(), ModelError> {
        self.item(item)?;
        self.shape_mut(shape)?.items.push(item);
        Ok(())
    }

    /// Returns a reference to the item data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the document.
    pub fn item(&self, id: ItemId) -> Result<&ItemData, ModelError> {
        self.items
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("item".into()))
    }

    /// Returns a mutable reference to the item data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the document.
    pub fn item_mut(&mut self, id: ItemId) -> Result<&mut ItemData, ModelError> {
        self.items
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("item".into()))
    }

    // --- Annotation operations ---

    /// Inserts an annotation representation and attaches it to `shape`.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape or one of the items is missing, or the
    /// annotation id is already used.
    pub fn add_annotation(
        &mut self,
        shape: ShapeId,
        data: AnnotationData,
    ) -> Result<AnnotationId, ModelError> {
        self.shape(shape)?;
        for &item in &data.items {
            self.item(item)?;
        }
        if self.index.contains_key(&data.entity_id) {
            return Err(ModelError::DuplicateEntity(data.entity_id));
        }
        let entity_id = data.entity_id;
        let id = self.annotations.insert(data);
        self.register(entity_id, EntityRef::Annotation(id))?;
        self.shape_mut(shape)?.annotations.push(id);
        Ok(id)
    }

    /// Returns a reference to the annotation data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the document.
    pub fn annotation(&self, id: AnnotationId) -> Result<&AnnotationData, ModelError> {
        self.annotations
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("annotation".into()))
    }

    /// Number of products in the document.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Number of shapes in the document.
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}
