use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DocumentError, Result};
use crate::math::transform::axis2_placement;
use crate::math::{Matrix4, Point3, Vector3};
use crate::model::{
    AnnotationData, AnnotationKind, BoundaryLoop, Brep, BrepFace, Color, Curve, Document,
    EntityId, EntityRef, ItemData, ItemId, ItemKind, LengthUnit, LinkKind, ProductId, ShapeId,
};

/// Top-level layout of an assembly file.
///
/// Entities refer to each other by id; references may point forward.
#[derive(Debug, Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    products: Vec<ProductRecord>,
    #[serde(default)]
    shapes: Vec<ShapeRecord>,
    #[serde(default)]
    items: Vec<ItemRecord>,
    #[serde(default)]
    annotations: Vec<AnnotationRecord>,
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    shapes: Vec<u64>,
    #[serde(default)]
    children: Vec<UsageRecord>,
}

#[derive(Debug, Deserialize)]
struct UsageRecord {
    id: u64,
    product: u64,
}

#[derive(Debug, Deserialize)]
struct ShapeRecord {
    id: u64,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    items: Vec<u64>,
    #[serde(default)]
    links: Vec<LinkRecord>,
    #[serde(default)]
    annotations: Vec<u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LinkKindRecord {
    #[default]
    Relationship,
    MappedItem,
}

#[derive(Debug, Deserialize)]
struct LinkRecord {
    id: u64,
    #[serde(default)]
    kind: LinkKindRecord,
    child: u64,
    #[serde(default)]
    placement: Option<PlacementRecord>,
}

/// A placement given as a raw column-major matrix or as an axis2 frame.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PlacementRecord {
    Matrix {
        matrix: [f64; 16],
    },
    Axis2 {
        location: [f64; 3],
        #[serde(default)]
        axis: Option<[f64; 3]>,
        #[serde(default)]
        ref_direction: Option<[f64; 3]>,
    },
}

impl PlacementRecord {
    fn to_matrix(&self) -> Matrix4 {
        match self {
            Self::Matrix { matrix } => Matrix4::from_column_slice(matrix),
            Self::Axis2 {
                location,
                axis,
                ref_direction,
            } => axis2_placement(
                &point(*location),
                &axis.map_or_else(Vector3::z, vector),
                &ref_direction.map_or_else(Vector3::x, vector),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemRecord {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(flatten)]
    kind: ItemKindRecord,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ItemKindRecord {
    Solid { faces: Vec<FaceRecord> },
    Shell { faces: Vec<FaceRecord> },
    Curve { curve: CurveRecord },
    GeometricSet { curves: Vec<CurveRecord> },
    AnnotationPlane { items: Vec<u64> },
    Placement,
}

#[derive(Debug, Deserialize)]
struct FaceRecord {
    id: u64,
    #[serde(default)]
    color: Option<String>,
    outer: LoopRecord,
    #[serde(default)]
    inner: Vec<LoopRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LoopRecord {
    Polygon(Vec<[f64; 3]>),
    Circle {
        center: [f64; 3],
        normal: [f64; 3],
        radius: f64,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CurveRecord {
    Polyline(Vec<[f64; 3]>),
    Circle {
        center: [f64; 3],
        normal: [f64; 3],
        radius: f64,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AnnotationKindRecord {
    DraughtingModel,
    ConstructiveGeometry,
}

#[derive(Debug, Deserialize)]
struct AnnotationRecord {
    id: u64,
    kind: AnnotationKindRecord,
    #[serde(default)]
    items: Vec<u64>,
}

fn point(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

fn vector(v: [f64; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}

fn entity_id(raw: u64) -> std::result::Result<EntityId, DocumentError> {
    EntityId::new(raw).ok_or(DocumentError::ZeroEntityId)
}

fn color(text: Option<&str>) -> std::result::Result<Option<Color>, DocumentError> {
    text.map(|t| Color::parse_hex(t).ok_or_else(|| DocumentError::InvalidColor(t.to_owned())))
        .transpose()
}

fn boundary(record: &LoopRecord) -> BoundaryLoop {
    match record {
        LoopRecord::Polygon(points) => {
            BoundaryLoop::Polygon(points.iter().copied().map(point).collect())
        }
        LoopRecord::Circle {
            center,
            normal,
            radius,
        } => BoundaryLoop::Circle {
            center: point(*center),
            normal: vector(*normal),
            radius: *radius,
        },
    }
}

fn curve(record: &CurveRecord) -> Curve {
    match record {
        CurveRecord::Polyline(points) => Curve::Polyline(points.iter().copied().map(point).collect()),
        CurveRecord::Circle {
            center,
            normal,
            radius,
        } => Curve::Circle {
            center: point(*center),
            normal: vector(*normal),
            radius: *radius,
        },
    }
}

fn brep(faces: &[FaceRecord]) -> std::result::Result<Brep, DocumentError> {
    let faces = faces
        .iter()
        .map(|f| -> std::result::Result<BrepFace, DocumentError> {
            Ok(BrepFace {
                entity_id: entity_id(f.id)?,
                color: color(f.color.as_deref())?,
                outer: boundary(&f.outer),
                inner: f.inner.iter().map(boundary).collect(),
            })
        })
        .collect::<std::result::Result<_, DocumentError>>()?;
    Ok(Brep { faces })
}

/// Resolves `to` (referenced from `from`) through the document index.
struct Resolver<'a> {
    doc: &'a Document,
}

impl Resolver<'_> {
    fn unresolved(from: u64, to: u64, expected: &'static str) -> DocumentError {
        DocumentError::UnresolvedReference { from, to, expected }
    }

    fn lookup(&self, to: u64) -> Option<EntityRef> {
        EntityId::new(to).and_then(|id| self.doc.find_by_entity(id))
    }

    fn product(&self, from: u64, to: u64) -> std::result::Result<ProductId, DocumentError> {
        match self.lookup(to) {
            Some(EntityRef::Product(id)) => Ok(id),
            _ => Err(Self::unresolved(from, to, "product")),
        }
    }

    fn shape(&self, from: u64, to: u64) -> std::result::Result<ShapeId, DocumentError> {
        match self.lookup(to) {
            Some(EntityRef::Shape(id)) => Ok(id),
            _ => Err(Self::unresolved(from, to, "shape")),
        }
    }

    fn item(&self, from: u64, to: u64) -> std::result::Result<ItemId, DocumentError> {
        match self.lookup(to) {
            Some(EntityRef::Item(id)) => Ok(id),
            _ => Err(Self::unresolved(from, to, "representation item")),
        }
    }
}

/// Reads an assembly document from a JSON file.
///
/// # Errors
///
/// Returns [`DocumentError::Read`] if the file cannot be read, and any error
/// of [`parse_document`].
pub fn load_document(path: &Path) -> Result<Document> {
    let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&text)
}

/// Builds a [`Document`] from the JSON text of an assembly file.
///
/// Entities are created first and cross-references resolved afterwards, so
/// records may appear in any order.
///
/// # Errors
///
/// Returns an error for malformed JSON, an entity id of zero, a duplicate
/// id, a reference to a missing or mistyped entity, or an invalid unit or
/// color.
pub fn parse_document(text: &str) -> Result<Document> {
    let record: DocumentRecord = serde_json::from_str(text).map_err(DocumentError::from)?;
    let mut doc = Document::new();

    for p in &record.products {
        doc.add_product(entity_id(p.id)?, p.name.clone())?;
    }
    for s in &record.shapes {
        let unit = s
            .unit
            .as_deref()
            .map(str::parse::<LengthUnit>)
            .transpose()?;
        doc.add_shape(entity_id(s.id)?, unit)?;
    }
    for i in &record.items {
        let kind = match &i.kind {
            ItemKindRecord::Solid { faces } => ItemKind::Solid(brep(faces)?),
            ItemKindRecord::Shell { faces } => ItemKind::Shell(brep(faces)?),
            ItemKindRecord::Curve { curve: c } => ItemKind::Curve(curve(c)),
            ItemKindRecord::GeometricSet { curves } => {
                ItemKind::GeometricSet(curves.iter().map(curve).collect())
            }
            // Elements are filled in once every item exists.
            ItemKindRecord::AnnotationPlane { .. } => ItemKind::AnnotationPlane(Vec::new()),
            ItemKindRecord::Placement => ItemKind::Placement,
        };
        doc.add_item(ItemData {
            entity_id: entity_id(i.id)?,
            name: i.name.clone(),
            color: color(i.color.as_deref())?,
            kind,
        })?;
    }

    resolve_products(&mut doc, &record.products)?;
    resolve_items(&mut doc, &record.items)?;
    resolve_shapes(&mut doc, &record.shapes, &record.annotations)?;
    Ok(doc)
}

fn resolve_products(doc: &mut Document, products: &[ProductRecord]) -> Result<()> {
    for p in products {
        let (product, shapes, usages) = {
            let r = Resolver { doc };
            let product = r.product(p.id, p.id)?;
            let shapes = p
                .shapes
                .iter()
                .map(|&s| r.shape(p.id, s))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let usages = p
                .children
                .iter()
                .map(|u| -> std::result::Result<_, DocumentError> {
                    Ok((entity_id(u.id)?, r.product(u.id, u.product)?))
                })
                .collect::<std::result::Result<Vec<_>, _>>()?;
            (product, shapes, usages)
        };
        for shape in shapes {
            doc.attach_shape(product, shape)?;
        }
        for (id, child) in usages {
            doc.add_usage(product, id, child)?;
        }
    }
    Ok(())
}

fn resolve_items(doc: &mut Document, items: &[ItemRecord]) -> Result<()> {
    for i in items {
        let ItemKindRecord::AnnotationPlane { items: elements } = &i.kind else {
            continue;
        };
        let (plane, resolved) = {
            let r = Resolver { doc };
            let plane = r.item(i.id, i.id)?;
            let resolved = elements
                .iter()
                .map(|&e| r.item(i.id, e))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            (plane, resolved)
        };
        doc.item_mut(plane)?.kind = ItemKind::AnnotationPlane(resolved);
    }
    Ok(())
}

fn resolve_shapes(
    doc: &mut Document,
    shapes: &[ShapeRecord],
    annotations: &[AnnotationRecord],
) -> Result<()> {
    for s in shapes {
        let r = Resolver { doc };
        let shape = r.shape(s.id, s.id)?;
        let items = s
            .items
            .iter()
            .map(|&i| r.item(s.id, i))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut links = Vec::with_capacity(s.links.len());
        for l in &s.links {
            let kind = match l.kind {
                LinkKindRecord::Relationship => LinkKind::Relationship,
                LinkKindRecord::MappedItem => LinkKind::MappedItem,
            };
            let placement = l
                .placement
                .as_ref()
                .map_or_else(Matrix4::identity, PlacementRecord::to_matrix);
            links.push((entity_id(l.id)?, kind, r.shape(l.id, l.child)?, placement));
        }
        let mut attached = Vec::with_capacity(s.annotations.len());
        for &a in &s.annotations {
            let record = annotations
                .iter()
                .find(|rec| rec.id == a)
                .ok_or_else(|| Resolver::unresolved(s.id, a, "annotation representation"))?;
            let kind = match record.kind {
                AnnotationKindRecord::DraughtingModel => AnnotationKind::DraughtingModel,
                AnnotationKindRecord::ConstructiveGeometry => AnnotationKind::ConstructiveGeometry,
            };
            let members = record
                .items
                .iter()
                .map(|&i| r.item(record.id, i))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            attached.push(AnnotationData {
                entity_id: entity_id(record.id)?,
                kind,
                items: members,
            });
        }

        for item in items {
            doc.add_shape_item(shape, item)?;
        }
        for (id, kind, child, placement) in links {
            doc.add_link(shape, id, kind, child, placement)?;
        }
        for data in attached {
            doc.add_annotation(shape, data)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{FacetError, ModelError};
    use approx::assert_relative_eq;

    const ASSEMBLY: &str = r##"{
        "products": [
            { "id": 1, "name": "ASM", "shapes": [10], "children": [{ "id": 3, "product": 2 }] },
            { "id": 2, "name": "A", "shapes": [20] }
        ],
        "shapes": [
            {
                "id": 10,
                "unit": "mm",
                "links": [
                    { "id": 11, "child": 20 },
                    {
                        "id": 12,
                        "kind": "mapped_item",
                        "child": 20,
                        "placement": { "location": [10, 0, 0] }
                    }
                ]
            },
            { "id": 20, "unit": "mm", "items": [30], "annotations": [50] }
        ],
        "items": [
            {
                "id": 30,
                "type": "solid",
                "name": "body",
                "color": "#00ff00",
                "faces": [
                    { "id": 31, "outer": { "polygon": [[0, 0, 0], [1, 0, 0], [0, 1, 0]] } }
                ]
            },
            { "id": 52, "type": "annotation_plane", "items": [51] },
            {
                "id": 51,
                "type": "geometric_set",
                "curves": [{ "polyline": [[0, 0, 1], [1, 0, 1]] }]
            }
        ],
        "annotations": [{ "id": 50, "kind": "draughting_model", "items": [52] }]
    }"##;

    #[test]
    fn assembly_file_resolves_every_reference() {
        let doc = parse_document(ASSEMBLY).unwrap();
        assert_eq!(doc.product_count(), 2);
        assert_eq!(doc.shape_count(), 2);

        let roots = doc.root_products();
        assert_eq!(roots.len(), 1);
        let asm = doc.product(roots[0]).unwrap();
        assert_eq!(asm.name.as_deref(), Some("ASM"));
        assert_eq!(asm.usages.len(), 1);

        let asm_shape = doc.shape(asm.shapes[0]).unwrap();
        assert_eq!(asm_shape.unit, Some(LengthUnit::Millimetre));
        assert_eq!(asm_shape.links.len(), 2);
        assert_eq!(asm_shape.links[0].placement, Matrix4::identity());
        assert_eq!(asm_shape.links[1].kind, LinkKind::MappedItem);
        assert_relative_eq!(asm_shape.links[1].placement[(0, 3)], 10.0);

        let part_shape = doc.shape(asm_shape.links[0].child).unwrap();
        let solid = doc.item(part_shape.items[0]).unwrap();
        assert_eq!(solid.color, Some(Color(0x00ff00)));
        assert!(solid.is_tessellable());
        assert_eq!(part_shape.annotations.len(), 1);

        let Some(EntityRef::Item(plane)) = doc.find_by_entity(EntityId::from_raw(52)) else {
            panic!("plane not indexed");
        };
        assert!(
            matches!(&doc.item(plane).unwrap().kind, ItemKind::AnnotationPlane(items) if items.len() == 1)
        );
    }

    #[test]
    fn raw_matrices_are_column_major() {
        let text = r#"{
            "shapes": [
                {
                    "id": 1,
                    "links": [{
                        "id": 2,
                        "child": 3,
                        "placement": { "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 4,5,6,1] }
                    }]
                },
                { "id": 3 }
            ]
        }"#;
        let doc = parse_document(text).unwrap();
        let Some(EntityRef::Shape(shape)) = doc.find_by_entity(EntityId::from_raw(1)) else {
            panic!("shape not indexed");
        };
        let m = doc.shape(shape).unwrap().links[0].placement;
        assert_relative_eq!(m[(0, 3)], 4.0);
        assert_relative_eq!(m[(1, 3)], 5.0);
        assert_relative_eq!(m[(2, 3)], 6.0);
    }

    #[test]
    fn dangling_references_are_rejected() {
        let text = r#"{ "products": [{ "id": 1, "shapes": [99] }] }"#;
        let err = parse_document(text).unwrap_err();
        assert!(matches!(
            err,
            FacetError::Document(DocumentError::UnresolvedReference { from: 1, to: 99, .. })
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn zero_ids_and_duplicates_are_rejected() {
        let zero = parse_document(r#"{ "products": [{ "id": 0 }] }"#).unwrap_err();
        assert!(matches!(zero, FacetError::Document(DocumentError::ZeroEntityId)));

        let dup = parse_document(r#"{ "products": [{ "id": 1 }], "shapes": [{ "id": 1 }] }"#)
            .unwrap_err();
        assert!(matches!(dup, FacetError::Model(ModelError::DuplicateEntity(_))));
    }

    #[test]
    fn bad_units_colors_and_syntax_are_reported() {
        let unit = parse_document(r#"{ "shapes": [{ "id": 1, "unit": "furlong" }] }"#);
        assert!(matches!(
            unit.unwrap_err(),
            FacetError::Document(DocumentError::UnknownUnit(_))
        ));

        let color = parse_document(
            r#"{ "items": [{ "id": 1, "type": "placement", "color": "red" }] }"#,
        );
        assert!(matches!(
            color.unwrap_err(),
            FacetError::Document(DocumentError::InvalidColor(_))
        ));

        assert!(matches!(
            parse_document("{ not json").unwrap_err(),
            FacetError::Document(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_document(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, FacetError::Document(DocumentError::Read { .. })));
        assert_eq!(err.exit_code(), 2);
    }
}
