//! Sample assemblies shared by unit tests.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use crate::math::{Matrix4, Point3, Vector3};
use crate::model::{
    AnnotationData, AnnotationId, AnnotationKind, BoundaryLoop, Brep, BrepFace, Curve, Document,
    EntityId, ItemData, ItemId, ItemKind, LengthUnit, LinkKind, ProductId, ShapeId,
};

fn eid(n: u64) -> EntityId {
    EntityId::from_raw(n)
}

/// Product "ASM" using part "A" twice, at the identity and at `(10, 0, 0)`.
///
/// | entity | id |
/// |---|---|
/// | ASM / A | #1 / #2 |
/// | usages | #3, #4 |
/// | ASM shape / A shape | #10 / #20 |
/// | links | #11 (identity), #12 (translation) |
/// | solid / its face | #30 / #31 |
/// | wireframe curve on A | #40 |
pub struct Fixture {
    pub doc: Arc<Document>,
    pub asm: ProductId,
    pub part: ProductId,
    pub asm_shape: ShapeId,
    pub part_shape: ShapeId,
    pub solid: ItemId,
    pub curve: ItemId,
}

pub fn two_instance_assembly() -> Fixture {
    let mut doc = Document::new();
    let asm = doc.add_product(eid(1), Some("ASM".into())).unwrap();
    let part = doc.add_product(eid(2), Some("A".into())).unwrap();
    doc.add_usage(asm, eid(3), part).unwrap();
    doc.add_usage(asm, eid(4), part).unwrap();

    let asm_shape = doc.add_shape(eid(10), Some(LengthUnit::Millimetre)).unwrap();
    let part_shape = doc.add_shape(eid(20), Some(LengthUnit::Millimetre)).unwrap();
    doc.attach_shape(asm, asm_shape).unwrap();
    doc.attach_shape(part, part_shape).unwrap();
    doc.add_link(
        asm_shape,
        eid(11),
        LinkKind::Relationship,
        part_shape,
        Matrix4::identity(),
    )
    .unwrap();
    doc.add_link(
        asm_shape,
        eid(12),
        LinkKind::MappedItem,
        part_shape,
        Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)),
    )
    .unwrap();

    let solid = doc
        .add_item(ItemData {
            entity_id: eid(30),
            name: Some("body".into()),
            color: None,
            kind: ItemKind::Solid(Brep {
                faces: vec![BrepFace {
                    entity_id: eid(31),
                    color: None,
                    outer: BoundaryLoop::Polygon(vec![
                        Point3::new(0.0, 0.0, 0.0),
                        Point3::new(1.0, 0.0, 0.0),
                        Point3::new(0.0, 1.0, 0.0),
                    ]),
                    inner: Vec::new(),
                }],
            }),
        })
        .unwrap();
    doc.add_shape_item(part_shape, solid).unwrap();

    let curve = doc
        .add_item(ItemData {
            entity_id: eid(40),
            name: None,
            color: None,
            kind: ItemKind::Curve(Curve::Polyline(vec![
                Point3::origin(),
                Point3::new(0.0, 0.0, 1.0),
            ])),
        })
        .unwrap();
    doc.add_shape_item(part_shape, curve).unwrap();

    Fixture {
        doc: Arc::new(doc),
        asm,
        part,
        asm_shape,
        part_shape,
        solid,
        curve,
    }
}

/// Adds an axis-aligned box solid with outward-facing faces to `shape`.
///
/// The solid gets id `first_id` and its six faces `first_id + 1..=first_id + 6`.
pub fn add_box(doc: &mut Document, shape: ShapeId, first_id: u64, size: [f64; 3]) -> ItemId {
    let [dx, dy, dz] = size;
    let p = Point3::new;
    let quads = [
        [p(0.0, 0.0, 0.0), p(0.0, dy, 0.0), p(dx, dy, 0.0), p(dx, 0.0, 0.0)],
        [p(0.0, 0.0, dz), p(dx, 0.0, dz), p(dx, dy, dz), p(0.0, dy, dz)],
        [p(0.0, 0.0, 0.0), p(dx, 0.0, 0.0), p(dx, 0.0, dz), p(0.0, 0.0, dz)],
        [p(0.0, dy, 0.0), p(0.0, dy, dz), p(dx, dy, dz), p(dx, dy, 0.0)],
        [p(0.0, 0.0, 0.0), p(0.0, 0.0, dz), p(0.0, dy, dz), p(0.0, dy, 0.0)],
        [p(dx, 0.0, 0.0), p(dx, dy, 0.0), p(dx, dy, dz), p(dx, 0.0, dz)],
    ];
    let faces = quads
        .iter()
        .zip(1..)
        .map(|(quad, n)| BrepFace {
            entity_id: eid(first_id + n),
            color: None,
            outer: BoundaryLoop::Polygon(quad.to_vec()),
            inner: Vec::new(),
        })
        .collect();
    let item = doc
        .add_item(ItemData {
            entity_id: eid(first_id),
            name: None,
            color: None,
            kind: ItemKind::Solid(Brep { faces }),
        })
        .unwrap();
    doc.add_shape_item(shape, item).unwrap();
    item
}

/// Root "ROOT" (#1) placing two sibling parts, each with its own box.
///
/// | entity | left | right |
/// |---|---|---|
/// | product | "P1" #2 | "P2" #3 |
/// | shape | #20 | #21 |
/// | solid | #100 (red) | #200 |
///
/// The root shape is #10 and its links are #11 and #12. The left shape also
/// carries a draughting model #50 (one polyline on an annotation plane) and
/// constructive geometry #60 (one circle).
pub struct Siblings {
    pub doc: Arc<Document>,
    pub root: ProductId,
    pub root_shape: ShapeId,
    pub left_shape: ShapeId,
    pub right_shape: ShapeId,
    pub left_solid: ItemId,
    pub right_solid: ItemId,
    pub draughting: AnnotationId,
    pub constructive: AnnotationId,
}

pub fn sibling_assembly() -> Siblings {
    let mut doc = Document::new();
    let root = doc.add_product(eid(1), Some("ROOT".into())).unwrap();
    let left = doc.add_product(eid(2), Some("P1".into())).unwrap();
    let right = doc.add_product(eid(3), Some("P2".into())).unwrap();
    doc.add_usage(root, eid(4), left).unwrap();
    doc.add_usage(root, eid(5), right).unwrap();

    let root_shape = doc.add_shape(eid(10), None).unwrap();
    let left_shape = doc.add_shape(eid(20), None).unwrap();
    let right_shape = doc.add_shape(eid(21), None).unwrap();
    doc.attach_shape(root, root_shape).unwrap();
    doc.attach_shape(left, left_shape).unwrap();
    doc.attach_shape(right, right_shape).unwrap();
    doc.add_link(
        root_shape,
        eid(11),
        LinkKind::Relationship,
        left_shape,
        Matrix4::identity(),
    )
    .unwrap();
    doc.add_link(
        root_shape,
        eid(12),
        LinkKind::Relationship,
        right_shape,
        Matrix4::new_translation(&Vector3::new(0.0, 5.0, 0.0)),
    )
    .unwrap();

    let left_solid = add_box(&mut doc, left_shape, 100, [1.0, 1.0, 1.0]);
    doc.item_mut(left_solid).unwrap().color = Some(crate::model::Color(0xff0000));
    let right_solid = add_box(&mut doc, right_shape, 200, [2.0, 1.0, 1.0]);

    let polyline = doc
        .add_item(ItemData {
            entity_id: eid(51),
            name: None,
            color: None,
            kind: ItemKind::GeometricSet(vec![Curve::Polyline(vec![
                Point3::new(0.0, 0.0, 2.0),
                Point3::new(1.0, 0.0, 2.0),
                Point3::new(1.0, 1.0, 2.0),
            ])]),
        })
        .unwrap();
    let plane = doc
        .add_item(ItemData {
            entity_id: eid(52),
            name: None,
            color: None,
            kind: ItemKind::AnnotationPlane(vec![polyline]),
        })
        .unwrap();
    let draughting = doc
        .add_annotation(
            left_shape,
            AnnotationData {
                entity_id: eid(50),
                kind: AnnotationKind::DraughtingModel,
                items: vec![plane],
            },
        )
        .unwrap();

    let circle = doc
        .add_item(ItemData {
            entity_id: eid(61),
            name: None,
            color: None,
            kind: ItemKind::Curve(Curve::Circle {
                center: Point3::new(0.5, 0.5, 0.0),
                normal: Vector3::z(),
                radius: 0.5,
            }),
        })
        .unwrap();
    let constructive = doc
        .add_annotation(
            left_shape,
            AnnotationData {
                entity_id: eid(60),
                kind: AnnotationKind::ConstructiveGeometry,
                items: vec![circle],
            },
        )
        .unwrap();

    Siblings {
        doc: Arc::new(doc),
        root,
        root_shape,
        left_shape,
        right_shape,
        left_solid,
        right_solid,
        draughting,
        constructive,
    }
}
