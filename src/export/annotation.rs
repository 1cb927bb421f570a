use std::collections::HashSet;

use tracing::warn;

use crate::error::Result;
use crate::math::Point3;
use crate::model::{AnnotationData, AnnotationKind, Curve, Document, ItemId, ItemKind};
use crate::tessellation::{curve_extent, linearize_curve, MeshOptions};

/// Chord tolerance for constructive curves, as a fraction of their extent.
const CONSTRUCTIVE_TOLERANCE: f64 = 0.01;

/// Polylines drawn by an annotation representation.
///
/// Draughting models contribute the curves of their geometric sets, found
/// directly or on annotation planes. Constructive geometry contributes its
/// bounded curves, linearized at one hundredth of each curve's extent.
/// Polylines with fewer than two points are dropped.
///
/// # Errors
///
/// Returns an error if an item of the annotation is not in the document.
pub fn annotation_polylines(
    doc: &Document,
    annotation: &AnnotationData,
    options: &MeshOptions,
) -> Result<Vec<Vec<Point3>>> {
    let mut out = Vec::new();
    match annotation.kind {
        AnnotationKind::DraughtingModel => {
            let mut seen = HashSet::new();
            for &item in &annotation.items {
                draughting_item(doc, item, options, &mut seen, &mut out)?;
            }
        }
        AnnotationKind::ConstructiveGeometry => {
            for &item in &annotation.items {
                let data = doc.item(item)?;
                match &data.kind {
                    ItemKind::Curve(curve) => push_curve(curve, options, &mut out),
                    ItemKind::GeometricSet(curves) => {
                        for curve in curves {
                            push_curve(curve, options, &mut out);
                        }
                    }
                    other => warn!(
                        item = %data.entity_id,
                        kind = other.name(),
                        "unimplemented constructive geometry case"
                    ),
                }
            }
        }
    }
    Ok(out)
}

fn draughting_item(
    doc: &Document,
    item: ItemId,
    options: &MeshOptions,
    seen: &mut HashSet<ItemId>,
    out: &mut Vec<Vec<Point3>>,
) -> Result<()> {
    if !seen.insert(item) {
        return Ok(());
    }
    let data = doc.item(item)?;
    match &data.kind {
        ItemKind::AnnotationPlane(elements) => {
            for &element in elements {
                draughting_item(doc, element, options, seen, out)?;
            }
        }
        ItemKind::GeometricSet(curves) => {
            for curve in curves {
                push_curve(curve, options, out);
            }
        }
        other => warn!(
            item = %data.entity_id,
            kind = other.name(),
            "unimplemented draughting case"
        ),
    }
    Ok(())
}

fn push_curve(curve: &Curve, options: &MeshOptions, out: &mut Vec<Vec<Point3>>) {
    let tolerance = curve_extent(curve) * CONSTRUCTIVE_TOLERANCE;
    let points = linearize_curve(curve, tolerance, options.min_segments, options.max_segments);
    if points.len() >= 2 {
        out.push(points);
    }
}
