use tracing::debug;

use crate::error::TessellationError;
use crate::math::BoundingBox;
use crate::model::{Document, ItemId, ShapeId};

use super::tessellate_face::face_bounds;
use super::{Mesh, MeshOptions, TessellateFace};

/// Tessellates every face of a solid or shell into one [`Mesh`].
pub struct TessellateSolid<'a> {
    shape: ShapeId,
    item: ItemId,
    options: &'a MeshOptions,
}

impl<'a> TessellateSolid<'a> {
    /// Creates a new `TessellateSolid` operation.
    #[must_use]
    pub fn new(shape: ShapeId, item: ItemId, options: &'a MeshOptions) -> Self {
        Self {
            shape,
            item,
            options,
        }
    }

    /// Executes the tessellation, returning a mesh with one face group per
    /// B-rep face.
    ///
    /// Faces smaller than the minimum face size, and faces whose boundary
    /// cannot be triangulated, are kept as empty groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing or not a B-rep, or if no face
    /// produced any facets.
    pub fn execute(&self, doc: &Document) -> Result<Mesh, TessellationError> {
        let item = doc
            .item(self.item)
            .map_err(|e| TessellationError::InvalidParameters(e.to_string()))?;
        let brep = item.brep().ok_or_else(|| {
            TessellationError::InvalidParameters(format!("item #{} is not a B-rep", item.entity_id))
        })?;

        let bounds: Vec<BoundingBox> = brep.faces.iter().map(face_bounds).collect();
        let mut solid_bbox = BoundingBox::empty();
        for b in &bounds {
            solid_bbox.merge(b);
        }
        let min_face = self
            .options
            .min_face
            .map(|m| m.resolve(solid_bbox.diagonal()));

        let mut mesh = Mesh::new(self.item, item.entity_id, self.shape);
        for (face, bbox) in brep.faces.iter().zip(&bounds) {
            let color = face.color.or(item.color);
            if min_face.is_some_and(|m| bbox.diagonal() < m) {
                mesh.push_empty_face(face.entity_id, color);
                continue;
            }
            match TessellateFace::new(face, self.options).execute() {
                Ok(planar) => mesh.push_face(face.entity_id, color, &planar),
                Err(e) => {
                    debug!(face = %face.entity_id, error = %e, "face skipped");
                    mesh.push_empty_face(face.entity_id, color);
                }
            }
        }

        if mesh.facet_count() == 0 {
            return Err(TessellationError::Failed(format!(
                "solid #{} produced no facets",
                item.entity_id
            )));
        }
        Ok(mesh)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EntityId;
    use crate::tessellation::Tolerance;
    use crate::test_support;

    #[test]
    fn one_group_per_face() {
        let fixture = test_support::two_instance_assembly();
        let mesh = TessellateSolid::new(fixture.part_shape, fixture.solid, &MeshOptions::default())
            .execute(&fixture.doc)
            .unwrap();
        assert_eq!(mesh.faces().len(), 1);
        assert_eq!(mesh.facet_count(), 1);
        assert_eq!(mesh.item(), fixture.solid);
        assert_eq!(mesh.shape(), fixture.part_shape);
    }

    #[test]
    fn box_faces_are_all_meshed() {
        let mut doc = Document::new();
        let shape = doc.add_shape(EntityId::from_raw(1), None).unwrap();
        let solid = test_support::add_box(&mut doc, shape, 100, [2.0, 3.0, 4.0]);
        let mesh = TessellateSolid::new(shape, solid, &MeshOptions::default())
            .execute(&doc)
            .unwrap();
        assert_eq!(mesh.faces().len(), 6);
        assert_eq!(mesh.facet_count(), 12);
        approx::assert_relative_eq!(mesh.area(), 2.0 * (6.0 + 8.0 + 12.0), epsilon = 1e-9);
    }

    #[test]
    fn small_faces_collapse_to_empty_groups() {
        let mut doc = Document::new();
        let shape = doc.add_shape(EntityId::from_raw(1), None).unwrap();
        let solid = test_support::add_box(&mut doc, shape, 100, [10.0, 0.5, 0.5]);
        let options = MeshOptions {
            min_face: Some(Tolerance::Absolute(5.0)),
            ..MeshOptions::default()
        };
        let mesh = TessellateSolid::new(shape, solid, &options)
            .execute(&doc)
            .unwrap();
        assert_eq!(mesh.faces().len(), 6);
        assert_eq!(mesh.facet_count(), 8);
    }

    #[test]
    fn non_brep_items_are_rejected() {
        let fixture = test_support::two_instance_assembly();
        let result = TessellateSolid::new(fixture.part_shape, fixture.curve, &MeshOptions::default())
            .execute(&fixture.doc);
        assert!(matches!(result, Err(TessellationError::InvalidParameters(_))));
    }
}
