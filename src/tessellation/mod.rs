mod linearize;
mod mesh;
mod tessellate_face;
mod tessellate_solid;

pub use linearize::{arc_segments, circle_points, curve_extent, linearize_curve};
pub use mesh::{FaceGroup, Facet, Mesh};
pub use tessellate_face::TessellateFace;
pub use tessellate_solid::TessellateSolid;

use crate::error::{Result, TessellationError};
use crate::math::{Point3, Vector3};
use crate::model::{Document, ItemId, ItemKind, ShapeId};

/// A size given either in model units or relative to an extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Distance in the native units of the part.
    Absolute(f64),
    /// Fraction of the bounding-box diagonal of the geometry being meshed.
    Fraction(f64),
}

impl Tolerance {
    /// Resolves to an absolute distance against `extent`.
    #[must_use]
    pub fn resolve(self, extent: f64) -> f64 {
        match self {
            Self::Absolute(d) => d,
            Self::Fraction(f) => f * extent,
        }
    }
}

/// Parameters controlling tessellation quality and the mesher pool.
#[derive(Debug, Clone, Copy)]
pub struct MeshOptions {
    /// Maximum deviation of a chord from the true curve.
    pub tolerance: Tolerance,
    /// Faces whose bounding box is smaller than this are collapsed.
    pub min_face: Option<Tolerance>,
    /// Minimum number of segments for a full circle.
    pub min_segments: usize,
    /// Maximum number of segments for a full circle.
    pub max_segments: usize,
    /// Worker threads; `None` lets the pool pick.
    pub threads: Option<usize>,
    /// Maximum number of jobs in flight; `None` is unbounded.
    pub queue_limit: Option<usize>,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::Absolute(0.01),
            min_face: None,
            min_segments: 4,
            max_segments: 256,
            threads: None,
            queue_limit: None,
        }
    }
}

impl MeshOptions {
    /// Checks that the options describe a usable mesher.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::InvalidParameters`] for a non-positive
    /// tolerance, a negative minimum face size, or inverted segment bounds.
    pub fn validate(&self) -> std::result::Result<(), TessellationError> {
        let tol = match self.tolerance {
            Tolerance::Absolute(v) | Tolerance::Fraction(v) => v,
        };
        if tol.is_nan() || tol <= 0.0 {
            return Err(TessellationError::InvalidParameters(format!(
                "tolerance must be positive, got {tol}"
            )));
        }
        if let Some(Tolerance::Absolute(v) | Tolerance::Fraction(v)) = self.min_face {
            if v.is_nan() || v < 0.0 {
                return Err(TessellationError::InvalidParameters(format!(
                    "minimum face size must not be negative, got {v}"
                )));
            }
        }
        if self.min_segments == 0 || self.min_segments > self.max_segments {
            return Err(TessellationError::InvalidParameters(format!(
                "segment bounds {}..{} are empty",
                self.min_segments, self.max_segments
            )));
        }
        Ok(())
    }
}

/// Triangulation of a single planar face.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Unit normal shared by every triangle.
    pub normal: Vector3,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

/// Meshing back end used by the scheduler.
///
/// Implementations are shared with worker threads and must only read the
/// document.
pub trait Tessellator: Send + Sync {
    /// Returns `true` if `item` can be meshed in the context of `shape`.
    fn can_make(&self, doc: &Document, shape: ShapeId, item: ItemId) -> bool;

    /// Returns `true` if `item` is written as a shell in the scene graph.
    fn is_shell(&self, doc: &Document, shape: ShapeId, item: ItemId) -> bool;

    /// Meshes `item` under `shape`.
    ///
    /// # Errors
    ///
    /// Returns an error if the item cannot be meshed.
    fn make_mesh(
        &self,
        doc: &Document,
        shape: ShapeId,
        item: ItemId,
        options: &MeshOptions,
    ) -> Result<Mesh>;
}

/// Planar B-rep mesher built on constrained Delaunay triangulation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrepTessellator;

impl Tessellator for BrepTessellator {
    fn can_make(&self, doc: &Document, _shape: ShapeId, item: ItemId) -> bool {
        doc.item(item).is_ok_and(|i| i.is_tessellable())
    }

    fn is_shell(&self, doc: &Document, _shape: ShapeId, item: ItemId) -> bool {
        doc.item(item)
            .is_ok_and(|i| matches!(i.kind, ItemKind::Solid(_) | ItemKind::Shell(_)))
    }

    fn make_mesh(
        &self,
        doc: &Document,
        shape: ShapeId,
        item: ItemId,
        options: &MeshOptions,
    ) -> Result<Mesh> {
        Ok(TessellateSolid::new(shape, item, options).execute(doc)?)
    }
}
