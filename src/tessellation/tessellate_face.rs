use std::collections::{HashMap, HashSet, VecDeque};
use std::f64::consts::TAU;

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::TessellationError;
use crate::math::polygon_3d::{centroid, newell_normal, PlaneFrame};
use crate::math::{BoundingBox, Point3, TOLERANCE};
use crate::model::{BoundaryLoop, BrepFace};

use super::linearize::{arc_segments, circle_points};
use super::{MeshOptions, TriangleMesh};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Tessellates a planar B-rep face into a triangle mesh.
pub struct TessellateFace<'a> {
    face: &'a BrepFace,
    options: &'a MeshOptions,
}

impl<'a> TessellateFace<'a> {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(face: &'a BrepFace, options: &'a MeshOptions) -> Self {
        Self { face, options }
    }

    /// Executes the tessellation.
    ///
    /// Triangles wind counter-clockwise around the face normal, which is
    /// taken from the outer loop.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::Failed`] if the outer loop is degenerate
    /// or the constrained triangulation cannot be built.
    #[allow(clippy::cast_possible_truncation)]
    pub fn execute(&self) -> Result<TriangleMesh, TessellationError> {
        let outer_3d = self.loop_points(&self.face.outer);
        if outer_3d.len() < 3 {
            return Err(TessellationError::Failed(format!(
                "face #{} has fewer than 3 boundary points",
                self.face.entity_id
            )));
        }
        let inner_3d_list: Vec<Vec<Point3>> =
            self.face.inner.iter().map(|l| self.loop_points(l)).collect();

        let frame = PlaneFrame::from_normal(centroid(&outer_3d), &newell_normal(&outer_3d))
            .ok_or_else(|| {
                TessellationError::Failed(format!("face #{} has zero area", self.face.entity_id))
            })?;

        let project = |p: &Point3| -> SpadePoint2<f64> {
            let (u, v) = frame.project(p);
            SpadePoint2::new(u, v)
        };

        let mut cdt = Cdt::new();
        insert_constraint_loop(&mut cdt, &outer_3d.iter().map(project).collect::<Vec<_>>())?;
        for inner_3d in inner_3d_list.iter().filter(|pts| pts.len() >= 3) {
            insert_constraint_loop(&mut cdt, &inner_3d.iter().map(project).collect::<Vec<_>>())?;
        }

        let interior_faces = classify_interior_faces(&cdt);

        let mut mesh = TriangleMesh {
            normal: *frame.normal(),
            ..TriangleMesh::default()
        };
        let mut vertex_map: HashMap<usize, u32> = HashMap::new();

        for face_handle in cdt.inner_faces() {
            if !interior_faces.contains(&face_handle.fix().index()) {
                continue;
            }

            let mut tri_indices = [0u32; 3];
            for (i, vh) in face_handle.vertices().iter().enumerate() {
                let idx = vh.fix().index();
                tri_indices[i] = *vertex_map.entry(idx).or_insert_with(|| {
                    let pos = vh.position();
                    mesh.vertices.push(frame.lift(pos.x, pos.y));
                    (mesh.vertices.len() - 1) as u32
                });
            }
            mesh.indices.push(tri_indices);
        }

        Ok(mesh)
    }

    /// Boundary points of one loop, with circles linearized under the
    /// chord tolerance.
    fn loop_points(&self, boundary: &BoundaryLoop) -> Vec<Point3> {
        match boundary {
            BoundaryLoop::Polygon(points) => {
                let mut points = points.clone();
                if points.len() > 1 && (points[0] - points[points.len() - 1]).norm() < TOLERANCE {
                    points.pop();
                }
                points
            }
            BoundaryLoop::Circle {
                center,
                normal,
                radius,
            } => {
                let tolerance = self.options.tolerance.resolve(2.0 * radius);
                let n = arc_segments(
                    *radius,
                    TAU,
                    tolerance,
                    self.options.min_segments.max(3),
                    self.options.max_segments,
                );
                circle_points(center, normal, *radius, n)
            }
        }
    }
}

/// Bounding box of a face's boundary, with circles taken by their extent.
#[must_use]
pub fn face_bounds(face: &BrepFace) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    for boundary in std::iter::once(&face.outer).chain(&face.inner) {
        match boundary {
            BoundaryLoop::Polygon(points) => {
                for p in points {
                    bbox.update(p);
                }
            }
            BoundaryLoop::Circle { center, radius, .. } => {
                let r = crate::math::Vector3::repeat(*radius);
                bbox.update(&(center - r));
                bbox.update(&(center + r));
            }
        }
    }
    bbox
}

/// Inserts a closed polygon as constraint edges into the CDT.
///
/// Edges that would cross an existing constraint are skipped; the loop is
/// then left open there and the flood fill treats the gap as unconstrained.
fn insert_constraint_loop(
    cdt: &mut Cdt,
    points: &[SpadePoint2<f64>],
) -> Result<(), TessellationError> {
    if points.len() < 3 {
        return Err(TessellationError::Failed(
            "constraint loop needs at least 3 points".into(),
        ));
    }

    let mut handles = Vec::with_capacity(points.len());
    for &pt in points {
        let h = cdt
            .insert(pt)
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from != to && cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        }
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the face using flood-fill.
///
/// Starts from faces adjacent to the outer (infinite) face at depth 0. Each time
/// a constraint edge is crossed, depth increments. Odd depth = interior.
fn classify_interior_faces(cdt: &Cdt) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map.contains_key(&idx) {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(idx, depth);
            if depth % 2 == 1 {
                interior.insert(idx);
            }
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        for edge in cdt.face(face_fix).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let n_idx = neighbor.fix().index();
            if depth_map.contains_key(&n_idx) {
                continue;
            }
            let new_depth = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map.insert(n_idx, new_depth);
            if new_depth % 2 == 1 {
                interior.insert(n_idx);
            }
            queue.push_back((neighbor.fix(), new_depth));
        }
    }

    interior
}
