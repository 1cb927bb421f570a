use crate::math::polygon_3d::{triangle_area, triangle_normal};
use crate::math::{BoundingBox, Point3, Vector3};
use crate::model::{Color, EntityId, ItemId, ShapeId};

use super::TriangleMesh;

/// One triangle of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Facet {
    /// Indices into the vertex buffer.
    pub verts: [u32; 3],
    /// Optional per-vertex indices into the normal buffer.
    pub normals: [Option<u32>; 3],
    /// Optional index of a precomputed facet normal.
    pub facet_normal: Option<u32>,
}

/// The run of facets generated from one B-rep face.
#[derive(Debug, Clone)]
pub struct FaceGroup {
    /// Entity id of the originating face.
    pub face: EntityId,
    pub first_facet: usize,
    pub facet_count: usize,
    pub color: Option<Color>,
    /// Surface area covered by the group's facets.
    pub area: f64,
}

/// Tessellation result for one solid.
///
/// Vertex, normal and facet buffers are shared by all face groups; each
/// group indexes a contiguous range of facets.
#[derive(Debug, Clone)]
pub struct Mesh {
    item: ItemId,
    solid_id: EntityId,
    shape: ShapeId,
    vertices: Vec<Point3>,
    normals: Vec<Vector3>,
    facets: Vec<Facet>,
    faces: Vec<FaceGroup>,
}

impl Mesh {
    /// Creates an empty mesh for `item`, generated under `shape`.
    #[must_use]
    pub fn new(item: ItemId, solid_id: EntityId, shape: ShapeId) -> Self {
        Self {
            item,
            solid_id,
            shape,
            vertices: Vec::new(),
            normals: Vec::new(),
            facets: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// The solid this mesh was generated for.
    #[must_use]
    pub fn item(&self) -> ItemId {
        self.item
    }

    /// Entity id of the solid, used as the shell reference in output.
    #[must_use]
    pub fn solid_id(&self) -> EntityId {
        self.solid_id
    }

    /// The shape context the solid was meshed under.
    #[must_use]
    pub fn shape(&self) -> ShapeId {
        self.shape
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn vertex(&self, index: u32) -> Option<&Point3> {
        self.vertices.get(index as usize)
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[must_use]
    pub fn normal(&self, index: u32) -> Option<&Vector3> {
        self.normals.get(index as usize)
    }

    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }

    #[must_use]
    pub fn facet(&self, index: usize) -> Option<&Facet> {
        self.facets.get(index)
    }

    /// Face groups in B-rep face order.
    #[must_use]
    pub fn faces(&self) -> &[FaceGroup] {
        &self.faces
    }

    /// Normal of facet `index`.
    ///
    /// Uses the precomputed facet normal when there is one, otherwise
    /// derives it from the vertex winding. Degenerate facets yield a zero
    /// vector.
    #[must_use]
    pub fn facet_normal(&self, index: usize) -> Option<Vector3> {
        let facet = self.facets.get(index)?;
        if let Some(n) = facet.facet_normal.and_then(|i| self.normal(i)) {
            return Some(*n);
        }
        let [a, b, c] = facet.verts.map(|v| self.vertex(v));
        let (a, b, c) = (a?, b?, c?);
        Some(triangle_normal(a, b, c).unwrap_or_else(Vector3::zeros))
    }

    /// Bounding box of all vertices.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Total area of all face groups.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.faces.iter().map(|f| f.area).sum()
    }

    /// Appends the triangulation of one planar face as a new face group.
    ///
    /// Every facet of the group shares the face normal, which is stored once
    /// and referenced as both the facet normal and the vertex normals.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_face(&mut self, face: EntityId, color: Option<Color>, planar: &TriangleMesh) {
        let first_facet = self.facets.len();
        let base = self.vertices.len() as u32;
        let normal_index = self.normals.len() as u32;
        self.normals.push(planar.normal);
        self.vertices.extend_from_slice(&planar.vertices);

        let mut area = 0.0;
        for tri in &planar.indices {
            let [a, b, c] = tri.map(|i| planar.vertices[i as usize]);
            area += triangle_area(&a, &b, &c);
            self.facets.push(Facet {
                verts: tri.map(|i| base + i),
                normals: [Some(normal_index); 3],
                facet_normal: Some(normal_index),
            });
        }

        self.faces.push(FaceGroup {
            face,
            first_facet,
            facet_count: planar.indices.len(),
            color,
            area,
        });
    }

    /// Records a face that produced no facets, e.g. one collapsed below the
    /// minimum face size.
    pub fn push_empty_face(&mut self, face: EntityId, color: Option<Color>) {
        self.faces.push(FaceGroup {
            face,
            first_facet: self.facets.len(),
            facet_count: 0,
            color,
            area: 0.0,
        });
    }
}
