use std::io::Write;

use crate::cache::MeshCache;
use crate::error::{ExportError, Result};
use crate::math::transform::{transform_direction, transform_point};
use crate::math::Matrix4;
use crate::model::{Document, ProductId};
use crate::tessellation::Mesh;
use crate::traversal::visit_instances;

use super::number::{fmt_point, fmt_vector};
use super::ShapeFilter;

/// Writes every cached facet reachable from `roots` as one ASCII STL solid.
///
/// Each shape instance is written with its own accumulated placement, so a
/// part used twice appears twice. Returns the number of facets written.
///
/// # Errors
///
/// Returns an error on a model lookup failure or a write failure.
pub fn write_ascii_stl<W: Write + ?Sized>(
    out: &mut W,
    doc: &Document,
    cache: &MeshCache,
    roots: &[ProductId],
    filter: &ShapeFilter,
    name: &str,
) -> Result<usize> {
    writeln!(out, "solid {name}").map_err(ExportError::from)?;
    let mut facets = 0;
    let identity = Matrix4::identity();
    for &root in roots {
        for &shape in &doc.product(root)?.shapes {
            visit_instances(doc, shape, &identity, &mut |instance, xform| {
                let data = doc.shape(instance)?;
                if !filter.allows(data.entity_id) {
                    return Ok(());
                }
                for &item in &data.items {
                    if let Some(mesh) = cache.find(item) {
                        facets += write_mesh(out, mesh, xform)?;
                    }
                }
                Ok(())
            })?;
        }
    }
    writeln!(out, "endsolid {name}").map_err(ExportError::from)?;
    Ok(facets)
}

fn write_mesh<W: Write + ?Sized>(
    out: &mut W,
    mesh: &Mesh,
    xform: &Matrix4,
) -> std::result::Result<usize, ExportError> {
    let mut written = 0;
    for index in 0..mesh.facet_count() {
        let (Some(facet), Some(normal)) = (mesh.facet(index), mesh.facet_normal(index)) else {
            continue;
        };
        let normal = transform_direction(xform, &normal);
        writeln!(out, "facet normal {}", fmt_vector(&normal))?;
        writeln!(out, "    outer loop")?;
        for v in facet.verts {
            if let Some(p) = mesh.vertex(v) {
                writeln!(out, "        vertex {}", fmt_point(&transform_point(xform, p)))?;
            }
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "endfacet")?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::export::facet_all_products;
    use crate::model::EntityId;
    use crate::scheduler::MeshScheduler;
    use crate::tessellation::{BrepTessellator, MeshOptions};
    use crate::test_support;
    use std::sync::Arc;

    fn stl_for(doc: &Arc<Document>, roots: &[ProductId], filter: &ShapeFilter) -> String {
        let options = MeshOptions::default();
        let mut scheduler =
            MeshScheduler::new(Arc::clone(doc), Arc::new(BrepTessellator), &options).unwrap();
        let mut cache = MeshCache::new();
        facet_all_products(&mut scheduler, &mut cache, roots, filter, &options).unwrap();
        let mut out = Vec::new();
        write_ascii_stl(&mut out, doc, &cache, roots, filter, "asm").unwrap();
        String::from_utf8(out).unwrap()
    }

    fn vertices(text: &str) -> Vec<[f64; 3]> {
        text.lines()
            .filter_map(|l| l.trim_start().strip_prefix("vertex "))
            .map(|rest| {
                let v: Vec<f64> = rest.split(' ').map(|t| t.parse().unwrap()).collect();
                [v[0], v[1], v[2]]
            })
            .collect()
    }

    #[test]
    fn each_instance_gets_its_own_placement() {
        let fx = test_support::two_instance_assembly();
        let text = stl_for(&fx.doc, &[fx.asm], &ShapeFilter::default());

        assert!(text.starts_with("solid asm\n"));
        assert!(text.ends_with("endsolid asm\n"));
        assert_eq!(text.matches("facet normal 0 0 1").count(), 2);

        let verts = vertices(&text);
        assert_eq!(verts.len(), 6);
        for (a, b) in verts[..3].iter().zip(&verts[3..]) {
            assert!((b[0] - a[0] - 10.0).abs() < 1e-12);
            assert_eq!(a[1], b[1]);
            assert_eq!(a[2], b[2]);
        }
    }

    #[test]
    fn facet_blocks_follow_the_ascii_layout() {
        let fx = test_support::two_instance_assembly();
        let text = stl_for(&fx.doc, &[fx.asm], &ShapeFilter::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "facet normal 0 0 1");
        assert_eq!(lines[2], "    outer loop");
        assert!(lines[3].starts_with("        vertex "));
        assert_eq!(lines[6], "    endloop");
        assert_eq!(lines[7], "endfacet");
    }

    #[test]
    fn allow_list_limits_facets_to_selected_shapes() {
        let sb = test_support::sibling_assembly();
        let everything = stl_for(&sb.doc, &[sb.root], &ShapeFilter::default());
        assert_eq!(everything.matches("endfacet").count(), 24);

        let right_only = ShapeFilter::new(&[EntityId::from_raw(21)]);
        let text = stl_for(&sb.doc, &[sb.root], &right_only);
        assert_eq!(text.matches("endfacet").count(), 12);
        for v in vertices(&text) {
            assert!(v[1] >= 5.0 - 1e-12);
        }
    }
}
