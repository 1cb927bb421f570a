use std::sync::Arc;

use tracing::debug;

use crate::cache::MeshCache;
use crate::error::Result;
use crate::math::Matrix4;
use crate::model::{Document, ProductId, ShapeId};
use crate::scheduler::MeshScheduler;
use crate::tessellation::MeshOptions;
use crate::traversal::{AssemblyVisitor, Traversal, VisitTracker};

use super::ShapeFilter;

/// Submits every tessellable, uncached solid of each visited shape.
struct SubmitSolids<'a> {
    scheduler: &'a mut MeshScheduler,
    cache: &'a mut MeshCache,
    filter: &'a ShapeFilter,
    options: &'a MeshOptions,
}

impl SubmitSolids<'_> {
    /// Drains completed meshes until the scheduler has room for another job.
    fn make_room(&mut self) -> Result<()> {
        while self.scheduler.is_full() {
            let Some(mesh) = self.scheduler.get_result(true) else {
                break;
            };
            self.cache.add(mesh.item(), mesh)?;
        }
        Ok(())
    }
}

impl AssemblyVisitor for SubmitSolids<'_> {
    fn enter_shape(
        &mut self,
        doc: &Document,
        shape: ShapeId,
        _accumulated: &Matrix4,
        marks: &mut VisitTracker,
    ) -> Result<()> {
        let data = doc.shape(shape)?;
        if !self.filter.allows(data.entity_id) {
            return Ok(());
        }
        for &item in &data.items {
            if !self.scheduler.tessellator().can_make(doc, shape, item)
                || self.cache.contains(item)
                || !marks.mark(item)
            {
                continue;
            }
            self.make_room()?;
            if !self.scheduler.start_mesh(shape, item, self.options) {
                debug!(shape = %data.entity_id, "solid not submitted");
            }
        }
        Ok(())
    }
}

/// Meshes every solid reachable from `roots` and stores the results in
/// `cache`.
///
/// A solid referenced from several shapes is submitted once. Returns the
/// number of meshes added to the cache.
///
/// # Errors
///
/// Returns an error on a model lookup failure or if a mesh arrives for a
/// solid that is already cached.
pub fn facet_all_products(
    scheduler: &mut MeshScheduler,
    cache: &mut MeshCache,
    roots: &[ProductId],
    filter: &ShapeFilter,
    options: &MeshOptions,
) -> Result<usize> {
    let doc = Arc::clone(scheduler.document());
    let before = cache.len();
    {
        let mut submit = SubmitSolids {
            scheduler: &mut *scheduler,
            cache: &mut *cache,
            filter,
            options,
        };
        let mut pass = Traversal::new(&doc);
        for &root in roots {
            pass.visit_product(root, &mut submit)?;
        }
        pass.finish();
    }

    while let Some(mesh) = scheduler.get_result(true) {
        cache.add(mesh.item(), mesh)?;
    }
    Ok(cache.len() - before)
}
