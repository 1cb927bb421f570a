mod marks;

pub use marks::{MarkSet, Markable, VisitTracker};

use std::cmp::Ordering;

use tracing::debug;

use crate::error::Result;
use crate::math::transform::compose_placement;
use crate::math::Matrix4;
use crate::model::{Document, ItemId, ProductId, ShapeId};

/// Hooks invoked by [`Traversal`] on the first visit of each node.
///
/// Every hook defaults to doing nothing, so a visitor only implements the
/// steps it emits or schedules at.
pub trait AssemblyVisitor {
    /// Called once per product, before its shapes or children are visited.
    fn product(
        &mut self,
        _doc: &Document,
        _product: ProductId,
        _marks: &mut VisitTracker,
    ) -> Result<()> {
        Ok(())
    }

    /// Called once per shape, before its children are visited.
    fn enter_shape(
        &mut self,
        _doc: &Document,
        _shape: ShapeId,
        _accumulated: &Matrix4,
        _marks: &mut VisitTracker,
    ) -> Result<()> {
        Ok(())
    }

    /// Called once per shape, after all of its children were visited.
    fn leave_shape(
        &mut self,
        _doc: &Document,
        _shape: ShapeId,
        _accumulated: &Matrix4,
        _marks: &mut VisitTracker,
    ) -> Result<()> {
        Ok(())
    }
}

/// Nodes marked during one [`Traversal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCounts {
    pub products: usize,
    pub shapes: usize,
    /// Solids marked by the visitor, typically those submitted for meshing.
    pub items: usize,
}

/// One marking pass over the product/shape graph.
///
/// Each product and shape is handed to the visitor at most once per pass,
/// however many parents reach it. A link that closes a cycle lands on an
/// already-marked shape and is dropped.
pub struct Traversal<'a> {
    doc: &'a Document,
    marks: VisitTracker,
}

impl<'a> Traversal<'a> {
    /// Starts a new pass over `doc`.
    #[must_use]
    pub fn new(doc: &'a Document) -> Self {
        let mut marks = VisitTracker::new();
        marks.begin_pass();
        Self { doc, marks }
    }

    /// Walks the shape tree below `shape`.
    ///
    /// Each child is visited with `accumulated * link.placement`, so the link
    /// placement applies to child-local points first.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the visitor or by model lookups.
    pub fn visit_shape<V: AssemblyVisitor + ?Sized>(
        &mut self,
        shape: ShapeId,
        accumulated: &Matrix4,
        visitor: &mut V,
    ) -> Result<()> {
        if !self.marks.mark(shape) {
            return Ok(());
        }
        let doc = self.doc;
        visitor.enter_shape(doc, shape, accumulated, &mut self.marks)?;
        for link in &doc.shape(shape)?.links {
            let child = compose_placement(accumulated, &link.placement);
            self.visit_shape(link.child, &child, visitor)?;
        }
        visitor.leave_shape(doc, shape, accumulated, &mut self.marks)
    }

    /// Visits a product's shapes from the identity placement, then its
    /// child products in declaration order.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the visitor or by model lookups.
    pub fn visit_product<V: AssemblyVisitor + ?Sized>(
        &mut self,
        product: ProductId,
        visitor: &mut V,
    ) -> Result<()> {
        if !self.marks.mark(product) {
            return Ok(());
        }
        let doc = self.doc;
        visitor.product(doc, product, &mut self.marks)?;
        let data = doc.product(product)?;
        let identity = Matrix4::identity();
        for &shape in &data.shapes {
            self.visit_shape(shape, &identity, visitor)?;
        }
        for usage in &data.usages {
            self.visit_product(usage.child, visitor)?;
        }
        Ok(())
    }

    /// Visits products only, recursing into children sorted by name.
    ///
    /// # Errors
    ///
    /// Propagates errors raised by the visitor or by model lookups.
    pub fn visit_product_structure<V: AssemblyVisitor + ?Sized>(
        &mut self,
        product: ProductId,
        visitor: &mut V,
    ) -> Result<()> {
        if !self.marks.mark(product) {
            return Ok(());
        }
        visitor.product(self.doc, product, &mut self.marks)?;
        for child in sorted_children(self.doc, product)? {
            self.visit_product_structure(child, visitor)?;
        }
        Ok(())
    }

    /// Ends the pass, returning how many nodes of each kind it marked.
    pub fn finish(mut self) -> PassCounts {
        let counts = PassCounts {
            products: self.marks.count::<ProductId>(),
            shapes: self.marks.count::<ShapeId>(),
            items: self.marks.count::<ItemId>(),
        };
        self.marks.end_pass();
        debug!(
            products = counts.products,
            shapes = counts.shapes,
            items = counts.items,
            "pass finished"
        );
        counts
    }
}

/// Child products of `product`, ordered by product name.
///
/// Unnamed children sort last; equal names keep declaration order.
///
/// # Errors
///
/// Returns an error if a product is not found.
pub fn sorted_children(doc: &Document, product: ProductId) -> Result<Vec<ProductId>> {
    let mut named = Vec::new();
    for usage in &doc.product(product)?.usages {
        named.push((doc.product(usage.child)?.name.as_deref(), usage.child));
    }
    named.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    Ok(named.into_iter().map(|(_, id)| id).collect())
}

/// Calls `f` for every path from `shape` through its links, without marks.
///
/// A shape reached through two parents is reported once per path, each time
/// with that path's accumulated placement. A link back to a shape already on
/// the current path is skipped.
///
/// # Errors
///
/// Propagates errors raised by `f` or by model lookups.
pub fn visit_instances<F>(
    doc: &Document,
    shape: ShapeId,
    accumulated: &Matrix4,
    f: &mut F,
) -> Result<()>
where
    F: FnMut(ShapeId, &Matrix4) -> Result<()>,
{
    let mut ancestors = Vec::new();
    walk_instances(doc, shape, accumulated, &mut ancestors, f)
}

fn walk_instances<F>(
    doc: &Document,
    shape: ShapeId,
    accumulated: &Matrix4,
    ancestors: &mut Vec<ShapeId>,
    f: &mut F,
) -> Result<()>
where
    F: FnMut(ShapeId, &Matrix4) -> Result<()>,
{
    f(shape, accumulated)?;
    ancestors.push(shape);
    for link in &doc.shape(shape)?.links {
        if ancestors.contains(&link.child) {
            debug!(link = %link.entity_id, "cyclic link skipped");
            continue;
        }
        let child = compose_placement(accumulated, &link.placement);
        walk_instances(doc, link.child, &child, ancestors, f)?;
    }
    ancestors.pop();
    Ok(())
}
