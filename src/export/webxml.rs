use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::BytesStart;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::math::{Matrix4, Point3};
use crate::model::{AnnotationId, AnnotationKind, Color, Document, EntityId, ProductId, ShapeId};
use crate::scheduler::MeshScheduler;
use crate::tessellation::{Mesh, MeshOptions};
use crate::traversal::{sorted_children, AssemblyVisitor, Traversal, VisitTracker};

use super::annotation::annotation_polylines;
use super::number::{fmt_g, fmt_indices, fmt_list, fmt_point, fmt_vector};
use super::xml::XmlOut;
use super::{component_file_name, ShapeFilter};

/// Where split output goes.
#[derive(Debug, Clone)]
pub struct SplitLayout {
    /// Directory holding the index and every per-unit file.
    pub dir: PathBuf,
    /// Extension of the source file, used to link component files.
    pub source_extension: Option<String>,
}

/// Counts of elements written by [`write_webxml`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebXmlSummary {
    pub products: usize,
    pub shapes: usize,
    pub shells: usize,
    pub facets: usize,
    pub annotations: usize,
}

fn join_tokens(ids: impl IntoIterator<Item = EntityId>) -> String {
    ids.into_iter()
        .map(EntityId::token)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Streams the scene graph as the traversal reaches each node.
struct WebXmlWriter<'a, W: Write> {
    out: XmlOut<W>,
    scheduler: &'a mut MeshScheduler,
    filter: &'a ShapeFilter,
    options: &'a MeshOptions,
    split: Option<&'a SplitLayout>,
    /// Meshes completed during the shape pass, written after it.
    held: Vec<Mesh>,
    summary: WebXmlSummary,
}

impl<W: Write> WebXmlWriter<'_, W> {
    /// Takes completed meshes until the scheduler has room for another job.
    fn make_room(&mut self) {
        while self.scheduler.is_full() {
            let Some(mesh) = self.scheduler.get_result(true) else {
                break;
            };
            self.held.push(mesh);
        }
    }

    /// Writes held meshes, then every mesh still outstanding.
    fn write_shells(&mut self, doc: &Document) -> Result<()> {
        for mesh in std::mem::take(&mut self.held) {
            self.write_shell(doc, &mesh)?;
        }
        while let Some(mesh) = self.scheduler.get_result(true) {
            self.write_shell(doc, &mesh)?;
        }
        Ok(())
    }

    fn write_shell(&mut self, doc: &Document, mesh: &Mesh) -> Result<()> {
        let color = doc.item(mesh.item())?.color;
        let id = mesh.solid_id().token();
        match self.split {
            None => write_shell_body(&mut self.out, &id, color, mesh)?,
            Some(split) => {
                let file = format!("shell_{id}.xml");
                let bbox = mesh.bounding_box();
                let mut el = BytesStart::new("shell");
                el.push_attribute(("id", id.as_str()));
                el.push_attribute(("size", mesh.facet_count().to_string().as_str()));
                el.push_attribute((
                    "bbox",
                    format!("{} {}", fmt_point(&bbox.min), fmt_point(&bbox.max)).as_str(),
                ));
                el.push_attribute(("a", fmt_g(mesh.area()).as_str()));
                el.push_attribute(("href", file.as_str()));
                self.out.empty(el)?;
                write_unit_file(&split.dir.join(&file), |out| {
                    write_shell_body(out, &id, color, mesh)
                })?;
            }
        }
        debug!(solid = %mesh.solid_id(), facets = mesh.facet_count(), "shell written");
        self.summary.shells += 1;
        self.summary.facets += mesh.facet_count();
        Ok(())
    }

    fn write_annotation(&mut self, doc: &Document, annotation: AnnotationId) -> Result<()> {
        let data = doc.annotation(annotation)?;
        let lines = annotation_polylines(doc, data, self.options)?;
        let id = data.entity_id.token();
        match self.split {
            None => write_annotation_body(&mut self.out, &id, &lines)?,
            Some(split) => {
                let file = format!("{}_{id}.xml", data.kind.file_prefix());
                let mut el = BytesStart::new("annotation");
                el.push_attribute(("id", id.as_str()));
                el.push_attribute(("href", file.as_str()));
                self.out.empty(el)?;
                write_unit_file(&split.dir.join(&file), |out| {
                    write_annotation_body(out, &id, &lines)
                })?;
            }
        }
        self.summary.annotations += 1;
        Ok(())
    }
}

impl<W: Write> AssemblyVisitor for WebXmlWriter<'_, W> {
    fn product(
        &mut self,
        doc: &Document,
        product: ProductId,
        _marks: &mut VisitTracker,
    ) -> Result<()> {
        let data = doc.product(product)?;
        let mut el = BytesStart::new("product");
        el.push_attribute(("id", data.entity_id.token().as_str()));
        if let Some(split) = self.split {
            let file =
                component_file_name(data.name.as_deref(), split.source_extension.as_deref());
            if split.dir.join(&file).is_file() {
                el.push_attribute(("step", file.as_str()));
            }
        }
        el.push_attribute(("name", data.name.as_deref().unwrap_or("")));

        let mut shapes = Vec::with_capacity(data.shapes.len());
        for &shape in &data.shapes {
            shapes.push(doc.shape(shape)?.entity_id);
        }
        if !shapes.is_empty() {
            el.push_attribute(("shape", join_tokens(shapes).as_str()));
        }

        let mut children = Vec::new();
        for child in sorted_children(doc, product)? {
            children.push(doc.product(child)?.entity_id);
        }
        if !children.is_empty() {
            el.push_attribute(("children", join_tokens(children).as_str()));
        }

        self.out.empty(el)?;
        self.summary.products += 1;
        Ok(())
    }

    fn enter_shape(
        &mut self,
        doc: &Document,
        shape: ShapeId,
        _accumulated: &Matrix4,
        _marks: &mut VisitTracker,
    ) -> Result<()> {
        let data = doc.shape(shape)?;
        let mut el = BytesStart::new("shape");
        el.push_attribute(("id", data.entity_id.token().as_str()));
        if let Some(unit) = doc.shape_unit(shape)? {
            el.push_attribute(("unit", unit.attribute().as_str()));
        }

        if self.filter.allows(data.entity_id) {
            let mut shells = Vec::new();
            for &item in &data.items {
                if self.scheduler.tessellator().is_shell(doc, shape, item) {
                    shells.push(doc.item(item)?.entity_id);
                }
            }
            if !shells.is_empty() {
                el.push_attribute(("shell", join_tokens(shells).as_str()));
            }
        }

        let mut annotations = Vec::with_capacity(data.annotations.len());
        for kind in [AnnotationKind::DraughtingModel, AnnotationKind::ConstructiveGeometry] {
            for &annotation in &data.annotations {
                let a = doc.annotation(annotation)?;
                if a.kind == kind {
                    annotations.push(a.entity_id);
                }
            }
        }
        if !annotations.is_empty() {
            el.push_attribute(("annotation", join_tokens(annotations).as_str()));
        }

        if data.links.is_empty() {
            self.out.empty(el)?;
        } else {
            self.out.start(el)?;
            for link in &data.links {
                let mut child = BytesStart::new("child");
                child.push_attribute(("ref", doc.shape(link.child)?.entity_id.token().as_str()));
                child.push_attribute(("xform", fmt_list(link.placement.iter().copied()).as_str()));
                self.out.empty(child)?;
            }
            self.out.end("shape")?;
        }
        self.summary.shapes += 1;
        Ok(())
    }

    fn leave_shape(
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
            if !self.scheduler.tessellator().can_make(doc, shape, item) || !marks.mark(item) {
                continue;
            }
            self.make_room();
            self.scheduler.start_mesh(shape, item, self.options);
        }
        for &annotation in &data.annotations {
            if marks.mark(annotation) {
                self.write_annotation(doc, annotation)?;
            }
        }
        Ok(())
    }
}

/// Streams the XML scene graph for `roots` to `out`.
///
/// Product metadata comes first, then shape elements in traversal order,
/// then one `shell` element per completed mesh in completion order. Solids
/// are submitted as their shapes are left; no shell is written before the
/// last shape. With
/// `split`, shells and annotations go to their own files in the split
/// directory and `out` receives placeholders that reference them.
///
/// Returns the writer along with counts of what was written.
///
/// # Errors
///
/// Returns an error on a model lookup failure or a write failure.
pub fn write_webxml<W: Write>(
    out: W,
    scheduler: &mut MeshScheduler,
    roots: &[ProductId],
    filter: &ShapeFilter,
    options: &MeshOptions,
    split: Option<&SplitLayout>,
) -> Result<(W, WebXmlSummary)> {
    let doc = Arc::clone(scheduler.document());
    let mut writer = WebXmlWriter {
        out: XmlOut::new(out),
        scheduler,
        filter,
        options,
        split,
        held: Vec::new(),
        summary: WebXmlSummary::default(),
    };

    writer.out.declaration()?;
    let mut root_ids = Vec::with_capacity(roots.len());
    for &root in roots {
        root_ids.push(doc.product(root)?.entity_id);
    }
    let mut assembly = BytesStart::new("step-assembly");
    assembly.push_attribute(("root", join_tokens(root_ids).as_str()));
    writer.out.start(assembly)?;

    let mut pass = Traversal::new(&doc);
    for &root in roots {
        pass.visit_product_structure(root, &mut writer)?;
    }
    let identity = Matrix4::identity();
    for &root in roots {
        for &shape in &doc.product(root)?.shapes {
            pass.visit_shape(shape, &identity, &mut writer)?;
        }
    }

    pass.finish();
    writer.write_shells(&doc)?;

    writer.out.end("step-assembly")?;
    Ok((writer.out.into_inner(), writer.summary))
}

fn write_shell_body<W: Write>(
    out: &mut XmlOut<W>,
    id: &str,
    color: Option<Color>,
    mesh: &Mesh,
) -> std::result::Result<(), ExportError> {
    let mut shell = BytesStart::new("shell");
    shell.push_attribute(("id", id));
    if let Some(color) = color {
        shell.push_attribute(("color", color.to_string().as_str()));
    }
    out.start(shell)?;

    out.start(BytesStart::new("verts"))?;
    for p in mesh.vertices() {
        let mut v = BytesStart::new("v");
        v.push_attribute(("p", fmt_point(p).as_str()));
        out.empty(v)?;
    }
    out.end("verts")?;

    for group in mesh.faces().iter().filter(|g| g.facet_count > 0) {
        let mut facets = BytesStart::new("facets");
        if let Some(color) = group.color {
            facets.push_attribute(("color", color.to_string().as_str()));
        }
        out.start(facets)?;
        for index in group.first_facet..group.first_facet + group.facet_count {
            let Some(facet) = mesh.facet(index) else {
                continue;
            };
            let mut f = BytesStart::new("f");
            f.push_attribute(("v", fmt_indices(&facet.verts).as_str()));
            let normals: Vec<_> = facet
                .normals
                .iter()
                .flatten()
                .filter_map(|&n| mesh.normal(n))
                .collect();
            if normals.is_empty() {
                out.empty(f)?;
                continue;
            }
            out.start(f)?;
            for normal in normals {
                let mut n = BytesStart::new("n");
                n.push_attribute(("d", fmt_vector(normal).as_str()));
                out.empty(n)?;
            }
            out.end("f")?;
        }
        out.end("facets")?;
    }

    out.end("shell")
}

fn write_annotation_body<W: Write>(
    out: &mut XmlOut<W>,
    id: &str,
    lines: &[Vec<Point3>],
) -> std::result::Result<(), ExportError> {
    let mut annotation = BytesStart::new("annotation");
    annotation.push_attribute(("id", id));
    if lines.is_empty() {
        return out.empty(annotation);
    }
    out.start(annotation)?;
    for line in lines {
        out.start(BytesStart::new("polyline"))?;
        for p in line {
            let mut point = BytesStart::new("p");
            point.push_attribute(("l", fmt_point(p).as_str()));
            out.empty(point)?;
        }
        out.end("polyline")?;
    }
    out.end("annotation")
}

/// Writes one standalone XML file holding a single unit.
fn write_unit_file<F>(path: &Path, body: F) -> std::result::Result<(), ExportError>
where
    F: FnOnce(&mut XmlOut<BufWriter<File>>) -> std::result::Result<(), ExportError>,
{
    let file = File::create(path).map_err(|source| ExportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = XmlOut::new(BufWriter::new(file));
    out.declaration()?;
    body(&mut out)?;
    out.into_inner().flush()?;
    Ok(())
}
