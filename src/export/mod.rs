mod annotation;
mod facet_all;
mod number;
mod stl;
mod webxml;
mod xml;

pub use annotation::annotation_polylines;
pub use facet_all::facet_all_products;
pub use number::{fmt_g, fmt_list, fmt_point};
pub use stl::write_ascii_stl;
pub use webxml::{write_webxml, SplitLayout, WebXmlSummary};
pub use xml::XmlOut;

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::cache::MeshCache;
use crate::error::{ExportError, Result};
use crate::model::{Document, EntityId, ProductId};
use crate::scheduler::MeshScheduler;
use crate::tessellation::{MeshOptions, Tessellator};

/// Directory used for split output when no `-o` path is given.
pub const DEFAULT_SPLIT_DIR: &str = "step_data";

/// Index file written inside the split output directory.
pub const SPLIT_INDEX: &str = "index.xml";

/// Output encodings understood by [`export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Streamed XML scene graph.
    #[default]
    WebXml,
    AsciiStl,
    BinaryStl,
}

/// What to export and where.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub format: OutputFormat,
    /// Root product ids; empty selects every top-level product.
    pub roots: Vec<EntityId>,
    /// Shape ids whose geometry is exported; empty exports all.
    pub shape_ids: Vec<EntityId>,
    /// Output file, or output directory in split mode. Standard output
    /// when unset and not splitting.
    pub output: Option<PathBuf>,
    /// Write each shell and annotation to its own file.
    pub split: bool,
    /// Extension of the source file, used to link component files.
    pub source_extension: Option<String>,
}

/// Allow-list of shapes whose geometry is exported.
///
/// Matching is exact per shape node. Structure is written regardless.
#[derive(Debug, Clone, Default)]
pub struct ShapeFilter {
    allowed: Option<HashSet<EntityId>>,
}

impl ShapeFilter {
    /// Builds a filter from shape ids; an empty list allows every shape.
    #[must_use]
    pub fn new(ids: &[EntityId]) -> Self {
        Self {
            allowed: (!ids.is_empty()).then(|| ids.iter().copied().collect()),
        }
    }

    #[must_use]
    pub fn allows(&self, shape: EntityId) -> bool {
        self.allowed.as_ref().is_none_or(|ids| ids.contains(&shape))
    }
}

/// Counts reported after an export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub roots: usize,
    pub products: usize,
    pub shapes: usize,
    pub solids: usize,
    pub facets: usize,
    pub annotations: usize,
}

/// Resolves root selectors, defaulting to the document's top-level products.
///
/// # Errors
///
/// Returns an error naming the first selector that is not a product.
pub fn resolve_roots(doc: &Document, ids: &[EntityId]) -> Result<Vec<ProductId>> {
    if ids.is_empty() {
        return Ok(doc.root_products());
    }
    ids.iter()
        .map(|&id| doc.resolve_root(id).map_err(Into::into))
        .collect()
}

/// Name of the component file linked from a product in split mode.
///
/// Whitespace and the characters `? / \ : " '` become underscores.
#[must_use]
pub fn component_file_name(product_name: Option<&str>, extension: Option<&str>) -> String {
    let base: String = product_name
        .unwrap_or("none")
        .chars()
        .map(|c| {
            if c.is_whitespace() || matches!(c, '?' | '/' | '\\' | ':' | '"' | '\'') {
                '_'
            } else {
                c
            }
        })
        .collect();
    match extension {
        Some(ext) if !ext.is_empty() => format!("part_{base}.{ext}"),
        _ => format!("part_{base}"),
    }
}

/// Runs one export of `doc`.
///
/// Roots are resolved and the output is opened before any meshing starts.
///
/// # Errors
///
/// Returns [`ExportError::Unsupported`] for binary or split STL, a model
/// error for unresolved roots, and I/O errors from the output.
pub fn export(
    doc: Arc<Document>,
    tessellator: Arc<dyn Tessellator>,
    mesh_options: &MeshOptions,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let roots = resolve_roots(&doc, &options.roots)?;
    let filter = ShapeFilter::new(&options.shape_ids);

    let summary = match options.format {
        OutputFormat::BinaryStl => {
            return Err(ExportError::Unsupported("binary STL output is not implemented").into());
        }
        OutputFormat::AsciiStl => {
            if options.split {
                return Err(ExportError::Unsupported(
                    "only single STL file output is implemented",
                )
                .into());
            }
            let mut out = open_output(options.output.as_deref())?;
            let mut scheduler = MeshScheduler::new(doc, tessellator, mesh_options)?;
            let mut cache = MeshCache::new();
            let solids = facet_all_products(
                &mut scheduler,
                &mut cache,
                &roots,
                &filter,
                mesh_options,
            )?;
            let name = options
                .output
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let facets = write_ascii_stl(&mut out, scheduler.document(), &cache, &roots, &filter, &name)?;
            out.flush().map_err(ExportError::from)?;
            ExportSummary {
                roots: roots.len(),
                products: scheduler.document().product_count(),
                shapes: scheduler.document().shape_count(),
                solids,
                facets,
                annotations: 0,
            }
        }
        OutputFormat::WebXml => {
            let (out, split) = if options.split {
                let dir = options
                    .output
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SPLIT_DIR));
                fs::create_dir_all(&dir).map_err(|source| ExportError::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
                let index = open_output(Some(&dir.join(SPLIT_INDEX)))?;
                let layout = SplitLayout {
                    dir,
                    source_extension: options.source_extension.clone(),
                };
                (index, Some(layout))
            } else {
                (open_output(options.output.as_deref())?, None)
            };
            let mut scheduler = MeshScheduler::new(doc, tessellator, mesh_options)?;
            let (mut out, written) = write_webxml(
                out,
                &mut scheduler,
                &roots,
                &filter,
                mesh_options,
                split.as_ref(),
            )?;
            out.flush().map_err(ExportError::from)?;
            ExportSummary {
                roots: roots.len(),
                products: written.products,
                shapes: written.shapes,
                solids: written.shells,
                facets: written.facets,
                annotations: written.annotations,
            }
        }
    };

    info!(
        roots = summary.roots,
        products = summary.products,
        shapes = summary.shapes,
        solids = summary.solids,
        facets = summary.facets,
        annotations = summary.annotations,
        "export complete"
    );
    Ok(summary)
}

/// Opens `path` for buffered writing, or standard output when `None`.
///
/// # Errors
///
/// Returns [`ExportError::Open`] if the file cannot be created.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|source| ExportError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
