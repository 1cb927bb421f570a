//! asmfacet: converts CAD assemblies into triangle meshes for lightweight
//! viewers.
//!
//! ```text
//! asmfacet [options] <source> [shape_eids...]
//! asmfacet -stl -o part.stl assembly.json
//! asmfacet -d -o step_data assembly.json
//! ```
//!
//! Long options are accepted with one dash or two. Logging goes to stderr
//! and is controlled by `RUST_LOG` (default `warn`).

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use asmfacet::export::{self, ExportOptions, OutputFormat};
use asmfacet::model::EntityId;
use asmfacet::tessellation::{BrepTessellator, MeshOptions, Tolerance};
use asmfacet::{io, Result};

/// Options spelled with a single dash in the traditional interface.
const SINGLE_DASH_LONG: &[&str] = &[
    "help", "version", "stl", "stlbin", "webxml", "tol", "ftol", "min", "fmin", "root", "threads",
];

/// Convert CAD assembly data into triangle meshes for WebGL and other
/// lightweight viewers.
#[derive(Parser, Debug)]
#[command(name = "asmfacet", version, long_about = None)]
struct Cli {
    /// Write STL data in ASCII text format
    #[arg(long, overrides_with_all = ["stlbin", "webxml"])]
    stl: bool,

    /// Write STL data in binary format
    #[arg(long, overrides_with_all = ["stl", "webxml"])]
    stlbin: bool,

    /// Write XML for the WebGL client (default)
    #[arg(long, overrides_with_all = ["stl", "stlbin"])]
    webxml: bool,

    /// Absolute linearization tolerance, in native units of the part
    #[arg(long, value_name = "DIST", overrides_with = "ftol")]
    tol: Option<f64>,

    /// Linearization tolerance as a fraction of the curve extent
    #[arg(long, value_name = "FRAC", overrides_with = "tol")]
    ftol: Option<f64>,

    /// Absolute minimum face size; smaller faces are collapsed
    #[arg(long, value_name = "SZ", overrides_with = "fmin")]
    min: Option<f64>,

    /// Minimum face size as a fraction of the solid's bounding box
    #[arg(long, value_name = "FRAC", overrides_with = "min")]
    fmin: Option<f64>,

    /// Export the subassembly rooted at this product definition
    #[arg(long = "root", value_name = "EID", value_parser = parse_entity_id)]
    roots: Vec<EntityId>,

    /// Output file, or output directory with -d
    #[arg(short = 'o', value_name = "OUTNAME")]
    output: Option<PathBuf>,

    /// Write multiple files (-o is a directory)
    #[arg(short = 'd')]
    split: bool,

    /// Number of mesher threads
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Assembly file to read
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Shape representation ids whose geometry is exported
    #[arg(value_name = "SHAPE_EIDS", value_parser = parse_entity_id)]
    shape_ids: Vec<EntityId>,
}

impl Cli {
    fn format(&self) -> OutputFormat {
        if self.stl {
            OutputFormat::AsciiStl
        } else if self.stlbin {
            OutputFormat::BinaryStl
        } else {
            OutputFormat::WebXml
        }
    }

    fn mesh_options(&self) -> MeshOptions {
        let defaults = MeshOptions::default();
        MeshOptions {
            tolerance: match (self.tol, self.ftol) {
                (Some(d), _) => Tolerance::Absolute(d),
                (None, Some(f)) => Tolerance::Fraction(f),
                (None, None) => defaults.tolerance,
            },
            min_face: self
                .min
                .map(Tolerance::Absolute)
                .or(self.fmin.map(Tolerance::Fraction)),
            threads: self.threads,
            ..defaults
        }
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            format: self.format(),
            roots: self.roots.clone(),
            shape_ids: self.shape_ids.clone(),
            output: self.output.clone(),
            split: self.split,
            source_extension: self
                .source
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_owned),
        }
    }
}

fn parse_entity_id(text: &str) -> std::result::Result<EntityId, String> {
    text.parse::<u64>()
        .ok()
        .and_then(EntityId::new)
        .ok_or_else(|| format!("bad entity id: {text}"))
}

/// Rewrites `-name` to `--name` for the long options.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(s)
                if s.len() > 2
                    && s.starts_with('-')
                    && !s.starts_with("--")
                    && SINGLE_DASH_LONG.contains(&&s[1..]) =>
            {
                OsString::from(format!("-{s}"))
            }
            _ => arg,
        })
        .collect()
}

fn run(cli: &Cli) -> Result<()> {
    let mesh = cli.mesh_options();
    let doc = io::load_document(&cli.source)?;
    export::export(
        Arc::new(doc),
        Arc::new(BrepTessellator),
        &mesh,
        &cli.export_options(),
    )?;
    Ok(())
}

fn main() -> ExitCode {
    // Default: WARN for everything. Override with RUST_LOG (e.g. RUST_LOG=asmfacet=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            let code = u8::from(err.use_stderr());
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("asmfacet: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
