//! Reading assembly documents from disk.

mod document_file;

pub use document_file::{load_document, parse_document};
