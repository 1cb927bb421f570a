use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::error::ExportError;

/// Indented XML event writer.
pub struct XmlOut<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlOut<W> {
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            writer: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    /// Writes the `<?xml version="1.0" encoding="UTF-8"?>` header.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Xml`] if the underlying writer fails.
    pub fn declaration(&mut self) -> Result<(), ExportError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)), "declaration")
    }

    /// Opens `element`; it must be closed with [`end`](Self::end).
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Xml`] if the underlying writer fails.
    pub fn start(&mut self, element: BytesStart<'_>) -> Result<(), ExportError> {
        self.event(Event::Start(element), "start tag")
    }

    /// Writes `element` as a self-closing tag.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Xml`] if the underlying writer fails.
    pub fn empty(&mut self, element: BytesStart<'_>) -> Result<(), ExportError> {
        self.event(Event::Empty(element), "empty tag")
    }

    /// Closes the element named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Xml`] if the underlying writer fails.
    pub fn end(&mut self, name: &str) -> Result<(), ExportError> {
        self.event(Event::End(BytesEnd::new(name)), "end tag")
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn event(&mut self, event: Event<'_>, what: &str) -> Result<(), ExportError> {
        self.writer
            .write_event(event)
            .map_err(|e| ExportError::Xml(format!("failed to write {what}: {e}")))
    }
}
