//! Office Open XML package writer: a ZIP archive of XML parts.

use std::io::{Cursor, Write};

use draftdeck_shared::{DraftDeckError, Result};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// XML declaration every part starts with.
pub(crate) const XML_HEADER: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Relationship type URIs.
pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// In-memory package being assembled.
pub(crate) struct Package {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl Package {
    pub(crate) fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated),
        }
    }

    /// Add one part. `name` is the path inside the archive, without a leading `/`.
    pub(crate) fn add(&mut self, name: &str, xml: &str) -> Result<()> {
        self.writer
            .start_file(name, self.options)
            .map_err(|e| DraftDeckError::Export(format!("{name}: {e}")))?;
        self.writer
            .write_all(xml.as_bytes())
            .map_err(|e| DraftDeckError::Export(format!("{name}: {e}")))?;
        Ok(())
    }

    /// Close the archive and return its bytes.
    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| DraftDeckError::Export(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

/// `[Content_Types].xml` with the two defaults plus per-part overrides.
pub(crate) fn content_types(overrides: &[(String, &str)]) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (part, content_type) in overrides {
        xml.push_str(&format!(
            r#"<Override PartName="{part}" ContentType="{content_type}"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// A `.rels` part from `(id, type, target)` triples.
pub(crate) fn relationships(rels: &[(String, &str, String)]) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, rel_type, target) in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{rel_type}" Target="{target}"/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Escape text for use in XML element content and attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are not legal in XML 1.0.
            c if c.is_control() && c != '\t' && c != '\n' => {}
            c => out.push(c),
        }
    }
    out
}
