//! Office document export for DraftDeck projects.
//!
//! [`export`] turns a topic and its sections into a `.docx` or `.pptx` file,
//! entirely in memory. Sections render in position order; a section without
//! content renders with an empty body.

mod docx;
mod package;
mod pptx;

use draftdeck_shared::{DocumentKind, Result, Section};
use tracing::{info, instrument};

/// A rendered office file.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    /// Suggested download name, e.g. `ev-market-analysis.docx`.
    pub file_name: String,
}

/// One section as the exporter sees it.
#[derive(Debug, Clone, Copy)]
pub struct ExportSection<'a> {
    pub title: &'a str,
    /// Empty when the section has no content yet.
    pub body: &'a str,
}

/// MIME type for a document kind.
pub fn mime_type(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Docx => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        DocumentKind::Pptx => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
    }
}

/// Render `sections` under `topic` in the format `kind` calls for.
#[instrument(skip_all, fields(kind = %kind, sections = sections.len()))]
pub fn export(kind: DocumentKind, topic: &str, sections: &[Section]) -> Result<ExportedFile> {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|s| s.position);
    let items: Vec<ExportSection<'_>> = ordered
        .iter()
        .map(|s| ExportSection {
            title: &s.title,
            body: s.content.as_deref().unwrap_or(""),
        })
        .collect();

    let bytes = match kind {
        DocumentKind::Docx => docx::render(topic, &items)?,
        DocumentKind::Pptx => pptx::render(topic, &items)?,
    };

    info!(bytes = bytes.len(), "export rendered");

    Ok(ExportedFile {
        bytes,
        mime_type: mime_type(kind),
        file_name: format!("{}.{}", file_stem(topic), kind.as_str()),
    })
}

/// Lowercase, hyphen-separated ASCII file stem derived from the topic.
///
/// The stem ends up in a `Content-Disposition` header, which must stay ASCII.
fn file_stem(topic: &str) -> String {
    let stem = topic
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn file_stem_slugifies_topic() {
        assert_eq!(file_stem("EV market analysis"), "ev-market-analysis");
        assert_eq!(file_stem("  Q3: R&D / Plans!  "), "q3-r-d-plans");
        assert_eq!(file_stem("???"), "document");
    }

    #[test]
    fn file_stem_stays_ascii() {
        assert_eq!(file_stem("Élan Vital 2030"), "lan-vital-2030");
        assert_eq!(file_stem("日本市場"), "document");
        assert!(file_stem("Café Überblick").is_ascii());
    }

    #[test]
    fn export_reports_mime_and_name() {
        let sections = vec![section(0, "A", None)];
        let docx = export(DocumentKind::Docx, "EV market analysis", &sections).unwrap();
        assert_eq!(docx.file_name, "ev-market-analysis.docx");
        assert!(docx.mime_type.contains("wordprocessingml"));
        assert_eq!(&docx.bytes[..2], b"PK");

        let pptx = export(DocumentKind::Pptx, "EV market analysis", &sections).unwrap();
        assert_eq!(pptx.file_name, "ev-market-analysis.pptx");
        assert!(pptx.mime_type.contains("presentationml"));
        assert_eq!(&pptx.bytes[..2], b"PK");
    }

    #[test]
    fn each_body_appears_exactly_once() {
        let sections = vec![
            section(0, "Intro", Some("alpha body text")),
            section(1, "Market", Some("beta body text")),
            section(2, "Empty", None),
            section(3, "Outlook", Some("gamma body text")),
        ];
        let bodies = ["alpha body text", "beta body text", "gamma body text"];

        let docx = export(DocumentKind::Docx, "Topic", &sections).unwrap();
        let document = read_part(&docx.bytes, "word/document.xml");
        for body in bodies {
            assert_eq!(document.matches(body).count(), 1, "docx: {body}");
        }

        let pptx = export(DocumentKind::Pptx, "Topic", &sections).unwrap();
        let slides: String = part_names(&pptx.bytes)
            .iter()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(|name| read_part(&pptx.bytes, name))
            .collect();
        for body in bodies {
            assert_eq!(slides.matches(body).count(), 1, "pptx: {body}");
        }
    }

    #[test]
    fn export_orders_by_position_not_input_order() {
        let sections = vec![
            section(2, "Third", Some("three")),
            section(0, "First", Some("one")),
            section(1, "Second", None),
        ];
        let file = export(DocumentKind::Docx, "Topic", &sections).unwrap();
        let xml = read_part(&file.bytes, "word/document.xml");

        let first = xml.find("First").unwrap();
        let second = xml.find("Second").unwrap();
        let third = xml.find("Third").unwrap();
        assert!(first < second && second < third);
    }
}
