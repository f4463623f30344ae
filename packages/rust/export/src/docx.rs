//! WordprocessingML (`.docx`) rendering on top of `docx-rs`.

use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use draftdeck_shared::{DraftDeckError, Result};

use crate::ExportSection;

/// Heading styles as `(id, name, size in half-points)`.
const HEADING_STYLES: [(&str, &str, usize); 2] =
    [("Heading1", "heading 1", 32), ("Heading2", "heading 2", 26)];

/// One paragraph of the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block {
    Heading1(String),
    Heading2(String),
    /// Body text; `\n` becomes a line break inside the paragraph.
    Body(String),
}

/// Paragraph layout: the topic, then a heading and body per section.
pub(crate) fn plan(topic: &str, sections: &[ExportSection<'_>]) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(1 + sections.len() * 2);
    blocks.push(Block::Heading1(topic.to_string()));
    for section in sections {
        blocks.push(Block::Heading2(section.title.to_string()));
        blocks.push(Block::Body(section.body.to_string()));
    }
    blocks
}

pub(crate) fn render(topic: &str, sections: &[ExportSection<'_>]) -> Result<Vec<u8>> {
    let mut doc = Docx::new();
    for (id, name, size) in HEADING_STYLES {
        doc = doc.add_style(
            Style::new(id, StyleType::Paragraph)
                .name(name)
                .size(size)
                .bold(),
        );
    }
    for block in plan(topic, sections) {
        doc = doc.add_paragraph(paragraph(&block));
    }

    let mut out = Cursor::new(Vec::new());
    doc.build()
        .pack(&mut out)
        .map_err(|e| DraftDeckError::Export(format!("failed to write docx: {e}")))?;
    Ok(out.into_inner())
}

fn paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Heading1(text) => Paragraph::new().style("Heading1").add_run(run(text)),
        Block::Heading2(text) => Paragraph::new().style("Heading2").add_run(run(text)),
        Block::Body(text) => Paragraph::new().add_run(run(text)),
    }
}

/// One run; `\n` becomes a line break, `\r` is dropped.
fn run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line.trim_end_matches('\r'));
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{part_names, read_part};

    fn sections<'a>(items: &[(&'a str, &'a str)]) -> Vec<ExportSection<'a>> {
        items
            .iter()
            .map(|&(title, body)| ExportSection { title, body })
            .collect()
    }

    #[test]
    fn plan_for_titles_without_content() {
        let blocks = plan("EV market analysis", &sections(&[("A", ""), ("B", ""), ("C", "")]));
        assert_eq!(
            blocks,
            vec![
                Block::Heading1("EV market analysis".into()),
                Block::Heading2("A".into()),
                Block::Body(String::new()),
                Block::Heading2("B".into()),
                Block::Body(String::new()),
                Block::Heading2("C".into()),
                Block::Body(String::new()),
            ]
        );
    }

    #[test]
    fn plan_with_no_sections_is_just_the_topic() {
        assert_eq!(plan("Solo", &[]), vec![Block::Heading1("Solo".into())]);
    }

    #[test]
    fn body_line_breaks_become_br() {
        let bytes = render("Topic", &sections(&[("Intro", "first\r\nsecond")])).unwrap();
        let doc = read_part(&bytes, "word/document.xml");
        let first = doc.find(">first<").expect("first line");
        let br = doc[first..].find("<w:br").expect("line break") + first;
        let second = doc.find(">second<").expect("second line");
        assert!(first < br && br < second);
        assert!(!doc.contains('\r'));
    }

    #[test]
    fn render_writes_expected_parts() {
        let bytes = render("Topic", &sections(&[("Intro", "Hello & welcome")])).unwrap();
        let names = part_names(&bytes);
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/styles.xml",
            "word/document.xml",
        ] {
            assert!(names.iter().any(|n| n == part), "missing {part}");
        }

        let doc = read_part(&bytes, "word/document.xml");
        assert!(doc.contains(r#"w:val="Heading1""#));
        assert!(doc.contains("Hello &amp; welcome"));

        let styles = read_part(&bytes, "word/styles.xml");
        assert!(styles.contains(r#"w:styleId="Heading2""#));
    }
}
