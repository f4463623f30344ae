//! PresentationML (`.pptx`) rendering.
//!
//! A 16:9 deck built from a single blank layout. Every slide is a handful of
//! absolutely positioned text boxes; geometry is planned in inches and
//! converted to EMUs when serialized.

use draftdeck_shared::Result;

use crate::ExportSection;
use crate::package::{
    Package, REL_OFFICE_DOCUMENT, XML_HEADER, content_types, escape, relationships,
};

const EMU_PER_INCH: f64 = 914_400.0;

/// Slide size in inches (16:9).
pub(crate) const SLIDE_WIDTH_IN: f64 = 10.0;
pub(crate) const SLIDE_HEIGHT_IN: f64 = 5.625;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Position and size of a text box, in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextBox {
    pub frame: Frame,
    pub text: String,
    pub size_pt: u32,
    pub bold: bool,
    /// Centre horizontally and vertically instead of top-left.
    pub centered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slide {
    pub boxes: Vec<TextBox>,
}

/// Slide layout: a title slide, then one slide per section.
pub(crate) fn plan(topic: &str, sections: &[ExportSection<'_>]) -> Vec<Slide> {
    let mut slides = Vec::with_capacity(1 + sections.len());
    slides.push(Slide {
        boxes: vec![TextBox {
            frame: Frame {
                x: 0.5,
                y: 0.5,
                w: SLIDE_WIDTH_IN - 1.0,
                h: SLIDE_HEIGHT_IN - 1.0,
            },
            text: topic.to_string(),
            size_pt: 44,
            bold: true,
            centered: true,
        }],
    });

    for section in sections {
        slides.push(Slide {
            boxes: vec![
                TextBox {
                    frame: Frame {
                        x: 0.5,
                        y: 0.5,
                        w: 9.0,
                        h: 1.0,
                    },
                    text: section.title.to_string(),
                    size_pt: 32,
                    bold: true,
                    centered: false,
                },
                TextBox {
                    frame: Frame {
                        x: 0.5,
                        y: 1.6,
                        w: 9.0,
                        h: 3.6,
                    },
                    text: section.body.to_string(),
                    size_pt: 16,
                    bold: false,
                    centered: false,
                },
            ],
        });
    }
    slides
}

pub(crate) fn render(topic: &str, sections: &[ExportSection<'_>]) -> Result<Vec<u8>> {
    let slides = plan(topic, sections);
    let count = slides.len();

    let mut overrides = vec![
        (
            "/ppt/presentation.xml".to_string(),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        ),
        (
            "/ppt/slideMasters/slideMaster1.xml".to_string(),
            "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml",
        ),
        (
            "/ppt/slideLayouts/slideLayout1.xml".to_string(),
            "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml",
        ),
        (
            "/ppt/theme/theme1.xml".to_string(),
            "application/vnd.openxmlformats-officedocument.theme+xml",
        ),
    ];
    for n in 1..=count {
        overrides.push((
            format!("/ppt/slides/slide{n}.xml"),
            "application/vnd.openxmlformats-officedocument.presentationml.slide+xml",
        ));
    }

    let rel_master = format!("{REL_BASE}/slideMaster");
    let rel_layout = format!("{REL_BASE}/slideLayout");
    let rel_slide = format!("{REL_BASE}/slide");
    let rel_theme = format!("{REL_BASE}/theme");

    let mut pres_rels = vec![(
        "rId1".to_string(),
        rel_master.as_str(),
        "slideMasters/slideMaster1.xml".to_string(),
    )];
    for n in 1..=count {
        pres_rels.push((
            format!("rId{}", n + 1),
            rel_slide.as_str(),
            format!("slides/slide{n}.xml"),
        ));
    }
    pres_rels.push((
        format!("rId{}", count + 2),
        rel_theme.as_str(),
        "theme/theme1.xml".to_string(),
    ));

    let mut pkg = Package::new();
    pkg.add("[Content_Types].xml", &content_types(&overrides))?;
    pkg.add(
        "_rels/.rels",
        &relationships(&[(
            "rId1".to_string(),
            REL_OFFICE_DOCUMENT,
            "ppt/presentation.xml".to_string(),
        )]),
    )?;
    pkg.add("ppt/presentation.xml", &presentation_xml(count))?;
    pkg.add("ppt/_rels/presentation.xml.rels", &relationships(&pres_rels))?;

    pkg.add("ppt/slideMasters/slideMaster1.xml", &master_xml())?;
    pkg.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[
            (
                "rId1".to_string(),
                rel_layout.as_str(),
                "../slideLayouts/slideLayout1.xml".to_string(),
            ),
            (
                "rId2".to_string(),
                rel_theme.as_str(),
                "../theme/theme1.xml".to_string(),
            ),
        ]),
    )?;
    pkg.add("ppt/slideLayouts/slideLayout1.xml", &layout_xml())?;
    pkg.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[(
            "rId1".to_string(),
            rel_master.as_str(),
            "../slideMasters/slideMaster1.xml".to_string(),
        )]),
    )?;
    pkg.add("ppt/theme/theme1.xml", THEME_XML)?;

    let slide_rels = relationships(&[(
        "rId1".to_string(),
        rel_layout.as_str(),
        "../slideLayouts/slideLayout1.xml".to_string(),
    )]);
    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        pkg.add(&format!("ppt/slides/slide{n}.xml"), &slide_xml(slide))?;
        pkg.add(&format!("ppt/slides/_rels/slide{n}.xml.rels"), &slide_rels)?;
    }

    pkg.finish()
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

fn presentation_xml(slide_count: usize) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(&format!(r#"<p:presentation {NS} saveSubsetFonts="1">"#));
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    xml.push_str("<p:sldIdLst>");
    for n in 1..=slide_count {
        xml.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1));
    }
    xml.push_str("</p:sldIdLst>");
    xml.push_str(&format!(
        r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
        emu(SLIDE_WIDTH_IN),
        emu(SLIDE_HEIGHT_IN)
    ));
    xml.push_str("</p:presentation>");
    xml
}

/// Empty shape tree header shared by master, layout and slides.
const EMPTY_GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

fn master_xml() -> String {
    format!(
        r#"{XML_HEADER}<p:sldMaster {NS}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{EMPTY_GROUP}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn layout_xml() -> String {
    format!(
        r#"{XML_HEADER}<p:sldLayout {NS} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{EMPTY_GROUP}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

fn slide_xml(slide: &Slide) -> String {
    let mut xml = String::from(XML_HEADER);
    xml.push_str(&format!(r#"<p:sld {NS}><p:cSld><p:spTree>{EMPTY_GROUP}"#));
    for (i, text_box) in slide.boxes.iter().enumerate() {
        // Shape id 1 belongs to the group.
        xml.push_str(&shape_xml(i + 2, text_box));
    }
    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    xml
}

fn shape_xml(id: usize, text_box: &TextBox) -> String {
    let Frame { x, y, w, h } = text_box.frame;
    let anchor = if text_box.centered { "ctr" } else { "t" };
    let size = text_box.size_pt * 100;
    let bold = if text_box.bold { r#" b="1""# } else { "" };
    let align = if text_box.centered {
        r#"<a:pPr algn="ctr"/>"#
    } else {
        ""
    };

    let mut xml = format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" anchor="{anchor}"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#,
        emu(x),
        emu(y),
        emu(w),
        emu(h)
    );
    for line in text_box.text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            xml.push_str(&format!(
                r#"<a:p>{align}<a:endParaRPr lang="en-US" sz="{size}"{bold}/></a:p>"#
            ));
        } else {
            xml.push_str(&format!(
                r#"<a:p>{align}<a:r><a:rPr lang="en-US" sz="{size}"{bold} dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                escape(line)
            ));
        }
    }
    xml.push_str("</p:txBody></p:sp>");
    xml
}

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="DraftDeck"><a:themeElements><a:clrScheme name="DraftDeck"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F2937"/></a:dk2><a:lt2><a:srgbClr val="F3F4F6"/></a:lt2><a:accent1><a:srgbClr val="2563EB"/></a:accent1><a:accent2><a:srgbClr val="16A34A"/></a:accent2><a:accent3><a:srgbClr val="D97706"/></a:accent3><a:accent4><a:srgbClr val="DC2626"/></a:accent4><a:accent5><a:srgbClr val="7C3AED"/></a:accent5><a:accent6><a:srgbClr val="0891B2"/></a:accent6><a:hlink><a:srgbClr val="2563EB"/></a:hlink><a:folHlink><a:srgbClr val="7C3AED"/></a:folHlink></a:clrScheme><a:fontScheme name="DraftDeck"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="DraftDeck"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#;
