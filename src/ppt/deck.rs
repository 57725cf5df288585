//! Minimal PresentationML package: blank slides holding one picture each.
//!
//! The package carries the smallest part set PowerPoint and LibreOffice
//! accept: one master, one blank layout, one theme, then a slide part and a
//! PNG media part per picture. Every XML part is emitted through a
//! `quick_xml::Writer`, which escapes attribute values and text, and the
//! parts are stored with `zip` (deflate).

use crate::error::ConvertError;
use crate::ppt::SlideDeck;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::fmt::Display;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// English Metric Units per inch.
pub const EMU_PER_INCH: u64 = 914_400;
/// Slide width: 10 inches.
pub const SLIDE_WIDTH_EMU: u64 = 10 * EMU_PER_INCH;
/// Slide height: 7.5 inches.
pub const SLIDE_HEIGHT_EMU: u64 = 15 * EMU_PER_INCH / 2;

const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CT_PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Namespace declarations shared by presentation, master, layout and slides.
const PML_NAMESPACES: [(&str, &str); 3] = [("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)];

/// Theme colour slots after `dk1`/`lt1`, which use system colours.
const SCHEME_COLOURS: [(&str, &str); 10] = [
    ("a:dk2", "44546A"),
    ("a:lt2", "E7E6E6"),
    ("a:accent1", "4472C4"),
    ("a:accent2", "ED7D31"),
    ("a:accent3", "A5A5A5"),
    ("a:accent4", "FFC000"),
    ("a:accent5", "5B9BD5"),
    ("a:accent6", "70AD47"),
    ("a:hlink", "0563C1"),
    ("a:folHlink", "954F72"),
];

type Xml = Writer<Vec<u8>>;
type XmlResult = quick_xml::Result<()>;

/// A picture placed at the top-left corner of its slide.
#[derive(Debug, Clone)]
struct PictureSlide {
    png: Vec<u8>,
    cx: u64,
    cy: u64,
}

/// A `.pptx` deck built in memory.
#[derive(Debug, Clone)]
pub struct PptxDeck {
    title: String,
    slides: Vec<PictureSlide>,
}

impl PptxDeck {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slides: Vec::new(),
        }
    }
}

/// Picture extent for an image scaled to the slide width.
pub fn fit_to_width(width_px: u32, height_px: u32) -> (u64, u64) {
    let cx = SLIDE_WIDTH_EMU;
    let cy = (cx as f64 * height_px as f64 / width_px as f64).round() as u64;
    (cx, cy)
}

impl SlideDeck for PptxDeck {
    fn add_picture_slide(&mut self, image: &Path) -> Result<(), ConvertError> {
        let (w, h) = image::image_dimensions(image).map_err(|e| ConvertError::DocumentWrite {
            kind: "pptx",
            detail: format!("unreadable slide image '{}': {e}", image.display()),
        })?;
        if w == 0 || h == 0 {
            return Err(ConvertError::DocumentWrite {
                kind: "pptx",
                detail: format!("slide image '{}' has zero size", image.display()),
            });
        }
        let png = std::fs::read(image).map_err(|e| ConvertError::io(image, e))?;
        let (cx, cy) = fit_to_width(w, h);
        self.slides.push(PictureSlide { png, cx, cy });
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        let parts = self.parts().map_err(pptx_error)?;
        zip_parts(&parts).map_err(pptx_error)
    }
}

fn pptx_error(e: impl Display) -> ConvertError {
    ConvertError::DocumentWrite {
        kind: "pptx",
        detail: e.to_string(),
    }
}

/// Store `parts` in a deflated zip, in order.
fn zip_parts(parts: &[(String, Cow<'_, [u8]>)]) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in parts {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(body)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Serialise one XML part: declaration, then whatever `body` writes.
fn xml_part(body: impl FnOnce(&mut Xml) -> XmlResult) -> quick_xml::Result<Cow<'static, [u8]>> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    body(&mut w)?;
    Ok(Cow::Owned(w.into_inner()))
}

fn element<F>(w: &mut Xml, name: &str, attrs: &[(&str, &str)], inner: F) -> XmlResult
where
    F: FnOnce(&mut Xml) -> XmlResult,
{
    w.create_element(name)
        .with_attributes(attrs.iter().copied())
        .write_inner_content(inner)?;
    Ok(())
}

fn empty(w: &mut Xml, name: &str, attrs: &[(&str, &str)]) -> XmlResult {
    w.create_element(name)
        .with_attributes(attrs.iter().copied())
        .write_empty()?;
    Ok(())
}

fn text(w: &mut Xml, name: &str, content: &str) -> XmlResult {
    w.create_element(name)
        .write_text_content(BytesText::new(content))?;
    Ok(())
}

/// `Relationships` part from `(id, type suffix under REL or full URI, target)`.
fn relationships(w: &mut Xml, rels: &[(String, String, String)]) -> XmlResult {
    element(w, "Relationships", &[("xmlns", NS_PACKAGE_RELS)], |w| {
        for (id, kind, target) in rels {
            empty(
                w,
                "Relationship",
                &[("Id", id.as_str()), ("Type", kind.as_str()), ("Target", target.as_str())],
            )?;
        }
        Ok(())
    })
}

fn rel(id: usize, kind: &str, target: impl Into<String>) -> (String, String, String) {
    (format!("rId{id}"), format!("{REL}/{kind}"), target.into())
}

impl PptxDeck {
    fn parts(&self) -> quick_xml::Result<Vec<(String, Cow<'_, [u8]>)>> {
        let mut parts = vec![
            ("[Content_Types].xml".to_string(), xml_part(|w| self.content_types(w))?),
            ("_rels/.rels".to_string(), xml_part(root_rels)?),
            ("docProps/app.xml".to_string(), xml_part(|w| self.app_props(w))?),
            ("docProps/core.xml".to_string(), xml_part(|w| self.core_props(w))?),
            ("ppt/presentation.xml".to_string(), xml_part(|w| self.presentation(w))?),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                xml_part(|w| self.presentation_rels(w))?,
            ),
            ("ppt/slideMasters/slideMaster1.xml".to_string(), xml_part(slide_master)?),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
                xml_part(|w| {
                    relationships(
                        w,
                        &[
                            rel(1, "slideLayout", "../slideLayouts/slideLayout1.xml"),
                            rel(2, "theme", "../theme/theme1.xml"),
                        ],
                    )
                })?,
            ),
            ("ppt/slideLayouts/slideLayout1.xml".to_string(), xml_part(slide_layout)?),
            (
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
                xml_part(|w| {
                    relationships(w, &[rel(1, "slideMaster", "../slideMasters/slideMaster1.xml")])
                })?,
            ),
            ("ppt/theme/theme1.xml".to_string(), xml_part(theme)?),
        ];

        for (idx, slide) in self.slides.iter().enumerate() {
            let n = idx + 1;
            parts.push((
                format!("ppt/slides/slide{n}.xml"),
                xml_part(|w| picture_slide(w, n, slide))?,
            ));
            parts.push((
                format!("ppt/slides/_rels/slide{n}.xml.rels"),
                xml_part(|w| {
                    relationships(
                        w,
                        &[
                            rel(1, "slideLayout", "../slideLayouts/slideLayout1.xml"),
                            rel(2, "image", format!("../media/image{n}.png")),
                        ],
                    )
                })?,
            ));
            parts.push((format!("ppt/media/image{n}.png"), Cow::Borrowed(&slide.png[..])));
        }

        Ok(parts)
    }

    fn content_types(&self, w: &mut Xml) -> XmlResult {
        element(w, "Types", &[("xmlns", NS_CONTENT_TYPES)], |w| {
            for (ext, ct) in [
                ("rels", "application/vnd.openxmlformats-package.relationships+xml"),
                ("xml", "application/xml"),
                ("png", "image/png"),
            ] {
                empty(w, "Default", &[("Extension", ext), ("ContentType", ct)])?;
            }

            let fixed = [
                ("/ppt/presentation.xml", format!("{CT_PML}.presentation.main+xml")),
                ("/ppt/slideMasters/slideMaster1.xml", format!("{CT_PML}.slideMaster+xml")),
                ("/ppt/slideLayouts/slideLayout1.xml", format!("{CT_PML}.slideLayout+xml")),
                (
                    "/ppt/theme/theme1.xml",
                    "application/vnd.openxmlformats-officedocument.theme+xml".to_string(),
                ),
            ];
            for (part, ct) in &fixed {
                empty(w, "Override", &[("PartName", *part), ("ContentType", ct.as_str())])?;
            }

            for n in 1..=self.slides.len() {
                let part = format!("/ppt/slides/slide{n}.xml");
                empty(w, "Override", &[("PartName", part.as_str()), ("ContentType", CT_SLIDE)])?;
            }

            empty(
                w,
                "Override",
                &[
                    ("PartName", "/docProps/core.xml"),
                    ("ContentType", "application/vnd.openxmlformats-package.core-properties+xml"),
                ],
            )?;
            empty(
                w,
                "Override",
                &[
                    ("PartName", "/docProps/app.xml"),
                    (
                        "ContentType",
                        "application/vnd.openxmlformats-officedocument.extended-properties+xml",
                    ),
                ],
            )
        })
    }

    fn app_props(&self, w: &mut Xml) -> XmlResult {
        let ns = "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
        element(w, "Properties", &[("xmlns", ns)], |w| {
            text(w, "Application", "pdf2office")?;
            text(w, "Slides", &self.slides.len().to_string())
        })
    }

    fn core_props(&self, w: &mut Xml) -> XmlResult {
        element(
            w,
            "cp:coreProperties",
            &[
                (
                    "xmlns:cp",
                    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
                ),
                ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ],
            |w| {
                text(w, "dc:title", &self.title)?;
                text(w, "dc:creator", "pdf2office")
            },
        )
    }

    fn presentation(&self, w: &mut Xml) -> XmlResult {
        let [a, r, p] = PML_NAMESPACES;
        let width = SLIDE_WIDTH_EMU.to_string();
        let height = SLIDE_HEIGHT_EMU.to_string();
        element(w, "p:presentation", &[a, r, p, ("saveSubsetFonts", "1")], |w| {
            element(w, "p:sldMasterIdLst", &[], |w| {
                empty(w, "p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])
            })?;
            // rId1 master, rId2 theme, slides from rId3
            element(w, "p:sldIdLst", &[], |w| {
                for i in 0..self.slides.len() {
                    let id = (256 + i).to_string();
                    let rid = format!("rId{}", 3 + i);
                    empty(w, "p:sldId", &[("id", id.as_str()), ("r:id", rid.as_str())])?;
                }
                Ok(())
            })?;
            empty(w, "p:sldSz", &[("cx", width.as_str()), ("cy", height.as_str())])?;
            empty(w, "p:notesSz", &[("cx", height.as_str()), ("cy", width.as_str())])
        })
    }

    fn presentation_rels(&self, w: &mut Xml) -> XmlResult {
        let mut rels = vec![
            rel(1, "slideMaster", "slideMasters/slideMaster1.xml"),
            rel(2, "theme", "theme/theme1.xml"),
        ];
        rels.extend((1..=self.slides.len()).map(|n| rel(n + 2, "slide", format!("slides/slide{n}.xml"))));
        relationships(w, &rels)
    }
}

fn root_rels(w: &mut Xml) -> XmlResult {
    relationships(
        w,
        &[
            rel(1, "officeDocument", "ppt/presentation.xml"),
            (
                "rId2".to_string(),
                format!("{NS_PACKAGE_RELS}/metadata/core-properties"),
                "docProps/core.xml".to_string(),
            ),
            rel(3, "extended-properties", "docProps/app.xml"),
        ],
    )
}

/// Empty group-shape header every shape tree starts with.
fn sp_tree_header(w: &mut Xml) -> XmlResult {
    element(w, "p:nvGrpSpPr", &[], |w| {
        empty(w, "p:cNvPr", &[("id", "1"), ("name", "")])?;
        empty(w, "p:cNvGrpSpPr", &[])?;
        empty(w, "p:nvPr", &[])
    })?;
    element(w, "p:grpSpPr", &[], |w| {
        element(w, "a:xfrm", &[], |w| {
            empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
            empty(w, "a:ext", &[("cx", "0"), ("cy", "0")])?;
            empty(w, "a:chOff", &[("x", "0"), ("y", "0")])?;
            empty(w, "a:chExt", &[("cx", "0"), ("cy", "0")])
        })
    })
}

fn master_colour_mapping(w: &mut Xml) -> XmlResult {
    element(w, "p:clrMapOvr", &[], |w| empty(w, "a:masterClrMapping", &[]))
}

fn slide_master(w: &mut Xml) -> XmlResult {
    element(w, "p:sldMaster", &PML_NAMESPACES, |w| {
        element(w, "p:cSld", &[], |w| {
            element(w, "p:bg", &[], |w| {
                element(w, "p:bgRef", &[("idx", "1001")], |w| {
                    empty(w, "a:schemeClr", &[("val", "bg1")])
                })
            })?;
            element(w, "p:spTree", &[], sp_tree_header)
        })?;
        empty(
            w,
            "p:clrMap",
            &[
                ("bg1", "lt1"),
                ("tx1", "dk1"),
                ("bg2", "lt2"),
                ("tx2", "dk2"),
                ("accent1", "accent1"),
                ("accent2", "accent2"),
                ("accent3", "accent3"),
                ("accent4", "accent4"),
                ("accent5", "accent5"),
                ("accent6", "accent6"),
                ("hlink", "hlink"),
                ("folHlink", "folHlink"),
            ],
        )?;
        element(w, "p:sldLayoutIdLst", &[], |w| {
            empty(w, "p:sldLayoutId", &[("id", "2147483649"), ("r:id", "rId1")])
        })
    })
}

fn slide_layout(w: &mut Xml) -> XmlResult {
    let [a, r, p] = PML_NAMESPACES;
    element(w, "p:sldLayout", &[a, r, p, ("type", "blank"), ("preserve", "1")], |w| {
        element(w, "p:cSld", &[("name", "Blank")], |w| {
            element(w, "p:spTree", &[], sp_tree_header)
        })?;
        master_colour_mapping(w)
    })
}

fn picture_slide(w: &mut Xml, n: usize, slide: &PictureSlide) -> XmlResult {
    let name = format!("Picture {n}");
    let cx = slide.cx.to_string();
    let cy = slide.cy.to_string();
    element(w, "p:sld", &PML_NAMESPACES, |w| {
        element(w, "p:cSld", &[], |w| {
            element(w, "p:spTree", &[], |w| {
                sp_tree_header(w)?;
                element(w, "p:pic", &[], |w| {
                    element(w, "p:nvPicPr", &[], |w| {
                        empty(w, "p:cNvPr", &[("id", "2"), ("name", name.as_str())])?;
                        element(w, "p:cNvPicPr", &[], |w| {
                            empty(w, "a:picLocks", &[("noChangeAspect", "1")])
                        })?;
                        empty(w, "p:nvPr", &[])
                    })?;
                    element(w, "p:blipFill", &[], |w| {
                        empty(w, "a:blip", &[("r:embed", "rId2")])?;
                        element(w, "a:stretch", &[], |w| empty(w, "a:fillRect", &[]))
                    })?;
                    element(w, "p:spPr", &[], |w| {
                        element(w, "a:xfrm", &[], |w| {
                            empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
                            empty(w, "a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])
                        })?;
                        element(w, "a:prstGeom", &[("prst", "rect")], |w| {
                            empty(w, "a:avLst", &[])
                        })
                    })
                })
            })
        })?;
        master_colour_mapping(w)
    })
}

fn solid_fill(w: &mut Xml) -> XmlResult {
    element(w, "a:solidFill", &[], |w| {
        empty(w, "a:schemeClr", &[("val", "phClr")])
    })
}

fn theme(w: &mut Xml) -> XmlResult {
    element(w, "a:theme", &[("xmlns:a", NS_A), ("name", "Office Theme")], |w| {
        element(w, "a:themeElements", &[], |w| {
            element(w, "a:clrScheme", &[("name", "Office")], |w| {
                element(w, "a:dk1", &[], |w| {
                    empty(w, "a:sysClr", &[("val", "windowText"), ("lastClr", "000000")])
                })?;
                element(w, "a:lt1", &[], |w| {
                    empty(w, "a:sysClr", &[("val", "window"), ("lastClr", "FFFFFF")])
                })?;
                for (slot, rgb) in SCHEME_COLOURS {
                    element(w, slot, &[], |w| empty(w, "a:srgbClr", &[("val", rgb)]))?;
                }
                Ok(())
            })?;
            element(w, "a:fontScheme", &[("name", "Office")], |w| {
                for (slot, latin) in [("a:majorFont", "Calibri Light"), ("a:minorFont", "Calibri")] {
                    element(w, slot, &[], |w| {
                        empty(w, "a:latin", &[("typeface", latin)])?;
                        empty(w, "a:ea", &[("typeface", "")])?;
                        empty(w, "a:cs", &[("typeface", "")])
                    })?;
                }
                Ok(())
            })?;
            element(w, "a:fmtScheme", &[("name", "Office")], |w| {
                element(w, "a:fillStyleLst", &[], |w| (0..3).try_for_each(|_| solid_fill(w)))?;
                element(w, "a:lnStyleLst", &[], |w| {
                    ["6350", "12700", "19050"]
                        .into_iter()
                        .try_for_each(|width| element(w, "a:ln", &[("w", width)], solid_fill))
                })?;
                element(w, "a:effectStyleLst", &[], |w| {
                    (0..3).try_for_each(|_| {
                        element(w, "a:effectStyle", &[], |w| empty(w, "a:effectLst", &[]))
                    })
                })?;
                element(w, "a:bgFillStyleLst", &[], |w| (0..3).try_for_each(|_| solid_fill(w)))
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Read;

    fn png_file(dir: &Path, name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255])))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut s = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut s).unwrap();
        s
    }

    #[test]
    fn canvas_is_ten_by_seven_and_a_half_inches() {
        assert_eq!(SLIDE_WIDTH_EMU, 9_144_000);
        assert_eq!(SLIDE_HEIGHT_EMU, 6_858_000);
    }

    #[test]
    fn picture_height_follows_aspect_ratio() {
        assert_eq!(fit_to_width(1000, 750), (9_144_000, 6_858_000));
        assert_eq!(fit_to_width(850, 1100), (9_144_000, 11_833_412));
    }

    #[test]
    fn package_contains_one_slide_and_picture_per_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut deck = PptxDeck::new("Report & Summary");
        deck.add_picture_slide(&png_file(dir.path(), "a.png", 40, 30)).unwrap();
        deck.add_picture_slide(&png_file(dir.path(), "b.png", 30, 40)).unwrap();
        assert_eq!(deck.slide_count(), 2);

        let bytes = deck.to_bytes().unwrap();
        let names: Vec<String> = zip::ZipArchive::new(Cursor::new(&bytes[..]))
            .unwrap()
            .file_names()
            .map(String::from)
            .collect();
        for n in 1..=2 {
            assert!(names.contains(&format!("ppt/slides/slide{n}.xml")));
            assert!(names.contains(&format!("ppt/media/image{n}.png")));
        }
        assert!(!names.iter().any(|n| n == "ppt/slides/slide3.xml"));

        let presentation = read_part(&bytes, "ppt/presentation.xml");
        assert!(presentation.contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));
        assert_eq!(presentation.matches("<p:sldId ").count(), 2);

        let slide = read_part(&bytes, "ppt/slides/slide1.xml");
        assert_eq!(slide.matches("<p:pic>").count(), 1);
        assert!(slide.contains(r#"<a:off x="0" y="0"/><a:ext cx="9144000" cy="6858000"/>"#));

        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("Report &amp; Summary"));
    }

    #[test]
    fn every_xml_part_is_well_formed() {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let dir = tempfile::tempdir().unwrap();
        let mut deck = PptxDeck::new(r#"<Q3> "draft" & 'final'"#);
        deck.add_picture_slide(&png_file(dir.path(), "a.png", 16, 9)).unwrap();
        let bytes = deck.to_bytes().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(&bytes[..])).unwrap();
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        let mut checked = 0;
        for name in names.iter().filter(|n| n.ends_with(".xml") || n.ends_with(".rels")) {
            let mut xml = String::new();
            archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
            assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
            let mut reader = Reader::from_str(&xml);
            loop {
                match reader.read_event() {
                    Ok(Event::Eof) => break,
                    Ok(_) => {}
                    Err(e) => panic!("{name}: {e}"),
                }
            }
            checked += 1;
        }
        // 11 fixed parts plus a slide and its rels
        assert_eq!(checked, 13);

        let core = read_part(&bytes, "docProps/core.xml");
        assert!(core.contains("&lt;Q3&gt;"), "{core}");
    }

    #[test]
    fn unreadable_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"not a png").unwrap();
        let mut deck = PptxDeck::new("x");
        assert!(deck.add_picture_slide(&bogus).is_err());
        assert_eq!(deck.slide_count(), 0);
    }
}
