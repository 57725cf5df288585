//! PDF → Word (`.docx`) conversion.
//!
//! Two tiers, tried in order:
//!
//! ```text
//! PDF ──▶ layout  (pdfium segments → lines → paragraphs) ──▶ docx
//!   │        │ any error
//!   │        ▼
//!   └──▶ plain   (lopdf text per page → one paragraph per page) ──▶ docx
//! ```
//!
//! Both tiers produce the same intermediate [`WordBlock`] list, so the docx
//! writer is shared. Text reaching a block has been through [`xml_text`],
//! which removes characters XML 1.0 cannot carry. The primary attempt covers extraction *and* writing: a
//! write failure on the layout output also triggers the fallback.

pub mod layout;
pub mod plain;

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::TargetFormat;
use crate::output::{write_atomically, ConversionReport, Strategy};
use docx_rs::{BreakType, Docx, Paragraph, Pic, Run};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

pub use layout::{LayoutSource, PageImage, PageLayout, PdfiumLayoutSource, TextSpan};
pub use plain::{LopdfTextSource, TextSource};

/// English Metric Units per point.
const EMU_PER_PT: f32 = 12_700.0;

/// Widest picture that fits between the default docx page margins.
const MAX_IMAGE_WIDTH_PT: f32 = 451.0;

/// One unit of the document body.
#[derive(Debug, Clone, PartialEq)]
pub enum WordBlock {
    /// A paragraph of text. Embedded newlines become line breaks.
    Paragraph { text: String, font_size_pt: f32 },
    /// An inline PNG picture with its size on the PDF page.
    Image {
        png: Vec<u8>,
        width_pt: f32,
        height_pt: f32,
    },
    /// A hard page break.
    PageBreak,
}

impl WordBlock {
    pub fn is_page_break(&self) -> bool {
        matches!(self, WordBlock::PageBreak)
    }
}

/// Convert `pdf` to a Word document at `output` using the default sources.
pub fn convert(
    pdf: &Path,
    output: &Path,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    let layout = PdfiumLayoutSource::new(config.password.clone());
    let plain = LopdfTextSource::new(config.password.clone());
    convert_with(pdf, output, &layout, &plain, config)
}

/// Convert with explicit primary and fallback sources.
pub fn convert_with(
    pdf: &Path,
    output: &Path,
    layout: &dyn LayoutSource,
    fallback: &dyn TextSource,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    info!("Using layout reconstruction for conversion...");
    let primary = layout.page_layouts(pdf).and_then(|pages| {
        let blocks = layout::layout_blocks(&pages, config.paragraph_gap_ratio);
        let bytes = write_docx_file(output, &blocks)?;
        Ok((pages.len(), bytes))
    });

    let primary_err = match primary {
        Ok((pages, bytes)) => {
            let mut report = ConversionReport::new(TargetFormat::Word, output, Strategy::Layout, bytes);
            report.pages = pages;
            return Ok(report);
        }
        Err(e) => e,
    };

    warn!("Layout conversion error: {}", primary_err);
    warn!("Trying plain-text fallback...");

    let fallback_result = fallback.page_texts(pdf).and_then(|pages| {
        let blocks = plain::plain_blocks(&pages, config.body_font_size_pt);
        let bytes = write_docx_file(output, &blocks)?;
        Ok((pages.len(), bytes))
    });

    match fallback_result {
        Ok((pages, bytes)) => {
            let mut report =
                ConversionReport::new(TargetFormat::Word, output, Strategy::PlainText, bytes);
            report.pages = pages;
            Ok(report)
        }
        Err(fallback_err) => {
            warn!("Fallback conversion also failed: {}", fallback_err);
            Err(ConvertError::WordConversion {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            })
        }
    }
}

/// Build a `Docx` from body blocks.
pub fn build_docx(blocks: &[WordBlock]) -> Docx {
    blocks.iter().fold(Docx::new(), |docx, block| match block {
        WordBlock::PageBreak => {
            docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
        }
        WordBlock::Paragraph { text, font_size_pt } => {
            docx.add_paragraph(text_paragraph(text, *font_size_pt))
        }
        WordBlock::Image {
            png,
            width_pt,
            height_pt,
        } => docx.add_paragraph(image_paragraph(png, *width_pt, *height_pt)),
    })
}

/// Keep only characters XML 1.0 allows in text.
///
/// Vertical tab and form feed become newlines; other C0 controls and the
/// `U+FFFE`/`U+FFFF` non-characters are dropped.
pub fn xml_text(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\t' | '\n' | '\r' => Some(c),
            '\u{0b}' | '\u{0c}' => Some('\n'),
            '\u{fffe}' | '\u{ffff}' => None,
            c if c < ' ' => None,
            c => Some(c),
        })
        .collect()
}

/// A paragraph holding one inline picture, scaled down to the text width.
fn image_paragraph(png: &[u8], width_pt: f32, height_pt: f32) -> Paragraph {
    let scale = (MAX_IMAGE_WIDTH_PT / width_pt).min(1.0);
    let cx = (width_pt * scale * EMU_PER_PT).round() as u32;
    let cy = (height_pt * scale * EMU_PER_PT).round() as u32;
    // pixel dimensions are superseded by the EMU size
    let pic = Pic::new_with_dimensions(png.to_vec(), 0, 0).size(cx, cy);
    Paragraph::new().add_run(Run::new().add_image(pic))
}

/// A single-run paragraph; newlines inside `text` become soft line breaks.
fn text_paragraph(text: &str, font_size_pt: f32) -> Paragraph {
    // docx sizes are in half-points
    let half_points = (font_size_pt * 2.0).round().max(2.0) as usize;
    let mut run = Run::new().size(half_points);
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Paragraph::new().add_run(run)
}

fn write_docx(file: &mut File, blocks: &[WordBlock]) -> Result<(), ConvertError> {
    build_docx(blocks)
        .build()
        .pack(file)
        .map_err(|e| ConvertError::DocumentWrite {
            kind: "docx",
            detail: e.to_string(),
        })
}

fn write_docx_file(output: &Path, blocks: &[WordBlock]) -> Result<u64, ConvertError> {
    write_atomically(output, |file| write_docx(file, blocks))
}
