//! Layout reconstruction: positioned text segments → flowing paragraphs.
//!
//! pdfium reports text as segments (runs sharing a baseline and font) with
//! bounding boxes. Reading order is rebuilt in two passes:
//!
//! 1. **Lines.** Spans sorted top-to-bottom; a span whose vertical centre
//!    falls inside the current line's extent joins it, otherwise it opens a
//!    new line. Within a line spans are ordered left-to-right.
//! 2. **Paragraphs.** A gap between consecutive lines larger than
//!    `gap_ratio × line height` starts a new paragraph.
//!
//! Font size is estimated from line height (single spacing ≈ 1.2 × size).
//!
//! Image objects placed directly on a page are kept as PNG pictures and
//! slotted between paragraphs by their top edge.

use crate::error::ConvertError;
use crate::pdfium::{bind_pdfium, open_document};
use crate::word::{xml_text, WordBlock};
use image::ImageFormat;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

/// Ratio between a line box and the font size that produced it.
const LINE_SPACING: f32 = 1.2;

/// A run of text with its bounding box in top-left-origin page points.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextSpan {
    fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    fn centre(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// A picture on the page: PNG bytes and its placed size in points.
#[derive(Clone, PartialEq)]
pub struct PageImage {
    pub png: Vec<u8>,
    pub top: f32,
    pub width_pt: f32,
    pub height_pt: f32,
}

impl std::fmt::Debug for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageImage")
            .field("png", &format_args!("{} bytes", self.png.len()))
            .field("top", &self.top)
            .field("width_pt", &self.width_pt)
            .field("height_pt", &self.height_pt)
            .finish()
    }
}

/// All spans and pictures of one page, in any order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub spans: Vec<TextSpan>,
    pub images: Vec<PageImage>,
}

/// Source of positioned text for the primary Word path.
pub trait LayoutSource {
    fn page_layouts(&self, pdf: &Path) -> Result<Vec<PageLayout>, ConvertError>;
}

/// [`LayoutSource`] backed by pdfium text segments.
#[derive(Debug, Clone, Default)]
pub struct PdfiumLayoutSource {
    password: Option<String>,
}

impl PdfiumLayoutSource {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }
}

impl LayoutSource for PdfiumLayoutSource {
    fn page_layouts(&self, pdf: &Path) -> Result<Vec<PageLayout>, ConvertError> {
        let pdfium = bind_pdfium()?;
        let document = open_document(&pdfium, pdf, self.password.as_deref())?;
        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut layouts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let page_height = page.height().value;
            let text = page.text().map_err(|e| ConvertError::TextExtraction {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

            let mut spans = Vec::new();
            for segment in text.segments().iter() {
                let content = segment.text();
                let content = content.trim();
                if content.is_empty() {
                    continue;
                }

                // PDF origin is bottom-left; flip to top-left.
                let bounds = segment.bounds();
                spans.push(TextSpan {
                    text: content.to_string(),
                    left: bounds.left().value,
                    top: page_height - bounds.top().value,
                    bottom: page_height - bounds.bottom().value,
                });
            }

            let images = page_images(&page, page_height, idx + 1);

            debug!(
                "Page {}: {} text segments, {} images",
                idx + 1,
                spans.len(),
                images.len()
            );
            layouts.push(PageLayout { spans, images });
        }

        Ok(layouts)
    }
}

/// Top-level image objects of `page` re-encoded as PNG.
///
/// An image pdfium cannot decode is skipped with a warning; it never fails
/// the page.
fn page_images(page: &PdfPage<'_>, page_height: f32, page_number: usize) -> Vec<PageImage> {
    let mut images = Vec::new();
    for object in page.objects().iter() {
        let Some(image) = object.as_image_object() else {
            continue;
        };
        let decoded = image.get_raw_image().map_err(|e| format!("{:?}", e)).and_then(|raw| {
            let mut png = Vec::new();
            raw.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|e| e.to_string())?;
            Ok(png)
        });
        let placed = object.bounds().map_err(|e| format!("{:?}", e));

        match (decoded, placed) {
            (Ok(png), Ok(bounds)) if bounds.width().value > 0.0 && bounds.height().value > 0.0 => {
                images.push(PageImage {
                    png,
                    top: page_height - bounds.top().value,
                    width_pt: bounds.width().value,
                    height_pt: bounds.height().value,
                });
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Page {}: skipping unreadable image ({})", page_number, e);
            }
            _ => debug!("Page {}: skipping zero-size image", page_number),
        }
    }
    images
}

/// A reconstructed line of text.
#[derive(Debug, Clone)]
struct Line {
    text: String,
    top: f32,
    bottom: f32,
}

impl Line {
    fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

/// Turn page layouts into body blocks, with a page break before every page but the first.
///
/// Within a page, paragraphs and pictures are ordered by their top edge; a
/// paragraph and a picture at the same height keep the paragraph first.
pub fn layout_blocks(pages: &[PageLayout], gap_ratio: f32) -> Vec<WordBlock> {
    let mut blocks = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        if idx > 0 {
            blocks.push(WordBlock::PageBreak);
        }
        let lines = group_lines(&page.spans);
        let mut placed = group_paragraphs(&lines, gap_ratio);
        placed.extend(page.images.iter().map(|img| {
            (
                img.top,
                WordBlock::Image {
                    png: img.png.clone(),
                    width_pt: img.width_pt,
                    height_pt: img.height_pt,
                },
            )
        }));
        placed.sort_by(|a, b| a.0.total_cmp(&b.0));
        blocks.extend(placed.into_iter().map(|(_, block)| block));
    }
    blocks
}

fn group_lines(spans: &[TextSpan]) -> Vec<Line> {
    let mut sorted: Vec<&TextSpan> = spans.iter().collect();
    sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left)));

    let mut groups: Vec<Vec<&TextSpan>> = Vec::new();
    let mut extent = (0.0f32, 0.0f32);
    for span in sorted {
        match groups.last_mut() {
            Some(group) if span.centre() >= extent.0 && span.centre() <= extent.1 => {
                group.push(span);
                extent = (extent.0.min(span.top), extent.1.max(span.bottom));
            }
            _ => {
                groups.push(vec![span]);
                extent = (span.top, span.bottom);
            }
        }
    }

    groups
        .into_iter()
        .map(|mut group| {
            group.sort_by(|a, b| a.left.total_cmp(&b.left));
            Line {
                text: group
                    .iter()
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                top: group.iter().map(|s| s.top).fold(f32::INFINITY, f32::min),
                bottom: group.iter().map(|s| s.bottom).fold(f32::NEG_INFINITY, f32::max),
            }
        })
        .collect()
}

/// Paragraph blocks paired with the top of their first line.
fn group_paragraphs(lines: &[Line], gap_ratio: f32) -> Vec<(f32, WordBlock)> {
    let mut paragraphs: Vec<Vec<&Line>> = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let starts_paragraph = match i.checked_sub(1).map(|p| &lines[p]) {
            None => true,
            Some(prev) => line.top - prev.bottom > gap_ratio * prev.height(),
        };
        match paragraphs.last_mut() {
            Some(current) if !starts_paragraph => current.push(line),
            _ => paragraphs.push(vec![line]),
        }
    }

    paragraphs
        .into_iter()
        .filter_map(|lines| {
            let text = xml_text(&join_lines(&lines));
            if text.trim().is_empty() {
                return None;
            }
            let paragraph = WordBlock::Paragraph {
                text,
                font_size_pt: estimate_font_size(&lines),
            };
            Some((lines[0].top, paragraph))
        })
        .collect()
}

/// Join wrapped lines, re-attaching words hyphenated across a line end.
fn join_lines(lines: &[&Line]) -> String {
    let mut text = String::new();
    for line in lines {
        if text.is_empty() {
            text.push_str(&line.text);
        } else if text.ends_with('-') && line.text.starts_with(char::is_lowercase) {
            text.pop();
            text.push_str(&line.text);
        } else {
            text.push(' ');
            text.push_str(&line.text);
        }
    }
    text
}

/// Median line height over the line-spacing factor, to the nearest half point.
fn estimate_font_size(lines: &[&Line]) -> f32 {
    let mut heights: Vec<f32> = lines.iter().map(|l| l.height()).collect();
    heights.sort_by(f32::total_cmp);
    let median = heights.get(heights.len() / 2).copied().unwrap_or(0.0);
    ((median / LINE_SPACING) * 2.0).round().clamp(12.0, 144.0) / 2.0
}
