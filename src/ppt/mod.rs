//! PDF → PowerPoint (`.pptx`) conversion.
//!
//! Each page is rasterised, written to a temporary PNG, and placed as the
//! only content of a blank slide, scaled to the slide width. The temporary
//! image is a [`tempfile::NamedTempFile`], so it is removed when the slide
//! has been added *and* when anything along the way fails.

pub mod deck;
pub mod render;

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::format::TargetFormat;
use crate::output::{write_atomically, ConversionReport, Strategy};
use image::{DynamicImage, ImageFormat};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub use deck::PptxDeck;
pub use render::PdfiumRasterizer;

/// Renders every page of a PDF to an image, in page order.
pub trait PageRasterizer {
    fn rasterize(&self, pdf: &Path) -> Result<Vec<DynamicImage>, ConvertError>;
}

/// A slide deck under construction.
pub trait SlideDeck {
    /// Append a blank slide holding the image at `image`.
    ///
    /// The image bytes are copied; the file may be deleted afterwards.
    fn add_picture_slide(&mut self, image: &Path) -> Result<(), ConvertError>;
    fn slide_count(&self) -> usize;
    fn to_bytes(&self) -> Result<Vec<u8>, ConvertError>;
}

/// Convert `pdf` to a slide deck at `output` using pdfium.
pub fn convert(
    pdf: &Path,
    output: &Path,
    config: &ConversionConfig,
) -> Result<ConversionReport, ConvertError> {
    let title = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut deck = PptxDeck::new(title);
    convert_with(
        pdf,
        output,
        &PdfiumRasterizer::from_config(config),
        &mut deck,
        config.temp_dir.as_deref(),
    )
}

/// Convert with an explicit rasterizer and deck.
///
/// Temporary page images go to `temp_dir`, or the system temp directory.
pub fn convert_with(
    pdf: &Path,
    output: &Path,
    rasterizer: &dyn PageRasterizer,
    deck: &mut dyn SlideDeck,
    temp_dir: Option<&Path>,
) -> Result<ConversionReport, ConvertError> {
    info!("Rendering PDF pages...");
    let images = rasterizer.rasterize(pdf)?;
    if images.is_empty() {
        return Err(ConvertError::NoPagesRendered {
            path: pdf.to_path_buf(),
        });
    }

    for (idx, image) in images.iter().enumerate() {
        place_page_image(deck, image, idx + 1, temp_dir)?;
    }
    info!("Added {} slide(s)", deck.slide_count());

    let buffer = deck.to_bytes()?;
    let bytes = write_atomically(output, |file| {
        file.write_all(&buffer)
            .map_err(|e| ConvertError::io(output, e))
    })?;

    let mut report = ConversionReport::new(TargetFormat::Ppt, output, Strategy::PageImages, bytes);
    report.pages = images.len();
    report.slides = deck.slide_count();
    Ok(report)
}

/// Write `image` to a temporary PNG and add it to `deck` as one slide.
fn place_page_image(
    deck: &mut dyn SlideDeck,
    image: &DynamicImage,
    page: usize,
    temp_dir: Option<&Path>,
) -> Result<(), ConvertError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("pdf2office-page-").suffix(".png");
    let tmp: NamedTempFile = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ConvertError::io(temp_dir.unwrap_or(Path::new(".")), e))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        image
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| ConvertError::Rasterisation {
                page,
                detail: format!("PNG encoding failed: {e}"),
            })?;
        writer.flush().map_err(|e| ConvertError::io(tmp.path(), e))?;
    }
    debug!("Page {} image at {}", page, tmp.path().display());

    deck.add_picture_slide(tmp.path())?;
    tmp.close().map_err(|e| ConvertError::io(Path::new("page image"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::path::PathBuf;

    struct FakeRasterizer(usize);

    impl PageRasterizer for FakeRasterizer {
        fn rasterize(&self, _pdf: &Path) -> Result<Vec<DynamicImage>, ConvertError> {
            Ok((0..self.0)
                .map(|_| DynamicImage::ImageRgba8(RgbaImage::from_pixel(17, 22, Rgba([255; 4]))))
                .collect())
        }
    }

    /// Records the image paths it was given and fails on the `fail_on`-th slide.
    struct RecordingDeck {
        seen: Vec<PathBuf>,
        fail_on: Option<usize>,
    }

    impl SlideDeck for RecordingDeck {
        fn add_picture_slide(&mut self, image: &Path) -> Result<(), ConvertError> {
            assert!(image.exists());
            self.seen.push(image.to_path_buf());
            if self.fail_on == Some(self.seen.len()) {
                return Err(ConvertError::DocumentWrite {
                    kind: "pptx",
                    detail: "injected".into(),
                });
            }
            Ok(())
        }

        fn slide_count(&self) -> usize {
            self.seen.len()
        }

        fn to_bytes(&self) -> Result<Vec<u8>, ConvertError> {
            Ok(b"deck".to_vec())
        }
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn one_slide_per_page_and_temp_images_removed() {
        let out_dir = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("deck.pptx");
        let mut deck = RecordingDeck {
            seen: vec![],
            fail_on: None,
        };

        let report = convert_with(
            Path::new("in.pdf"),
            &out,
            &FakeRasterizer(4),
            &mut deck,
            Some(scratch.path()),
        )
        .unwrap();

        assert_eq!(report.slides, 4);
        assert_eq!(report.pages, 4);
        assert_eq!(report.strategy, Strategy::PageImages);
        assert!(deck.seen.iter().all(|p| p.starts_with(scratch.path())));
        assert_eq!(entries(scratch.path()), 0);
        assert_eq!(std::fs::read(&out).unwrap(), b"deck");
    }

    #[test]
    fn temp_image_removed_when_slide_insertion_fails() {
        let out_dir = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("deck.pptx");
        let mut deck = RecordingDeck {
            seen: vec![],
            fail_on: Some(2),
        };

        let err = convert_with(
            Path::new("in.pdf"),
            &out,
            &FakeRasterizer(3),
            &mut deck,
            Some(scratch.path()),
        )
        .unwrap_err();

        assert!(matches!(err, ConvertError::DocumentWrite { .. }));
        assert_eq!(deck.seen.len(), 2);
        assert_eq!(entries(scratch.path()), 0);
        assert!(!out.exists());
    }

    #[test]
    fn zero_pages_is_a_failure() {
        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("deck.pptx");
        let mut deck = PptxDeck::new("empty");

        let err =
            convert_with(Path::new("in.pdf"), &out, &FakeRasterizer(0), &mut deck, None).unwrap_err();

        assert!(matches!(err, ConvertError::NoPagesRendered { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn real_deck_gets_sized_pictures() {
        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("deck.pptx");
        let mut deck = PptxDeck::new("pages");

        let report =
            convert_with(Path::new("in.pdf"), &out, &FakeRasterizer(2), &mut deck, None).unwrap();

        assert_eq!(report.slides, 2);
        let file = std::fs::File::open(&out).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let slides = archive
            .file_names()
            .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
            .count();
        assert_eq!(slides, 2);
    }
}
