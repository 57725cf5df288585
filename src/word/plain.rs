//! Plain-text fallback: raw per-page text via lopdf.
//!
//! Used when layout reconstruction fails. lopdf is a pure-Rust parser that
//! does not depend on the pdfium library, so this path still works on hosts
//! where pdfium cannot be bound.

use crate::error::ConvertError;
use crate::word::{xml_text, WordBlock};
use lopdf::Document;
use std::path::Path;
use tracing::{debug, warn};

/// Source of unpositioned text, one string per page in page order.
pub trait TextSource {
    fn page_texts(&self, pdf: &Path) -> Result<Vec<String>, ConvertError>;
}

/// [`TextSource`] backed by lopdf.
#[derive(Debug, Clone, Default)]
pub struct LopdfTextSource {
    password: Option<String>,
}

impl LopdfTextSource {
    pub fn new(password: Option<String>) -> Self {
        Self { password }
    }
}

impl TextSource for LopdfTextSource {
    fn page_texts(&self, pdf: &Path) -> Result<Vec<String>, ConvertError> {
        let mut doc = Document::load(pdf).map_err(|e| ConvertError::PdfOpen {
            path: pdf.to_path_buf(),
            detail: e.to_string(),
        })?;

        if doc.is_encrypted() {
            let password = self.password.as_deref().unwrap_or("");
            doc.decrypt(password).map_err(|_| {
                if self.password.is_some() {
                    ConvertError::WrongPassword {
                        path: pdf.to_path_buf(),
                    }
                } else {
                    ConvertError::PasswordRequired {
                        path: pdf.to_path_buf(),
                    }
                }
            })?;
        }

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        debug!("lopdf opened {} pages", page_numbers.len());

        Ok(page_numbers
            .into_iter()
            .map(|n| {
                doc.extract_text(&[n]).unwrap_or_else(|e| {
                    warn!("Page {}: no extractable text ({})", n, e);
                    String::new()
                })
            })
            .collect())
    }
}

/// One paragraph per page with text, and a page break before every page but the first.
///
/// A page whose text is blank adds no paragraph, but its page break is
/// still emitted so page boundaries survive.
pub fn plain_blocks(pages: &[String], font_size_pt: f32) -> Vec<WordBlock> {
    let mut blocks = Vec::with_capacity(pages.len() * 2);
    for (idx, text) in pages.iter().enumerate() {
        if idx > 0 {
            blocks.push(WordBlock::PageBreak);
        }
        let text = xml_text(text);
        if !text.trim().is_empty() {
            blocks.push(WordBlock::Paragraph { text, font_size_pt });
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_paragraph_per_page_with_breaks_between() {
        let blocks = plain_blocks(&pages(&["a", "b", "c"]), 11.0);
        assert_eq!(
            blocks,
            vec![
                WordBlock::Paragraph {
                    text: "a".into(),
                    font_size_pt: 11.0
                },
                WordBlock::PageBreak,
                WordBlock::Paragraph {
                    text: "b".into(),
                    font_size_pt: 11.0
                },
                WordBlock::PageBreak,
                WordBlock::Paragraph {
                    text: "c".into(),
                    font_size_pt: 11.0
                },
            ]
        );
    }

    #[test]
    fn blank_pages_keep_their_break_but_add_no_paragraph() {
        let blocks = plain_blocks(&pages(&["intro", "  \n ", "end"]), 11.0);
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks.iter().filter(|b| b.is_page_break()).count(), 2);
        assert!(blocks[1].is_page_break() && blocks[2].is_page_break());
    }

    #[test]
    fn blank_first_page_emits_nothing_before_second_break() {
        let blocks = plain_blocks(&pages(&["", "text"]), 11.0);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_page_break());
    }

    #[test]
    fn page_of_control_characters_counts_as_blank() {
        let blocks = plain_blocks(&pages(&["\u{0c}\u{0}", "text"]), 11.0);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_page_break());
    }

    #[test]
    fn empty_document_is_empty() {
        assert!(plain_blocks(&[], 11.0).is_empty());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = LopdfTextSource::default()
            .page_texts(Path::new("/definitely/not/here.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::PdfOpen { .. }));
    }
}
