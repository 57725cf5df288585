//! Configuration types for PDF-to-office conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The three routines read only the
//! fields that concern them; the rest are ignored.

use crate::error::ConvertError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// JVM heap sizes as accepted by `-Xmx` / `-Xms`, e.g. `512m`, `2g`, `1048576`.
static HEAP_SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9][0-9]*[kKmMgG]?$").unwrap());

/// Configuration for a PDF-to-office conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2office::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .java_max_heap("1g")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Rendering DPI for slide images. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// A safety cap independent of DPI so a poster-sized page cannot exhaust
    /// memory during rasterisation.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Font size of paragraphs written by the plain-text Word fallback. Default: 11.
    pub body_font_size_pt: f32,

    /// Vertical gap, as a fraction of line height, that starts a new paragraph
    /// during layout reconstruction. Default: 0.8.
    pub paragraph_gap_ratio: f32,

    /// Java executable used to run tabula. Default: `java`.
    pub java_binary: PathBuf,

    /// Path to the tabula-java jar. Falls back to the `TABULA_JAR` env var.
    pub tabula_jar: Option<PathBuf>,

    /// JVM maximum heap for table extraction (`-Xmx`). Default: `512m`.
    pub java_max_heap: String,

    /// JVM initial heap for table extraction (`-Xms`). Default: `128m`.
    pub java_initial_heap: String,

    /// Directory for per-slide temporary images. Default: system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 4000,
            password: None,
            body_font_size_pt: 11.0,
            paragraph_gap_ratio: 0.8,
            java_binary: PathBuf::from("java"),
            tabula_jar: None,
            java_max_heap: "512m".to_string(),
            java_initial_heap: "128m".to_string(),
            temp_dir: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("body_font_size_pt", &self.body_font_size_pt)
            .field("paragraph_gap_ratio", &self.paragraph_gap_ratio)
            .field("java_binary", &self.java_binary)
            .field("tabula_jar", &self.tabula_jar)
            .field("java_max_heap", &self.java_max_heap)
            .field("java_initial_heap", &self.java_initial_heap)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn body_font_size_pt(mut self, pt: f32) -> Self {
        self.config.body_font_size_pt = pt.clamp(6.0, 72.0);
        self
    }

    pub fn paragraph_gap_ratio(mut self, ratio: f32) -> Self {
        self.config.paragraph_gap_ratio = ratio;
        self
    }

    pub fn java_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.java_binary = path.into();
        self
    }

    pub fn tabula_jar(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tabula_jar = Some(path.into());
        self
    }

    pub fn java_max_heap(mut self, size: impl Into<String>) -> Self {
        self.config.java_max_heap = size.into();
        self
    }

    pub fn java_initial_heap(mut self, size: impl Into<String>) -> Self {
        self.config.java_initial_heap = size.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if !(c.paragraph_gap_ratio.is_finite() && c.paragraph_gap_ratio > 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "Paragraph gap ratio must be > 0, got {}",
                c.paragraph_gap_ratio
            )));
        }
        for (flag, size) in [("-Xmx", &c.java_max_heap), ("-Xms", &c.java_initial_heap)] {
            if !HEAP_SIZE_RE.is_match(size) {
                return Err(ConvertError::InvalidConfig(format!(
                    "Invalid JVM heap size for {flag}: '{size}' (expected e.g. 512m, 2g)"
                )));
            }
        }
        if heap_bytes(&c.java_initial_heap)? > heap_bytes(&c.java_max_heap)? {
            return Err(ConvertError::InvalidConfig(format!(
                "Initial heap {} exceeds maximum heap {}",
                c.java_initial_heap, c.java_max_heap
            )));
        }
        Ok(self.config)
    }
}

/// Byte count of a validated JVM heap size string.
///
/// Sizes that do not fit in a `u64` are rejected rather than compared.
fn heap_bytes(size: &str) -> Result<u64, ConvertError> {
    let (digits, unit) = match size.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => (&size[..size.len() - 1], c.to_ascii_lowercase()),
        _ => (size, 'b'),
    };
    let scale: u64 = match unit {
        'k' => 1 << 10,
        'm' => 1 << 20,
        'g' => 1 << 30,
        _ => 1,
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(scale))
        .ok_or_else(|| ConvertError::InvalidConfig(format!("JVM heap size '{size}' is too large")))
}
