//! Extraction options and configuration.

use super::table_detector::TableDetectorConfig;

/// Encoding used for extracted images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutput {
    /// Lossy JPEG with the given quality (1-100)
    Jpeg { quality: u8 },
    /// Lossless PNG
    Png,
}

impl ImageOutput {
    /// File extension for blobs in this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageOutput::Jpeg { .. } => "jpg",
            ImageOutput::Png => "png",
        }
    }
}

impl Default for ImageOutput {
    fn default() -> Self {
        ImageOutput::Jpeg { quality: 90 }
    }
}

/// Options for extracting content from presentation-sheet PDFs.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// How extracted images are re-encoded
    pub image_output: ImageOutput,

    /// Table detection thresholds
    pub table: TableDetectorConfig,

    /// Whether batch processing runs documents in parallel
    pub parallel: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode images as JPEG with the given quality (clamped to 1-100).
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.image_output = ImageOutput::Jpeg {
            quality: quality.clamp(1, 100),
        };
        self
    }

    /// Encode images as PNG.
    pub fn png(mut self) -> Self {
        self.image_output = ImageOutput::Png;
        self
    }

    /// Set table detection configuration.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.table = config;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            image_output: ImageOutput::default(),
            table: TableDetectorConfig::default(),
            parallel: true,
        }
    }
}
