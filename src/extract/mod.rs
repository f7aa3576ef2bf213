//! Image and table extraction from presentation-sheet PDFs.

mod backend;
mod images;
mod options;
mod spans;
mod table_detector;
mod tables;

use std::io::Read;
use std::path::Path;

pub use backend::{
    check_header, decode_text_simple, ColorSpace, ContentOp, ImageRef, LopdfBackend, PageId,
    PdfBackend, PdfValue, RawImage,
};
pub use images::{decode_raw, encode, extract_images};
pub use options::{ExtractOptions, ImageOutput};
pub use spans::{page_spans, TextSpan};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};
pub use tables::{extract_table, CellCleaner};

use crate::error::{Error, Result};
use crate::model::{ImageSet, RawTable};

/// Owns one open document for the duration of an extraction.
///
/// The document is released when the extractor is dropped, whichever
/// extraction calls were made and whether they succeeded.
pub struct ContentExtractor {
    backend: LopdfBackend,
    options: ExtractOptions,
}

impl ContentExtractor {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ExtractOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Opening {}", path.display());
        let backend = LopdfBackend::load_file(path)?;
        Ok(Self { backend, options })
    }

    /// Open a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ExtractOptions::default())
    }

    /// Open a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ExtractOptions) -> Result<Self> {
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self { backend, options })
    }

    /// Open a PDF from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ExtractOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// PDF version from the header, e.g. "1.5".
    pub fn version(&self) -> String {
        self.backend.version()
    }

    /// Options this extractor was opened with.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract embedded images, dropping a trailing run of duplicate pages.
    pub fn extract_images(&self) -> Result<ImageSet> {
        images::extract_images(&self.backend, &self.options.image_output)
    }

    /// Merge every label/value table in the document.
    ///
    /// An empty table is not an error; it means the document has nothing to
    /// normalize.
    pub fn extract_tables(&self) -> RawTable {
        tables::extract_table(&self.backend, &self.options.table)
    }

    /// Label/value pairs from a single page (1-based).
    pub fn page_table(&self, page_num: u32) -> Result<RawTable> {
        let pages = self.backend.pages();
        let page_id = *pages
            .get(&page_num)
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))?;

        let spans = page_spans(&self.backend, page_id)?;
        let cleaner = CellCleaner::new();
        let detector = TableDetector::with_config(self.options.table.clone());

        Ok(detector
            .detect(&spans)
            .iter()
            .flat_map(DetectedTable::key_values)
            .map(|(k, v)| (cleaner.clean(&k), cleaner.clean(&v)))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect())
    }

    /// Release the document now.
    pub fn close(self) {}
}

impl Drop for ContentExtractor {
    fn drop(&mut self) {
        log::trace!("Releasing document ({} pages)", self.page_count());
    }
}
