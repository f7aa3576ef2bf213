//! # rentsheet
//!
//! Turns rental-listing presentation-sheet PDFs into typed property records.
//!
//! A sheet is read in two passes: embedded photos are collected from the
//! last page backwards (stopping at a trailing run of duplicated pages) and
//! every label/value table is merged into one [`RawTable`]. The
//! [`FieldNormalizer`] then parses that table into a [`RentalProperty`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use rentsheet::{process_file, ExtractOptions, FieldNormalizer};
//!
//! fn main() -> rentsheet::Result<()> {
//!     let listing = process_file("sheet.pdf", &ExtractOptions::default(), &FieldNormalizer::new())?;
//!
//!     if let Some(listing) = listing {
//!         for diagnostic in listing.report().iter() {
//!             eprintln!("{}: {}", diagnostic.field, diagnostic.error);
//!         }
//!         let property = listing.into_property("listing-1", None);
//!         println!("{}", rentsheet::render::to_json(&property, rentsheet::JsonFormat::Pretty)?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod render;

pub use error::{Error, Result};
pub use extract::{ContentExtractor, ExtractOptions, ImageOutput, TableDetectorConfig};
pub use model::{ImageSet, PropertyBuilder, RawTable, RentalImages, RentalProperty};
pub use normalize::{
    FieldDiagnostic, FieldError, FieldId, FieldNormalizer, FieldRule, LabelDictionary,
    NormalizationReport, Normalized,
};
pub use render::JsonFormat;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

/// Images and merged table of one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub images: ImageSet,
    pub table: RawTable,
}

/// A document that yielded a non-empty table, normalized.
#[derive(Debug, Clone)]
pub struct ProcessedListing {
    /// Extracted photos
    pub images: ImageSet,
    /// The table the record was parsed from
    pub table: RawTable,
    /// Parsed fields and diagnostics
    pub normalized: Normalized,
}

impl ProcessedListing {
    /// Fields that failed to parse.
    pub fn report(&self) -> &NormalizationReport {
        &self.normalized.report
    }

    /// Whether the record has the fields it needs (a price).
    pub fn is_valid(&self) -> bool {
        self.normalized.is_valid()
    }

    /// Builder with the id set and the images attached under it, for callers
    /// that still want to set the link or override the city.
    pub fn into_builder(self, id: impl Into<String>) -> PropertyBuilder {
        let id = id.into();
        self.normalized
            .builder
            .with_id(id.clone())
            .with_images(RentalImages::new(id, self.images))
    }

    /// Finish the record under the given id.
    pub fn into_property(self, id: impl Into<String>, link: Option<String>) -> RentalProperty {
        let builder = self.into_builder(id);
        match link {
            Some(link) => builder.with_link(link).build(),
            None => builder.build(),
        }
    }
}

/// Outcome for one input of [`process_files`].
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub result: Result<Option<ProcessedListing>>,
}

/// Extract images and tables from PDF bytes.
pub fn extract_bytes(data: &[u8], options: &ExtractOptions) -> Result<Extraction> {
    let extractor = ContentExtractor::from_bytes_with_options(data, options.clone())?;
    extract(&extractor)
}

/// Extract images and tables from a PDF file.
pub fn extract_file<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<Extraction> {
    let extractor = ContentExtractor::open_with_options(path, options.clone())?;
    extract(&extractor)
}

fn extract(extractor: &ContentExtractor) -> Result<Extraction> {
    let images = extractor.extract_images()?;
    let table = extractor.extract_tables();
    Ok(Extraction { images, table })
}

/// Extract and normalize one document held in memory.
///
/// Returns `Ok(None)` when the document has no table to normalize. Open and
/// image decode failures are errors; field parse failures are not (see
/// [`ProcessedListing::report`]).
pub fn process_bytes(
    data: &[u8],
    options: &ExtractOptions,
    normalizer: &FieldNormalizer,
) -> Result<Option<ProcessedListing>> {
    Ok(finish(extract_bytes(data, options)?, normalizer))
}

/// Extract and normalize one document on disk.
pub fn process_file<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
    normalizer: &FieldNormalizer,
) -> Result<Option<ProcessedListing>> {
    Ok(finish(extract_file(path, options)?, normalizer))
}

fn finish(extraction: Extraction, normalizer: &FieldNormalizer) -> Option<ProcessedListing> {
    let Extraction { images, table } = extraction;
    if table.is_empty() {
        return None;
    }
    let normalized = normalizer.normalize(&table);
    Some(ProcessedListing {
        images,
        table,
        normalized,
    })
}

/// Process many documents independently.
///
/// One item per input, in input order. Documents run in parallel unless
/// `options.parallel` is off; a failing document never affects the others.
pub fn process_files<P: AsRef<Path> + Sync>(
    paths: &[P],
    options: &ExtractOptions,
    normalizer: &FieldNormalizer,
) -> Vec<BatchItem> {
    let run = |path: &P| process_item(path.as_ref(), options, normalizer);

    if options.parallel {
        paths.par_iter().map(run).collect()
    } else {
        paths.iter().map(run).collect()
    }
}

/// Process many documents, handing each result to `sink` as soon as it is
/// ready instead of collecting them.
///
/// `sink` gets the input index with every item. With `options.parallel` set,
/// calls arrive from worker threads in completion order; otherwise they
/// arrive in input order on the calling thread.
pub fn for_each_file<P, F>(
    paths: &[P],
    options: &ExtractOptions,
    normalizer: &FieldNormalizer,
    sink: F,
) where
    P: AsRef<Path> + Sync,
    F: Fn(usize, BatchItem) + Sync,
{
    let run = |(index, path): (usize, &P)| {
        sink(index, process_item(path.as_ref(), options, normalizer));
    };

    if options.parallel {
        paths.par_iter().enumerate().for_each(run);
    } else {
        paths.iter().enumerate().for_each(run);
    }
}

fn process_item(path: &Path, options: &ExtractOptions, normalizer: &FieldNormalizer) -> BatchItem {
    let result = process_file(path, options, normalizer);
    if let Err(e) = &result {
        log::warn!("{}: {}", path.display(), e);
    }
    BatchItem {
        path: path.to_path_buf(),
        result,
    }
}

/// Builder bundling extraction options and a normalizer.
///
/// # Example
///
/// ```no_run
/// use rentsheet::Rentsheet;
///
/// let listing = Rentsheet::new()
///     .png()
///     .sequential()
///     .process_file("sheet.pdf")?;
/// # Ok::<(), rentsheet::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Rentsheet {
    options: ExtractOptions,
    normalizer: FieldNormalizer,
}

impl Rentsheet {
    /// Create a builder with default options and the Finnish labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode images as JPEG with the given quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.options = self.options.with_jpeg_quality(quality);
        self
    }

    /// Encode images as PNG.
    pub fn png(mut self) -> Self {
        self.options = self.options.png();
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set table detection thresholds.
    pub fn with_table_config(mut self, config: TableDetectorConfig) -> Self {
        self.options = self.options.with_table_config(config);
        self
    }

    /// Use a custom label dictionary.
    pub fn with_dictionary(mut self, dictionary: LabelDictionary) -> Self {
        self.normalizer = FieldNormalizer::with_dictionary(dictionary);
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn normalizer(&self) -> &FieldNormalizer {
        &self.normalizer
    }

    /// Extract without normalizing.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Extraction> {
        extract_file(path, &self.options)
    }

    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<Option<ProcessedListing>> {
        process_file(path, &self.options, &self.normalizer)
    }

    pub fn process_bytes(&self, data: &[u8]) -> Result<Option<ProcessedListing>> {
        process_bytes(data, &self.options, &self.normalizer)
    }

    pub fn process_files<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<BatchItem> {
        process_files(paths, &self.options, &self.normalizer)
    }

    pub fn for_each_file<P, F>(&self, paths: &[P], sink: F)
    where
        P: AsRef<Path> + Sync,
        F: Fn(usize, BatchItem) + Sync,
    {
        for_each_file(paths, &self.options, &self.normalizer, sink)
    }
}
