//! Merging label/value tables across a document's pages.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::backend::PdfBackend;
use super::spans::page_spans;
use super::table_detector::{TableDetector, TableDetectorConfig};
use crate::model::RawTable;

/// Normalizes cell text into the form stored in a [`RawTable`].
pub struct CellCleaner {
    whitespace: Regex,
    ligature_map: Vec<(&'static str, &'static str)>,
}

impl CellCleaner {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").unwrap(),
            ligature_map: vec![
                ("\u{FB00}", "ff"),
                ("\u{FB01}", "fi"),
                ("\u{FB02}", "fl"),
                ("\u{FB03}", "ffi"),
                ("\u{FB04}", "ffl"),
            ],
        }
    }

    /// NFC, ligatures expanded, NBSP as space, whitespace collapsed,
    /// trimmed, lower-cased.
    pub fn clean(&self, text: &str) -> String {
        let mut result: String = text.nfc().collect();
        for (ligature, replacement) in &self.ligature_map {
            if result.contains(ligature) {
                result = result.replace(ligature, replacement);
            }
        }
        let result = result.replace('\u{00A0}', " ");
        self.whitespace
            .replace_all(result.trim(), " ")
            .to_lowercase()
    }
}

impl Default for CellCleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge every label/value row found on every page, first page to last.
///
/// A later page's value replaces an earlier one for the same label. Pages
/// whose content cannot be read contribute nothing.
pub fn extract_table<B: PdfBackend + ?Sized>(backend: &B, config: &TableDetectorConfig) -> RawTable {
    let detector = TableDetector::with_config(config.clone());
    let cleaner = CellCleaner::new();
    let mut table = RawTable::new();

    for (page_num, page_id) in backend.pages() {
        let spans = match page_spans(backend, page_id) {
            Ok(spans) => spans,
            Err(e) => {
                log::warn!("Page {}: skipping unreadable content: {}", page_num, e);
                continue;
            }
        };

        for detected in detector.detect(&spans) {
            for (key, value) in detected.key_values() {
                let key = cleaner.clean(&key);
                let value = cleaner.clean(&value);
                if key.is_empty() || value.is_empty() {
                    continue;
                }
                if let Some(previous) = table.insert(key.clone(), value) {
                    log::debug!("Page {}: '{}' overrides '{}'", page_num, key, previous);
                }
            }
        }
    }

    log::debug!("Extracted {} table entries", table.len());
    table
}
