//! Extracted image blobs.

use serde::{Deserialize, Serialize};

/// Ordered sequence of encoded image blobs.
///
/// Order is extraction order: pages last-to-first, then images in the order
/// the page references them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSet {
    blobs: Vec<Vec<u8>>,
    extension: &'static str,
}

impl ImageSet {
    /// Create an empty set whose blobs use the given file extension.
    pub fn new(extension: &'static str) -> Self {
        Self {
            blobs: Vec::new(),
            extension,
        }
    }

    /// Append an encoded blob.
    pub fn push(&mut self, blob: Vec<u8>) {
        self.blobs.push(blob);
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no image was extracted.
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Blob at position `index`.
    pub fn get(&self, index: usize) -> Option<&[u8]> {
        self.blobs.get(index).map(Vec::as_slice)
    }

    /// Iterate over blobs in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.blobs.iter().map(Vec::as_slice)
    }

    /// File extension matching the encoding ("jpg" or "png").
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Consume the set, returning the blobs.
    pub fn into_blobs(self) -> Vec<Vec<u8>> {
        self.blobs
    }
}

/// An [`ImageSet`] paired with the id of the property it belongs to.
///
/// Only the id and the derived file names are serialized; blobs are written
/// separately by the caller (see [`RentalImages::files`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalImages {
    /// Id of the owning property
    pub id: String,

    /// File names the blobs are stored under, in order
    pub files: Vec<String>,

    /// Encoded blobs
    #[serde(skip)]
    pub data: ImageSet,
}

impl RentalImages {
    /// Pair an image set with a property id.
    pub fn new(id: impl Into<String>, data: ImageSet) -> Self {
        let id = id.into();
        let files = (0..data.len())
            .map(|i| format!("{}_{}.{}", id, i, data.extension()))
            .collect();
        Self { id, files, data }
    }

    /// Iterate over `(file name, blob)` pairs.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(String::as_str).zip(self.data.iter())
    }
}
