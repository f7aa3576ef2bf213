//! Data types produced by extraction and normalization.
//!
//! [`RawTable`] and [`ImageSet`] are what the extractor hands out;
//! [`RentalProperty`] is the typed record the normalizer builds from them.

mod images;
mod property;
mod raw_table;

pub use images::{ImageSet, RentalImages};
pub use property::{PropertyBuilder, RentalProperty};
pub use raw_table::RawTable;
