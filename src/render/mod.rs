//! Output rendering for tables, records and reports.

mod json;

pub use json::{to_json, JsonFormat};
