//! Per-field parse failures collected during normalization.

use serde::Serialize;
use thiserror::Error;

use super::labels::FieldId;

/// Why one field's value could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FieldError {
    /// A required label is absent from the table.
    #[error("required label is missing")]
    Missing,

    /// The value has no decimal digits to parse.
    #[error("no digits in value")]
    NoDigits,

    /// The value is not a whole number.
    #[error("not an integer: {0}")]
    NotInteger(String),

    /// The value does not start with a number.
    #[error("not a number: {0}")]
    NotNumber(String),

    /// The digits do not fit the field.
    #[error("number out of range: {0}")]
    OutOfRange(String),

    /// The part after the last comma is not "<postcode> <city>".
    #[error("expected '<postcode> <city>' after the last comma")]
    MissingPostcodeCity,

    /// The floor is neither "X" nor "X / Y".
    #[error("expected '<floor>' or '<floor> / <floors>'")]
    FloorFormat,
}

/// One field that could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiagnostic {
    /// Field that was left unset
    pub field: FieldId,
    /// Source label it was read from
    pub label: String,
    /// Raw value, if the label was present
    pub value: Option<String>,
    /// What went wrong
    pub error: FieldError,
}

/// All diagnostics for one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub diagnostics: Vec<FieldDiagnostic>,
}

impl NormalizationReport {
    /// Record a failed field.
    pub fn push(&mut self, diagnostic: FieldDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether every present label parsed.
    pub fn is_complete(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Whether the given field failed.
    pub fn has_error(&self, field: FieldId) -> bool {
        self.diagnostics.iter().any(|d| d.field == field)
    }

    /// Number of failed fields.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDiagnostic> {
        self.diagnostics.iter()
    }
}
