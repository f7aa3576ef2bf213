//! JSON rendering.

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a table, record or list of records to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PropertyBuilder, RawTable};

    #[test]
    fn test_to_json_pretty() {
        let table: RawTable = [("kerros", "6 / 6")].into_iter().collect();

        let json = to_json(&table, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"kerros\": \"6 / 6\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let records = vec![PropertyBuilder::new().with_id("a").build()];

        let json = to_json(&records, JsonFormat::Compact).unwrap();
        assert!(json.starts_with("[{\"id\":\"a\""));
        assert!(!json.contains('\n'));
    }
}
