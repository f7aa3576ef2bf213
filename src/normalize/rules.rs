//! Field parsing rules. Each takes the raw table value and either yields the
//! typed value or a [`FieldError`].

use std::sync::OnceLock;

use regex::Regex;

use super::report::FieldError;

/// A split "street, postcode city" value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub address: Option<String>,
    pub postcode: String,
    pub city: String,
}

/// A floor value, with the building's floor count when it was given inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Floor {
    /// "6": the floor count lives under its own label
    Bare(u32),
    /// "6 / 8"
    OfFloors { floor: u32, floors: u32 },
}

fn floor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)/(\d+)$").unwrap())
}

/// Everything before the last comma is the street; the last segment is
/// `<postcode> <city> ...`.
pub fn location(value: &str) -> Result<Location, FieldError> {
    let (street, tail) = match value.rsplit_once(',') {
        Some((street, tail)) => (street.split(',').collect::<String>(), tail),
        None => (String::new(), value),
    };

    let mut tokens = tail.split_whitespace();
    let (Some(postcode), Some(city)) = (tokens.next(), tokens.next()) else {
        return Err(FieldError::MissingPostcodeCity);
    };

    let street = street.trim();
    Ok(Location {
        address: (!street.is_empty()).then(|| street.to_string()),
        postcode: postcode.to_string(),
        city: city.to_string(),
    })
}

/// "6" or "6 / 8" (spaces ignored).
pub fn floor(value: &str) -> Result<Floor, FieldError> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Floor::Bare(to_u32(value)?));
    }

    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let caps = floor_pattern()
        .captures(&compact)
        .ok_or(FieldError::FloorFormat)?;
    Ok(Floor::OfFloors {
        floor: to_u32(&caps[1])?,
        floors: to_u32(&caps[2])?,
    })
}

/// Whole value as an integer.
pub fn integer(value: &str) -> Result<u32, FieldError> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::NotInteger(value.to_string()));
    }
    to_u32(value)
}

/// "54,5 m²" → 54. The first whitespace-separated token is the number.
pub fn area(value: &str) -> Result<u32, FieldError> {
    let token = value.split_whitespace().next().unwrap_or_default();
    let number: f64 = token
        .replace(',', ".")
        .parse()
        .map_err(|_| FieldError::NotNumber(value.to_string()))?;
    if !number.is_finite() || number < 0.0 || number >= u32::MAX as f64 {
        return Err(FieldError::OutOfRange(value.to_string()));
    }
    Ok(number.trunc() as u32)
}

/// "2h + kk + s" → ["2h", "kk", "s"]; comma-separated values split on
/// commas instead.
pub fn configuration(value: &str) -> Option<Vec<String>> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let separator = if compact.contains(',') { ',' } else { '+' };
    let tokens: Vec<String> = compact
        .split(separator)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    (!tokens.is_empty()).then_some(tokens)
}

/// Decimal digits before the first comma: "1 200,00 €" → 1200.
pub fn digits_before_comma(value: &str) -> Result<u32, FieldError> {
    let head = value.split(',').next().unwrap_or_default();
    let digits: String = head.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(FieldError::NoDigits);
    }
    to_u32(&digits)
}

/// Every decimal digit in the value: "1 200 €" → 1200. A decimal comma is
/// not a separator here, so "2 400,00" reads as 240000.
pub fn digits(value: &str) -> Result<u32, FieldError> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(FieldError::NoDigits);
    }
    to_u32(&digits)
}

/// Stored trimmed; blank is unset.
pub fn text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// True only for an exact match of the affirmative token.
pub fn affirmative(value: Option<&str>, token: &str) -> bool {
    value.is_some_and(|v| v.trim() == token)
}

/// True for any non-empty value.
pub fn presence(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn to_u32(digits: &str) -> Result<u32, FieldError> {
    digits
        .parse()
        .map_err(|_| FieldError::OutOfRange(digits.to_string()))
}
