//! Versioned label dictionary: canonical fields to source-site labels.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical field identifiers the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Location,
    District,
    Floor,
    Floors,
    Size,
    Configuration,
    Rooms,
    Price,
    Deposit,
    Year,
    BuildingType,
    Condition,
    Heating,
    LandOwnership,
    Balcony,
    Sauna,
    Elevator,
    PublicSauna,
}

impl FieldId {
    /// Every field, in the order the normalizer runs them.
    pub const ALL: [FieldId; 18] = [
        FieldId::Location,
        FieldId::District,
        FieldId::Floor,
        FieldId::Floors,
        FieldId::Size,
        FieldId::Configuration,
        FieldId::Rooms,
        FieldId::Price,
        FieldId::Deposit,
        FieldId::Year,
        FieldId::BuildingType,
        FieldId::Condition,
        FieldId::Heating,
        FieldId::LandOwnership,
        FieldId::Balcony,
        FieldId::Sauna,
        FieldId::Elevator,
        FieldId::PublicSauna,
    ];

    /// Name used in JSON and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldId::Location => "location",
            FieldId::District => "district",
            FieldId::Floor => "floor",
            FieldId::Floors => "floors",
            FieldId::Size => "size",
            FieldId::Configuration => "configuration",
            FieldId::Rooms => "rooms",
            FieldId::Price => "price",
            FieldId::Deposit => "deposit",
            FieldId::Year => "year",
            FieldId::BuildingType => "building_type",
            FieldId::Condition => "condition",
            FieldId::Heating => "heating",
            FieldId::LandOwnership => "land_ownership",
            FieldId::Balcony => "balcony",
            FieldId::Sauna => "sauna",
            FieldId::Elevator => "elevator",
            FieldId::PublicSauna => "public_sauna",
        }
    }

    /// The parsing rule applied to this field's value.
    pub fn rule(self) -> FieldRule {
        match self {
            FieldId::Location => FieldRule::Location,
            FieldId::Floor => FieldRule::FloorOfFloors,
            FieldId::Floors => FieldRule::FloorCount,
            FieldId::Rooms | FieldId::Year => FieldRule::Integer,
            FieldId::Size => FieldRule::Area,
            FieldId::Configuration => FieldRule::Configuration,
            FieldId::Price => FieldRule::Price,
            FieldId::Deposit => FieldRule::Digits,
            FieldId::District
            | FieldId::BuildingType
            | FieldId::Condition
            | FieldId::Heating
            | FieldId::LandOwnership => FieldRule::Text,
            FieldId::Balcony | FieldId::Sauna | FieldId::Elevator => FieldRule::Affirmative,
            FieldId::PublicSauna => FieldRule::Presence,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field's raw value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    /// "street, postcode city"
    Location,
    /// "X / Y", or a bare "X" with the floor count under its own label
    FloorOfFloors,
    /// Integer, read only when the floor value was bare
    FloorCount,
    /// Whole value parsed as an integer
    Integer,
    /// Leading number with comma or period decimals, truncated
    Area,
    /// Room tokens split on "," or "+"
    Configuration,
    /// Digits before the first comma; required
    Price,
    /// Every digit in the value, separators and currency dropped
    Digits,
    /// Stored as written
    Text,
    /// True only for the affirmative token
    Affirmative,
    /// True for any non-empty value
    Presence,
}

impl FieldRule {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldRule::Location => "location",
            FieldRule::FloorOfFloors => "floor_of_floors",
            FieldRule::FloorCount => "floor_count",
            FieldRule::Integer => "integer",
            FieldRule::Area => "area",
            FieldRule::Configuration => "configuration",
            FieldRule::Price => "price",
            FieldRule::Digits => "digits",
            FieldRule::Text => "text",
            FieldRule::Affirmative => "affirmative",
            FieldRule::Presence => "presence",
        }
    }
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps each [`FieldId`] to the literal label the source site prints.
///
/// Labels are compared against [`RawTable`](crate::RawTable) keys, which are
/// lower-cased, so labels must be lower-case too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDictionary {
    /// Bumped whenever a label changes meaning
    pub version: u32,
    /// Locale tag of the source site, e.g. "fi"
    pub locale: String,
    /// Value that means "yes" for affirmative fields
    pub affirmative: String,
    /// Source label per field
    pub labels: BTreeMap<FieldId, String>,
}

impl LabelDictionary {
    /// The built-in dictionary for Finnish rental presentation sheets.
    pub fn finnish() -> Self {
        let labels = [
            (FieldId::Location, "sijainti"),
            (FieldId::District, "kaupunginosa"),
            (FieldId::Floor, "kerros"),
            (FieldId::Floors, "kerroksia"),
            (FieldId::Size, "asuinpinta-ala"),
            (FieldId::Configuration, "huoneiston kokoonpano"),
            (FieldId::Rooms, "huoneita"),
            (FieldId::Price, "vuokra/kk"),
            (FieldId::Deposit, "vakuus"),
            (FieldId::Year, "rakennusvuosi"),
            (FieldId::BuildingType, "rakennuksen tyyppi"),
            (FieldId::Condition, "kunto"),
            (FieldId::Heating, "lämmitys"),
            (FieldId::LandOwnership, "tontin omistus"),
            (FieldId::Balcony, "parveke"),
            (FieldId::Sauna, "asunnossa sauna"),
            (FieldId::Elevator, "hissi"),
            (FieldId::PublicSauna, "taloyhtiössä on sauna"),
        ]
        .into_iter()
        .map(|(field, label)| (field, label.to_string()))
        .collect();

        Self {
            version: 1,
            locale: "fi".to_string(),
            affirmative: "kyllä".to_string(),
            labels,
        }
    }

    /// Parse and validate a dictionary from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let dict: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        dict.validate()?;
        Ok(dict)
    }

    /// Load and validate a dictionary from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Render(e.to_string()))
    }

    /// Source label for a field, if the dictionary maps it.
    pub fn label(&self, field: FieldId) -> Option<&str> {
        self.labels.get(&field).map(String::as_str)
    }

    /// Reject empty, non-lower-case or duplicate labels and an empty or
    /// non-lower-case affirmative token.
    pub fn validate(&self) -> Result<()> {
        if self.affirmative.trim().is_empty() {
            return Err(Error::Config("affirmative token is empty".to_string()));
        }
        if self.affirmative.to_lowercase() != self.affirmative {
            return Err(Error::Config(format!(
                "affirmative token is not lower-case: {:?}",
                self.affirmative
            )));
        }

        let mut seen = HashSet::new();
        for (field, label) in &self.labels {
            if label.trim().is_empty() {
                return Err(Error::Config(format!("label for '{}' is empty", field)));
            }
            if label.to_lowercase() != *label {
                return Err(Error::Config(format!(
                    "label for '{}' is not lower-case: {:?}",
                    field, label
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(Error::Config(format!(
                    "label {:?} is used by more than one field",
                    label
                )));
            }
        }
        Ok(())
    }
}

impl Default for LabelDictionary {
    fn default() -> Self {
        Self::finnish()
    }
}
