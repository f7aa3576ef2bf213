//! Normalization of a [`RawTable`] into a typed property.
//!
//! Every field is parsed independently by the rule its [`FieldId`] names. A
//! field whose value does not parse is left unset and reported in the
//! [`NormalizationReport`]; the other fields are unaffected. Normalization
//! itself never fails.

mod labels;
mod report;
pub mod rules;

pub use labels::{FieldId, FieldRule, LabelDictionary};
pub use report::{FieldDiagnostic, FieldError, NormalizationReport};

use crate::model::{PropertyBuilder, RawTable};
use rules::Floor;

/// Result of normalizing one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Fields parsed from the table; identity and images still to be added
    pub builder: PropertyBuilder,
    /// Fields that could not be parsed
    pub report: NormalizationReport,
}

impl Normalized {
    /// A record without a price is not usable.
    pub fn is_valid(&self) -> bool {
        self.builder.price().is_some()
    }
}

/// Turns raw label/value tables into typed properties.
#[derive(Debug, Clone, Default)]
pub struct FieldNormalizer {
    dictionary: LabelDictionary,
}

impl FieldNormalizer {
    /// Normalizer using the built-in Finnish labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer using a custom label dictionary.
    pub fn with_dictionary(dictionary: LabelDictionary) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &LabelDictionary {
        &self.dictionary
    }

    /// Parse every known field out of `table`, each by its [`FieldRule`].
    pub fn normalize(&self, table: &RawTable) -> Normalized {
        let mut run = Run {
            dictionary: &self.dictionary,
            table,
            report: NormalizationReport::default(),
        };
        let mut b = PropertyBuilder::new();
        let yes = self.dictionary.affirmative.as_str();
        // Set when "kerros" held only the floor; the count then has its own label.
        let mut bare_floor = false;

        for field in FieldId::ALL {
            match field.rule() {
                FieldRule::Location => {
                    if let Some(loc) = run.parse(field, rules::location) {
                        b.address = loc.address;
                        b.postcode = Some(loc.postcode);
                        b.city = Some(loc.city);
                    }
                }
                FieldRule::FloorOfFloors => match run.parse(field, rules::floor) {
                    Some(Floor::OfFloors { floor, floors }) => {
                        b.floor = Some(floor);
                        b.floors = Some(floors);
                    }
                    Some(Floor::Bare(floor)) => {
                        b.floor = Some(floor);
                        bare_floor = true;
                    }
                    None => {}
                },
                FieldRule::FloorCount => {
                    if bare_floor {
                        b.floors = run.parse(field, rules::integer);
                    }
                }
                FieldRule::Integer => set_number(&mut b, field, run.parse(field, rules::integer)),
                FieldRule::Area => set_number(&mut b, field, run.parse(field, rules::area)),
                FieldRule::Configuration => {
                    b.configuration = run.value(field).and_then(rules::configuration);
                }
                FieldRule::Price => {
                    if run.value(field).is_none() {
                        run.missing(field);
                    }
                    set_number(&mut b, field, run.parse(field, rules::digits_before_comma));
                }
                FieldRule::Digits => set_number(&mut b, field, run.parse(field, rules::digits)),
                FieldRule::Text => set_text(&mut b, field, run.text(field)),
                FieldRule::Affirmative => {
                    set_flag(&mut b, field, rules::affirmative(run.value(field), yes));
                }
                FieldRule::Presence => set_flag(&mut b, field, rules::presence(run.value(field))),
            }
        }

        Normalized {
            builder: b,
            report: run.report,
        }
    }
}

fn set_number(b: &mut PropertyBuilder, field: FieldId, value: Option<u32>) {
    let slot = match field {
        FieldId::Floor => &mut b.floor,
        FieldId::Floors => &mut b.floors,
        FieldId::Size => &mut b.size,
        FieldId::Rooms => &mut b.rooms,
        FieldId::Price => &mut b.price,
        FieldId::Deposit => &mut b.deposit,
        FieldId::Year => &mut b.year,
        _ => {
            log::debug!("Field '{}' has no numeric slot", field);
            return;
        }
    };
    *slot = value;
}

fn set_text(b: &mut PropertyBuilder, field: FieldId, value: Option<String>) {
    let slot = match field {
        FieldId::District => &mut b.district,
        FieldId::BuildingType => &mut b.building_type,
        FieldId::Condition => &mut b.condition,
        FieldId::Heating => &mut b.heating,
        FieldId::LandOwnership => &mut b.land_ownership,
        _ => {
            log::debug!("Field '{}' has no text slot", field);
            return;
        }
    };
    *slot = value;
}

fn set_flag(b: &mut PropertyBuilder, field: FieldId, value: bool) {
    let slot = match field {
        FieldId::Balcony => &mut b.balcony,
        FieldId::Sauna => &mut b.sauna,
        FieldId::Elevator => &mut b.elevator,
        FieldId::PublicSauna => &mut b.public_sauna,
        _ => {
            log::debug!("Field '{}' has no flag slot", field);
            return;
        }
    };
    *slot = value;
}

/// State for one normalization pass.
struct Run<'a> {
    dictionary: &'a LabelDictionary,
    table: &'a RawTable,
    report: NormalizationReport,
}

impl<'a> Run<'a> {
    fn value(&self, field: FieldId) -> Option<&'a str> {
        let table: &'a RawTable = self.table;
        self.dictionary
            .label(field)
            .and_then(|label| table.get(label))
    }

    fn text(&self, field: FieldId) -> Option<String> {
        self.value(field).and_then(rules::text)
    }

    /// Apply `rule` to the field's value; a failure is recorded and yields
    /// `None`. A missing label yields `None` silently.
    fn parse<T>(
        &mut self,
        field: FieldId,
        rule: impl FnOnce(&str) -> Result<T, FieldError>,
    ) -> Option<T> {
        let value = self.value(field)?;
        match rule(value) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                self.fail(field, Some(value), error);
                None
            }
        }
    }

    fn missing(&mut self, field: FieldId) {
        self.fail(field, None, FieldError::Missing);
    }

    fn fail(&mut self, field: FieldId, value: Option<&str>, error: FieldError) {
        let label = self.dictionary.label(field).unwrap_or_default().to_string();
        log::warn!(
            "Field '{}' ({:?} = {:?}): {}",
            field,
            label,
            value.unwrap_or_default(),
            error
        );
        self.report.push(FieldDiagnostic {
            field,
            label,
            value: value.map(str::to_string),
            error,
        });
    }
}
