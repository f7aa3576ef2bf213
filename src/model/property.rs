//! The normalized rental property record.

use serde::{Deserialize, Serialize};

use super::RentalImages;

/// A normalized rental listing.
///
/// Every numeric field is either a parsed integer or `None`; composite source
/// values such as "6 / 6" are decomposed before they get here. Built through
/// [`PropertyBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalProperty {
    /// Opaque unique id assigned by the caller
    pub id: String,
    /// Source listing URL
    pub link: Option<String>,

    /// Street address
    pub address: Option<String>,
    /// Postal code
    pub postcode: Option<String>,
    /// City
    pub city: Option<String>,
    /// District within the city
    pub district: Option<String>,

    /// Building type, e.g. "kerrostalo"
    pub building_type: Option<String>,
    /// Floor the apartment is on
    pub floor: Option<u32>,
    /// Number of floors in the building
    pub floors: Option<u32>,
    /// Living area in whole square meters
    pub size: Option<u32>,
    /// Room-type tokens, e.g. ["2h", "kk", "s"]
    pub configuration: Option<Vec<String>>,
    /// Number of rooms
    pub rooms: Option<u32>,
    /// Construction year
    pub year: Option<u32>,
    /// Condition as written in the listing
    pub condition: Option<String>,

    pub balcony: bool,
    pub sauna: bool,
    pub public_sauna: bool,
    pub elevator: bool,
    /// Never populated from the listing table
    pub pets: Option<bool>,

    /// Monthly rent
    pub price: Option<u32>,
    /// Security deposit
    pub deposit: Option<u32>,

    pub heating: Option<String>,
    pub land_ownership: Option<String>,

    /// Photos belonging to this property
    pub images: Option<RentalImages>,
}

/// Incrementally populated property, starting from all-unset defaults.
///
/// The normalizer fills the data fields; the caller adds identity and
/// images, then calls [`PropertyBuilder::build`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBuilder {
    pub(crate) id: String,
    pub(crate) link: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) postcode: Option<String>,
    pub(crate) city: Option<String>,
    pub(crate) district: Option<String>,
    pub(crate) building_type: Option<String>,
    pub(crate) floor: Option<u32>,
    pub(crate) floors: Option<u32>,
    pub(crate) size: Option<u32>,
    pub(crate) configuration: Option<Vec<String>>,
    pub(crate) rooms: Option<u32>,
    pub(crate) year: Option<u32>,
    pub(crate) condition: Option<String>,
    pub(crate) balcony: bool,
    pub(crate) sauna: bool,
    pub(crate) public_sauna: bool,
    pub(crate) elevator: bool,
    pub(crate) price: Option<u32>,
    pub(crate) deposit: Option<u32>,
    pub(crate) heating: Option<String>,
    pub(crate) land_ownership: Option<String>,
    pub(crate) images: Option<RentalImages>,
}

impl PropertyBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the property id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the source link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Override the city parsed from the location field.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Attach images.
    pub fn with_images(mut self, images: RentalImages) -> Self {
        self.images = Some(images);
        self
    }

    /// Parsed monthly rent, if any.
    pub fn price(&self) -> Option<u32> {
        self.price
    }

    /// Finalize into an immutable record.
    pub fn build(self) -> RentalProperty {
        RentalProperty {
            id: self.id,
            link: self.link,
            address: self.address,
            postcode: self.postcode,
            city: self.city,
            district: self.district,
            building_type: self.building_type,
            floor: self.floor,
            floors: self.floors,
            size: self.size,
            configuration: self.configuration,
            rooms: self.rooms,
            year: self.year,
            condition: self.condition,
            balcony: self.balcony,
            sauna: self.sauna,
            public_sauna: self.public_sauna,
            elevator: self.elevator,
            pets: None,
            price: self.price,
            deposit: self.deposit,
            heating: self.heating,
            land_ownership: self.land_ownership,
            images: self.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageSet;

    #[test]
    fn test_empty_builder_has_no_data() {
        let property = PropertyBuilder::new().build();
        assert!(property.address.is_none());
        assert!(property.price.is_none());
        assert!(property.configuration.is_none());
        assert!(!property.balcony);
        assert!(!property.public_sauna);
        assert!(property.pets.is_none());
    }

    #[test]
    fn test_identity_and_images() {
        let mut set = ImageSet::new("jpg");
        set.push(vec![1, 2, 3]);

        let property = PropertyBuilder::new()
            .with_id("id-1")
            .with_link("https://example.invalid/listing/1")
            .with_city("tampere")
            .with_images(RentalImages::new("id-1", set))
            .build();

        assert_eq!(property.id, "id-1");
        assert_eq!(property.city.as_deref(), Some("tampere"));
        assert_eq!(property.images.map(|i| i.files.len()), Some(1));
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(PropertyBuilder::new().build()).unwrap();
        assert!(json.get("building_type").is_some());
        assert!(json.get("public_sauna").is_some());
        assert!(json.get("land_ownership").is_some());
    }
}
