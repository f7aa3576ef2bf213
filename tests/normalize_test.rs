//! End-to-end normalization tests: sheet PDF in, property record out.

mod common;

use common::{listing_rows, SheetBuilder};
use rentsheet::{
    process_bytes, ExtractOptions, FieldError, FieldId, FieldNormalizer, LabelDictionary,
    Rentsheet,
};

fn sheet(rows: &[(&str, &str)]) -> Vec<u8> {
    SheetBuilder::new().page(rows, &[]).build()
}

#[test]
fn test_full_sheet() {
    let mut builder = SheetBuilder::new();
    let photo = builder.jpeg_image([200, 180, 160]);
    let pdf = builder.page(&listing_rows(), &[photo]).build();

    let listing = Rentsheet::new().process_bytes(&pdf).unwrap().unwrap();
    assert!(listing.report().is_complete(), "{:?}", listing.report());
    assert!(listing.is_valid());
    assert_eq!(listing.images.len(), 1);

    let property = listing.into_property("a1", Some("https://example.invalid/a1".to_string()));
    assert_eq!(property.address.as_deref(), Some("mannerheimintie 4 a 12"));
    assert_eq!(property.postcode.as_deref(), Some("00100"));
    assert_eq!(property.city.as_deref(), Some("helsinki"));
    assert_eq!(property.district.as_deref(), Some("kamppi"));
    assert_eq!(property.floor, Some(6));
    assert_eq!(property.floors, Some(6));
    assert_eq!(property.size, Some(54));
    assert_eq!(
        property.configuration,
        Some(vec!["2h".to_string(), "kk".to_string(), "s".to_string()])
    );
    assert_eq!(property.rooms, Some(2));
    assert_eq!(property.price, Some(1200));
    assert_eq!(property.deposit, Some(2400));
    assert_eq!(property.year, Some(1962));
    assert_eq!(property.building_type.as_deref(), Some("kerrostalo"));
    assert_eq!(property.heating.as_deref(), Some("kaukolämpö"));
    assert!(property.balcony);
    assert!(property.elevator);
    assert!(!property.sauna);
    assert!(property.public_sauna);
    assert_eq!(property.pets, None);

    let images = property.images.unwrap();
    assert_eq!(images.id, "a1");
    assert_eq!(images.files, vec!["a1_0.jpg".to_string()]);
}

#[test]
fn test_sheet_without_table_is_skipped() {
    let mut builder = SheetBuilder::new();
    let photo = builder.rgb_image([9, 9, 9]);
    let pdf = builder.page(&[], &[photo]).build();

    let result = process_bytes(&pdf, &ExtractOptions::default(), &FieldNormalizer::new());
    assert!(result.unwrap().is_none());
}

#[test]
fn test_broken_image_fails_the_document() {
    let mut builder = SheetBuilder::new();
    let broken = builder.truncated_image();
    let pdf = builder.page(&listing_rows(), &[broken]).build();

    assert!(matches!(
        Rentsheet::new().process_bytes(&pdf),
        Err(rentsheet::Error::ImageDecode { .. })
    ));
}

#[test]
fn test_unparseable_fields_are_reported() {
    let pdf = sheet(&[
        ("Sijainti", "Helsinki"),
        ("Kerros", "Katutaso"),
        ("Vuokra/kk", "950"),
        ("Rakennusvuosi", "1960-luku"),
    ]);
    let listing = Rentsheet::new().process_bytes(&pdf).unwrap().unwrap();

    assert!(listing.is_valid());
    let report = listing.report();
    assert_eq!(report.len(), 3);
    assert!(report.has_error(FieldId::Location));
    assert!(report.has_error(FieldId::Floor));
    assert!(report.has_error(FieldId::Year));

    let json = serde_json::to_value(report).unwrap();
    let fields: Vec<&str> = json["diagnostics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["location", "floor", "year"]);
    assert_eq!(json["diagnostics"][1]["value"], "katutaso");
    assert_eq!(json["diagnostics"][1]["error"]["kind"], "floor_format");

    let property = listing.into_property("b2", None);
    assert_eq!(property.price, Some(950));
    assert_eq!(property.city, None);
}

#[test]
fn test_missing_price_makes_record_invalid() {
    let pdf = sheet(&[("Kerros", "2 / 4"), ("Hissi", "Kyllä")]);
    let listing = Rentsheet::new().process_bytes(&pdf).unwrap().unwrap();

    assert!(!listing.is_valid());
    let diagnostic = listing.report().iter().next().unwrap();
    assert_eq!(diagnostic.field, FieldId::Price);
    assert_eq!(diagnostic.error, FieldError::Missing);
    assert_eq!(diagnostic.value, None);
}

#[test]
fn test_values_are_normalized_before_parsing() {
    // Non-breaking space, upper case and extra spaces in the sheet.
    let pdf = sheet(&[
        ("Vuokra/kk", "1\u{a0}050,00"),
        ("PARVEKE", "KYLLÄ"),
        ("Kerros", "3  /  5"),
    ]);
    let property = Rentsheet::new()
        .process_bytes(&pdf)
        .unwrap()
        .unwrap()
        .into_property("c3", None);

    assert_eq!(property.price, Some(1050));
    assert!(property.balcony);
    assert_eq!((property.floor, property.floors), (Some(3), Some(5)));
}

#[test]
fn test_dictionary_from_file() {
    let mut dictionary = LabelDictionary::finnish();
    dictionary.version = 2;
    dictionary
        .labels
        .insert(FieldId::Price, "kuukausivuokra".to_string());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels.json");
    std::fs::write(&path, dictionary.to_json().unwrap()).unwrap();

    let loaded = LabelDictionary::from_path(&path).unwrap();
    assert_eq!(loaded, dictionary);

    let pdf = sheet(&[("Kuukausivuokra", "700"), ("Vuokra/kk", "999")]);
    let property = Rentsheet::new()
        .with_dictionary(loaded)
        .process_bytes(&pdf)
        .unwrap()
        .unwrap()
        .into_property("d4", None);
    assert_eq!(property.price, Some(700));
}

#[test]
fn test_invalid_dictionary_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels.json");
    std::fs::write(
        &path,
        r#"{"version":1,"locale":"fi","affirmative":"","labels":{}}"#,
    )
    .unwrap();

    assert!(matches!(
        LabelDictionary::from_path(&path),
        Err(rentsheet::Error::Config(_))
    ));
}

#[test]
fn test_batch_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.pdf");
    let empty = dir.path().join("empty.pdf");
    let broken = dir.path().join("broken.pdf");
    std::fs::write(&good, sheet(&listing_rows())).unwrap();
    std::fs::write(&empty, sheet(&[])).unwrap();
    std::fs::write(&broken, b"%PDF-1.7\n").unwrap();

    let items = Rentsheet::new().process_files(&[good.clone(), broken.clone(), empty.clone()]);
    let paths: Vec<_> = items.iter().map(|item| item.path.clone()).collect();
    assert_eq!(paths, vec![good, broken, empty]);

    assert!(matches!(&items[0].result, Ok(Some(listing)) if listing.is_valid()));
    assert!(items[1].result.is_err());
    assert!(matches!(items[2].result, Ok(None)));
}

#[test]
fn test_normalization_is_idempotent() {
    let pdf = sheet(&listing_rows());
    let normalizer = FieldNormalizer::new();
    let first = process_bytes(&pdf, &ExtractOptions::default(), &normalizer)
        .unwrap()
        .unwrap();
    assert_eq!(normalizer.normalize(&first.table), first.normalized);
}
