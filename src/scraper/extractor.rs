// extractor.rs
use crate::config::ExtractConfig;
use crate::domain::listing::{IdentityKey, ListingRecord};
use crate::domain::logic::is_grey_structure;
use crate::scraper::fields::{parse_number, Field, Fields};
use crate::scraper::locator::locate_block;
use crate::scraper::units::AreaUnit;
use crate::scraper::ExtractError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

const DESCRIPTION_MAX_CHARS: usize = 200;

/// Records pulled from one page, plus everything that was skipped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    pub records: Vec<ListingRecord>,
    pub diagnostics: Vec<ExtractError>,
}

impl Extraction {
    fn failed(error: ExtractError) -> Self {
        Self {
            records: Vec::new(),
            diagnostics: vec![error],
        }
    }
}

/// Turns one rendered listing page into valid, normalized records.
///
/// Never fails: a missing or malformed data block gives an empty result,
/// and an element that cannot be read is skipped on its own. Every skip
/// is logged and returned in `diagnostics`.
pub fn extract(page: &str, config: &ExtractConfig) -> Extraction {
    let block = match locate_block(page, &config.marker) {
        Ok(block) => block,
        Err(e) => {
            warn!("{e}");
            return Extraction::failed(e);
        }
    };

    let elements = match block.parse() {
        Ok(elements) => elements,
        Err(e) => {
            warn!("{e}");
            return Extraction::failed(e);
        }
    };

    let mut extraction = Extraction::default();
    for (index, element) in elements.iter().enumerate() {
        match extract_record(element, config) {
            Ok(record) => extraction.records.push(record),
            Err(reason) => {
                let error = ExtractError::FieldExtractionFailed {
                    index,
                    fragment: fragment_of(element),
                    reason,
                };
                warn!("{error}");
                extraction.diagnostics.push(error);
            }
        }
    }

    debug!(
        "extracted {} of {} listing elements",
        extraction.records.len(),
        elements.len()
    );
    extraction
}

fn extract_record(element: &Value, config: &ExtractConfig) -> Result<ListingRecord, String> {
    let fields = Fields::new(element).ok_or("element is not an object")?;

    let price = fields.number("price").required("price")?;
    let (area_value, source_unit) = read_area(&fields, config.default_area_unit)?;
    let area_sq_yd = source_unit.to_sq_yd(area_value);

    if !(price > 0.0 && price.is_finite()) {
        return Err(format!("price {price} is not positive"));
    }
    if !(area_sq_yd > 0.0 && area_sq_yd.is_finite()) {
        return Err(format!("area {area_value} {source_unit} is not positive"));
    }
    let bounds = &config.bounds;
    if !(bounds.min_price..=bounds.max_price).contains(&price) {
        return Err(format!(
            "price {price} outside {}..={}",
            bounds.min_price, bounds.max_price
        ));
    }
    if !(bounds.min_area_sq_yd..=bounds.max_area_sq_yd).contains(&area_sq_yd) {
        return Err(format!(
            "area {area_sq_yd:.1} sq yd outside {}..={}",
            bounds.min_area_sq_yd, bounds.max_area_sq_yd
        ));
    }

    let locations = fields.names("location");
    let location_tag = locations
        .last()
        .map(|s| s.to_string())
        .unwrap_or_else(|| config.location_tag.clone());
    let location_detail = (!locations.is_empty()).then(|| locations.join(" > "));

    let title = fields.text("title").present().map(str::to_string);
    let short_description = fields
        .text("shortDescription")
        .present()
        .map(|s| s.chars().take(DESCRIPTION_MAX_CHARS).collect::<String>());

    let identity_key = match fields.id_text("id").present() {
        Some(id) => IdentityKey::ListingId(id),
        None => IdentityKey::composite(title.as_deref(), &location_tag, price, area_sq_yd),
    };

    let created_at = fields
        .integer("createdAt")
        .present()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    let url = fields
        .text("slug")
        .present()
        .map(|slug| format!("{}/Property/{}", config.base_url.trim_end_matches('/'), slug));

    let is_grey = is_grey_structure(title.as_deref(), short_description.as_deref());

    Ok(ListingRecord {
        identity_key,
        category: config.category,
        location_tag,
        price,
        area_sq_yd,
        source_unit,
        title,
        location_detail,
        property_type: fields.names("category").last().map(|s| s.to_string()),
        bedrooms: fields.integer("rooms").present(),
        bathrooms: fields.integer("baths").present(),
        created_at,
        url,
        agency_name: fields
            .nested("agency")
            .and_then(|agency| agency.text("name").present())
            .map(str::to_string),
        short_description,
        is_grey_structure: is_grey,
    })
}

/// Area as a number plus its unit.
///
/// A bare number uses the element's `areaUnit` when declared, otherwise the
/// configured default. Text such as "10 Marla" carries its own unit.
fn read_area(fields: &Fields<'_>, default_unit: AreaUnit) -> Result<(f64, AreaUnit), String> {
    match fields.raw("area") {
        None => Err("missing area".to_string()),
        Some(Value::Number(n)) => {
            let value = n.as_f64().ok_or("area is not representable")?;
            let unit = match fields.text("areaUnit") {
                Field::Present(text) => {
                    AreaUnit::parse(text).ok_or_else(|| format!("unknown area unit {text:?}"))?
                }
                Field::Absent => default_unit,
                Field::Invalid(why) => return Err(format!("unusable areaUnit: {why}")),
            };
            Ok((value, unit))
        }
        Some(Value::String(text)) => parse_area_text(text),
        Some(other) => Err(format!("unexpected area {other}")),
    }
}

fn parse_area_text(text: &str) -> Result<(f64, AreaUnit), String> {
    let text = text.trim();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(text.len());
    let (number, unit_text) = text.split_at(split);

    let value = parse_number(number).ok_or_else(|| format!("area {text:?} has no number"))?;
    let unit =
        AreaUnit::parse(unit_text).ok_or_else(|| format!("unknown area unit in {text:?}"))?;
    Ok((value, unit))
}

fn fragment_of(element: &Value) -> String {
    let Some(fields) = Fields::new(element) else {
        return "<non-object>".to_string();
    };
    if let Some(id) = fields.id_text("id").present() {
        return format!("id {id}");
    }
    match fields.text("title").present() {
        Some(title) => format!("{:?}", title.chars().take(40).collect::<String>()),
        None => "<unidentified>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::Category;
    use serde_json::json;

    fn config() -> ExtractConfig {
        ExtractConfig::new(Category::ResidentialBuilt, "precinct_8")
    }

    fn page(hits: Value) -> String {
        let body = hits.to_string();
        let inner = &body[1..body.len() - 1];
        format!(
            r#"<html><script>window.state={{"algolia":{{"content":{{"hits":[{inner}],"hitsPerPage":25}}}}}};</script></html>"#
        )
    }

    #[test]
    fn full_element_maps_every_field() {
        let html = page(json!([{
            "id": 4512,
            "title": "  125 Sq Yd House  ",
            "price": 14_500_000,
            "area": 104.5158,
            "rooms": 3,
            "baths": 3,
            "location": [{"name": "Karachi"}, {"name": "Bahria Town"}, {"name": "Precinct 8"}],
            "category": [{"name": "Homes"}, {"name": "House"}],
            "agency": {"name": "Prime Realty", "product": "titanium"},
            "createdAt": 1_700_000_000,
            "slug": "Property/karachi_house-4512-1",
            "shortDescription": "Grey structure, corner"
        }]));

        let out = extract(&html, &config());
        assert!(out.diagnostics.is_empty());
        let r = &out.records[0];
        assert_eq!(r.identity_key, IdentityKey::ListingId("4512".into()));
        assert_eq!(r.title.as_deref(), Some("125 Sq Yd House"));
        assert_eq!(r.price, 14_500_000.0);
        assert_eq!(r.source_unit, AreaUnit::SquareMeters);
        assert!((r.area_sq_yd - 125.0).abs() < 0.01);
        assert_eq!(r.location_tag, "Precinct 8");
        assert_eq!(r.location_detail.as_deref(), Some("Karachi > Bahria Town > Precinct 8"));
        assert_eq!(r.property_type.as_deref(), Some("House"));
        assert_eq!(r.agency_name.as_deref(), Some("Prime Realty"));
        assert_eq!(r.bedrooms, Some(3));
        assert_eq!(r.created_at.map(|t| t.timestamp()), Some(1_700_000_000));
        assert!(r.url.as_deref().unwrap().starts_with("https://www.zameen.com/Property/"));
        assert!(r.is_grey_structure);
        assert_eq!(r.category, Category::ResidentialBuilt);
    }

    #[test]
    fn optional_fields_may_be_missing() {
        let html = page(json!([{"id": 1, "price": 9_000_000, "area": 100}]));
        let out = extract(&html, &config());
        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert_eq!(r.bedrooms, None);
        assert_eq!(r.title, None);
        assert_eq!(r.location_tag, "precinct_8");
        assert!(!r.is_grey_structure);
    }

    #[test]
    fn declared_units_and_area_text_are_converted() {
        let html = page(json!([
            {"id": 1, "price": 90_000_000, "area": 1, "areaUnit": "Kanal"},
            {"id": 2, "price": 45_000_000, "area": "10 Marla"},
            {"id": 3, "price": 30_000_000, "area": "1,800 sq. ft."},
            {"id": 4, "price": 36_000_000, "area": 240, "areaUnit": "sq yd"}
        ]));
        let out = extract(&html, &config());
        let areas: Vec<f64> = out.records.iter().map(|r| r.area_sq_yd).collect();
        assert_eq!(areas, vec![605.0, 300.0, 200.0, 240.0]);
    }

    #[test]
    fn bad_elements_are_skipped_individually() {
        let html = page(json!([
            {"id": 1, "price": 9_000_000, "area": 100},
            {"id": 2, "area": 100},
            {"id": 3, "price": "call for price", "area": 100},
            {"id": 4, "price": 9_000_000, "area": 5, "areaUnit": "acre"},
            {"id": 5, "price": 0, "area": 100},
            {"id": 6, "price": 9_000_000, "area": -3},
            "not an object",
            {"id": 8, "price": 9_500_000, "area": 110}
        ]));
        let out = extract(&html, &config());
        let ids: Vec<String> = out.records.iter().map(|r| r.identity_key.to_string()).collect();
        assert_eq!(ids, vec!["1", "8"]);
        assert_eq!(out.diagnostics.len(), 6);
        assert!(out.records.iter().all(ListingRecord::is_valid));

        match &out.diagnostics[0] {
            ExtractError::FieldExtractionFailed { index, fragment, reason } => {
                assert_eq!(*index, 1);
                assert_eq!(fragment, "id 2");
                assert!(reason.contains("price"));
            }
            other => panic!("unexpected diagnostic {other:?}"),
        }
    }

    #[test]
    fn page_without_block_is_empty() {
        let out = extract("<html><body>Access denied</body></html>", &config());
        assert!(out.records.is_empty());
        assert_eq!(out.diagnostics, vec![ExtractError::BlockNotFound]);
    }

    #[test]
    fn malformed_block_is_empty() {
        let html = r#"<script>{"hits":[{"id":1,"price":}],"hitsPerPage":25}</script>"#;
        let out = extract(html, &config());
        assert!(out.records.is_empty());
        assert!(matches!(out.diagnostics.as_slice(), [ExtractError::BlockMalformed(_)]));
    }

    #[test]
    fn missing_id_falls_back_to_composite_key() {
        let html = page(json!([{"title": "Plot", "price": 5_000_000, "area": 100}]));
        let out = extract(&html, &config());
        assert!(matches!(out.records[0].identity_key, IdentityKey::Composite(_)));
    }

    #[test]
    fn extraction_is_repeatable() {
        let html = page(json!([
            {"id": 1, "price": 9_000_000, "area": 100},
            {"price": "x", "area": 100}
        ]));
        assert_eq!(extract(&html, &config()), extract(&html, &config()));
    }

    #[test]
    fn implausible_values_are_skipped() {
        let html = page(json!([
            {"id": 1, "price": 1.7e308, "area": 100, "areaUnit": "sq yd"},
            {"id": 2, "price": 500_000, "area": 100, "areaUnit": "sq yd"},
            {"id": 3, "price": 9_000_000, "area": 2, "areaUnit": "sq yd"},
            {"id": 4, "price": 9_000_000, "area": 50, "areaUnit": "Kanal"},
            {"id": 5, "price": 9_000_000, "area": 100, "areaUnit": "sq yd"}
        ]));
        let out = extract(&html, &config());
        let ids: Vec<String> = out.records.iter().map(|r| r.identity_key.to_string()).collect();
        assert_eq!(ids, vec!["5"]);
        assert_eq!(out.diagnostics.len(), 4);
        assert!(out
            .diagnostics
            .iter()
            .all(|d| matches!(d, ExtractError::FieldExtractionFailed { reason, .. } if reason.contains("outside"))));
    }

    #[test]
    fn bounds_are_configurable() {
        let html = page(json!([{"id": 1, "price": 500_000, "area": 100, "areaUnit": "sq yd"}]));
        let mut config = config();
        config.bounds.min_price = 100_000.0;
        assert_eq!(extract(&html, &config).records.len(), 1);
    }
}
