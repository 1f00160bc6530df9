use crate::domain::listing::{Category, IdentityKey, ListingRecord};
use crate::scraper::units::AreaUnit;
use serde_json::{json, Value};

/// A listing page with `hits` embedded in the search-state script the
/// marketplace renders.
pub fn hits_page(hits: &[Value]) -> String {
    let inner = hits
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"<html><head><title>Listings</title></head><body><script>window.state={{"algolia":{{"content":{{"hits":[{inner}],"hitsPerPage":25,"nbHits":{}}}}}}};</script></body></html>"#,
        hits.len()
    )
}

/// One listing element with its area declared in square yards.
pub fn listing_json(id: i64, price: f64, area_sq_yd: f64) -> Value {
    json!({
        "id": id,
        "title": format!("{area_sq_yd} Sq Yd House"),
        "price": price,
        "area": area_sq_yd,
        "areaUnit": "sq yd",
        "location": [
            {"name": "Karachi"},
            {"name": "Bahria Town Karachi"},
            {"name": "Precinct 8"}
        ],
        "category": [{"name": "Homes"}, {"name": "House"}],
        "rooms": 3,
        "baths": 3,
        "slug": format!("listing-{id}"),
    })
}

/// A minimal valid record.
pub fn record(id: &str, category: Category, price: f64, area_sq_yd: f64) -> ListingRecord {
    ListingRecord {
        identity_key: IdentityKey::ListingId(id.to_string()),
        category,
        location_tag: "Precinct 8".into(),
        price,
        area_sq_yd,
        source_unit: AreaUnit::SquareYards,
        title: None,
        location_detail: None,
        property_type: None,
        bedrooms: None,
        bathrooms: None,
        created_at: None,
        url: None,
        agency_name: None,
        short_description: None,
        is_grey_structure: false,
    }
}
