use crate::scraper::units::AreaUnit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Listing categories scraped separately and never compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Built houses.
    ResidentialBuilt,
    /// Residential plots.
    LandParcel,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::ResidentialBuilt, Category::LandParcel];

    /// Path segment the marketplace uses for this category.
    pub fn url_segment(self) -> &'static str {
        match self {
            Category::ResidentialBuilt => "Homes",
            Category::LandParcel => "Plots",
        }
    }

    /// Stem of the per-category output files in a run folder.
    pub fn file_stem(self) -> &'static str {
        match self {
            Category::ResidentialBuilt => "houses",
            Category::LandParcel => "plots",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::ResidentialBuilt => f.write_str("Houses"),
            Category::LandParcel => f.write_str("Residential Plots"),
        }
    }
}

/// What makes two records "the same listing" across pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKey {
    /// The marketplace's own listing id.
    ListingId(String),
    /// Hex SHA-256 of the normalized title, location, price and area.
    Composite(String),
}

impl IdentityKey {
    pub fn composite(title: Option<&str>, location_tag: &str, price: f64, area_sq_yd: f64) -> Self {
        let title = title.unwrap_or("").trim().to_lowercase();
        let location = location_tag.trim().to_lowercase();
        let material = format!("{title}|{location}|{price:.0}|{area_sq_yd:.2}");

        let digest = Sha256::digest(material.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        IdentityKey::Composite(hex)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::ListingId(id) => write!(f, "{id}"),
            IdentityKey::Composite(hash) => write!(f, "~{}", &hash[..hash.len().min(12)]),
        }
    }
}

/// One normalized listing. Area is always in square yards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub identity_key: IdentityKey,
    pub category: Category,
    /// Most specific sub-area name.
    pub location_tag: String,

    pub price: f64,
    pub area_sq_yd: f64,
    /// Unit the area was declared in before conversion.
    pub source_unit: AreaUnit,

    // Descriptive, all optional
    pub title: Option<String>,
    pub location_detail: Option<String>,
    pub property_type: Option<String>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    pub agency_name: Option<String>,
    pub short_description: Option<String>,
    pub is_grey_structure: bool,
}

impl ListingRecord {
    pub fn is_valid(&self) -> bool {
        self.price > 0.0 && self.area_sq_yd > 0.0
    }

    /// Whole days between listing creation and `now`.
    pub fn days_on_market(&self, now: DateTime<Utc>) -> Option<i64> {
        self.created_at.map(|created| (now - created).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(price: f64, area: f64) -> ListingRecord {
        ListingRecord {
            identity_key: IdentityKey::ListingId("1".into()),
            category: Category::ResidentialBuilt,
            location_tag: "Precinct 8".into(),
            price,
            area_sq_yd: area,
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

    #[test]
    fn validity_requires_positive_price_and_area() {
        assert!(record(1.0, 1.0).is_valid());
        assert!(!record(0.0, 120.0).is_valid());
        assert!(!record(5_000_000.0, 0.0).is_valid());
        assert!(!record(-1.0, 120.0).is_valid());
        assert!(!record(f64::NAN, 120.0).is_valid());
    }

    #[test]
    fn composite_key_ignores_case_and_padding() {
        let a = IdentityKey::composite(Some(" 125 Sq Yd House "), "Precinct 8", 12_500_000.0, 125.0);
        let b = IdentityKey::composite(Some("125 sq yd house"), "precinct 8", 12_500_000.0, 125.0);
        let c = IdentityKey::composite(Some("125 sq yd house"), "precinct 8", 12_600_000.0, 125.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
        match a {
            IdentityKey::Composite(hex) => assert_eq!(hex.len(), 64),
            other => panic!("unexpected key {other:?}"),
        }
    }

    #[test]
    fn days_on_market_counts_whole_days() {
        let mut r = record(1.0, 1.0);
        let now = Utc.with_ymd_and_hms(2025, 11, 11, 12, 0, 0).unwrap();
        assert_eq!(r.days_on_market(now), None);

        r.created_at = Some(Utc.with_ymd_and_hms(2025, 11, 1, 18, 0, 0).unwrap());
        assert_eq!(r.days_on_market(now), Some(9));
    }
}
