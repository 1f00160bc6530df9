use serde::{Deserialize, Serialize};
use std::fmt;

/// Area units accepted from listing data. Every area is converted to
/// square yards before it leaves the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaUnit {
    SquareFeet,
    SquareYards,
    SquareMeters,
    Marla,
    Kanal,
}

pub const SQ_YD_PER_SQ_FT: f64 = 1.0 / 9.0;
pub const SQ_YD_PER_SQ_M: f64 = 1.19599;
pub const SQ_YD_PER_MARLA: f64 = 30.0;
pub const SQ_YD_PER_KANAL: f64 = 605.0;

impl AreaUnit {
    /// Square yards in one of this unit.
    pub fn sq_yd_ratio(self) -> f64 {
        match self {
            AreaUnit::SquareFeet => SQ_YD_PER_SQ_FT,
            AreaUnit::SquareYards => 1.0,
            AreaUnit::SquareMeters => SQ_YD_PER_SQ_M,
            AreaUnit::Marla => SQ_YD_PER_MARLA,
            AreaUnit::Kanal => SQ_YD_PER_KANAL,
        }
    }

    pub fn to_sq_yd(self, value: f64) -> f64 {
        match self {
            // Divide rather than multiply by 1/9 so whole square yards stay exact.
            AreaUnit::SquareFeet => value / 9.0,
            other => value * other.sq_yd_ratio(),
        }
    }

    /// Recognizes the unit spellings used in listing text
    /// ("Marla", "Kanal", "Sq. Yd.", "sq ft", "square meters", "sqm", ...).
    pub fn parse(text: &str) -> Option<AreaUnit> {
        let t: String = text
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();

        if t.is_empty() {
            return None;
        }
        if t.contains("marla") {
            return Some(AreaUnit::Marla);
        }
        if t.contains("kanal") {
            return Some(AreaUnit::Kanal);
        }
        if t.contains("yard") || t.contains("yd") {
            return Some(AreaUnit::SquareYards);
        }
        if t.contains("feet") || t.contains("foot") || t.contains("ft") {
            return Some(AreaUnit::SquareFeet);
        }
        if t.contains("meter") || t.contains("metre") || t == "sqm" || t == "m" {
            return Some(AreaUnit::SquareMeters);
        }
        None
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AreaUnit::SquareFeet => "sq ft",
            AreaUnit::SquareYards => "sq yd",
            AreaUnit::SquareMeters => "sq m",
            AreaUnit::Marla => "marla",
            AreaUnit::Kanal => "kanal",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_of_each_unit_converts_to_documented_ratio() {
        assert_eq!(AreaUnit::Kanal.to_sq_yd(1.0), 605.0);
        assert_eq!(AreaUnit::Marla.to_sq_yd(1.0), 30.0);
        assert_eq!(AreaUnit::SquareYards.to_sq_yd(1.0), 1.0);
        assert_eq!(AreaUnit::SquareMeters.to_sq_yd(1.0), 1.19599);
        assert_eq!(AreaUnit::SquareFeet.to_sq_yd(9.0), 1.0);
        assert!((AreaUnit::SquareFeet.to_sq_yd(1.0) - 1.0 / 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scaled_values_stay_linear() {
        assert_eq!(AreaUnit::Marla.to_sq_yd(10.0), 300.0);
        assert_eq!(AreaUnit::Kanal.to_sq_yd(2.0), 1210.0);
        assert_eq!(AreaUnit::SquareFeet.to_sq_yd(1800.0), 200.0);
    }

    #[test]
    fn parses_listing_spellings() {
        assert_eq!(AreaUnit::parse("Marla"), Some(AreaUnit::Marla));
        assert_eq!(AreaUnit::parse("KANAL"), Some(AreaUnit::Kanal));
        assert_eq!(AreaUnit::parse("Sq. Yd."), Some(AreaUnit::SquareYards));
        assert_eq!(AreaUnit::parse("square yards"), Some(AreaUnit::SquareYards));
        assert_eq!(AreaUnit::parse("sq ft"), Some(AreaUnit::SquareFeet));
        assert_eq!(AreaUnit::parse("Square Feet"), Some(AreaUnit::SquareFeet));
        assert_eq!(AreaUnit::parse("sqm"), Some(AreaUnit::SquareMeters));
        assert_eq!(AreaUnit::parse("square metres"), Some(AreaUnit::SquareMeters));
    }

    #[test]
    fn unknown_units_are_rejected() {
        assert_eq!(AreaUnit::parse("acre"), None);
        assert_eq!(AreaUnit::parse(""), None);
        assert_eq!(AreaUnit::parse("123"), None);
    }
}
