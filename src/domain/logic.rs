// src/domain/logic.rs

/// Phrases sellers use for unfinished ("grey") structures, lowercase with
/// single spaces.
pub const GREY_STRUCTURE_KEYWORDS: &[&str] = &[
    "grey structure",
    "greystructure",
    "gray structure",
    "graystructure",
    "grey-work",
    "greywork",
    "grey work",
    "core & shell",
    "core and shell",
    "shell only",
    "structure only",
    "semi-finished",
    "semi finished",
    "semifinished",
    "unfinished",
    "without finishing",
];

/// Determines whether a listing advertises an unfinished structure, based on
/// its title and description text.
///
/// Grey structures are priced like neither finished houses nor bare plots,
/// so the construction cost estimate leaves them out.
pub fn is_grey_structure(title: Option<&str>, description: Option<&str>) -> bool {
    let text = format!("{} {}", title.unwrap_or(""), description.unwrap_or(""));
    let normalized = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    GREY_STRUCTURE_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_keywords_in_title_or_description() {
        assert!(is_grey_structure(Some("125 Sq Yd Grey Structure for sale"), None));
        assert!(is_grey_structure(None, Some("Corner house, core   and\nshell")));
        assert!(is_grey_structure(Some("Semi-Finished villa"), None));
        assert!(is_grey_structure(Some("GRAY STRUCTURE"), Some("")));
    }

    #[test]
    fn finished_houses_are_not_flagged() {
        assert!(!is_grey_structure(Some("Brand new 3 bed villa"), Some("Fully finished, ready to move")));
        assert!(!is_grey_structure(None, None));
    }
}
