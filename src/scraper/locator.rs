// locator.rs
//
// The only place that knows how listing data is embedded in a page.
// Re-check the fixtures below whenever the site markup changes.

use regex::Regex;
use ::scraper::{Html, Selector};

use crate::scraper::ExtractError;

/// The hits array as embedded in the search results state object.
pub const DEFAULT_HITS_PATTERN: &str = r#""hits":\s*\[(.*?)\],"hitsPerPage""#;

/// How to find the listing block inside a rendered page.
#[derive(Debug, Clone)]
pub enum BlockMarker {
    /// A regex whose first capture group is the comma-separated body of a
    /// JSON array. The capture is re-wrapped in brackets before parsing.
    ArrayPattern(Regex),
    /// A `<script id="...">` element holding a JSON document, plus the JSON
    /// pointer of the listing array inside it.
    ScriptJson { script_id: String, pointer: String },
}

impl BlockMarker {
    pub fn array_pattern(pattern: &str) -> Result<Self, regex::Error> {
        // Listing state is frequently one long line, but allow newlines too.
        let re = regex::RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()?;
        Ok(BlockMarker::ArrayPattern(re))
    }

    pub fn script_json(script_id: impl Into<String>, pointer: impl Into<String>) -> Self {
        BlockMarker::ScriptJson {
            script_id: script_id.into(),
            pointer: pointer.into(),
        }
    }
}

impl Default for BlockMarker {
    fn default() -> Self {
        // Literal pattern, always compiles.
        BlockMarker::array_pattern(DEFAULT_HITS_PATTERN).expect("default hits pattern compiles")
    }
}

/// A located span of listing data, not yet parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawListingBlock {
    /// Text of a JSON array, brackets included.
    ArrayText(String),
    /// Full JSON document of a script element and the pointer to the listings.
    Document { text: String, pointer: String },
}

impl RawListingBlock {
    /// Parses the block into its listing elements.
    pub fn parse(&self) -> Result<Vec<serde_json::Value>, ExtractError> {
        match self {
            RawListingBlock::ArrayText(text) => {
                let value: serde_json::Value = serde_json::from_str(text)
                    .map_err(|e| ExtractError::BlockMalformed(e.to_string()))?;
                into_elements(value)
            }
            RawListingBlock::Document { text, pointer } => {
                let doc: serde_json::Value = serde_json::from_str(text)
                    .map_err(|e| ExtractError::BlockMalformed(e.to_string()))?;
                let listings = doc.pointer(pointer).cloned().ok_or_else(|| {
                    ExtractError::BlockMalformed(format!("pointer {pointer} not present"))
                })?;
                into_elements(listings)
            }
        }
    }
}

fn into_elements(value: serde_json::Value) -> Result<Vec<serde_json::Value>, ExtractError> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        other => Err(ExtractError::BlockMalformed(format!(
            "expected an array of listings, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Finds the listing block in `page` using `marker`.
pub fn locate_block(page: &str, marker: &BlockMarker) -> Result<RawListingBlock, ExtractError> {
    match marker {
        BlockMarker::ArrayPattern(re) => {
            let caps = re.captures(page).ok_or(ExtractError::BlockNotFound)?;
            let body = caps.get(1).ok_or(ExtractError::BlockNotFound)?;
            Ok(RawListingBlock::ArrayText(format!("[{}]", body.as_str())))
        }
        BlockMarker::ScriptJson { script_id, pointer } => {
            let text = script_text(page, script_id)?;
            Ok(RawListingBlock::Document {
                text,
                pointer: pointer.clone(),
            })
        }
    }
}

fn script_text(page: &str, script_id: &str) -> Result<String, ExtractError> {
    let document = Html::parse_document(page);
    let selector = Selector::parse(&format!(r#"script[id="{script_id}"]"#))
        .map_err(|e| ExtractError::BlockMalformed(format!("bad script selector: {e}")))?;

    let element = document
        .select(&selector)
        .next()
        .ok_or(ExtractError::BlockNotFound)?;

    let text: String = element.text().collect();
    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::BlockNotFound);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE_PAGE: &str = r#"<html><head><script>
window.state = {"algolia":{"content":{"hits":[{"id":1,"price":100},{"id":2,"price":200}],"hitsPerPage":25,"nbHits":2}}};
</script></head><body></body></html>"#;

    const NEXT_DATA_PAGE: &str = r#"<html><body>
<script id="__NEXT_DATA__" type="application/json">{"props":{"pageProps":{"listings":[{"id":"a"}]}}}</script>
</body></html>"#;

    #[test]
    fn finds_hits_array_in_state_object() {
        let block = locate_block(STATE_PAGE, &BlockMarker::default()).unwrap();
        let elements = block.parse().unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1]["price"], 200);
    }

    #[test]
    fn pattern_spans_newlines() {
        let page = "\"hits\": [\n{\"id\":1},\n{\"id\":2}\n],\"hitsPerPage\":25";
        let elements = locate_block(page, &BlockMarker::default())
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn empty_hits_array_parses_to_no_elements() {
        let page = r#"{"hits":[],"hitsPerPage":25}"#;
        let elements = locate_block(page, &BlockMarker::default())
            .unwrap()
            .parse()
            .unwrap();
        assert!(elements.is_empty());
    }

    #[test]
    fn missing_marker_is_block_not_found() {
        let err = locate_block("<html>nothing here</html>", &BlockMarker::default()).unwrap_err();
        assert_eq!(err, ExtractError::BlockNotFound);
    }

    #[test]
    fn truncated_array_is_malformed() {
        let page = r#"{"hits":[{"id":1,"price":],"hitsPerPage":25}"#;
        let block = locate_block(page, &BlockMarker::default()).unwrap();
        assert!(matches!(block.parse(), Err(ExtractError::BlockMalformed(_))));
    }

    #[test]
    fn script_marker_follows_pointer() {
        let marker = BlockMarker::script_json("__NEXT_DATA__", "/props/pageProps/listings");
        let elements = locate_block(NEXT_DATA_PAGE, &marker)
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0]["id"], "a");
    }

    #[test]
    fn script_marker_with_wrong_pointer_is_malformed() {
        let marker = BlockMarker::script_json("__NEXT_DATA__", "/props/pageProps/properties");
        let block = locate_block(NEXT_DATA_PAGE, &marker).unwrap();
        assert!(matches!(block.parse(), Err(ExtractError::BlockMalformed(_))));
    }

    #[test]
    fn absent_script_is_block_not_found() {
        let marker = BlockMarker::script_json("__APP_STATE__", "/hits");
        assert_eq!(
            locate_block(NEXT_DATA_PAGE, &marker).unwrap_err(),
            ExtractError::BlockNotFound
        );
    }
}
