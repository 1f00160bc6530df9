use serde_json::{Map, Value};

/// Result of reading one field of a listing element.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Present(T),
    Absent,
    /// The key exists but its value has the wrong shape.
    Invalid(String),
}

impl<T> Field<T> {
    /// Optional fields: anything but a usable value reads as `None`.
    pub fn present(self) -> Option<T> {
        match self {
            Field::Present(v) => Some(v),
            _ => None,
        }
    }

    /// Required fields: absence and bad shape both become a skip reason.
    pub fn required(self, key: &str) -> Result<T, String> {
        match self {
            Field::Present(v) => Ok(v),
            Field::Absent => Err(format!("missing {key}")),
            Field::Invalid(why) => Err(format!("unusable {key}: {why}")),
        }
    }
}

/// Read-only view over one loosely structured listing element.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Only JSON objects carry fields.
    pub fn new(value: &'a Value) -> Option<Self> {
        value.as_object().map(|map| Fields { map })
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Numbers, or strings holding a number with optional thousands separators.
    pub fn number(&self, key: &str) -> Field<f64> {
        match self.raw(key) {
            None => Field::Absent,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) => Field::Present(f),
                None => Field::Invalid(format!("{n} is not representable")),
            },
            Some(Value::String(s)) => match parse_number(s) {
                Some(f) => Field::Present(f),
                None => Field::Invalid(format!("{s:?} is not a number")),
            },
            Some(other) => Field::Invalid(format!("unexpected value {other}")),
        }
    }

    pub fn integer(&self, key: &str) -> Field<i64> {
        match self.number(key) {
            Field::Present(f) if f.fract() == 0.0 && f.is_finite() => Field::Present(f as i64),
            Field::Present(f) => Field::Invalid(format!("{f} is not a whole number")),
            Field::Absent => Field::Absent,
            Field::Invalid(why) => Field::Invalid(why),
        }
    }

    /// Non-empty trimmed text.
    pub fn text(&self, key: &str) -> Field<&'a str> {
        match self.raw(key) {
            None => Field::Absent,
            Some(Value::String(s)) => match s.trim() {
                "" => Field::Absent,
                t => Field::Present(t),
            },
            Some(other) => Field::Invalid(format!("expected text, found {other}")),
        }
    }

    /// Text or a number rendered as text (listing ids come as either).
    pub fn id_text(&self, key: &str) -> Field<String> {
        match self.raw(key) {
            None => Field::Absent,
            Some(Value::Number(n)) => Field::Present(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Field::Present(s.trim().to_string()),
            Some(Value::String(_)) => Field::Absent,
            Some(other) => Field::Invalid(format!("unexpected id {other}")),
        }
    }

    pub fn nested(&self, key: &str) -> Option<Fields<'a>> {
        self.raw(key).and_then(Fields::new)
    }

    /// `name` of every object in a list, in order, e.g. a location breadcrumb.
    pub fn names(&self, key: &str) -> Vec<&'a str> {
        self.raw(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Fields::new)
                    .filter_map(|f| f.text("name").present())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Parses "12,500,000" or " 10.5 " style numbers.
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
