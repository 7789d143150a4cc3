//! Ordered-candidate field resolution
//!
//! Backend schemas drift: the same value may live under an English name, a
//! French name or a lookup column. Every mapper reads through these helpers,
//! passing the candidate names in preference order.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::gateway::Record;

/// A value counts as present when it is not null, not a blank string and not
/// an empty array
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// First present value among `candidates`
pub fn first_present<'a>(fields: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|name| fields.get(*name))
        .find(|value| is_present(value))
}

/// Text rendering of a scalar, lookup arrays yield their first element
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => items.first().and_then(value_text),
        _ => None,
    }
}

/// Numeric reading of a value; malformed and non-finite input is absent
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let normalized = s.trim().replace(',', ".");
            normalized.parse::<f64>().ok()
        }
        Value::Array(items) if items.len() == 1 => return coerce_number(&items[0]),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// First candidate carrying text
pub fn text(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|name| fields.get(*name))
        .filter(|value| is_present(value))
        .find_map(value_text)
}

/// First candidate carrying a usable number
pub fn number(fields: &Map<String, Value>, candidates: &[&str]) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|name| fields.get(*name))
        .filter(|value| is_present(value))
        .find_map(coerce_number)
}

/// Linked record id: a bare id or the first element of a link array
pub fn link_id(fields: &Map<String, Value>, candidates: &[&str]) -> Option<String> {
    text(fields, candidates)
}

/// Whether any candidate link field references `needle`, either as one of
/// its ids or as its text value
pub fn links_contain(fields: &Map<String, Value>, candidates: &[&str], needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return false;
    }

    candidates
        .iter()
        .filter_map(|name| fields.get(*name))
        .any(|value| match value {
            Value::Array(items) => items
                .iter()
                .filter_map(value_text)
                .any(|item| item == needle),
            other => value_text(other).is_some_and(|text| text == needle),
        })
}

/// Parse a backend date (`2024-03-01`, RFC 3339 timestamps, `01/03/2024`)
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok())
}

/// First candidate parseable as a date
pub fn date(fields: &Map<String, Value>, candidates: &[&str]) -> Option<NaiveDate> {
    candidates
        .iter()
        .filter_map(|name| fields.get(*name))
        .filter_map(value_text)
        .find_map(|raw| parse_date(&raw))
}

impl Record {
    pub fn text(&self, candidates: &[&str]) -> Option<String> {
        text(&self.fields, candidates)
    }

    pub fn number(&self, candidates: &[&str]) -> Option<f64> {
        number(&self.fields, candidates)
    }

    pub fn date(&self, candidates: &[&str]) -> Option<NaiveDate> {
        date(&self.fields, candidates)
    }

    pub fn link_id(&self, candidates: &[&str]) -> Option<String> {
        link_id(&self.fields, candidates)
    }

    pub fn links_contain(&self, candidates: &[&str], needle: &str) -> bool {
        links_contain(&self.fields, candidates, needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_first_present_skips_blank_and_empty() {
        let map = fields(json!({"Weight": null, "Poids": "  ", "Mass": [], "Kg": 72}));
        assert_eq!(
            first_present(&map, &["Weight", "Poids", "Mass", "Kg"]),
            Some(&json!(72))
        );
        assert_eq!(first_present(&map, &["Weight", "Missing"]), None);
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(coerce_number(&json!(81.5)), Some(81.5));
        assert_eq!(coerce_number(&json!(" 81,5 ")), Some(81.5));
        assert_eq!(coerce_number(&json!([64])), Some(64.0));
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!("NaN")), None);
        assert_eq!(coerce_number(&json!("inf")), None);
        assert_eq!(coerce_number(&json!([1, 2])), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn test_number_falls_through_malformed_candidates() {
        let map = fields(json!({"Weight": "n/a", "Poids": "72.4"}));
        assert_eq!(number(&map, &["Weight", "Poids"]), Some(72.4));
    }

    #[test]
    fn test_text_reads_lookup_arrays() {
        let map = fields(json!({"Name": ["Féline Faure"], "Count": 3}));
        assert_eq!(text(&map, &["Nom", "Name"]).as_deref(), Some("Féline Faure"));
        assert_eq!(text(&map, &["Count"]).as_deref(), Some("3"));
    }

    #[test]
    fn test_link_normalization() {
        let bare = fields(json!({"Élève": "recA"}));
        let array = fields(json!({"Élève": ["recB", "recC"]}));
        assert_eq!(link_id(&bare, &["Élève"]).as_deref(), Some("recA"));
        assert_eq!(link_id(&array, &["Élève"]).as_deref(), Some("recB"));
        assert!(links_contain(&array, &["StudentId", "Élève"], "recC"));
        assert!(!links_contain(&array, &["Élève"], "recD"));
        assert!(!links_contain(&array, &["Élève"], ""));
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(parse_date("2024-03-01"), expected);
        assert_eq!(parse_date("2024-03-01T08:30:00.000Z"), expected);
        assert_eq!(parse_date("01/03/2024"), expected);
        assert_eq!(parse_date("Semaine 3"), None);
    }
}
