//! Filter formula construction
//!
//! Values are embedded as single-quoted string literals; quotes and
//! backslashes are escaped so a token can never close the literal early.

/// Quote `value` as a formula string literal
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// `{field} = 'value'`
pub fn field_equals(field: &str, value: &str) -> String {
    format!("{{{}}} = {}", field, quote(value))
}

/// Matches records whose field (link list or text) mentions `value`
pub fn field_contains(field: &str, value: &str) -> String {
    format!("FIND({}, {{{}}} & '') > 0", quote(value), field)
}

/// `RECORD_ID() = 'value'`
pub fn record_id_equals(value: &str) -> String {
    format!("RECORD_ID() = {}", quote(value))
}

/// Disjunction of `formulas`, the formula itself when there is only one
pub fn any_of(formulas: &[String]) -> String {
    match formulas {
        [single] => single.clone(),
        _ => format!("OR({})", formulas.join(", ")),
    }
}
