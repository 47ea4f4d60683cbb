use serde_json::Value;

/// Textual form of an `id` value; string and numeric ids compare by this
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// True when the record's `id` field matches the path id
pub fn id_matches(record: &Value, id: &str) -> bool {
    record.get("id").and_then(id_text).is_some_and(|candidate| candidate == id)
}

/// An `id` counts as present when it is not null, false, zero or the empty string
pub fn has_present_id(record: &Value) -> bool {
    match record.get("id") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Case-insensitive substring match against a string field; missing or
/// non-string fields never match
pub fn field_contains(record: &Value, field: &str, needle_lower: &str) -> bool {
    record
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|text| text.to_lowercase().contains(needle_lower))
}

/// Case-insensitive substring match against every string field of a record
pub fn any_field_contains(record: &Value, needle_lower: &str) -> bool {
    match record {
        Value::Object(map) => map.values().any(|v| match v {
            Value::String(s) => s.to_lowercase().contains(needle_lower),
            _ => false,
        }),
        _ => false,
    }
}

/// Compare a field against a query-string value the way a query string can
/// express it: strings verbatim, numbers and booleans by their text
pub fn field_equals(record: &Value, field: &str, expected: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        Some(Value::Null) => expected == "null",
        _ => false,
    }
}
