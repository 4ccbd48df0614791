//! Human-readable rendering of the value that failed validation

use super::metadata::EntityMetadata;
use super::value::{CustomValue, EntityRef, FieldValue};

/// Render `value` for a violation message
///
/// `lookup` supplies metadata for referenced entities so identifiers are
/// listed in key order.
pub fn describe<'m, F>(value: &FieldValue, lookup: &F) -> String
where
    F: Fn(&str) -> Option<&'m EntityMetadata>,
{
    match value {
        FieldValue::Null => "null".to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Int(n) => n.to_string(),
        FieldValue::Float(x) => x.to_string(),
        FieldValue::Text(s) => format!("\"{s}\""),
        FieldValue::Timestamp(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        FieldValue::Custom(custom) => describe_custom(custom),
        FieldValue::Ref(reference) => describe_ref(reference, lookup),
    }
}

/// A custom-typed value has no identifiers to fall back on
fn describe_custom(custom: &CustomValue) -> String {
    match custom.display() {
        Some(display) => display.to_string(),
        None => format!("object({})", custom.type_name()),
    }
}

fn describe_ref<'m, F>(reference: &EntityRef, lookup: &F) -> String
where
    F: Fn(&str) -> Option<&'m EntityMetadata>,
{
    if let Some(display) = reference.display() {
        return display.to_string();
    }

    let identifiers: Vec<(&str, &FieldValue)> = match lookup(reference.entity()) {
        Some(meta) => meta
            .identifier_fields()
            .iter()
            .filter_map(|name| reference.identifier(name).map(|v| (name.as_str(), v)))
            .collect(),
        None => reference
            .identifiers()
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect(),
    };

    if identifiers.is_empty() {
        return format!("object({})", reference.entity());
    }

    let parts: Vec<String> = identifiers
        .into_iter()
        .map(|(name, value)| format!("{name}={}", describe(value, lookup)))
        .collect();
    format!("{}({})", reference.entity(), parts.join(", "))
}
