//! Conversion between raw field text and the JSON stored in the record.
//!
//! [`parse_input`] turns what the admin typed into the value to store, or a
//! rejection reason that flags the field. [`display_value`] renders the
//! stored value back into editable text.

use serde_json::Value;

use super::field::{FieldDescriptor, FieldKind, NumberKind};
use super::path;
use crate::model::split_list;

/// Parse raw input for `field`.
///
/// `Err` carries the reason the input was rejected; the caller must leave
/// the record untouched in that case. Numbers are the exception: an
/// unparseable number is stored as `null` rather than rejected.
pub fn parse_input(field: &FieldDescriptor, raw: &str) -> Result<Value, String> {
    let text = raw.trim();
    match field.kind {
        FieldKind::Text => Ok(Value::String(text.to_string())),
        FieldKind::Number(kind) => Ok(parse_number(kind, text)),
        FieldKind::Select(options) => {
            if options.contains(&text) {
                Ok(Value::String(text.to_string()))
            } else {
                Err(format!("expected one of: {}", options.join(", ")))
            }
        }
        FieldKind::Switch => parse_switch(text)
            .map(Value::Bool)
            .ok_or_else(|| "expected true or false".to_string()),
        FieldKind::Color => normalize_color(text)
            .map(Value::String)
            .ok_or_else(|| "expected a hex color like #7c3aed".to_string()),
        FieldKind::Json => {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(text).map_err(|e| format!("invalid JSON: {e}"))
        }
        FieldKind::List => Ok(Value::Array(
            split_list(text).into_iter().map(Value::String).collect(),
        )),
    }
}

/// Render the stored value of `field` as editable text, falling back to the
/// descriptor's default when the record has nothing usable.
pub fn display_value(field: &FieldDescriptor, record: &Value) -> String {
    let value = match path::get(record, field.path) {
        None | Some(Value::Null) => return field.default.to_string(),
        Some(value) => value,
    };

    match (field.kind, value) {
        (FieldKind::Json, value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        (FieldKind::List, Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        (FieldKind::List, _) => String::new(),
        (FieldKind::Switch, Value::Bool(b)) => b.to_string(),
        (FieldKind::Switch, _) => field.default.to_string(),
        (_, Value::String(s)) if s.is_empty() => field.default.to_string(),
        (_, Value::String(s)) => s.clone(),
        (_, other) => other.to_string(),
    }
}

fn parse_number(kind: NumberKind, text: &str) -> Value {
    let Ok(n) = text.parse::<f64>() else {
        return Value::Null;
    };
    if !n.is_finite() {
        return Value::Null;
    }
    match kind {
        NumberKind::Integer => match text.parse::<i64>() {
            Ok(i) => Value::from(i),
            // "300.7" keeps its integer part, like parseInt.
            Err(_) => Value::from(n.trunc() as i64),
        },
        NumberKind::Float => Value::from(n),
    }
}

/// Accepts the same words the config layer treats as booleans.
pub fn parse_switch(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Normalize `#rgb`, `#rrggbb` (hash optional) to lowercase `#rrggbb`.
pub fn normalize_color(text: &str) -> Option<String> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    Some(format!("#{}", expanded.to_ascii_lowercase()))
}

/// RGB components of a hex color, for drawing a swatch.
pub fn color_rgb(text: &str) -> Option<(u8, u8, u8)> {
    let hex = normalize_color(text)?;
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(1)?, channel(3)?, channel(5)?))
}
