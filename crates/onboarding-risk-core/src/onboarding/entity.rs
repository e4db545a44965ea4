use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::field_mapping::{all_attribute_names, fields, is_multi_valued};

// ---------------------------------------------------------------------------
// Canonical entity shape
// ---------------------------------------------------------------------------

/// A raw attribute value after boundary clean-up, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// Attribute values keyed by canonical (camelCase) name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: HashMap<String, FieldValue>,
    sanction_match_count: u32,
}

impl Attributes {
    pub fn get(&self, field_name: &str) -> Option<&FieldValue> {
        self.values.get(field_name)
    }

    /// Single text value of a field; `None` for lists or absent fields.
    pub fn text(&self, field_name: &str) -> Option<&str> {
        match self.values.get(field_name)? {
            FieldValue::Text(s) => Some(s.as_str()),
            FieldValue::List(_) => None,
        }
    }

    /// Upstream screening result; absent means no match was found.
    pub fn sanction_match_count(&self) -> u32 {
        self.sanction_match_count
    }

    pub fn insert(&mut self, field_name: &str, value: FieldValue) {
        self.values.insert(field_name.to_string(), value);
    }

    pub fn with(mut self, field_name: &str, value: &str) -> Self {
        self.insert(field_name, FieldValue::Text(value.to_string()));
        self
    }

    pub fn with_list(mut self, field_name: &str, values: &[&str]) -> Self {
        self.insert(
            field_name,
            FieldValue::List(values.iter().map(|v| v.to_string()).collect()),
        );
        self
    }

    pub fn with_sanction_match_count(mut self, count: u32) -> Self {
        self.sanction_match_count = count;
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shareholder {
    /// Zero-based index in the source `shareholders` array.
    pub position: usize,
    /// Declared type, e.g. "Natural Person" or "Offshore Company".
    pub entity_type: Option<String>,
    pub attributes: Attributes,
}

/// A customer record as the engine sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct Entity {
    pub customer_type: Option<String>,
    pub attributes: Attributes,
    pub shareholders: Vec<Shareholder>,
}

impl Entity {
    pub fn new(customer_type: &str, attributes: Attributes) -> Self {
        Self {
            customer_type: Some(customer_type.to_string()),
            attributes,
            shareholders: Vec::new(),
        }
    }

    pub fn with_shareholder(mut self, entity_type: &str, attributes: Attributes) -> Self {
        self.shareholders.push(Shareholder {
            position: self.shareholders.len(),
            entity_type: Some(entity_type.to_string()),
            attributes,
        });
        self
    }

    /// Adapt a flattened JSON record. Never fails: anything unreadable is
    /// treated as absent.
    pub fn from_json(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let shareholders = lookup(map, fields::SHAREHOLDERS)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(position, item)| {
                        item.as_object().map(|map| read_shareholder(position, map))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            customer_type: lookup(map, fields::CUSTOMER_TYPE).and_then(scalar_to_string),
            attributes: read_attributes(map),
            shareholders,
        }
    }
}

impl From<Value> for Entity {
    fn from(value: Value) -> Self {
        Entity::from_json(&value)
    }
}

// ---------------------------------------------------------------------------
// Key resolution
// ---------------------------------------------------------------------------

fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Key spellings tried for a canonical name, highest priority first:
/// camelCase, lowercase, snake_case.
pub fn key_variants(canonical: &str) -> Vec<String> {
    let mut variants = vec![canonical.to_string()];
    for candidate in [canonical.to_lowercase(), camel_to_snake(canonical)] {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// First present, non-null value across the key variants.
fn lookup<'a>(map: &'a Map<String, Value>, canonical: &str) -> Option<&'a Value> {
    key_variants(canonical)
        .iter()
        .filter_map(|k| map.get(k))
        .find(|v| !v.is_null())
}

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        _ => None,
    }
}

fn list_from_values(items: &[Value]) -> Option<FieldValue> {
    let list: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
    if list.is_empty() {
        None
    } else {
        Some(FieldValue::List(list))
    }
}

fn read_field(value: &Value, multi_valued: bool) -> Option<FieldValue> {
    match value {
        Value::Array(items) => list_from_values(items),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed.starts_with('[') {
                // serialized list; malformed JSON reads as absent
                return match serde_json::from_str::<Vec<Value>>(trimmed) {
                    Ok(items) => list_from_values(&items),
                    Err(_) => None,
                };
            }
            if multi_valued && trimmed.contains(',') {
                let parts: Vec<String> = trimmed
                    .split(',')
                    .filter(|p| !p.trim().is_empty())
                    .map(str::to_string)
                    .collect();
                return if parts.is_empty() {
                    None
                } else {
                    Some(FieldValue::List(parts))
                };
            }
            Some(FieldValue::Text(s.clone()))
        }
        other => scalar_to_string(other).map(FieldValue::Text),
    }
}

fn read_match_count(value: Option<&Value>) -> u32 {
    let count = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    count.map_or(0, |c| u32::try_from(c).unwrap_or(u32::MAX))
}

fn read_attributes(map: &Map<String, Value>) -> Attributes {
    let mut attributes = Attributes::default();
    for name in all_attribute_names() {
        if let Some(value) = lookup(map, name).and_then(|v| read_field(v, is_multi_valued(name))) {
            attributes.insert(name, value);
        }
    }
    attributes.sanction_match_count =
        read_match_count(lookup(map, fields::FULL_NAME_SANCTION_MATCH_COUNT));
    attributes
}

fn read_shareholder(position: usize, map: &Map<String, Value>) -> Shareholder {
    let entity_type = ["type", "entity_type", "entityType"]
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(scalar_to_string);
    Shareholder {
        position,
        entity_type,
        attributes: read_attributes(map),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
