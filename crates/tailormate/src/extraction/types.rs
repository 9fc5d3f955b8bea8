//! Wire types returned by the extraction service.
//!
//! Everything here is lenient: the service is an AI model, so missing
//! fields, `null`s and odd leaf types are expected and must not fail the
//! whole response.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// One parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub raw_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub structured: StructuredFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFields {
    #[serde(default, deserialize_with = "lenient_text")]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub measurements: Option<Measurements>,
    #[serde(
        default,
        deserialize_with = "lenient_notes",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_items: Option<Vec<OrderItemDraft>>,
}

impl StructuredFields {
    /// The client name, or `None` when absent or blank.
    pub fn client_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Section → key → leaf, in the order the service sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measurements(pub IndexMap<String, MeasurementSection>);

impl Measurements {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &MeasurementSection)> {
        self.0.iter()
    }

    /// The blob as stored on the measurement session, key order intact.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// A garment section. Only mappings carry measurements; anything else is
/// kept in the blob but produces no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasurementSection {
    Fields(IndexMap<String, LeafValue>),
    Scalar(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeafValue {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

impl LeafValue {
    /// Numeric reading of the leaf, see [`coerce_measurement`].
    pub fn coerce(&self) -> Option<f64> {
        match self {
            LeafValue::Number(n) => coerce_measurement(&n.to_string()),
            LeafValue::Text(s) => coerce_measurement(s),
            LeafValue::Other(serde_json::Value::Null | serde_json::Value::Object(_)) => None,
            LeafValue::Other(v) => coerce_measurement(&v.to_string()),
        }
    }
}

/// Drops every character that is not an ASCII digit or `.`, then reads the
/// longest leading decimal number. `"108cm"` is 108, `"88 cm"` is 88,
/// `"bad"` and `""` are `None`. A second `.` ends the number.
///
/// Zero is a reading like any other: `"0"` is `Some(0.0)`, not `None`.
pub fn coerce_measurement(text: &str) -> Option<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    for (i, c) in kept.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        } else {
            seen_digit = true;
        }
        end = i + 1;
    }

    if !seen_digit {
        return None;
    }
    kept[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A garment line on an order form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDraft {
    #[serde(default, deserialize_with = "lenient_garment")]
    pub garment: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<u32>,
}

impl OrderItemDraft {
    /// Quantity to persist. Missing or zero counts as one.
    pub fn effective_quantity(&self) -> u32 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Strings pass through and numbers are written out. Anything else reads
/// as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_garment<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

/// A single string is one note. Non-string entries of a list are dropped.
fn lenient_notes<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(vec![s]),
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// `None` when the value does not have the expected shape.
fn lenient_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => {
            tracing::debug!("Ignoring malformed extraction field: {}", e);
            Ok(None)
        }
    }
}

/// Accepts `2`, `2.0` and `"2"`. Anything else reads as no quantity.
fn lenient_quantity<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let quantity = match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(quantity.and_then(|q| u32::try_from(q).ok()))
}
