//! Table records and attribute values.
//!
//! A [`Record`] is one table row: a mapping from attribute name to
//! [`AttrValue`]. Only the index attribute is ever inspected by the
//! duplicate finder; everything else is carried along so that duplicate
//! rows can be logged and exported in full.
//!
//! # Canonical JSON
//!
//! Records render as plain JSON (not the DynamoDB wire format):
//!
//! ```
//! use dynadupe::accessor::{AttrValue, Record};
//!
//! let record = Record::from_iter([
//!     ("id", AttrValue::S("a-1".into())),
//!     ("count", AttrValue::N("3".into())),
//! ]);
//! assert_eq!(record.to_json(), r#"{"count":3,"id":"a-1"}"#);
//! ```

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A single attribute value.
///
/// Mirrors the DynamoDB attribute types. Numbers are kept as their decimal
/// string so no precision is lost between the store and the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum AttrValue {
    /// String
    S(String),
    /// Number, as its decimal representation
    N(String),
    /// Binary
    B(Vec<u8>),
    /// Boolean
    Bool(bool),
    /// Null
    Null,
    /// Heterogeneous list
    L(Vec<AttrValue>),
    /// Nested map
    M(BTreeMap<String, AttrValue>),
    /// String set
    Ss(Vec<String>),
    /// Number set
    Ns(Vec<String>),
    /// Binary set
    Bs(Vec<Vec<u8>>),
}

impl AttrValue {
    /// The string payload, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Short DynamoDB type descriptor (`S`, `N`, `BOOL`, ...).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::Null => "NULL",
            Self::L(_) => "L",
            Self::M(_) => "M",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
        }
    }
}

/// Render a DynamoDB number as a JSON number when that is lossless.
///
/// Values an `f64` cannot hold exactly (more than ~17 significant digits,
/// out of range) stay strings with their original digits.
fn number_to_json(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(u) = n.parse::<u64>() {
        return Value::from(u);
    }
    n.parse::<f64>()
        .ok()
        .filter(|f| {
            let exact = canonical_decimal(n);
            exact.is_some() && exact == canonical_decimal(&f.to_string())
        })
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(n.to_string()), Value::Number)
}

/// Decimal text reduced to `(negative, significant digits, exponent)`.
///
/// `"1.50"`, `"15e-1"` and `"0.15E1"` all map to `(false, "15", -1)`.
fn canonical_decimal(text: &str) -> Option<(bool, String, i64)> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(pos) => (&unsigned[..pos], unsigned[pos + 1..].parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{int_part}{frac_part}");
    let mut exponent = exponent.checked_sub(i64::try_from(frac_part.len()).ok()?)?;
    let trimmed = digits.trim_start_matches('0');
    let significant = trimmed.trim_end_matches('0');
    if significant.is_empty() {
        return Some((false, String::new(), 0));
    }
    exponent = exponent.checked_add(i64::try_from(trimmed.len() - significant.len()).ok()?)?;
    Some((negative, significant.to_string(), exponent))
}

impl From<AttrValue> for Value {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::S(s) => Value::String(s),
            AttrValue::N(n) => number_to_json(&n),
            AttrValue::B(b) => Value::String(STANDARD.encode(b)),
            AttrValue::Bool(b) => Value::Bool(b),
            AttrValue::Null => Value::Null,
            AttrValue::L(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            AttrValue::M(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect::<Map<_, _>>(),
            ),
            AttrValue::Ss(items) => Value::Array(items.into_iter().map(Value::String).collect()),
            AttrValue::Ns(items) => Value::Array(items.iter().map(|n| number_to_json(n)).collect()),
            AttrValue::Bs(items) => Value::Array(
                items
                    .into_iter()
                    .map(|b| Value::String(STANDARD.encode(b)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::S(s),
            Value::Number(n) => Self::N(n.to_string()),
            Value::Bool(b) => Self::Bool(b),
            Value::Null => Self::Null,
            Value::Array(items) => Self::L(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::M(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

/// One table row.
///
/// Attributes are kept sorted by name, which makes the JSON rendering
/// stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attributes: BTreeMap<String, AttrValue>,
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) {
        self.attributes.insert(name.into(), value);
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Number of attributes in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the record has no attributes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// A copy of this record holding only `name` (empty if absent).
    #[must_use]
    pub fn project(&self, name: &str) -> Self {
        let mut projected = Self::new();
        if let Some(value) = self.get(name) {
            projected.insert(name, value.clone());
        }
        projected
    }

    /// Canonical single-line JSON rendering used for log lines and exports.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::from(self).to_string()
    }
}

impl From<&Record> for Value {
    fn from(record: &Record) -> Self {
        Value::Object(
            record
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, AttrValue)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
