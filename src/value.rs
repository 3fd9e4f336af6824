//! Generic value tree consumed and produced by the cleaner.
//!
//! Input trees come straight from a decoded interchange document
//! (`serde_json::Value`), output trees are the same shape except that cleaning
//! may introduce `Date`/`Datetime` leaves and canonical numbers.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    /// Only for integers above `i64::MAX`.
    UInt(u64),
    Float(OrderedFloat<f64>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

// ————————————————————————————————————————————————————————————————————————————
// NUMBER
// ————————————————————————————————————————————————————————————————————————————

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::UInt(u) => u as f64,
            Number::Float(f) => f.0,
        }
    }

    /// Build from an exact integer, keeping `Int` wherever it fits.
    pub fn from_u64(u: u64) -> Number {
        i64::try_from(u).map_or(Number::UInt(u), Number::Int)
    }

    /// Integral floats inside the 64-bit integer range collapse to `Int` (or
    /// `UInt` above `i64::MAX`); everything else is kept.
    pub fn canonical(self) -> Number {
        match self {
            Number::Float(f) if f.0.is_finite() && f.0.fract() == 0.0 => {
                // both bounds are exact powers of two, so the casts below never saturate
                if f.0 >= I64_LOWER && f.0 < I64_UPPER {
                    Number::Int(f.0 as i64)
                } else if f.0 >= I64_UPPER && f.0 < U64_UPPER {
                    Number::UInt(f.0 as u64)
                } else {
                    self
                }
            }
            Number::UInt(u) => Number::from_u64(u),
            other => other,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self.canonical(), Number::Int(_) | Number::UInt(_))
    }

    fn as_i128(self) -> Option<i128> {
        match self {
            Number::Int(i) => Some(i as i128),
            Number::UInt(u) => Some(u as i128),
            Number::Float(_) => None,
        }
    }
}

const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;
const U64_UPPER: f64 = 18_446_744_073_709_551_616.0;

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (Number::Float(a), Number::Float(b)) => a == b,
                (a, b) => a.as_f64() == b.as_f64(),
            },
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::UInt(u) => write!(f, "{u}"),
            // keep a trailing `.0` so floats read back as floats
            Number::Float(x) if x.0.is_finite() && x.0.fract() == 0.0 => write!(f, "{:.1}", x.0),
            Number::Float(x) => write!(f, "{}", x.0),
        }
    }
}

impl From<&serde_json::Number> for Number {
    fn from(n: &serde_json::Number) -> Self {
        if let Some(i) = n.as_i64() {
            Number::Int(i)
        } else if let Some(u) = n.as_u64() {
            Number::UInt(u)
        } else {
            Number::Float(OrderedFloat(n.as_f64().unwrap_or(f64::NAN)))
        }
    }
}

fn json_number(n: Number) -> serde_json::Value {
    match n {
        Number::Int(i) => serde_json::Value::from(i),
        Number::UInt(u) => serde_json::Value::from(u),
        Number::Float(f) => serde_json::Number::from_f64(f.0)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// VALUE
// ————————————————————————————————————————————————————————————————————————————

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Datetime(_) => "datetime",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::as_f64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Datetime(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Mapping lookup; `None` for non-mappings and absent keys.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Text used when a lenient `String` node coerces a value: strings pass
    /// through untouched, dates render in their ISO form, anything else
    /// renders as JSON text.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::Datetime(d) => d.format(DATETIME_OUTPUT_FORMAT).to_string(),
            other => other.to_string(),
        }
    }

    /// Lower back to the interchange tree. Dates become ISO strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Number(n) => json_number(*n),
            Value::String(s) => J::String(s.clone()),
            Value::Date(_) | Value::Datetime(_) => J::String(self.to_plain_string()),
            Value::Sequence(xs) => J::Array(xs.iter().map(Value::to_json).collect()),
            Value::Mapping(m) => J::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            other => {
                let text = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::UInt(u)) => serializer.serialize_u64(*u),
            Value::Number(Number::Float(x)) => serializer.serialize_f64(x.0),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(_) | Value::Datetime(_) => serializer.serialize_str(&self.to_plain_string()),
            Value::Sequence(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs {
                    seq.serialize_element(x)?;
                }
                seq.end()
            }
            Value::Mapping(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

// -------------------- conversions --------------------

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        use serde_json::Value as J;
        match v {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(*b),
            J::Number(n) => Value::Number(n.into()),
            J::String(s) => Value::String(s.clone()),
            J::Array(xs) => Value::Sequence(xs.iter().map(Value::from).collect()),
            J::Object(m) => Value::Mapping(
                m.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from(&v)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Number::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Number(Number::Int(i as i64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(Number::Float(OrderedFloat(f)))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Datetime(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::Sequence(xs)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Mapping(m)
    }
}

// ------------------------------- Tests ------------------------------------ //
