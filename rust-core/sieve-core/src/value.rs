// SPDX-License-Identifier: PMPL-1.0-or-later
//! Dynamic values carried by conditions and records.
//!
//! [`Value`] is the tagged union every operator pattern-matches on. JSON
//! input only ever produces the JSON-shaped variants; the temporal and uuid
//! variants appear once a value has gone through [`crate::coerce`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::coerce;
use crate::error::{OperatorError, QueryError};

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Interval(Duration),
    Uuid(Uuid),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Convert any serializable record into a [`Value`] tree.
    ///
    /// Structs become maps keyed by field name, sequences become lists.
    pub fn from_serialize<T: Serialize + ?Sized>(item: &T) -> Result<Value, QueryError> {
        Ok(Value::from(serde_json::to_value(item)?))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
            Value::Interval(_) => "interval",
            Value::Uuid(_) => "uuid",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Convert back into plain JSON.
    ///
    /// Temporal values become ISO-8601 strings, intervals become seconds and
    /// non-finite floats become `"NaN"`, `"inf"` or `"-inf"`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Interval(d) => serde_json::Value::from(interval_seconds(d)),
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Uuid(_) => {
                serde_json::Value::String(self.to_string())
            }
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Tag naming the variant when [`Value::to_json`] alone would not
    /// decode back to it.
    ///
    /// A list carries a kind when every non-null element shares it; finite
    /// floats travel alongside non-finite ones. `None` for JSON-shaped values.
    pub fn wire_kind(&self) -> Option<&'static str> {
        match self {
            Value::Float(f) if !f.is_finite() => Some("float"),
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Interval(_) | Value::Uuid(_) => {
                Some(self.type_name())
            }
            Value::List(items) => {
                let mut kind = None;
                for item in items.iter().filter(|item| !item.is_null()) {
                    let item_kind = match item {
                        Value::Float(_) => "float",
                        other => other.wire_kind()?,
                    };
                    if *kind.get_or_insert(item_kind) != item_kind {
                        return None;
                    }
                }
                kind.filter(|k| *k != "float" || items.iter().any(|item| item.wire_kind().is_some()))
            }
            _ => None,
        }
    }

    /// Re-type a value decoded from JSON under a [`Value::wire_kind`] tag.
    ///
    /// Lists are restored element-wise. `None` when the kind is unknown or
    /// an element is not in that kind's JSON form.
    pub fn restore_kind(self, kind: &str) -> Option<Value> {
        match (self, kind) {
            (Value::Null, _) => Some(Value::Null),
            (Value::List(items), _) => items
                .into_iter()
                .map(|item| item.restore_kind(kind))
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            (Value::String(s), "float") => s.trim().parse::<f64>().ok().map(Value::Float),
            (number @ (Value::Int(_) | Value::Float(_)), "float") => Some(number),
            (Value::String(s), "date") => coerce::parse_date(&s).map(Value::Date),
            (Value::String(s), "datetime") => coerce::parse_datetime(&s).map(Value::DateTime),
            (Value::String(s), "time") => coerce::parse_time(&s).map(Value::Time),
            (Value::String(s), "uuid") => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),
            (Value::String(s), "interval") => coerce::parse_interval(&s).map(Value::Interval),
            (number @ (Value::Int(_) | Value::Float(_)), "interval") => number
                .as_f64()
                .and_then(coerce::seconds_to_duration)
                .map(Value::Interval),
            _ => None,
        }
    }

    /// Equality with numeric widening.
    ///
    /// Integers and floats compare by magnitude, a date equals the datetime
    /// at its midnight, and a string compared against a temporal or uuid
    /// value is parsed into that kind first.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Date(a), Value::DateTime(b)) | (Value::DateTime(b), Value::Date(a)) => {
                a.and_time(NaiveTime::MIN) == *b
            }
            (Value::String(s), typed) | (typed, Value::String(s)) if typed.is_parsed_kind() => {
                parse_as(s, typed).is_some_and(|parsed| parsed.loose_eq(typed))
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.loose_eq(other)))
            }
            (a, b) => a == b,
        }
    }

    /// Ordering between two values of comparable kinds.
    ///
    /// Fails with [`OperatorError::TypeMismatch`] when the kinds cannot be
    /// ordered against each other (including anything against null).
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering, OperatorError> {
        let mismatch = || {
            OperatorError::TypeMismatch(format!(
                "cannot order {} against {}",
                self.type_name(),
                other.type_name()
            ))
        };

        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let (a, b) = (self.as_f64(), other.as_f64());
                a.zip(b)
                    .and_then(|(a, b)| a.partial_cmp(&b))
                    .ok_or_else(mismatch)
            }
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Ok(a.cmp(b)),
            (Value::Date(a), Value::DateTime(b)) => Ok(a.and_time(NaiveTime::MIN).cmp(b)),
            (Value::DateTime(a), Value::Date(b)) => Ok(a.cmp(&b.and_time(NaiveTime::MIN))),
            (Value::Time(a), Value::Time(b)) => Ok(a.cmp(b)),
            (Value::Interval(a), Value::Interval(b)) => Ok(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Ok(a.cmp(b)),
            (Value::String(s), typed) if typed.is_parsed_kind() => parse_as(s, typed)
                .ok_or_else(mismatch)
                .and_then(|parsed| parsed.try_cmp(typed)),
            (typed, Value::String(s)) if typed.is_parsed_kind() => parse_as(s, typed)
                .ok_or_else(mismatch)
                .and_then(|parsed| typed.try_cmp(&parsed)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => continue,
                        unequal => return Ok(unequal),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(mismatch()),
        }
    }

    /// Total ordering used for sorting heterogeneous data.
    ///
    /// Comparable kinds use [`Value::try_cmp`]; anything else falls back to
    /// a fixed rank per kind so a sort never fails half way through.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        self.try_cmp(other)
            .unwrap_or_else(|_| self.kind_rank().cmp(&other.kind_rank()))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Date(_) | Value::DateTime(_) => 4,
            Value::Time(_) => 5,
            Value::Interval(_) => 6,
            Value::Uuid(_) => 7,
            Value::List(_) => 8,
            Value::Map(_) => 9,
        }
    }

    /// Kinds that a plain string can be parsed into for comparison.
    fn is_parsed_kind(&self) -> bool {
        matches!(
            self,
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Interval(_) | Value::Uuid(_)
        )
    }
}

/// Parse `raw` into the same kind as `like`.
fn parse_as(raw: &str, like: &Value) -> Option<Value> {
    match like {
        Value::Date(_) => coerce::parse_date(raw)
            .or_else(|| coerce::parse_datetime(raw).map(|dt| dt.date()))
            .map(Value::Date),
        Value::DateTime(_) => coerce::parse_datetime(raw)
            .or_else(|| coerce::parse_date(raw).map(|d| d.and_time(NaiveTime::MIN)))
            .map(Value::DateTime),
        Value::Time(_) => coerce::parse_time(raw).map(Value::Time),
        Value::Interval(_) => coerce::parse_interval(raw).map(Value::Interval),
        Value::Uuid(_) => Uuid::parse_str(raw.trim()).ok().map(Value::Uuid),
        _ => None,
    }
}

fn interval_seconds(d: &Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::Interval(d) => write!(f, "{}", interval_seconds(d)),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
            Value::List(_) | Value::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
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
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Interval(d) => serializer.serialize_f64(interval_seconds(d)),
            Value::Date(_) | Value::DateTime(_) | Value::Time(_) | Value::Uuid(_) => {
                serializer.collect_str(self)
            }
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion_keeps_integers() {
        let value = Value::from(json!({"age": 25, "score": 1.5, "tags": ["a"]}));
        let map = value.as_map().unwrap();
        assert_eq!(map["age"], Value::Int(25));
        assert_eq!(map["score"], Value::Float(1.5));
        assert_eq!(map["tags"], Value::List(vec![Value::from("a")]));
        assert_eq!(value.to_json(), json!({"age": 25, "score": 1.5, "tags": ["a"]}));
    }

    #[test]
    fn test_loose_eq_widens_numbers() {
        assert!(Value::Int(3).loose_eq(&Value::Float(3.0)));
        assert!(Value::Float(3.0).loose_eq(&Value::Int(3)));
        assert!(!Value::Int(3).loose_eq(&Value::from("3")));
    }

    #[test]
    fn test_loose_eq_parses_strings_against_dates() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(Value::from("2024-01-15").loose_eq(&date));
        assert!(date.loose_eq(&Value::from("2024-01-15")));
        assert!(!Value::from("2024-01-16").loose_eq(&date));
    }

    #[test]
    fn test_try_cmp_mismatch() {
        assert!(Value::from("abc").try_cmp(&Value::Int(1)).is_err());
        assert!(Value::Null.try_cmp(&Value::Int(1)).is_err());
        assert_eq!(Value::Int(1).try_cmp(&Value::Float(1.5)).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_sort_cmp_is_total() {
        assert_eq!(Value::from("a").sort_cmp(&Value::Int(1)), Ordering::Greater);
        assert_eq!(Value::Int(2).sort_cmp(&Value::Int(1)), Ordering::Greater);
    }

    #[test]
    fn test_from_serialize_struct() {
        #[derive(Serialize)]
        struct Item {
            name: String,
            qty: u32,
        }
        let v = Value::from_serialize(&Item { name: "x".into(), qty: 2 }).unwrap();
        assert_eq!(v.as_map().unwrap()["qty"], Value::Int(2));
    }

    #[test]
    fn test_serialize_temporal_as_string() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let json = serde_json::to_string(&Value::DateTime(dt)).unwrap();
        assert_eq!(json, "\"2024-03-01T10:30:00\"");
    }

    #[test]
    fn test_wire_kind_restores_typed_values() {
        let dates = Value::List(vec![
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Value::Null,
            Value::Date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()),
        ]);
        let interval = Value::Interval(Duration::milliseconds(90_500));
        let floats = Value::List(vec![Value::Float(1.5), Value::Float(f64::INFINITY)]);

        for value in [dates, interval, floats] {
            let kind = value.wire_kind().unwrap();
            let decoded = Value::from(value.to_json()).restore_kind(kind);
            assert_eq!(decoded, Some(value));
        }
    }

    #[test]
    fn test_wire_kind_absent_for_json_shapes() {
        assert_eq!(Value::Float(2.5).wire_kind(), None);
        assert_eq!(Value::List(vec![Value::Float(1.0), Value::Int(2)]).wire_kind(), None);
        let mixed = Value::List(vec![
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            Value::from("2024-01-02"),
        ]);
        assert_eq!(mixed.wire_kind(), None);
        assert_eq!(Value::from("soon").restore_kind("date"), None);
        assert_eq!(Value::from("x").restore_kind("colour"), None);
        assert_eq!(Value::Float(f64::NAN).to_json(), json!("NaN"));
    }
}
