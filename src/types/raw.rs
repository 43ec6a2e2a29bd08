//! Loosely-typed provider records and the small set of coercions the rest of the
//! crate needs on top of them.
//!
//! The provider delivers attributes either as a single mapping or as a list of
//! per-period row mappings. [`RawValue`] captures that split once so lookups can
//! pattern-match on it instead of probing the JSON shape at every call site.

use serde_json::{Map, Value};

/// An untyped key/value mapping exactly as delivered by the upstream provider.
pub type RawRecord = Map<String, Value>;

/// One attribute of a [`RawRecord`]: either a single row, or an ordered list of
/// per-period rows (each one usually carrying a `periodo` and a `value` key).
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue<'a> {
    Row(&'a RawRecord),
    Rows(Vec<&'a RawRecord>),
}

impl<'a> RawValue<'a> {
    /// Classifies a JSON value. Scalars have no row structure and yield `None`;
    /// non-object items inside a list are ignored.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Object(row) => Some(RawValue::Row(row)),
            Value::Array(items) => Some(RawValue::Rows(
                items.iter().filter_map(Value::as_object).collect(),
            )),
            _ => None,
        }
    }

    /// Looks up `key` in `record` and classifies it. A missing key or a scalar
    /// value is reported as an empty row list.
    pub fn attribute(record: &'a RawRecord, key: &str) -> Self {
        record
            .get(key)
            .and_then(RawValue::from_value)
            .unwrap_or(RawValue::Rows(Vec::new()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a RawRecord> + '_ {
        let rows: &[&'a RawRecord] = match self {
            RawValue::Row(row) => std::slice::from_ref(row),
            RawValue::Rows(rows) => rows,
        };
        rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        match self {
            RawValue::Row(_) => 1,
            RawValue::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// True for values that carry no data: `null`, `false`, `""`, `[]` and `{}`.
///
/// Numeric zero is a real measurement and is *not* empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Integer coercion accepting JSON integers, whole floats and integer strings.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Float coercion accepting JSON numbers and numeric strings.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// String coercion: strings are returned as-is, numbers are formatted.
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Unwraps list-valued cells to their first element (`["NE"]` → `"NE"`).
pub fn first_element(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Renders a value for error messages without surrounding JSON quotes.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_rows_and_single_row() {
        let list = json!([{ "value": "1", "periodo": "07" }, 3, { "value": "2" }]);
        let single = json!({ "maxima": 30, "minima": 18 });
        let scalar = json!("12");

        let rows = RawValue::from_value(&list).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(RawValue::from_value(&single), Some(RawValue::Row(_))));
        assert!(RawValue::from_value(&scalar).is_none());
    }

    #[test]
    fn missing_attribute_is_empty() {
        let record = json!({ "uvMax": 7 });
        let record = record.as_object().unwrap();
        assert!(RawValue::attribute(record, "estadoCielo").is_empty());
        assert!(RawValue::attribute(record, "uvMax").is_empty());
    }

    #[test]
    fn empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!("0")));
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(value_as_i64(&json!("12")), Some(12));
        assert_eq!(value_as_i64(&json!(-3)), Some(-3));
        assert_eq!(value_as_i64(&json!(4.0)), Some(4));
        assert_eq!(value_as_i64(&json!(4.5)), None);
        assert_eq!(value_as_i64(&json!("12.5")), None);
        assert_eq!(value_as_f64(&json!("12.5")), Some(12.5));
        assert_eq!(value_as_f64(&json!(3)), Some(3.0));
        assert_eq!(value_as_f64(&json!("Ip")), None);
        assert_eq!(value_as_string(&json!(657)), Some("657".to_string()));
        assert_eq!(first_element(&json!(["NE", "N"])), Some(&json!("NE")));
    }
}
