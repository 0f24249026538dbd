//! Records of field values supplied at evaluation time

use ahash::AHashMap;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyString};
use std::fmt;

use crate::error::RuleEngineError;

/// Runtime value of a record field
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Int(i64),
    Float(f64),
    String(String),
}

impl RuntimeValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            RuntimeValue::Int(_) => "int",
            RuntimeValue::Float(_) => "float",
            RuntimeValue::String(_) => "string",
        }
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Int(i) => write!(f, "{}", i),
            RuntimeValue::Float(v) => write!(f, "{:?}", v),
            RuntimeValue::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for RuntimeValue {
    fn from(value: i64) -> Self {
        RuntimeValue::Int(value)
    }
}

impl From<i32> for RuntimeValue {
    fn from(value: i32) -> Self {
        RuntimeValue::Int(value.into())
    }
}

impl From<f64> for RuntimeValue {
    fn from(value: f64) -> Self {
        RuntimeValue::Float(value)
    }
}

impl From<&str> for RuntimeValue {
    fn from(value: &str) -> Self {
        RuntimeValue::String(value.to_string())
    }
}

impl From<String> for RuntimeValue {
    fn from(value: String) -> Self {
        RuntimeValue::String(value)
    }
}

/// Mapping from field name to runtime value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: AHashMap<String, RuntimeValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RuntimeValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RuntimeValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&RuntimeValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<RuntimeValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

/// Deserialize a record from a Python dict of str -> int | float | str
pub fn record_from_py(dict: &Bound<'_, PyDict>) -> PyResult<Record> {
    let mut record = Record::new();

    for (key, value) in dict.iter() {
        let field: String = key.extract()?;

        // bool is a subclass of int in Python; reject it before the int check
        let runtime_value = if value.is_instance_of::<PyBool>() {
            None
        } else if value.is_instance_of::<PyInt>() {
            Some(RuntimeValue::Int(value.extract()?))
        } else if value.is_instance_of::<PyFloat>() {
            Some(RuntimeValue::Float(value.extract()?))
        } else if value.is_instance_of::<PyString>() {
            Some(RuntimeValue::String(value.extract()?))
        } else {
            None
        };

        match runtime_value {
            Some(v) => record.fields.insert(field, v),
            None => {
                let type_name = value.get_type().name()?.to_string();
                return Err(RuleEngineError::InvalidRecordValue { field, type_name }.into());
            }
        };
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = Record::new().with("age", 20).with("status", "active");
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("age"), Some(&RuntimeValue::Int(20)));
        assert_eq!(
            record.get("status"),
            Some(&RuntimeValue::String("active".to_string()))
        );
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_record_from_iter() {
        let record: Record = vec![("a", 1i64), ("b", 2i64)].into_iter().collect();
        assert_eq!(record.get("b"), Some(&RuntimeValue::Int(2)));
    }
}
