//! Execution context: caller-supplied signals that gate conditional steps.
//!
//! Loosely-typed input (CLI strings, JSON numbers of any width) is normalized
//! here, once, into a closed set of value kinds. The condition evaluator only
//! ever compares values of the same kind.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized scalar context value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ContextValue {
    /// Type a raw string once: `true`/`false` become booleans, anything that
    /// parses as a finite number becomes a number, the rest stays text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => return ContextValue::Bool(true),
            "false" => return ContextValue::Bool(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => ContextValue::Number(n),
            _ => ContextValue::Text(raw.to_string()),
        }
    }

    /// Normalize a JSON scalar. Arrays, objects and null have no kind and
    /// are rejected.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(ContextValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(ContextValue::Number),
            serde_json::Value::String(s) => Some(ContextValue::Text(s.clone())),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContextValue::Bool(_) => "bool",
            ContextValue::Number(_) => "number",
            ContextValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Bool(b) => write!(f, "{}", b),
            ContextValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            ContextValue::Number(n) => write!(f, "{}", n),
            ContextValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

/// Numbers are held as `f64`; integers beyond ±2^53 round to the nearest
/// representable value.
impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Number(value as f64)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Number(f64::from(value))
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        ContextValue::Number(f64::from(value))
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Number(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

/// Read-only variable map for one planning call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    values: BTreeMap<String, ContextValue>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextValue)> {
        self.values.iter()
    }

    /// Parse a `key=value` assignment as given on the command line.
    pub fn parse_assignment(assignment: &str) -> Result<(String, ContextValue), String> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| format!("Invalid context assignment '{}': expected key=value", assignment))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("Invalid context assignment '{}': empty key", assignment));
        }
        Ok((key.to_string(), ContextValue::parse(value)))
    }

    /// Build a context from a JSON object. Non-scalar members are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "Context JSON must be an object".to_string())?;

        let mut ctx = Self::new();
        for (key, raw) in object {
            let normalized = ContextValue::from_json(raw).ok_or_else(|| {
                format!("Context value for '{}' must be a string, number or boolean", key)
            })?;
            ctx.insert(key.clone(), normalized);
        }
        Ok(ctx)
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for ExecutionContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}
