//! CIM object paths
//!
//! Untyped WBEM object-path syntax: `//host/namespace:Class.key="v",num=3`.
//! Host and namespace are optional; a path without key bindings names a class.

use cimql_diagnostics::{CIMQL0014, QueryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A key binding value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum KeyValue {
    String(String),
    /// Numeric keys keep their literal text
    Number(String),
    Boolean(bool),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::String(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
            KeyValue::Number(n) => write!(f, "{}", n),
            KeyValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

/// A `name=value` key binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub name: String,
    pub value: KeyValue,
}

impl KeyBinding {
    pub fn new(name: impl Into<String>, value: KeyValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Reference to a CIM class or instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectPath {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<KeyBinding>,
}

impl ObjectPath {
    /// Path naming a class
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            host: None,
            namespace: None,
            class_name: class_name.into(),
            keys: Vec::new(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_key(mut self, name: impl Into<String>, value: KeyValue) -> Self {
        self.keys.push(KeyBinding::new(name, value));
        self
    }

    /// Class name and key bindings, without host or namespace
    pub fn model_path(&self) -> String {
        let mut out = self.class_name.clone();
        for (i, key) in self.keys.iter().enumerate() {
            out.push(if i == 0 { '.' } else { ',' });
            out.push_str(&format!("{}={}", key.name, key.value));
        }
        out
    }

    pub fn key(&self, name: &str) -> Option<&KeyValue> {
        self.keys
            .iter()
            .find(|k| k.name.eq_ignore_ascii_case(name))
            .map(|k| &k.value)
    }
}

fn eq_opt_ignore_case(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for ObjectPath {
    fn eq(&self, other: &Self) -> bool {
        eq_opt_ignore_case(&self.host, &other.host)
            && eq_opt_ignore_case(&self.namespace, &other.namespace)
            && self.class_name.eq_ignore_ascii_case(&other.class_name)
            && self.keys.len() == other.keys.len()
            && self
                .keys
                .iter()
                .all(|k| other.key(&k.name) == Some(&k.value))
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "//{}/", host)?;
        }
        if let Some(ns) = &self.namespace {
            write!(f, "{}:", ns)?;
        }
        write!(f, "{}", self.model_path())
    }
}

fn invalid(input: &str, reason: &str) -> QueryError {
    QueryError::syntax(CIMQL0014, format!("invalid object path '{}': {}", input, reason))
}

/// Split `a="x,y",b=2` on commas outside quotes
fn split_keys(input: &str) -> Result<Vec<&str>, QueryError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(invalid(input, "unterminated string key"));
    }
    parts.push(&input[start..]);
    Ok(parts)
}

fn parse_key_value(input: &str, raw: &str) -> Result<KeyValue, QueryError> {
    if let Some(inner) = raw.strip_prefix('"') {
        let inner = inner
            .strip_suffix('"')
            .ok_or_else(|| invalid(input, "unterminated string key"))?;
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        return Ok(KeyValue::String(out));
    }
    if raw.eq_ignore_ascii_case("true") {
        return Ok(KeyValue::Boolean(true));
    }
    if raw.eq_ignore_ascii_case("false") {
        return Ok(KeyValue::Boolean(false));
    }
    if !raw.is_empty() && raw.parse::<f64>().is_ok() {
        return Ok(KeyValue::Number(raw.to_string()));
    }
    Err(invalid(input, "unrecognized key value"))
}

impl FromStr for ObjectPath {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();
        let mut path = ObjectPath::new("");

        if let Some(after) = rest.strip_prefix("//") {
            let slash = after
                .find('/')
                .ok_or_else(|| invalid(s, "host must be followed by '/'"))?;
            path.host = Some(after[..slash].to_string());
            rest = &after[slash + 1..];
        }

        let (head, keys) = match rest.find('.') {
            Some(dot) => (&rest[..dot], Some(&rest[dot + 1..])),
            None => (rest, None),
        };
        let class_name = match head.rfind(':') {
            Some(colon) => {
                path.namespace = Some(head[..colon].to_string());
                &head[colon + 1..]
            }
            None => head,
        };
        if class_name.is_empty() {
            return Err(invalid(s, "missing class name"));
        }
        path.class_name = class_name.to_string();

        if let Some(keys) = keys {
            for binding in split_keys(keys)? {
                let (name, raw) = binding
                    .split_once('=')
                    .ok_or_else(|| invalid(s, "key binding without '='"))?;
                let value = parse_key_value(s, raw.trim())?;
                path.keys.push(KeyBinding::new(name.trim(), value));
            }
        }
        Ok(path)
    }
}
