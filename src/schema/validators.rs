//! Configuration validation
//!
//! Type checks, presence rules and per-attribute validators, reported as
//! [`Diagnostic`]s keyed by attribute path (`conditions.users.include_groups[0]`).

use super::{AttributeKind, ElementKind, Schema};
use base64::Engine;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{LazyLock, Mutex};

const ISO_DURATION_PATTERN: &str =
    r"^-?P(?:\d+Y)?(?:\d+M)?(?:\d+W)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?$";

/// Compiled validator patterns, keyed by source
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn compiled(pattern: &'static str) -> Result<Regex, regex::Error> {
    let mut cache = PATTERNS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache.insert(pattern, re.clone());
    Ok(re)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: String,
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl Diagnostic {
    pub fn error(path: &str, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.to_string(),
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(path: &str, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.to_string(),
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "<root>" } else { &self.path };
        write!(f, "{}: {}", path, self.summary)?;
        if !self.detail.is_empty() {
            write!(f, " ({})", self.detail)?;
        }
        Ok(())
    }
}

/// Value constraint attached to an attribute
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Validator {
    StringLength { min: usize, max: Option<usize> },
    OneOf { values: &'static [&'static str] },
    EachOneOf { values: &'static [&'static str] },
    Regex { pattern: &'static str, message: &'static str },
    Uuid,
    EachUuid,
    Int64Range { min: i64, max: i64 },
    SizeAtLeast { min: usize },
    SizeAtMost { max: usize },
    Rfc3339DateTime,
    IsoDuration,
    Base64,
    ConflictsWith { attributes: &'static [&'static str] },
    AlsoRequires { attributes: &'static [&'static str] },
}

impl Validator {
    pub fn length(min: usize, max: usize) -> Self {
        Self::StringLength { min, max: Some(max) }
    }

    pub fn one_of(values: &'static [&'static str]) -> Self {
        Self::OneOf { values }
    }

    pub fn each_one_of(values: &'static [&'static str]) -> Self {
        Self::EachOneOf { values }
    }

    pub fn regex(pattern: &'static str, message: &'static str) -> Self {
        Self::Regex { pattern, message }
    }

    pub fn range(min: i64, max: i64) -> Self {
        Self::Int64Range { min, max }
    }

    pub fn conflicts_with(attributes: &'static [&'static str]) -> Self {
        Self::ConflictsWith { attributes }
    }

    pub fn also_requires(attributes: &'static [&'static str]) -> Self {
        Self::AlsoRequires { attributes }
    }

    /// Check `value` (never null) with access to its sibling attributes
    fn check(&self, value: &Value, siblings: &Map<String, Value>, path: &str, diags: &mut Vec<Diagnostic>) {
        match self {
            Self::StringLength { min, max } => {
                if let Some(s) = value.as_str() {
                    let len = s.chars().count();
                    if len < *min || max.is_some_and(|m| len > m) {
                        let bound = match max {
                            Some(m) => format!("between {} and {}", min, m),
                            None => format!("at least {}", min),
                        };
                        diags.push(Diagnostic::error(
                            path,
                            "Invalid string length",
                            format!("length must be {} characters, got {}", bound, len),
                        ));
                    }
                }
            }
            Self::OneOf { values } => {
                if let Some(s) = value.as_str() {
                    if !values.contains(&s) {
                        diags.push(one_of_error(path, s, values));
                    }
                }
            }
            Self::EachOneOf { values } => {
                for (i, item) in array_items(value) {
                    if let Some(s) = item.as_str() {
                        if !values.contains(&s) {
                            diags.push(one_of_error(&index_path(path, i), s, values));
                        }
                    }
                }
            }
            Self::Regex { pattern, message } => {
                if let Some(s) = value.as_str() {
                    match compiled(pattern) {
                        Ok(re) if re.is_match(s) => {}
                        Ok(_) => diags.push(Diagnostic::error(path, "Invalid value", *message)),
                        Err(e) => diags.push(Diagnostic::error(
                            path,
                            "Invalid validation pattern",
                            e.to_string(),
                        )),
                    }
                }
            }
            Self::Uuid => {
                if let Some(s) = value.as_str() {
                    check_uuid(s, path, diags);
                }
            }
            Self::EachUuid => {
                for (i, item) in array_items(value) {
                    if let Some(s) = item.as_str() {
                        check_uuid(s, &index_path(path, i), diags);
                    }
                }
            }
            Self::Int64Range { min, max } => {
                if let Some(n) = value.as_i64() {
                    if n < *min || n > *max {
                        diags.push(Diagnostic::error(
                            path,
                            "Value out of range",
                            format!("must be between {} and {}, got {}", min, max, n),
                        ));
                    }
                }
            }
            Self::SizeAtLeast { min } => {
                if let Some(items) = value.as_array() {
                    if items.len() < *min {
                        diags.push(Diagnostic::error(
                            path,
                            "Too few elements",
                            format!("must contain at least {} element(s)", min),
                        ));
                    }
                }
            }
            Self::SizeAtMost { max } => {
                if let Some(items) = value.as_array() {
                    if items.len() > *max {
                        diags.push(Diagnostic::error(
                            path,
                            "Too many elements",
                            format!("must contain at most {} element(s)", max),
                        ));
                    }
                }
            }
            Self::Rfc3339DateTime => {
                if let Some(s) = value.as_str() {
                    if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                        diags.push(Diagnostic::error(
                            path,
                            "Invalid date-time",
                            format!("'{}' is not an RFC 3339 timestamp", s),
                        ));
                    }
                }
            }
            Self::IsoDuration => {
                if let Some(s) = value.as_str() {
                    let valid = s != "P"
                        && s != "PT"
                        && !s.ends_with('T')
                        && compiled(ISO_DURATION_PATTERN).is_ok_and(|re| re.is_match(s));
                    if !valid {
                        diags.push(Diagnostic::error(
                            path,
                            "Invalid duration",
                            format!("'{}' is not an ISO 8601 duration (e.g. PT1H, P30D)", s),
                        ));
                    }
                }
            }
            Self::Base64 => {
                if let Some(s) = value.as_str() {
                    if base64::engine::general_purpose::STANDARD.decode(s).is_err() {
                        diags.push(Diagnostic::error(
                            path,
                            "Invalid base64",
                            "value must be standard base64",
                        ));
                    }
                }
            }
            Self::ConflictsWith { attributes } => {
                for other in attributes.iter() {
                    if siblings.get(*other).is_some_and(|v| !v.is_null()) {
                        diags.push(Diagnostic::error(
                            path,
                            "Conflicting attributes",
                            format!("cannot be set together with '{}'", other),
                        ));
                    }
                }
            }
            Self::AlsoRequires { attributes } => {
                for other in attributes.iter() {
                    if siblings.get(*other).map_or(true, Value::is_null) {
                        diags.push(Diagnostic::error(
                            path,
                            "Missing dependent attribute",
                            format!("'{}' must also be set", other),
                        ));
                    }
                }
            }
        }
    }
}

/// Validate a configuration object against `schema`
pub fn validate_config(schema: &Schema, config: &Value) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let empty = Map::new();

    match config {
        Value::Object(map) => validate_object(schema, map, "", &mut diags),
        Value::Null => validate_object(schema, &empty, "", &mut diags),
        _ => diags.push(Diagnostic::error("", "Invalid configuration", "expected an object")),
    }

    diags
}

fn validate_object(schema: &Schema, map: &Map<String, Value>, path: &str, diags: &mut Vec<Diagnostic>) {
    for key in map.keys() {
        if schema.get(key).is_none() {
            diags.push(Diagnostic::error(
                &join_path(path, key),
                "Unsupported attribute",
                "this attribute is not defined by the schema",
            ));
        }
    }

    for (name, attr) in &schema.attributes {
        let attr_path = join_path(path, name);
        let value = map.get(*name).unwrap_or(&Value::Null);

        if value.is_null() {
            if attr.required {
                diags.push(Diagnostic::error(
                    &attr_path,
                    "Missing required attribute",
                    attr.description,
                ));
            }
            continue;
        }

        if attr.is_read_only() {
            diags.push(Diagnostic::error(
                &attr_path,
                "Read-only attribute",
                "this attribute is computed by Microsoft Graph and cannot be configured",
            ));
            continue;
        }

        if let Some(advice) = attr.deprecation {
            diags.push(Diagnostic::warning(&attr_path, "Deprecated attribute", advice));
        }

        if !check_kind(&attr.kind, value, &attr_path, diags) {
            continue;
        }

        for validator in &attr.validators {
            validator.check(value, map, &attr_path, diags);
        }
    }

    // computed-only branches (data sources) are never configured
    if schema.derived_attributes().any(|(_, a)| !a.is_read_only()) {
        let names: Vec<&str> = schema.derived_attributes().map(|(n, _)| n).collect();
        let set: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| map.get(*n).is_some_and(|v| !v.is_null()))
            .collect();

        if set.len() != 1 {
            let summary = if set.is_empty() {
                "Missing derived type"
            } else {
                "Conflicting derived types"
            };
            diags.push(Diagnostic::error(
                path,
                summary,
                format!("exactly one of [{}] must be set", names.join(", ")),
            ));
        }
    }
}

/// Returns false when the value has the wrong shape (validators are skipped then)
fn check_kind(kind: &AttributeKind, value: &Value, path: &str, diags: &mut Vec<Diagnostic>) -> bool {
    match kind {
        AttributeKind::String => expect(value.is_string(), "string", path, diags),
        AttributeKind::Bool => expect(value.is_boolean(), "bool", path, diags),
        AttributeKind::Int64 => expect(value.is_i64(), "int64", path, diags),
        AttributeKind::Float64 => expect(value.is_number(), "number", path, diags),
        AttributeKind::List(element) | AttributeKind::Set(element) => {
            let Some(items) = value.as_array() else {
                return expect(false, "list", path, diags);
            };
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                ok &= check_element(*element, item, &index_path(path, i), diags);
            }
            if kind.is_unordered() && has_duplicates(items) {
                diags.push(Diagnostic::error(
                    path,
                    "Duplicate set element",
                    "set elements must be unique",
                ));
                ok = false;
            }
            ok
        }
        AttributeKind::SingleNested(schema) => match value.as_object() {
            Some(map) => {
                validate_object(schema, map, path, diags);
                true
            }
            None => expect(false, "object", path, diags),
        },
        AttributeKind::ListNested(schema) | AttributeKind::SetNested(schema) => {
            let Some(items) = value.as_array() else {
                return expect(false, "list of objects", path, diags);
            };
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                let item_path = index_path(path, i);
                match item.as_object() {
                    Some(map) => validate_object(schema, map, &item_path, diags),
                    None => ok &= expect(false, "object", &item_path, diags),
                }
            }
            ok
        }
    }
}

fn check_element(element: ElementKind, value: &Value, path: &str, diags: &mut Vec<Diagnostic>) -> bool {
    match element {
        ElementKind::String => expect(value.is_string(), "string", path, diags),
        ElementKind::Bool => expect(value.is_boolean(), "bool", path, diags),
        ElementKind::Int64 => expect(value.is_i64(), "int64", path, diags),
        ElementKind::Float64 => expect(value.is_number(), "number", path, diags),
    }
}

fn expect(ok: bool, expected: &str, path: &str, diags: &mut Vec<Diagnostic>) -> bool {
    if !ok {
        diags.push(Diagnostic::error(
            path,
            "Incorrect attribute value type",
            format!("expected {}", expected),
        ));
    }
    ok
}

fn check_uuid(s: &str, path: &str, diags: &mut Vec<Diagnostic>) {
    if uuid::Uuid::parse_str(s).is_err() {
        diags.push(Diagnostic::error(
            path,
            "Invalid UUID",
            format!("'{}' is not a valid UUID", s),
        ));
    }
}

fn one_of_error(path: &str, got: &str, values: &[&str]) -> Diagnostic {
    Diagnostic::error(
        path,
        "Invalid attribute value",
        format!("'{}' must be one of: {}", got, values.join(", ")),
    )
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, a)| items[i + 1..].contains(a))
}

fn array_items(value: &Value) -> impl Iterator<Item = (usize, &Value)> {
    value.as_array().into_iter().flatten().enumerate()
}

pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}
