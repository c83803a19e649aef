//! Translation between declarative attribute values and Graph JSON
//!
//! Declarative values use snake_case attribute names; Graph uses camelCase (or the
//! attribute's `graph_name`). Derived-type branches are flattened into their parent
//! object on the way out and selected by `@odata.type` on the way back.

use crate::error::{ProviderError, Result};
use crate::schema::naming::camel_to_snake;
use crate::schema::validators::{index_path, join_path};
use crate::schema::{Attribute, AttributeKind, ElementKind, Schema};
use serde_json::{Map, Value};

pub const ODATA_TYPE: &str = "@odata.type";

/// Convert a declarative object into a Graph payload. Null attributes and
/// read-only attributes are omitted.
pub fn terraform_to_graph(schema: &Schema, value: &Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => object_to_graph(schema, map, ""),
        Value::Null => object_to_graph(schema, &Map::new(), ""),
        _ => Err(ProviderError::conversion("", "expected an object")),
    }
}

/// Convert a single attribute value (used by sub-actions)
pub fn attribute_to_graph(attribute: &Attribute, value: &Value, path: &str) -> Result<Value> {
    value_to_graph(&attribute.kind, value, path)
}

fn object_to_graph(schema: &Schema, map: &Map<String, Value>, path: &str) -> Result<Map<String, Value>> {
    let mut out = Map::new();

    if let Some(odata_type) = schema.odata_type {
        out.insert(ODATA_TYPE.to_string(), Value::String(odata_type.to_string()));
    }

    for (name, attr) in schema.base_attributes() {
        if attr.is_read_only() {
            continue;
        }
        let Some(value) = map.get(name).filter(|v| !v.is_null()) else {
            continue;
        };
        let attr_path = join_path(path, name);
        out.insert(attr.graph_key(name), value_to_graph(&attr.kind, value, &attr_path)?);
    }

    for (name, attr) in schema.derived_attributes() {
        let Some(value) = map.get(name).filter(|v| !v.is_null()) else {
            continue;
        };
        let (Some(odata_type), Some(nested)) = (attr.derived_type, attr.nested_schema()) else {
            continue;
        };
        let attr_path = join_path(path, name);
        let branch = value
            .as_object()
            .ok_or_else(|| ProviderError::conversion(&attr_path, "expected an object"))?;

        out.extend(object_to_graph(nested, branch, &attr_path)?);
        out.insert(ODATA_TYPE.to_string(), Value::String(odata_type.to_string()));
        break;
    }

    Ok(out)
}

fn value_to_graph(kind: &AttributeKind, value: &Value, path: &str) -> Result<Value> {
    match kind {
        AttributeKind::SingleNested(schema) => {
            let map = value
                .as_object()
                .ok_or_else(|| ProviderError::conversion(path, "expected an object"))?;
            Ok(Value::Object(object_to_graph(schema, map, path)?))
        }
        AttributeKind::ListNested(schema) | AttributeKind::SetNested(schema) => {
            let items = value
                .as_array()
                .ok_or_else(|| ProviderError::conversion(path, "expected a list"))?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = index_path(path, i);
                let map = item
                    .as_object()
                    .ok_or_else(|| ProviderError::conversion(&item_path, "expected an object"))?;
                out.push(Value::Object(object_to_graph(schema, map, &item_path)?));
            }
            Ok(Value::Array(out))
        }
        _ => Ok(value.clone()),
    }
}

/// Convert a raw Graph entity into a declarative object. Every schema attribute is
/// present in the result (null when Graph did not return it).
pub fn graph_to_terraform(schema: &Schema, raw: &Map<String, Value>) -> Result<Value> {
    object_to_terraform(schema, raw, "")
}

fn object_to_terraform(schema: &Schema, raw: &Map<String, Value>, path: &str) -> Result<Value> {
    let mut out = Map::new();

    for (name, attr) in schema.base_attributes() {
        let attr_path = join_path(path, name);
        let value = raw.get(&attr.graph_key(name)).unwrap_or(&Value::Null);
        out.insert(name.to_string(), value_to_terraform(&attr.kind, value, &attr_path)?);
    }

    let odata_type = raw.get(ODATA_TYPE).and_then(Value::as_str);
    for (name, attr) in schema.derived_attributes() {
        let selected = odata_type.is_some_and(|t| {
            attr.derived_type
                .is_some_and(|d| d.eq_ignore_ascii_case(t))
        });
        let value = match (selected, attr.nested_schema()) {
            (true, Some(nested)) => object_to_terraform(nested, raw, &join_path(path, name))?,
            _ => Value::Null,
        };
        out.insert(name.to_string(), value);
    }

    if tracing::enabled!(tracing::Level::TRACE) {
        for key in raw.keys() {
            if !key.starts_with('@') && !is_mapped(schema, key, odata_type) {
                tracing::trace!(
                    "unmapped Graph property '{}' at '{}' (would be '{}')",
                    key,
                    path,
                    camel_to_snake(key)
                );
            }
        }
    }

    Ok(Value::Object(out))
}

fn is_mapped(schema: &Schema, graph_key: &str, odata_type: Option<&str>) -> bool {
    if schema
        .base_attributes()
        .any(|(name, attr)| attr.graph_key(name) == graph_key)
    {
        return true;
    }
    odata_type
        .and_then(|t| schema.derived_branch_for(t))
        .and_then(|(_, attr)| attr.nested_schema())
        .is_some_and(|nested| is_mapped(nested, graph_key, None))
}

fn value_to_terraform(kind: &AttributeKind, value: &Value, path: &str) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        AttributeKind::String => Ok(scalar_to_string(value)),
        AttributeKind::Bool => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| ProviderError::conversion(path, format!("expected bool, got {}", value))),
        AttributeKind::Int64 => to_int64(value)
            .map(Value::from)
            .ok_or_else(|| ProviderError::conversion(path, format!("expected integer, got {}", value))),
        AttributeKind::Float64 => value
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| ProviderError::conversion(path, format!("expected number, got {}", value))),
        AttributeKind::List(element) | AttributeKind::Set(element) => {
            let items = value
                .as_array()
                .ok_or_else(|| ProviderError::conversion(path, "expected a list"))?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(element_to_terraform(*element, item, &index_path(path, i))?);
            }
            Ok(Value::Array(out))
        }
        AttributeKind::SingleNested(schema) => {
            let map = value
                .as_object()
                .ok_or_else(|| ProviderError::conversion(path, "expected an object"))?;
            object_to_terraform(schema, map, path)
        }
        AttributeKind::ListNested(schema) | AttributeKind::SetNested(schema) => {
            let items = value
                .as_array()
                .ok_or_else(|| ProviderError::conversion(path, "expected a list"))?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = index_path(path, i);
                let map = item
                    .as_object()
                    .ok_or_else(|| ProviderError::conversion(&item_path, "expected an object"))?;
                out.push(object_to_terraform(schema, map, &item_path)?);
            }
            Ok(Value::Array(out))
        }
    }
}

fn element_to_terraform(element: ElementKind, value: &Value, path: &str) -> Result<Value> {
    match element {
        ElementKind::String => Ok(scalar_to_string(value)),
        ElementKind::Bool => value
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| ProviderError::conversion(path, "expected bool")),
        ElementKind::Int64 => to_int64(value)
            .map(Value::from)
            .ok_or_else(|| ProviderError::conversion(path, "expected integer")),
        ElementKind::Float64 => value
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| ProviderError::conversion(path, "expected number")),
    }
}

/// Graph occasionally returns numbers or booleans for string-typed properties
fn scalar_to_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => Value::String(other.to_string()),
    }
}

fn to_int64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, ElementKind, Schema};
    use serde_json::json;

    fn named_location_schema() -> Schema {
        let ip_range = Schema::new("")
            .attribute(
                "v4",
                Attribute::derived(
                    "#microsoft.graph.iPv4CidrRange",
                    Schema::new("").attribute("cidr_address", Attribute::string().required()),
                ),
            )
            .attribute(
                "v6",
                Attribute::derived(
                    "#microsoft.graph.iPv6CidrRange",
                    Schema::new("").attribute("cidr_address", Attribute::string().required()),
                ),
            );

        Schema::new("")
            .attribute("id", Attribute::string().computed())
            .attribute("display_name", Attribute::string().required())
            .attribute(
                "country",
                Attribute::derived(
                    "#microsoft.graph.countryNamedLocation",
                    Schema::new("")
                        .attribute("countries_and_regions", Attribute::set(ElementKind::String).required())
                        .attribute(
                            "include_unknown_countries_and_regions",
                            Attribute::bool().default_value(false),
                        ),
                ),
            )
            .attribute(
                "ip",
                Attribute::derived(
                    "#microsoft.graph.ipNamedLocation",
                    Schema::new("")
                        .attribute("is_trusted", Attribute::bool().optional())
                        .attribute("ip_ranges", Attribute::set_nested(ip_range).required()),
                ),
            )
    }

    #[test]
    fn test_derived_type_flattened_on_write() {
        let body = terraform_to_graph(
            &named_location_schema(),
            &json!({
                "id": "ignored-read-only",
                "display_name": "Office",
                "ip": {
                    "is_trusted": true,
                    "ip_ranges": [{ "v4": { "cidr_address": "10.0.0.0/8" } }]
                }
            }),
        )
        .unwrap();

        assert_eq!(
            Value::Object(body),
            json!({
                "@odata.type": "#microsoft.graph.ipNamedLocation",
                "displayName": "Office",
                "isTrusted": true,
                "ipRanges": [{
                    "@odata.type": "#microsoft.graph.iPv4CidrRange",
                    "cidrAddress": "10.0.0.0/8"
                }]
            })
        );
    }

    #[test]
    fn test_derived_type_selected_on_read() {
        let raw = json!({
            "@odata.type": "#microsoft.graph.countryNamedLocation",
            "id": "loc-1",
            "displayName": "Allowed countries",
            "countriesAndRegions": ["US", "CA"],
            "includeUnknownCountriesAndRegions": false,
            "createdDateTime": "2025-01-01T00:00:00Z"
        });

        let state = graph_to_terraform(&named_location_schema(), raw.as_object().unwrap()).unwrap();
        assert_eq!(state["id"], "loc-1");
        assert_eq!(state["ip"], Value::Null);
        assert_eq!(
            state["country"],
            json!({
                "countries_and_regions": ["US", "CA"],
                "include_unknown_countries_and_regions": false
            })
        );
    }

    #[test]
    fn test_missing_properties_become_null() {
        let raw = json!({ "id": "loc-2" });
        let state = graph_to_terraform(&named_location_schema(), raw.as_object().unwrap()).unwrap();
        assert_eq!(state["display_name"], Value::Null);
        assert_eq!(state["country"], Value::Null);
    }

    #[test]
    fn test_scalar_coercion_on_read() {
        let schema = Schema::new("")
            .attribute("version", Attribute::string().computed())
            .attribute("priority", Attribute::int64().computed());
        let raw = json!({ "version": 3, "priority": 2.0 });
        let state = graph_to_terraform(&schema, raw.as_object().unwrap()).unwrap();
        assert_eq!(state, json!({ "version": "3", "priority": 2 }));
    }

    #[test]
    fn test_type_mismatch_on_read_reports_path() {
        let schema = Schema::new("").attribute(
            "settings",
            Attribute::single_nested(Schema::new("").attribute("enabled", Attribute::bool().optional()))
                .optional(),
        );
        let raw = json!({ "settings": { "enabled": "yes" } });
        let err = graph_to_terraform(&schema, raw.as_object().unwrap()).unwrap_err();
        assert!(err.to_string().contains("settings.enabled"));
    }

    #[test]
    fn test_fixed_odata_type_on_nested_object() {
        let schema = Schema::new("").attribute(
            "target",
            Attribute::single_nested(
                Schema::new("")
                    .odata_type("#microsoft.graph.groupAssignmentTarget")
                    .attribute("group_id", Attribute::string().required()),
            )
            .required(),
        );
        let body = terraform_to_graph(&schema, &json!({ "target": { "group_id": "g1" } })).unwrap();
        assert_eq!(
            body["target"],
            json!({ "@odata.type": "#microsoft.graph.groupAssignmentTarget", "groupId": "g1" })
        );
    }
}
