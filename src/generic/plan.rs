//! Plan computation: configuration + prior state -> planned state
//!
//! Applies defaults, marks computed attributes as known-after-apply, honours
//! `UseStateForUnknown` and the requires-replace modifiers, and classifies the change.

use crate::error::{ProviderError, Result};
use crate::schema::validators::{index_path, join_path};
use crate::schema::{AttributeKind, PlanModifier, Schema};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    Replace,
    NoOp,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub before: Value,
    pub after: Value,
    pub known_after_apply: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub action: PlanAction,
    /// Planned state; unknown values are null and listed in `unknown`
    pub planned_state: Value,
    pub unknown: Vec<String>,
    pub requires_replace: Vec<String>,
    pub changes: Vec<AttributeChange>,
}

impl Plan {
    pub fn has_changes(&self) -> bool {
        self.action != PlanAction::NoOp
    }
}

/// Computed attribute left null by configuration
struct Pending {
    pointer: String,
    display: String,
    use_state: bool,
}

/// Plan `config` against `prior` (None when the resource does not exist yet)
pub fn plan(schema: &Schema, config: &Value, prior: Option<&Value>) -> Result<Plan> {
    let empty = Map::new();
    let config_map = match config {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(ProviderError::conversion("", "configuration must be an object")),
    };

    let mut pending = Vec::new();
    let mut planned = plan_object(schema, config_map, "", "", &mut pending);

    let Some(prior) = prior.filter(|p| !p.is_null()) else {
        let unknown = mark_unknown(&mut planned, &pending);
        let changes = top_level_changes(schema, &planned, &Value::Null, &unknown);
        return Ok(Plan {
            action: PlanAction::Create,
            planned_state: planned,
            unknown,
            requires_replace: Vec::new(),
            changes,
        });
    };

    // Assume every computed value stays as it is, then check whether anything changed
    for p in &pending {
        if let (Some(slot), Some(old)) = (planned.pointer_mut(&p.pointer), prior.pointer(&p.pointer)) {
            *slot = old.clone();
        }
    }
    let changed = !object_equal(schema, &planned, prior);

    let mut unknown = Vec::new();
    if changed {
        let volatile: Vec<&Pending> = pending.iter().filter(|p| !p.use_state).collect();
        for p in &volatile {
            if let Some(slot) = planned.pointer_mut(&p.pointer) {
                *slot = Value::Null;
            }
            unknown.push(p.display.clone());
        }
    }

    let requires_replace = replace_paths(schema, config_map, &planned, prior, &unknown);
    let changes = top_level_changes(schema, &planned, prior, &unknown);

    let action = if !requires_replace.is_empty() {
        PlanAction::Replace
    } else if changed {
        PlanAction::Update
    } else {
        PlanAction::NoOp
    };

    Ok(Plan {
        action,
        planned_state: planned,
        unknown,
        requires_replace,
        changes,
    })
}

fn plan_object(
    schema: &Schema,
    config: &Map<String, Value>,
    pointer: &str,
    path: &str,
    pending: &mut Vec<Pending>,
) -> Value {
    let mut out = Map::new();

    for (name, attr) in &schema.attributes {
        let attr_pointer = format!("{}/{}", pointer, escape_pointer(name));
        let attr_path = join_path(path, name);
        let configured = config.get(*name).filter(|v| !v.is_null());

        let value = match configured {
            Some(value) => plan_configured(&attr.kind, value, &attr_pointer, &attr_path, pending),
            None => match &attr.default {
                Some(default) => default.clone(),
                None if attr.computed => {
                    pending.push(Pending {
                        pointer: attr_pointer,
                        display: attr_path,
                        use_state: attr.has_plan_modifier(PlanModifier::UseStateForUnknown),
                    });
                    Value::Null
                }
                None => Value::Null,
            },
        };

        out.insert(name.to_string(), value);
    }

    Value::Object(out)
}

fn plan_configured(
    kind: &AttributeKind,
    value: &Value,
    pointer: &str,
    path: &str,
    pending: &mut Vec<Pending>,
) -> Value {
    match (kind, value) {
        (AttributeKind::SingleNested(schema), Value::Object(map)) => {
            plan_object(schema, map, pointer, path, pending)
        }
        (AttributeKind::ListNested(schema) | AttributeKind::SetNested(schema), Value::Array(items)) => {
            let planned = items
                .iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => plan_object(
                        schema,
                        map,
                        &format!("{}/{}", pointer, i),
                        &index_path(path, i),
                        pending,
                    ),
                    other => other.clone(),
                })
                .collect();
            Value::Array(planned)
        }
        _ => value.clone(),
    }
}

fn mark_unknown(planned: &mut Value, pending: &[Pending]) -> Vec<String> {
    pending
        .iter()
        .map(|p| {
            if let Some(slot) = planned.pointer_mut(&p.pointer) {
                *slot = Value::Null;
            }
            p.display.clone()
        })
        .collect()
}

fn replace_paths(
    schema: &Schema,
    config: &Map<String, Value>,
    planned: &Value,
    prior: &Value,
    unknown: &[String],
) -> Vec<String> {
    let mut paths = Vec::new();

    for (name, attr) in &schema.attributes {
        if unknown.iter().any(|u| u == name) {
            continue;
        }
        let before = prior.get(*name).unwrap_or(&Value::Null);
        let after = planned.get(*name).unwrap_or(&Value::Null);
        let differs = !values_equal(&attr.kind, before, after);

        let replace = attr.has_plan_modifier(PlanModifier::RequiresReplace)
            || (attr.has_plan_modifier(PlanModifier::RequiresReplaceIfConfigured)
                && config.get(*name).is_some_and(|v| !v.is_null()));

        // Switching between derived types cannot be done in place
        let type_switch = attr.derived_type.is_some() && before.is_null() != after.is_null();

        if differs && (replace || type_switch) {
            paths.push(name.to_string());
        }
    }

    paths
}

fn top_level_changes(schema: &Schema, planned: &Value, prior: &Value, unknown: &[String]) -> Vec<AttributeChange> {
    schema
        .attributes
        .iter()
        .filter_map(|(name, attr)| {
            let before = prior.get(*name).cloned().unwrap_or(Value::Null);
            let after = planned.get(*name).cloned().unwrap_or(Value::Null);
            let known_after_apply = unknown.iter().any(|u| u == name);
            if known_after_apply || !values_equal(&attr.kind, &before, &after) {
                Some(AttributeChange {
                    attribute: name.to_string(),
                    before,
                    after,
                    known_after_apply,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Semantic equality: sets ignore order, empty collections equal null
pub fn values_equal(kind: &AttributeKind, a: &Value, b: &Value) -> bool {
    let collection = matches!(
        kind,
        AttributeKind::List(_) | AttributeKind::Set(_) | AttributeKind::ListNested(_) | AttributeKind::SetNested(_)
    );
    if collection && is_empty_collection(a) && is_empty_collection(b) {
        return true;
    }

    match (kind, a, b) {
        (_, Value::Null, Value::Null) => true,
        (_, Value::Null, _) | (_, _, Value::Null) => false,
        (AttributeKind::Float64, _, _) => a.as_f64() == b.as_f64(),
        (AttributeKind::Set(_), Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().all(|item| y.contains(item))
        }
        (AttributeKind::SingleNested(schema), _, _) => object_equal(schema, a, b),
        (AttributeKind::ListNested(schema), Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(i, j)| object_equal(schema, i, j))
        }
        (AttributeKind::SetNested(schema), Value::Array(x), Value::Array(y)) => {
            x.len() == y.len()
                && x.iter().all(|i| y.iter().any(|j| object_equal(schema, i, j)))
        }
        _ => a == b,
    }
}

/// Attribute-wise equality of two objects of the same schema
pub fn object_equal(schema: &Schema, a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Object(x), Value::Object(y)) => schema.attributes.iter().all(|(name, attr)| {
            values_equal(
                &attr.kind,
                x.get(*name).unwrap_or(&Value::Null),
                y.get(*name).unwrap_or(&Value::Null),
            )
        }),
        _ => false,
    }
}

fn is_empty_collection(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
