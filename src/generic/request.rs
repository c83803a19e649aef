//! Request builders: turn a resource definition plus planned/prior state into the
//! sequence of Graph calls that realises it. Pure functions, executed by the engine.

use super::convert::{attribute_to_graph, terraform_to_graph, ODATA_TYPE};
use super::plan::values_equal;
use super::{
    CreateMethod, DeleteBehavior, ResourceDefinition, SubActionKind, TerraformToGraphParams,
    UpdateMethod, WriteSubAction,
};
use crate::error::{ProviderError, Result};
use crate::schema::{AttributeKind, Schema};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// One call against the Graph API, `uri` relative to the API root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphRequest {
    pub method: HttpMethod,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl GraphRequest {
    pub fn new(method: HttpMethod, uri: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            uri: uri.into(),
            body,
        }
    }
}

impl fmt::Display for GraphRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

/// Id of the entity a state document refers to
pub fn entity_id(definition: &ResourceDefinition, state: &Value) -> Result<String> {
    if let Some(id) = definition.access.singleton_id {
        return Ok(id.to_string());
    }
    state
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::InvalidState(format!("{} state has no id", definition.type_name)))
}

/// Id the entity will have before Graph answers, for resources that choose their own id
pub fn planned_id(definition: &ResourceDefinition, planned: &Value) -> Option<String> {
    if let Some(id) = definition.access.singleton_id {
        return Some(id.to_string());
    }
    let id_attribute = match definition.access.create_method {
        CreateMethod::Post => return None,
        CreateMethod::PostWithId { id_attribute } | CreateMethod::PatchWithId { id_attribute } => id_attribute,
    };
    planned
        .get(id_attribute)
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn create_request(definition: &ResourceDefinition, planned: &Value, api_root: &str) -> Result<GraphRequest> {
    let access = &definition.access;
    let mut body = terraform_to_graph(&definition.schema, planned)?;
    strip_attributes(&definition.schema, &mut body, &access.sub_action_attributes(false));
    run_terraform_to_graph(definition, &mut body, planned, None, api_root)?;

    let (method, uri) = if access.is_singleton() {
        (HttpMethod::Patch, access.base_uri.to_string())
    } else {
        match access.create_method {
            CreateMethod::Post | CreateMethod::PostWithId { .. } => {
                (HttpMethod::Post, access.base_uri.to_string())
            }
            CreateMethod::PatchWithId { id_attribute } => {
                let id = planned_id(definition, planned).ok_or_else(|| {
                    ProviderError::conversion(id_attribute, "required to create this resource")
                })?;
                (HttpMethod::Patch, access.entity_uri(&id))
            }
        }
    };

    Ok(GraphRequest::new(method, uri, Some(Value::Object(body))))
}

/// Update request, `None` when no attribute of the entity body changed
pub fn update_request(
    definition: &ResourceDefinition,
    planned: &Value,
    prior: &Value,
    api_root: &str,
) -> Result<Option<GraphRequest>> {
    let access = &definition.access;
    let schema = &definition.schema;
    let id = entity_id(definition, prior)?;
    let excluded = access.sub_action_attributes(true);

    let full = terraform_to_graph(schema, planned)?;
    let mut body = match access.update_method {
        UpdateMethod::Put => full.clone(),
        UpdateMethod::Patch => changed_body(schema, &full, planned, prior, &excluded),
    };
    strip_attributes(schema, &mut body, &excluded);

    let has_changes = body.keys().any(|k| k != ODATA_TYPE);
    if has_changes {
        if let Some(odata_type) = full.get(ODATA_TYPE) {
            body.insert(ODATA_TYPE.to_string(), odata_type.clone());
        }
    }

    run_terraform_to_graph(definition, &mut body, planned, Some(prior), api_root)?;

    if !body.keys().any(|k| k != ODATA_TYPE) {
        return Ok(None);
    }

    let method = match access.update_method {
        UpdateMethod::Patch => HttpMethod::Patch,
        UpdateMethod::Put => HttpMethod::Put,
    };
    Ok(Some(GraphRequest::new(method, access.entity_uri(&id), Some(Value::Object(body)))))
}

/// Changed top-level attributes of `planned` (nulls where a value was cleared).
/// A changed derived-type branch is sent whole.
fn changed_body(
    schema: &Schema,
    full: &Map<String, Value>,
    planned: &Value,
    prior: &Value,
    excluded: &[&str],
) -> Map<String, Value> {
    let mut body = Map::new();

    for (name, attr) in &schema.attributes {
        if attr.is_read_only() || excluded.contains(name) {
            continue;
        }
        let after = planned.get(*name).unwrap_or(&Value::Null);
        let before = prior.get(*name).unwrap_or(&Value::Null);
        if values_equal(&attr.kind, before, after) {
            continue;
        }

        match (attr.derived_type, attr.nested_schema()) {
            (Some(_), Some(nested)) => {
                if after.is_null() {
                    continue;
                }
                for (branch_name, branch_attr) in nested.base_attributes() {
                    if branch_attr.is_read_only() {
                        continue;
                    }
                    let key = branch_attr.graph_key(branch_name);
                    let value = full.get(&key).cloned().unwrap_or(Value::Null);
                    body.insert(key, value);
                }
            }
            _ => {
                let key = attr.graph_key(name);
                let value = full.get(&key).cloned().unwrap_or(Value::Null);
                body.insert(key, value);
            }
        }
    }

    body
}

fn strip_attributes(schema: &Schema, body: &mut Map<String, Value>, attributes: &[&str]) {
    for name in attributes {
        if let Some(attr) = schema.get(name) {
            body.remove(&attr.graph_key(name));
        }
    }
}

fn run_terraform_to_graph(
    definition: &ResourceDefinition,
    body: &mut Map<String, Value>,
    planned: &Value,
    prior: Option<&Value>,
    api_root: &str,
) -> Result<()> {
    if let Some(middleware) = definition.access.terraform_to_graph {
        let mut params = TerraformToGraphParams {
            raw: body,
            planned,
            prior,
            is_update: prior.is_some(),
            api_root,
        };
        middleware(&mut params)?;
    }
    Ok(())
}

/// GET URI for one entity including `$expand` / `$select`
pub fn read_uri(definition: &ResourceDefinition, id: &str) -> String {
    let read = &definition.access.read;
    let mut query = Vec::new();
    if let Some(expand) = read.odata_expand {
        query.push(format!("$expand={}", expand));
    }
    if let Some(select) = read.odata_select {
        query.push(format!("$select={}", select));
    }

    let uri = definition.access.entity_uri(id);
    if query.is_empty() {
        uri
    } else {
        format!("{}?{}", uri, query.join("&"))
    }
}

/// Destroy request, `None` when the entity is only forgotten
pub fn delete_request(definition: &ResourceDefinition, id: &str) -> Option<GraphRequest> {
    let uri = definition.access.entity_uri(id);
    match &definition.access.delete_behavior {
        DeleteBehavior::Delete => Some(GraphRequest::new(HttpMethod::Delete, uri, None)),
        DeleteBehavior::Forget => None,
        DeleteBehavior::Patch(body) => Some(GraphRequest::new(HttpMethod::Patch, uri, Some(body.clone()))),
    }
}

/// Sub-action calls for a freshly created (`prior == None`) or updated entity
pub fn sub_action_requests(
    definition: &ResourceDefinition,
    entity_uri: &str,
    planned: &Value,
    prior: Option<&Value>,
    api_root: &str,
) -> Result<Vec<GraphRequest>> {
    let is_update = prior.is_some();
    let mut requests = Vec::new();

    for sub_action in &definition.access.write_sub_actions {
        if !sub_action.runs_on(is_update) {
            continue;
        }
        match sub_action.kind {
            SubActionKind::AllInOne => {
                if let Some(request) = all_in_one_request(&definition.schema, sub_action, entity_uri, planned, prior)? {
                    requests.push(request);
                }
            }
            SubActionKind::RefSet => {
                requests.extend(ref_set_requests(sub_action, entity_uri, planned, prior, api_root));
            }
        }
    }

    Ok(requests)
}

fn all_in_one_request(
    schema: &Schema,
    sub_action: &WriteSubAction,
    entity_uri: &str,
    planned: &Value,
    prior: Option<&Value>,
) -> Result<Option<GraphRequest>> {
    let mut any_set = false;
    let mut any_changed = false;
    let mut body = Map::new();

    for name in &sub_action.attributes {
        let Some(attr) = schema.get(name) else {
            return Err(ProviderError::conversion(
                *name,
                format!("sub-action '{}' refers to an unknown attribute", sub_action.uri_suffix),
            ));
        };
        let after = planned.get(*name).unwrap_or(&Value::Null);
        let before = prior.and_then(|p| p.get(*name)).unwrap_or(&Value::Null);

        any_set |= !after.is_null();
        any_changed |= !values_equal(&attr.kind, before, after);

        let value = if after.is_null() {
            empty_value(&attr.kind)
        } else {
            attribute_to_graph(attr, after, name)?
        };

        let key = sub_action
            .body_keys
            .iter()
            .find(|(a, _)| a == name)
            .map(|(_, k)| k.to_string())
            .unwrap_or_else(|| attr.graph_key(name));
        body.insert(key, value);
    }

    let needed = match prior {
        None => any_set,
        Some(_) => any_changed,
    };
    if !needed {
        return Ok(None);
    }

    Ok(Some(GraphRequest::new(
        HttpMethod::Post,
        format!("{}/{}", entity_uri, sub_action.uri_suffix),
        Some(Value::Object(body)),
    )))
}

fn ref_set_requests(
    sub_action: &WriteSubAction,
    entity_uri: &str,
    planned: &Value,
    prior: Option<&Value>,
    api_root: &str,
) -> Vec<GraphRequest> {
    let mut requests = Vec::new();

    for name in &sub_action.attributes {
        let wanted = string_items(planned.get(*name));
        let current = prior.map(|p| string_items(p.get(*name))).unwrap_or_default();

        for id in wanted.iter().filter(|id| !current.contains(id)) {
            requests.push(GraphRequest::new(
                HttpMethod::Post,
                format!("{}/{}/$ref", entity_uri, sub_action.uri_suffix),
                Some(json!({
                    "@odata.id": format!("{}/{}/{}", api_root, sub_action.ref_collection, id)
                })),
            ));
        }

        for id in current.iter().filter(|id| !wanted.contains(id)) {
            requests.push(GraphRequest::new(
                HttpMethod::Delete,
                format!("{}/{}/{}/$ref", entity_uri, sub_action.uri_suffix, id),
                None,
            ));
        }
    }

    requests
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn empty_value(kind: &AttributeKind) -> Value {
    match kind {
        AttributeKind::List(_)
        | AttributeKind::Set(_)
        | AttributeKind::ListNested(_)
        | AttributeKind::SetNested(_) => Value::Array(Vec::new()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::{ReadOptions, WriteSubAction};
    use crate::schema::{Attribute, ElementKind, PlanModifier, Schema};

    const ROOT: &str = "https://graph.microsoft.com/beta";

    fn policy_definition() -> ResourceDefinition {
        let target = Schema::new("")
            .attribute(
                "group",
                Attribute::derived(
                    "#microsoft.graph.groupAssignmentTarget",
                    Schema::new("").attribute("group_id", Attribute::string().required()),
                ),
            )
            .attribute(
                "all_devices",
                Attribute::derived("#microsoft.graph.allDevicesAssignmentTarget", Schema::new("")),
            );

        let schema = Schema::new("")
            .attribute(
                "id",
                Attribute::string()
                    .computed()
                    .plan_modifier(PlanModifier::UseStateForUnknown),
            )
            .attribute("display_name", Attribute::string().required())
            .attribute("description", Attribute::string().optional())
            .attribute(
                "ios",
                Attribute::derived(
                    "#microsoft.graph.iosCompliancePolicy",
                    Schema::new("")
                        .attribute("passcode_required", Attribute::bool().optional())
                        .attribute("os_minimum_version", Attribute::string().optional()),
                ),
            )
            .attribute(
                "assignments",
                Attribute::set_nested(
                    Schema::new("").attribute("target", Attribute::single_nested(target).required()),
                )
                .optional(),
            )
            .attribute("owners", Attribute::set(ElementKind::String).optional());

        ResourceDefinition::new("policy", "/deviceManagement/deviceCompliancePolicies", schema)
            .read_options(ReadOptions::default().expand("assignments"))
            .write_sub_action(WriteSubAction::assign())
            .write_sub_action(WriteSubAction::ref_set("owners", "owners"))
    }

    fn planned() -> Value {
        json!({
            "id": null,
            "display_name": "iOS baseline",
            "description": null,
            "ios": { "passcode_required": true, "os_minimum_version": "17.0" },
            "assignments": [{ "target": { "group": { "group_id": "g-1" }, "all_devices": null } }],
            "owners": ["u-1"]
        })
    }

    #[test]
    fn test_create_request_excludes_sub_action_attributes() {
        let request = create_request(&policy_definition(), &planned(), ROOT).unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.uri, "/deviceManagement/deviceCompliancePolicies");
        assert_eq!(
            request.body.unwrap(),
            json!({
                "@odata.type": "#microsoft.graph.iosCompliancePolicy",
                "displayName": "iOS baseline",
                "passcodeRequired": true,
                "osMinimumVersion": "17.0"
            })
        );
    }

    #[test]
    fn test_create_sub_actions() {
        let requests = sub_action_requests(
            &policy_definition(),
            "/deviceManagement/deviceCompliancePolicies/p-1",
            &planned(),
            None,
            ROOT,
        )
        .unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].uri, "/deviceManagement/deviceCompliancePolicies/p-1/assign");
        assert_eq!(
            requests[0].body.as_ref().unwrap(),
            &json!({
                "assignments": [{
                    "target": {
                        "@odata.type": "#microsoft.graph.groupAssignmentTarget",
                        "groupId": "g-1"
                    }
                }]
            })
        );
        assert_eq!(requests[1].uri, "/deviceManagement/deviceCompliancePolicies/p-1/owners/$ref");
        assert_eq!(
            requests[1].body.as_ref().unwrap()["@odata.id"],
            "https://graph.microsoft.com/beta/directoryObjects/u-1"
        );
    }

    #[test]
    fn test_update_request_sends_changed_attributes_with_odata_type() {
        let mut prior = planned();
        prior["id"] = json!("p-1");
        prior["description"] = json!("old");
        let mut next = prior.clone();
        next["description"] = Value::Null;
        next["ios"]["os_minimum_version"] = json!("18.0");

        let request = update_request(&policy_definition(), &next, &prior, ROOT)
            .unwrap()
            .unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.uri, "/deviceManagement/deviceCompliancePolicies/p-1");
        assert_eq!(
            request.body.unwrap(),
            json!({
                "@odata.type": "#microsoft.graph.iosCompliancePolicy",
                "description": null,
                "passcodeRequired": true,
                "osMinimumVersion": "18.0"
            })
        );
    }

    #[test]
    fn test_update_without_body_changes() {
        let mut prior = planned();
        prior["id"] = json!("p-1");
        let mut next = prior.clone();
        next["owners"] = json!(["u-2"]);

        let definition = policy_definition();
        assert!(update_request(&definition, &next, &prior, ROOT).unwrap().is_none());

        let requests = sub_action_requests(&definition, "/x/p-1", &next, Some(&prior), ROOT).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[1], GraphRequest::new(HttpMethod::Delete, "/x/p-1/owners/u-1/$ref", None));
    }

    #[test]
    fn test_cleared_assignments_send_empty_list() {
        let mut prior = planned();
        prior["id"] = json!("p-1");
        let mut next = prior.clone();
        next["assignments"] = Value::Null;

        let requests = sub_action_requests(&policy_definition(), "/x/p-1", &next, Some(&prior), ROOT).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body.as_ref().unwrap(), &json!({ "assignments": [] }));
    }

    #[test]
    fn test_read_uri_with_expand() {
        assert_eq!(
            read_uri(&policy_definition(), "p-1"),
            "/deviceManagement/deviceCompliancePolicies/p-1?$expand=assignments"
        );
    }

    #[test]
    fn test_delete_behaviors() {
        let definition = policy_definition();
        assert_eq!(
            delete_request(&definition, "p-1").unwrap().method,
            HttpMethod::Delete
        );

        let forgotten = policy_definition().singleton("default");
        assert!(delete_request(&forgotten, "default").is_none());

        let disabled = policy_definition().delete_behavior(DeleteBehavior::Patch(json!({ "state": "disabled" })));
        let request = delete_request(&disabled, "Fido2").unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.body, Some(json!({ "state": "disabled" })));
    }

    #[test]
    fn test_patch_with_id_create() {
        let definition = ResourceDefinition::new(
            "ctx",
            "/identity/conditionalAccess/authenticationContextClassReferences",
            Schema::new("")
                .attribute("id", Attribute::string().required())
                .attribute("display_name", Attribute::string().required()),
        )
        .create_method(CreateMethod::PatchWithId { id_attribute: "id" });

        let request = create_request(&definition, &json!({ "id": "c1", "display_name": "Sensitive" }), ROOT).unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(
            request.uri,
            "/identity/conditionalAccess/authenticationContextClassReferences/c1"
        );
        assert_eq!(request.body.unwrap(), json!({ "id": "c1", "displayName": "Sensitive" }));
    }
}
