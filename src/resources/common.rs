//! Attribute fragments and payload helpers shared by several resources

use crate::error::{ProviderError, Result};
use crate::schema::{Attribute, ElementKind, PlanModifier, Schema, Validator};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

/// Server-assigned identifier
pub fn id() -> Attribute {
    Attribute::string()
        .computed()
        .description("Unique identifier assigned by Microsoft Graph")
        .plan_modifier(PlanModifier::UseStateForUnknown)
}

pub fn created_date_time() -> Attribute {
    Attribute::string()
        .computed()
        .description("Creation timestamp (RFC 3339)")
        .plan_modifier(PlanModifier::UseStateForUnknown)
}

pub fn last_modified_date_time() -> Attribute {
    Attribute::string()
        .computed()
        .description("Last modification timestamp (RFC 3339)")
}

/// `created_date_time` and `last_modified_date_time`
pub fn timestamps() -> Schema {
    Schema::new("")
        .attribute("created_date_time", created_date_time())
        .attribute("last_modified_date_time", last_modified_date_time())
}

pub fn uuid() -> Attribute {
    Attribute::string().validator(Validator::Uuid)
}

pub fn uuid_set() -> Attribute {
    Attribute::set(ElementKind::String).validator(Validator::EachUuid)
}

/// Intune scope tags; Graph fills in `0` (Default) when none are given
pub fn role_scope_tag_ids() -> Attribute {
    Attribute::set(ElementKind::String)
        .optional()
        .computed()
        .description("Role scope tag ids")
        .plan_modifier(PlanModifier::UseStateForUnknown)
}

/// Intune assignment target with one branch per `deviceAndAppManagementAssignmentTarget` subtype
pub fn assignment_target() -> Schema {
    Schema::new("Assignment target")
        .attribute(
            "filter_id",
            uuid()
                .optional()
                .graph_name("deviceAndAppManagementAssignmentFilterId")
                .validator(Validator::also_requires(&["filter_type"])),
        )
        .attribute(
            "filter_type",
            Attribute::string()
                .optional()
                .graph_name("deviceAndAppManagementAssignmentFilterType")
                .validator(Validator::one_of(&["none", "include", "exclude"])),
        )
        .attribute(
            "all_devices",
            Attribute::derived("#microsoft.graph.allDevicesAssignmentTarget", Schema::new("")),
        )
        .attribute(
            "all_licensed_users",
            Attribute::derived("#microsoft.graph.allLicensedUsersAssignmentTarget", Schema::new("")),
        )
        .attribute(
            "group",
            Attribute::derived(
                "#microsoft.graph.groupAssignmentTarget",
                Schema::new("").attribute("group_id", uuid().required()),
            ),
        )
        .attribute(
            "exclusion_group",
            Attribute::derived(
                "#microsoft.graph.exclusionGroupAssignmentTarget",
                Schema::new("").attribute("group_id", uuid().required()),
            ),
        )
        .attribute(
            "configuration_manager_collection",
            Attribute::derived(
                "#microsoft.graph.configurationManagerCollectionAssignmentTarget",
                Schema::new("").attribute("collection_id", Attribute::string().required()),
            ),
        )
}

/// Set of assignments, each with a `target` plus any resource-specific fields in `item`
pub fn assignments(item: Schema) -> Attribute {
    let item = Schema::new("Assignment")
        .attribute("target", Attribute::single_nested(assignment_target()).required())
        .extend(item);

    Attribute::set_nested(item)
        .optional()
        .description("Assignments, written through the entity's `assign` action")
}

/// `{api_root}/directoryObjects/{id}` as used by `@odata.bind` and `$ref`
pub fn directory_object_url(api_root: &str, id: &str) -> String {
    format!("{}/directoryObjects/{}", api_root, id)
}

/// Replace the plain-text value under `key` with its base64 encoding
pub fn encode_base64_field(raw: &mut Map<String, Value>, key: &str) {
    if let Some(Value::String(text)) = raw.get(key) {
        let encoded = STANDARD.encode(text.as_bytes());
        raw.insert(key.to_string(), Value::String(encoded));
    }
}

/// Inverse of [`encode_base64_field`]
pub fn decode_base64_field(raw: &mut Map<String, Value>, key: &str) -> Result<()> {
    if let Some(Value::String(encoded)) = raw.get(key) {
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| ProviderError::conversion(key, format!("invalid base64 from Graph: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ProviderError::conversion(key, format!("content is not UTF-8: {}", e)))?;
        raw.insert(key.to_string(), Value::String(text));
    }
    Ok(())
}

/// Move `{key: {id: x}}` (expanded navigation property) to `{flat_key: x}`
pub fn flatten_navigation_id(raw: &mut Map<String, Value>, key: &str, flat_key: &str) {
    if let Some(id) = raw
        .remove(key)
        .and_then(|nav| nav.get("id").cloned())
    {
        raw.entry(flat_key.to_string()).or_insert(id);
    }
}

/// Inverse of [`flatten_navigation_id`]
pub fn nest_navigation_id(raw: &mut Map<String, Value>, flat_key: &str, key: &str) {
    if let Some(id) = raw.remove(flat_key) {
        let mut nav = Map::new();
        nav.insert("id".to_string(), id);
        raw.insert(key.to_string(), Value::Object(nav));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base64_fields() {
        let mut raw = json!({ "scriptContent": "Write-Host 'hi'" })
            .as_object()
            .cloned()
            .unwrap();
        encode_base64_field(&mut raw, "scriptContent");
        assert_eq!(raw["scriptContent"], "V3JpdGUtSG9zdCAnaGkn");

        decode_base64_field(&mut raw, "scriptContent").unwrap();
        assert_eq!(raw["scriptContent"], "Write-Host 'hi'");
    }

    #[test]
    fn test_invalid_base64_from_graph() {
        let mut raw = json!({ "scriptContent": "%%%" }).as_object().cloned().unwrap();
        assert!(decode_base64_field(&mut raw, "scriptContent").is_err());
    }

    #[test]
    fn test_navigation_ids() {
        let mut raw = json!({ "catalogId": "c-1" }).as_object().cloned().unwrap();
        nest_navigation_id(&mut raw, "catalogId", "catalog");
        assert_eq!(Value::Object(raw.clone()), json!({ "catalog": { "id": "c-1" } }));

        let mut read = json!({ "catalog": { "id": "c-1", "displayName": "General" } })
            .as_object()
            .cloned()
            .unwrap();
        flatten_navigation_id(&mut read, "catalog", "catalogId");
        assert_eq!(Value::Object(read), json!({ "catalogId": "c-1" }));
    }

    #[test]
    fn test_assignment_target_branches() {
        let target = assignment_target();
        assert_eq!(target.derived_attributes().count(), 5);
        assert!(target
            .derived_branch_for("#microsoft.graph.groupAssignmentTarget")
            .is_some());
    }
}
