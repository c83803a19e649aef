use crate::error::Result;
use crate::generic::{ReadOptions, ResourceDefinition, TerraformToGraphParams, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, PlanModifier, Schema, Validator};
use serde_json::Value;

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Microsoft 365 or security group")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute(
            "mail_nickname",
            Attribute::string()
                .required()
                .validator(Validator::length(1, 64))
                .validator(Validator::regex(r"^[^@()\\\[\]\x22;:<>, ]+$", "must not contain spaces or @()\\[]\";:<>,")),
        )
        .attribute("mail_enabled", Attribute::bool().required())
        .attribute("security_enabled", Attribute::bool().required())
        .attribute(
            "group_types",
            Attribute::set(ElementKind::String)
                .optional()
                .validator(Validator::each_one_of(&["Unified", "DynamicMembership"]))
                .plan_modifier(PlanModifier::RequiresReplaceIfConfigured),
        )
        .attribute(
            "visibility",
            Attribute::string()
                .optional()
                .computed()
                .validator(Validator::one_of(&["Private", "Public", "HiddenMembership"]))
                .plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .attribute(
            "membership_rule",
            Attribute::string()
                .optional()
                .validator(Validator::also_requires(&["membership_rule_processing_state"])),
        )
        .attribute(
            "membership_rule_processing_state",
            Attribute::string()
                .optional()
                .validator(Validator::one_of(&["On", "Paused"])),
        )
        .attribute(
            "is_assignable_to_role",
            Attribute::bool()
                .optional()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "owners",
            common::uuid_set()
                .optional()
                .description("Object ids of the group owners"),
        )
        .attribute(
            "members",
            common::uuid_set()
                .optional()
                .validator(Validator::conflicts_with(&["membership_rule"]))
                .description("Object ids of the direct members"),
        )
        .attribute("mail", Attribute::string().computed())
        .attribute("security_identifier", Attribute::string().computed())
        .attribute("created_date_time", common::created_date_time());

    ResourceDefinition::new("group", "/groups", schema)
        .read_options(
            ReadOptions::default()
                .extra_read_ids("owners", "owners")
                .extra_read_ids("members", "members"),
        )
        .write_sub_action(WriteSubAction::ref_set("owners", "owners").update_only())
        .write_sub_action(WriteSubAction::ref_set("members", "members").update_only())
        .terraform_to_graph(bind_initial_references)
        .lookup_by(&["display_name", "mail_nickname"])
}

/// Owners and members of a new group are bound in the POST itself
fn bind_initial_references(params: &mut TerraformToGraphParams<'_>) -> Result<()> {
    if params.is_update {
        return Ok(());
    }

    for key in ["owners", "members"] {
        if let Some(Value::Array(ids)) = params.raw.remove(key) {
            let binds = ids
                .iter()
                .filter_map(Value::as_str)
                .map(|id| Value::String(common::directory_object_url(params.api_root, id)))
                .collect();
            params.raw.insert(format!("{}@odata.bind", key), Value::Array(binds));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::{create_request, sub_action_requests, update_request};
    use crate::generic::HttpMethod;
    use serde_json::json;

    const ROOT: &str = "https://graph.microsoft.com/beta";
    const OWNER: &str = "5f0b2a3c-7d1e-4a6b-9c8d-0e1f2a3b4c5d";
    const MEMBER: &str = "6a1c3b4d-8e2f-4b7c-8d9e-1f2a3b4c5d6e";

    fn planned() -> Value {
        json!({
            "id": null,
            "display_name": "Helpdesk",
            "description": null,
            "mail_nickname": "helpdesk",
            "mail_enabled": false,
            "security_enabled": true,
            "group_types": null,
            "visibility": null,
            "membership_rule": null,
            "membership_rule_processing_state": null,
            "is_assignable_to_role": null,
            "owners": [OWNER],
            "members": [MEMBER],
            "mail": null,
            "security_identifier": null,
            "created_date_time": null
        })
    }

    #[test]
    fn test_create_binds_owners_and_members() {
        let request = create_request(&resource(), &planned(), ROOT).unwrap();
        let body = request.body.unwrap();
        assert_eq!(
            body["owners@odata.bind"],
            json!([format!("{}/directoryObjects/{}", ROOT, OWNER)])
        );
        assert_eq!(
            body["members@odata.bind"],
            json!([format!("{}/directoryObjects/{}", ROOT, MEMBER)])
        );
        assert!(body.get("owners").is_none());

        let subs = sub_action_requests(&resource(), "/groups/g-1", &planned(), None, ROOT).unwrap();
        assert!(subs.is_empty());
    }

    #[test]
    fn test_update_uses_ref_sets() {
        let mut prior = planned();
        prior["id"] = json!("g-1");
        let mut next = prior.clone();
        next["members"] = json!([]);

        let definition = resource();
        assert!(update_request(&definition, &next, &prior, ROOT).unwrap().is_none());

        let subs = sub_action_requests(&definition, "/groups/g-1", &next, Some(&prior), ROOT).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].method, HttpMethod::Delete);
        assert_eq!(subs[0].uri, format!("/groups/g-1/members/{}/$ref", MEMBER));
    }
}
