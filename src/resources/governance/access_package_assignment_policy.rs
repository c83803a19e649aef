use crate::error::Result;
use crate::generic::{
    GraphToTerraformParams, ReadOptions, ResourceDefinition, TerraformToGraphParams, UpdateMethod,
};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

/// Users, groups or managers that can request or approve
fn subject_set() -> Schema {
    Schema::new("")
        .attribute("description", Attribute::string().optional())
        .attribute(
            "single_user",
            Attribute::derived(
                "#microsoft.graph.singleUser",
                Schema::new("").attribute("user_id", common::uuid().required()),
            ),
        )
        .attribute(
            "group_members",
            Attribute::derived(
                "#microsoft.graph.groupMembers",
                Schema::new("").attribute("group_id", common::uuid().required()),
            ),
        )
        .attribute(
            "requestor_manager",
            Attribute::derived(
                "#microsoft.graph.requestorManager",
                Schema::new("").attribute(
                    "manager_level",
                    Attribute::int64().optional().default_value(1).validator(Validator::range(1, 2)),
                ),
            ),
        )
        .attribute(
            "internal_sponsors",
            Attribute::derived("#microsoft.graph.internalSponsors", Schema::new("")),
        )
        .attribute(
            "external_sponsors",
            Attribute::derived("#microsoft.graph.externalSponsors", Schema::new("")),
        )
}

fn expiration() -> Schema {
    Schema::new("When assignments expire")
        .attribute(
            "type",
            Attribute::string().required().validator(Validator::one_of(&[
                "notSpecified",
                "noExpiration",
                "afterDateTime",
                "afterDuration",
            ])),
        )
        .attribute(
            "end_date_time",
            Attribute::string()
                .optional()
                .validator(Validator::Rfc3339DateTime)
                .validator(Validator::conflicts_with(&["duration"])),
        )
        .attribute(
            "duration",
            Attribute::string().optional().validator(Validator::IsoDuration),
        )
}

fn requestor_settings() -> Schema {
    Schema::new("Who may request and how")
        .attribute("enable_targets_to_self_add_access", Attribute::bool().optional())
        .attribute("enable_targets_to_self_update_access", Attribute::bool().optional())
        .attribute("enable_targets_to_self_remove_access", Attribute::bool().optional())
        .attribute("allow_custom_assignment_schedule", Attribute::bool().optional())
        .attribute("enable_on_behalf_requestors_to_add_access", Attribute::bool().optional())
        .attribute("enable_on_behalf_requestors_to_update_access", Attribute::bool().optional())
        .attribute("enable_on_behalf_requestors_to_remove_access", Attribute::bool().optional())
}

fn approval_settings() -> Schema {
    let stage = Schema::new("Approval stage")
        .attribute(
            "duration_before_automatic_denial",
            Attribute::string()
                .optional()
                .default_value("P14D")
                .validator(Validator::IsoDuration),
        )
        .attribute(
            "is_approver_justification_required",
            Attribute::bool().optional().default_value(false),
        )
        .attribute("is_escalation_enabled", Attribute::bool().optional().default_value(false))
        .attribute(
            "duration_before_escalation",
            Attribute::string().optional().validator(Validator::IsoDuration),
        )
        .attribute(
            "primary_approvers",
            Attribute::set_nested(subject_set())
                .required()
                .validator(Validator::SizeAtLeast { min: 1 }),
        )
        .attribute(
            "fallback_primary_approvers",
            Attribute::set_nested(subject_set()).optional(),
        )
        .attribute("escalation_approvers", Attribute::set_nested(subject_set()).optional());

    Schema::new("Approval of requests")
        .attribute("is_approval_required_for_add", Attribute::bool().optional().default_value(false))
        .attribute(
            "is_approval_required_for_update",
            Attribute::bool().optional().default_value(false),
        )
        .attribute(
            "stages",
            Attribute::list_nested(stage)
                .optional()
                .validator(Validator::SizeAtMost { max: 3 }),
        )
}

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Access package assignment policy")
        .attribute("id", common::id())
        .attribute(
            "access_package_id",
            common::uuid()
                .required()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().required())
        .attribute(
            "allowed_target_scope",
            Attribute::string().required().validator(Validator::one_of(&[
                "notSpecified",
                "specificDirectoryUsers",
                "specificConnectedOrganizationUsers",
                "specificDirectoryServicePrincipals",
                "allMemberUsers",
                "allDirectoryUsers",
                "allDirectoryServicePrincipals",
                "allConfiguredConnectedOrganizationUsers",
                "allExternalUsers",
            ])),
        )
        .attribute(
            "specific_allowed_targets",
            Attribute::set_nested(subject_set()).optional(),
        )
        .attribute("expiration", Attribute::single_nested(expiration()).optional())
        .attribute(
            "requestor_settings",
            Attribute::single_nested(requestor_settings()).optional(),
        )
        .attribute(
            "request_approval_settings",
            Attribute::single_nested(approval_settings()).optional(),
        )
        .attribute("created_date_time", common::created_date_time())
        .attribute("modified_date_time", common::last_modified_date_time());

    // Graph only accepts complete policies on update
    ResourceDefinition::new(
        "access_package_assignment_policy",
        "/identityGovernance/entitlementManagement/assignmentPolicies",
        schema,
    )
    .update_method(UpdateMethod::Put)
    .read_options(ReadOptions::default().expand("accessPackage"))
    .terraform_to_graph(access_package_to_graph)
    .graph_to_terraform(access_package_from_graph)
}

fn access_package_to_graph(params: &mut TerraformToGraphParams<'_>) -> Result<()> {
    common::nest_navigation_id(params.raw, "accessPackageId", "accessPackage");
    Ok(())
}

fn access_package_from_graph(params: &mut GraphToTerraformParams<'_>) -> Result<()> {
    common::flatten_navigation_id(params.raw, "accessPackage", "accessPackageId");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::convert::graph_to_terraform;
    use crate::generic::request::update_request;
    use crate::generic::HttpMethod;
    use serde_json::json;

    const PACKAGE: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
    const APPROVER: &str = "0e7e2a5c-1c2a-4c1b-9a5e-3b2f7a9c1d00";

    fn state() -> serde_json::Value {
        json!({
            "id": "pol-1",
            "access_package_id": PACKAGE,
            "display_name": "Employees",
            "description": "Members may request",
            "allowed_target_scope": "allMemberUsers",
            "request_approval_settings": {
                "is_approval_required_for_add": true,
                "is_approval_required_for_update": false,
                "stages": [{
                    "duration_before_automatic_denial": "P14D",
                    "is_approver_justification_required": false,
                    "is_escalation_enabled": false,
                    "primary_approvers": [{ "single_user": { "user_id": APPROVER } }]
                }]
            }
        })
    }

    #[test]
    fn test_update_puts_full_policy() {
        let prior = state();
        let mut next = state();
        next["display_name"] = json!("All employees");

        let request = update_request(&resource(), &next, &prior, "https://graph.microsoft.com/beta")
            .unwrap()
            .unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(
            request.uri,
            "/identityGovernance/entitlementManagement/assignmentPolicies/pol-1"
        );

        let body = request.body.unwrap();
        assert_eq!(body["displayName"], "All employees");
        assert_eq!(body["accessPackage"], json!({ "id": PACKAGE }));
        assert_eq!(
            body["requestApprovalSettings"]["stages"][0]["primaryApprovers"][0],
            json!({ "@odata.type": "#microsoft.graph.singleUser", "userId": APPROVER })
        );
    }

    #[test]
    fn test_read_flattens_access_package() {
        let mut raw = json!({
            "id": "pol-1",
            "displayName": "Employees",
            "accessPackage": { "id": PACKAGE, "displayName": "Sales tools" }
        })
        .as_object()
        .cloned()
        .unwrap();
        access_package_from_graph(&mut GraphToTerraformParams { raw: &mut raw }).unwrap();
        let state = graph_to_terraform(&resource().schema, &raw).unwrap();
        assert_eq!(state["access_package_id"], PACKAGE);
    }
}
