use crate::error::Result;
use crate::generic::{
    GraphToTerraformParams, ReadOptions, ResourceDefinition, TerraformToGraphParams, WriteSubAction,
};
use crate::resources::common;
use crate::schema::{Attribute, Schema, Validator};

/// Attributes shared by Windows PowerShell and macOS shell scripts
pub(super) fn script_attributes() -> Schema {
    Schema::new("")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 200)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute(
            "script_content",
            Attribute::string()
                .required()
                .description("Plain-text script; base64-encoded on the wire"),
        )
        .attribute(
            "file_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute(
            "run_as_account",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["system", "user"])),
        )
        .attribute("role_scope_tag_ids", common::role_scope_tag_ids())
        .attribute("assignments", common::assignments(Schema::new("")))
        .extend(common::timestamps())
}

pub(super) fn encode_script(params: &mut TerraformToGraphParams<'_>) -> Result<()> {
    common::encode_base64_field(params.raw, "scriptContent");
    Ok(())
}

pub(super) fn decode_script(params: &mut GraphToTerraformParams<'_>) -> Result<()> {
    common::decode_base64_field(params.raw, "scriptContent")
}

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Intune PowerShell script for Windows")
        .extend(script_attributes())
        .attribute(
            "file_name",
            Attribute::string()
                .required()
                .validator(Validator::regex(r"(?i)\.ps1$", "must end in .ps1")),
        )
        .attribute(
            "enforce_signature_check",
            Attribute::bool().optional().default_value(false),
        )
        .attribute("run_as_32_bit", Attribute::bool().optional().default_value(false));

    ResourceDefinition::new(
        "device_management_script",
        "/deviceManagement/deviceManagementScripts",
        schema,
    )
    .read_options(ReadOptions::default().expand("assignments"))
    .write_sub_action(
        WriteSubAction::assign().body_key("assignments", "deviceManagementScriptAssignments"),
    )
    .terraform_to_graph(encode_script)
    .graph_to_terraform(decode_script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::{create_request, update_request};
    use serde_json::json;

    const ROOT: &str = "https://graph.microsoft.com/beta";

    #[test]
    fn test_script_content_is_encoded() {
        let planned = json!({
            "display_name": "Set time zone",
            "script_content": "Set-TimeZone -Id 'UTC'",
            "file_name": "tz.ps1",
            "run_as_account": "system",
            "enforce_signature_check": false,
            "run_as_32_bit": false
        });
        let body = create_request(&resource(), &planned, ROOT).unwrap().body.unwrap();
        assert_eq!(body["scriptContent"], "U2V0LVRpbWVab25lIC1JZCAnVVRDJw==");
        assert_eq!(body["runAs32Bit"], false);
    }

    #[test]
    fn test_unchanged_script_not_resent() {
        let prior = json!({
            "id": "s-1",
            "display_name": "Set time zone",
            "script_content": "Set-TimeZone -Id 'UTC'",
            "file_name": "tz.ps1",
            "run_as_account": "system"
        });
        let mut next = prior.clone();
        next["display_name"] = json!("Set time zone (UTC)");

        let body = update_request(&resource(), &next, &prior, ROOT)
            .unwrap()
            .unwrap()
            .body
            .unwrap();
        assert_eq!(body, json!({ "displayName": "Set time zone (UTC)" }));
    }

    #[test]
    fn test_read_decodes_content() {
        let mut raw = json!({ "scriptContent": "ZWNobyBoaQ==" }).as_object().cloned().unwrap();
        decode_script(&mut GraphToTerraformParams { raw: &mut raw }).unwrap();
        assert_eq!(raw["scriptContent"], "echo hi");
    }
}
