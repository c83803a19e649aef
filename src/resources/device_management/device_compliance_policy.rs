use crate::error::Result;
use crate::generic::{ReadOptions, ResourceDefinition, TerraformToGraphParams, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, Schema, Validator};
use serde_json::json;

fn os_version() -> Attribute {
    Attribute::string()
        .optional()
        .validator(Validator::regex(r"^\d+(\.\d+){0,3}$", "must be a dotted version number"))
}

pub fn resource() -> ResourceDefinition {
    let windows10 = Schema::new("")
        .attribute("password_required", Attribute::bool().optional())
        .attribute(
            "password_minimum_length",
            Attribute::int64().optional().validator(Validator::range(4, 16)),
        )
        .attribute("bit_locker_enabled", Attribute::bool().optional())
        .attribute("secure_boot_enabled", Attribute::bool().optional())
        .attribute("code_integrity_enabled", Attribute::bool().optional())
        .attribute("storage_require_encryption", Attribute::bool().optional())
        .attribute("active_firewall_required", Attribute::bool().optional())
        .attribute("defender_enabled", Attribute::bool().optional())
        .attribute("rtp_enabled", Attribute::bool().optional())
        .attribute("antivirus_required", Attribute::bool().optional())
        .attribute("os_minimum_version", os_version())
        .attribute("os_maximum_version", os_version());

    let ios = Schema::new("")
        .attribute("passcode_required", Attribute::bool().optional())
        .attribute(
            "passcode_minimum_length",
            Attribute::int64().optional().validator(Validator::range(4, 14)),
        )
        .attribute("security_block_jailbroken_devices", Attribute::bool().optional())
        .attribute("managed_email_profile_required", Attribute::bool().optional())
        .attribute("os_minimum_version", os_version())
        .attribute("os_maximum_version", os_version());

    let android_work_profile = Schema::new("")
        .attribute("password_required", Attribute::bool().optional())
        .attribute(
            "password_minimum_length",
            Attribute::int64().optional().validator(Validator::range(4, 16)),
        )
        .attribute("security_block_jailbroken_devices", Attribute::bool().optional())
        .attribute("storage_require_encryption", Attribute::bool().optional())
        .attribute("os_minimum_version", os_version());

    let macos = Schema::new("")
        .attribute("password_required", Attribute::bool().optional())
        .attribute("system_integrity_protection_enabled", Attribute::bool().optional())
        .attribute("firewall_enabled", Attribute::bool().optional())
        .attribute("storage_require_encryption", Attribute::bool().optional())
        .attribute("os_minimum_version", os_version());

    let schema = Schema::new("Intune device compliance policy")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 200)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("role_scope_tag_ids", common::role_scope_tag_ids())
        .attribute(
            "windows10",
            Attribute::derived("#microsoft.graph.windows10CompliancePolicy", windows10),
        )
        .attribute(
            "ios",
            Attribute::derived("#microsoft.graph.iosCompliancePolicy", ios),
        )
        .attribute(
            "android_work_profile",
            Attribute::derived("#microsoft.graph.androidWorkProfileCompliancePolicy", android_work_profile),
        )
        .attribute(
            "macos",
            Attribute::derived("#microsoft.graph.macOSCompliancePolicy", macos),
        )
        .attribute("assignments", common::assignments(Schema::new("")))
        .extend(common::timestamps());

    ResourceDefinition::new(
        "device_compliance_policy",
        "/deviceManagement/deviceCompliancePolicies",
        schema,
    )
    .read_options(ReadOptions::default().expand("assignments"))
    .write_sub_action(WriteSubAction::assign())
    .terraform_to_graph(scheduled_actions)
    .plural("device_compliance_policies")
}

/// Graph refuses to create a compliance policy without a block action for
/// non-compliance, and refuses the property on PATCH
fn scheduled_actions(params: &mut TerraformToGraphParams<'_>) -> Result<()> {
    if params.is_update {
        params.raw.remove("scheduledActionsForRule");
        return Ok(());
    }

    params.raw.insert(
        "scheduledActionsForRule".to_string(),
        json!([{
            "ruleName": "PasswordRequired",
            "scheduledActionConfigurations": [{
                "actionType": "block",
                "gracePeriodHours": 0,
                "notificationTemplateId": "",
                "notificationMessageCCList": []
            }]
        }]),
    );
    Ok(())
}
