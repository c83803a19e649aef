use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let oobe = Schema::new("Out-of-box experience")
        .attribute("hide_privacy_settings", Attribute::bool().optional().default_value(true))
        .attribute("hide_eula", Attribute::bool().optional().default_value(true))
        .attribute("hide_escape_link", Attribute::bool().optional().default_value(true))
        .attribute(
            "skip_keyboard_selection_page",
            Attribute::bool().optional().default_value(false),
        )
        .attribute(
            "user_type",
            Attribute::string()
                .optional()
                .default_value("standard")
                .validator(Validator::one_of(&["administrator", "standard"])),
        )
        .attribute(
            "device_usage_type",
            Attribute::string()
                .optional()
                .default_value("singleUser")
                .validator(Validator::one_of(&["singleUser", "shared"])),
        );

    let hybrid = Schema::new("").attribute(
        "hybrid_azure_ad_join_skip_connectivity_check",
        Attribute::bool().optional().default_value(false),
    );

    let schema = Schema::new("Windows Autopilot deployment profile")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 200)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute(
            "language",
            Attribute::string().optional().default_value("os-default"),
        )
        .attribute(
            "device_name_template",
            Attribute::string()
                .optional()
                .validator(Validator::length(1, 15)),
        )
        .attribute(
            "device_type",
            Attribute::string()
                .optional()
                .default_value("windowsPc")
                .validator(Validator::one_of(&["windowsPc", "holoLens", "surfaceHub2", "surfaceHub2S", "virtualMachine"]))
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "enable_white_glove",
            Attribute::bool()
                .optional()
                .computed()
                .deprecated("use preprovisioning_allowed instead"),
        )
        .attribute(
            "preprovisioning_allowed",
            Attribute::bool().optional().default_value(false),
        )
        .attribute("extract_hardware_hash", Attribute::bool().optional().default_value(false))
        .attribute(
            "out_of_box_experience_settings",
            Attribute::single_nested(oobe).optional(),
        )
        .attribute("role_scope_tag_ids", common::role_scope_tag_ids())
        .attribute(
            "azure_ad_joined",
            Attribute::derived(
                "#microsoft.graph.azureADWindowsAutopilotDeploymentProfile",
                Schema::new(""),
            ),
        )
        .attribute(
            "hybrid_joined",
            Attribute::derived(
                "#microsoft.graph.activeDirectoryWindowsAutopilotDeploymentProfile",
                hybrid,
            ),
        )
        .attribute("assignments", common::assignments(Schema::new("")))
        .extend(common::timestamps());

    ResourceDefinition::new(
        "windows_autopilot_deployment_profile",
        "/deviceManagement/windowsAutopilotDeploymentProfiles",
        schema,
    )
    .read_options(ReadOptions::default().expand("assignments"))
    .write_sub_action(WriteSubAction::assign())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{validate_config, Severity};
    use serde_json::json;

    #[test]
    fn test_white_glove_is_deprecated() {
        let definition = resource();
        let config = json!({
            "display_name": "Kiosk",
            "enable_white_glove": true,
            "azure_ad_joined": {}
        });
        let diags = validate_config(&definition.schema, &config);
        let warning = diags
            .iter()
            .find(|d| d.path == "enable_white_glove")
            .expect("deprecation warning");
        assert_eq!(warning.severity, Severity::Warning);
        assert!(warning.detail.contains("preprovisioning_allowed"));
        assert!(!diags.iter().any(|d| d.is_error()), "{:?}", diags);
    }
}
