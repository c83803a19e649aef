use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

fn platform_restriction() -> Attribute {
    let restriction = Schema::new("")
        .attribute("platform_blocked", Attribute::bool().optional().default_value(false))
        .attribute(
            "personal_device_enrollment_blocked",
            Attribute::bool().optional().default_value(false),
        )
        .attribute("os_minimum_version", Attribute::string().optional())
        .attribute("os_maximum_version", Attribute::string().optional());
    Attribute::single_nested(restriction).optional()
}

pub fn resource() -> ResourceDefinition {
    let limit = Schema::new("").attribute(
        "limit",
        Attribute::int64().required().validator(Validator::range(1, 15)),
    );

    let platform_restrictions = Schema::new("")
        .attribute("ios_restriction", platform_restriction())
        .attribute("android_restriction", platform_restriction())
        .attribute("windows_restriction", platform_restriction())
        .attribute(
            "macos_restriction",
            platform_restriction().graph_name("macOSRestriction"),
        );

    let windows_hello = Schema::new("")
        .attribute(
            "state",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["notConfigured", "enabled", "disabled"])),
        )
        .attribute(
            "pin_minimum_length",
            Attribute::int64().optional().validator(Validator::range(4, 127)),
        )
        .attribute(
            "pin_maximum_length",
            Attribute::int64().optional().validator(Validator::range(4, 127)),
        )
        .attribute("security_device_required", Attribute::bool().optional());

    let completion_page = Schema::new("")
        .attribute("show_installation_progress", Attribute::bool().optional())
        .attribute(
            "install_progress_timeout_in_minutes",
            Attribute::int64().optional().validator(Validator::range(1, 1440)),
        )
        .attribute("allow_device_reset_on_install_failure", Attribute::bool().optional())
        .attribute("custom_error_message", Attribute::string().optional());

    let schema = Schema::new("Intune enrollment restriction or enrollment status page")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 200)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute(
            "priority",
            Attribute::int64()
                .optional()
                .computed()
                .validator(Validator::range(1, 1000))
                .plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .attribute("role_scope_tag_ids", common::role_scope_tag_ids())
        .attribute(
            "limit",
            Attribute::derived("#microsoft.graph.deviceEnrollmentLimitConfiguration", limit),
        )
        .attribute(
            "platform_restrictions",
            Attribute::derived(
                "#microsoft.graph.deviceEnrollmentPlatformRestrictionsConfiguration",
                platform_restrictions,
            ),
        )
        .attribute(
            "windows_hello_for_business",
            Attribute::derived(
                "#microsoft.graph.deviceEnrollmentWindowsHelloForBusinessConfiguration",
                windows_hello,
            ),
        )
        .attribute(
            "enrollment_status_page",
            Attribute::derived(
                "#microsoft.graph.windows10EnrollmentCompletionPageConfiguration",
                completion_page,
            ),
        )
        .attribute("assignments", common::assignments(Schema::new("")))
        .extend(common::timestamps());

    // priority is changed through setPriority once the configuration exists
    ResourceDefinition::new(
        "device_enrollment_configuration",
        "/deviceManagement/deviceEnrollmentConfigurations",
        schema,
    )
    .read_options(ReadOptions::default().expand("assignments"))
    .write_sub_action(
        WriteSubAction::assign().body_key("assignments", "enrollmentConfigurationAssignments"),
    )
    .write_sub_action(WriteSubAction::all_in_one("setPriority", &["priority"]).update_only())
}
