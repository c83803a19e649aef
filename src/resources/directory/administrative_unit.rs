use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Administrative unit scoping directory role assignments")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute(
            "visibility",
            Attribute::string()
                .optional()
                .validator(Validator::one_of(&["Public", "HiddenMembership"]))
                .plan_modifier(PlanModifier::RequiresReplaceIfConfigured),
        )
        .attribute(
            "membership_type",
            Attribute::string()
                .optional()
                .default_value("Assigned")
                .validator(Validator::one_of(&["Assigned", "Dynamic"])),
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
            "is_member_management_restricted",
            Attribute::bool()
                .optional()
                .default_value(false)
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "members",
            common::uuid_set()
                .optional()
                .validator(Validator::conflicts_with(&["membership_rule"])),
        );

    ResourceDefinition::new("administrative_unit", "/administrativeUnits", schema)
        .read_options(ReadOptions::default().extra_read_ids("members", "members"))
        .write_sub_action(WriteSubAction::ref_set("members", "members"))
}
