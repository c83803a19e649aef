use crate::generic::ResourceDefinition;
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let permission = Schema::new("")
        .attribute(
            "allowed_resource_actions",
            Attribute::set(ElementKind::String)
                .required()
                .validator(Validator::SizeAtLeast { min: 1 }),
        )
        .attribute("condition", Attribute::string().optional());

    let schema = Schema::new("Custom Entra ID directory role")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("is_enabled", Attribute::bool().required())
        .attribute(
            "role_permissions",
            Attribute::list_nested(permission)
                .required()
                .validator(Validator::SizeAtLeast { min: 1 }),
        )
        .attribute(
            "template_id",
            common::uuid()
                .optional()
                .computed()
                .plan_modifier(PlanModifier::UseStateForUnknown)
                .plan_modifier(PlanModifier::RequiresReplaceIfConfigured),
        )
        .attribute("version", Attribute::string().optional())
        .attribute("is_built_in", Attribute::bool().computed());

    ResourceDefinition::new("role_definition", "/roleManagement/directory/roleDefinitions", schema)
}
