use crate::generic::ResourceDefinition;
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

/// Role assignments cannot be updated in place
pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Directory role assignment")
        .attribute("id", common::id())
        .attribute(
            "principal_id",
            common::uuid()
                .required()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "role_definition_id",
            Attribute::string()
                .required()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "directory_scope_id",
            Attribute::string()
                .optional()
                .default_value("/")
                .validator(Validator::regex(r"^/", "must start with '/'"))
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "app_scope_id",
            Attribute::string()
                .optional()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute("condition", Attribute::string().optional().plan_modifier(PlanModifier::RequiresReplace));

    ResourceDefinition::new("role_assignment", "/roleManagement/directory/roleAssignments", schema)
        .lookup_by(&["principal_id"])
}
