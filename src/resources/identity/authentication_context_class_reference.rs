use crate::generic::{CreateMethod, ResourceDefinition};
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

/// Context ids are chosen by the caller (`c1`..`c99`) and created by PATCH (upsert)
pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Authentication context for step-up Conditional Access")
        .attribute(
            "id",
            Attribute::string()
                .required()
                .validator(Validator::regex(r"^c([1-9]|[1-9][0-9])$", "must be c1 through c99"))
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("is_available", Attribute::bool().optional().default_value(false));

    ResourceDefinition::new(
        "authentication_context_class_reference",
        "/identity/conditionalAccess/authenticationContextClassReferences",
        schema,
    )
    .create_method(CreateMethod::PatchWithId { id_attribute: "id" })
}
