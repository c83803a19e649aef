use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Enterprise application (service principal) of an app registration")
        .attribute("id", common::id())
        .attribute(
            "app_id",
            common::uuid()
                .required()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "account_enabled",
            Attribute::bool().optional().default_value(true),
        )
        .attribute(
            "app_role_assignment_required",
            Attribute::bool().optional().default_value(false),
        )
        .attribute("notes", Attribute::string().optional())
        .attribute("tags", Attribute::set(ElementKind::String).optional())
        .attribute(
            "preferred_single_sign_on_mode",
            Attribute::string()
                .optional()
                .validator(Validator::one_of(&["password", "saml", "notSupported", "oidc"])),
        )
        .attribute("owners", common::uuid_set().optional())
        .attribute("display_name", Attribute::string().computed())
        .attribute("service_principal_type", Attribute::string().computed())
        .attribute("app_owner_organization_id", Attribute::string().computed());

    ResourceDefinition::new("service_principal", "/servicePrincipals", schema)
        .read_options(ReadOptions::default().extra_read_ids("owners", "owners"))
        .write_sub_action(WriteSubAction::ref_set("owners", "owners"))
        .lookup_by(&["app_id", "display_name"])
}
