use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, Schema, Validator};

fn redirect_uris() -> Attribute {
    Attribute::set(ElementKind::String)
        .optional()
        .validator(Validator::SizeAtMost { max: 256 })
}

pub fn resource() -> ResourceDefinition {
    let implicit_grant = Schema::new("")
        .attribute("enable_access_token_issuance", Attribute::bool().optional())
        .attribute("enable_id_token_issuance", Attribute::bool().optional());

    let web = Schema::new("Web platform settings")
        .attribute("redirect_uris", redirect_uris())
        .attribute("home_page_url", Attribute::string().optional())
        .attribute("logout_url", Attribute::string().optional())
        .attribute(
            "implicit_grant_settings",
            Attribute::single_nested(implicit_grant).optional(),
        );

    let resource_access = Schema::new("")
        .attribute("id", common::uuid().required())
        .attribute(
            "type",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["Scope", "Role"])),
        );

    let required_resource_access = Schema::new("API permissions")
        .attribute("resource_app_id", common::uuid().required())
        .attribute(
            "resource_access",
            Attribute::set_nested(resource_access)
                .required()
                .validator(Validator::SizeAtLeast { min: 1 }),
        );

    let schema = Schema::new("App registration")
        .attribute("id", common::id())
        .attribute(
            "app_id",
            Attribute::string()
                .computed()
                .description("Client id")
                .plan_modifier(crate::schema::PlanModifier::UseStateForUnknown),
        )
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("notes", Attribute::string().optional())
        .attribute(
            "sign_in_audience",
            Attribute::string()
                .optional()
                .default_value("AzureADMyOrg")
                .validator(Validator::one_of(&[
                    "AzureADMyOrg",
                    "AzureADMultipleOrgs",
                    "AzureADandPersonalMicrosoftAccount",
                    "PersonalMicrosoftAccount",
                ])),
        )
        .attribute(
            "group_membership_claims",
            Attribute::string()
                .optional()
                .validator(Validator::one_of(&["None", "SecurityGroup", "All", "ApplicationGroup", "DirectoryRole"])),
        )
        .attribute(
            "identifier_uris",
            Attribute::set(ElementKind::String).optional(),
        )
        .attribute("tags", Attribute::set(ElementKind::String).optional())
        .attribute("web", Attribute::single_nested(web).optional())
        .attribute(
            "spa",
            Attribute::single_nested(Schema::new("").attribute("redirect_uris", redirect_uris())).optional(),
        )
        .attribute(
            "public_client",
            Attribute::single_nested(Schema::new("").attribute("redirect_uris", redirect_uris())).optional(),
        )
        .attribute(
            "required_resource_access",
            Attribute::set_nested(required_resource_access).optional(),
        )
        .attribute("owners", common::uuid_set().optional())
        .attribute("created_date_time", common::created_date_time());

    ResourceDefinition::new("application", "/applications", schema)
        .read_options(ReadOptions::default().extra_read_ids("owners", "owners"))
        .write_sub_action(WriteSubAction::ref_set("owners", "owners"))
        .lookup_by(&["display_name", "app_id"])
}
