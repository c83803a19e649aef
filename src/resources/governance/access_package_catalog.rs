use crate::generic::ResourceDefinition;
use crate::resources::common;
use crate::schema::{Attribute, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Entitlement management catalog")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute(
            "state",
            Attribute::string()
                .optional()
                .default_value("published")
                .validator(Validator::one_of(&["published", "unpublished"])),
        )
        .attribute(
            "is_externally_visible",
            Attribute::bool().optional().default_value(false),
        )
        .attribute("catalog_type", Attribute::string().computed())
        .attribute("created_date_time", common::created_date_time())
        .attribute("modified_date_time", common::last_modified_date_time());

    ResourceDefinition::new(
        "access_package_catalog",
        "/identityGovernance/entitlementManagement/catalogs",
        schema,
    )
}
