use crate::generic::ResourceDefinition;
use crate::resources::common;
use crate::schema::{Attribute, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Intune device category")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 128)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("role_scope_tag_ids", common::role_scope_tag_ids());

    ResourceDefinition::new("device_category", "/deviceManagement/deviceCategories", schema)
}
