use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let auto_assignment = Schema::new("").odata_type("#microsoft.graph.roleScopeTagAutoAssignment");

    let schema = Schema::new("Intune scope tag")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 128)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("is_built_in", Attribute::bool().computed())
        .attribute(
            "assignments",
            common::assignments(auto_assignment)
                .description("Groups whose devices are tagged automatically"),
        );

    ResourceDefinition::new("role_scope_tag", "/deviceManagement/roleScopeTags", schema)
        .read_options(ReadOptions::default().expand("assignments"))
        .write_sub_action(WriteSubAction::assign())
}
