use crate::error::Result;
use crate::generic::{
    GraphToTerraformParams, ReadOptions, ResourceDefinition, TerraformToGraphParams,
};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Entitlement management access package")
        .attribute("id", common::id())
        .attribute(
            "catalog_id",
            common::uuid()
                .required()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("is_hidden", Attribute::bool().optional().default_value(false))
        .attribute("created_date_time", common::created_date_time())
        .attribute("modified_date_time", common::last_modified_date_time());

    ResourceDefinition::new(
        "access_package",
        "/identityGovernance/entitlementManagement/accessPackages",
        schema,
    )
    .read_options(ReadOptions::default().expand("catalog"))
    .terraform_to_graph(catalog_to_graph)
    .graph_to_terraform(catalog_from_graph)
}

/// The catalog is a navigation property in Graph
fn catalog_to_graph(params: &mut TerraformToGraphParams<'_>) -> Result<()> {
    if params.is_update {
        params.raw.remove("catalogId");
    } else {
        common::nest_navigation_id(params.raw, "catalogId", "catalog");
    }
    Ok(())
}

fn catalog_from_graph(params: &mut GraphToTerraformParams<'_>) -> Result<()> {
    common::flatten_navigation_id(params.raw, "catalog", "catalogId");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::{create_request, read_uri};
    use serde_json::json;

    #[test]
    fn test_catalog_navigation() {
        let definition = resource();
        let planned = json!({
            "catalog_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "display_name": "Sales tools",
            "is_hidden": false
        });
        let body = create_request(&definition, &planned, "https://graph.microsoft.com/beta")
            .unwrap()
            .body
            .unwrap();
        assert_eq!(
            body,
            json!({
                "catalog": { "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6" },
                "displayName": "Sales tools",
                "isHidden": false
            })
        );

        assert_eq!(
            read_uri(&definition, "ap-1"),
            "/identityGovernance/entitlementManagement/accessPackages/ap-1?$expand=catalog"
        );
    }
}
