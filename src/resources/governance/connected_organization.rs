use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let identity_source = Schema::new("Where users of the organization sign in")
        .attribute(
            "azure_active_directory_tenant",
            Attribute::derived(
                "#microsoft.graph.azureActiveDirectoryTenant",
                Schema::new("")
                    .attribute("tenant_id", common::uuid().required())
                    .attribute("display_name", Attribute::string().optional()),
            ),
        )
        .attribute(
            "domain",
            Attribute::derived(
                "#microsoft.graph.domainIdentitySource",
                Schema::new("")
                    .attribute("domain_name", Attribute::string().required())
                    .attribute("display_name", Attribute::string().optional()),
            ),
        )
        .attribute(
            "external_domain_federation",
            Attribute::derived(
                "#microsoft.graph.externalDomainFederation",
                Schema::new("")
                    .attribute("domain_name", Attribute::string().required())
                    .attribute("issuer_uri", Attribute::string().required())
                    .attribute("display_name", Attribute::string().optional()),
            ),
        );

    let schema = Schema::new("Entitlement management connected organization")
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
                .default_value("configured")
                .validator(Validator::one_of(&["configured", "proposed"])),
        )
        .attribute(
            "identity_sources",
            Attribute::set_nested(identity_source)
                .required()
                .validator(Validator::SizeAtLeast { min: 1 })
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "internal_sponsors",
            common::uuid_set()
                .optional()
                .description("Users or groups in this tenant who approve requests"),
        )
        .attribute(
            "external_sponsors",
            common::uuid_set()
                .optional()
                .description("Guest users or groups representing the organization"),
        )
        .attribute("created_date_time", common::created_date_time())
        .attribute("modified_date_time", common::last_modified_date_time());

    ResourceDefinition::new(
        "connected_organization",
        "/identityGovernance/entitlementManagement/connectedOrganizations",
        schema,
    )
    .read_options(
        ReadOptions::default()
            .extra_read_ids("internalSponsors", "internalSponsors")
            .extra_read_ids("externalSponsors", "externalSponsors"),
    )
    .write_sub_action(WriteSubAction::ref_set("internalSponsors", "internal_sponsors"))
    .write_sub_action(WriteSubAction::ref_set("externalSponsors", "external_sponsors"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::{create_request, sub_action_requests};
    use crate::generic::HttpMethod;
    use serde_json::json;

    const ROOT: &str = "https://graph.microsoft.com/beta";
    const SPONSOR: &str = "0e7e2a5c-1c2a-4c1b-9a5e-3b2f7a9c1d00";

    #[test]
    fn test_sponsors_are_references() {
        let planned = json!({
            "display_name": "Fabrikam",
            "state": "configured",
            "identity_sources": [{ "domain": { "domain_name": "fabrikam.com" } }],
            "internal_sponsors": [SPONSOR]
        });

        let definition = resource();
        let body = create_request(&definition, &planned, ROOT).unwrap().body.unwrap();
        assert!(body.get("internalSponsors").is_none());
        assert_eq!(
            body["identitySources"],
            json!([{ "@odata.type": "#microsoft.graph.domainIdentitySource", "domainName": "fabrikam.com" }])
        );

        let subs = sub_action_requests(&definition, "/cx/o-1", &planned, None, ROOT).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].method, HttpMethod::Post);
        assert_eq!(subs[0].uri, "/cx/o-1/internalSponsors/$ref");
        assert_eq!(
            subs[0].body,
            Some(json!({ "@odata.id": format!("{}/directoryObjects/{}", ROOT, SPONSOR) }))
        );
    }
}
