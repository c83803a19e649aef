use crate::error::Result;
use crate::generic::{CreateMethod, GraphToTerraformParams, ResourceDefinition};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

fn targets(values: &'static [&'static str]) -> Schema {
    let target = Schema::new("")
        .attribute("target", Attribute::string().required())
        .attribute(
            "target_type",
            Attribute::string()
                .required()
                .validator(Validator::one_of(values)),
        );

    Schema::new("")
        .attribute(
            "access_type",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["allowed", "blocked"])),
        )
        .attribute("targets", Attribute::set_nested(target).required())
}

fn b2b_setting() -> Attribute {
    let setting = Schema::new("")
        .attribute(
            "users_and_groups",
            Attribute::single_nested(targets(&["user", "group"])).optional(),
        )
        .attribute(
            "applications",
            Attribute::single_nested(targets(&["application"])).optional(),
        );
    Attribute::single_nested(setting).optional()
}

/// Trust and B2B settings shared by the default policy and partner overrides
pub(super) fn settings() -> Schema {
    let inbound_trust = Schema::new("Claims accepted from the other tenant")
        .attribute("is_mfa_accepted", Attribute::bool().optional())
        .attribute("is_compliant_device_accepted", Attribute::bool().optional())
        .attribute(
            "is_hybrid_azure_ad_joined_device_accepted",
            Attribute::bool().optional(),
        );

    let consent = Schema::new("")
        .attribute("inbound_allowed", Attribute::bool().optional())
        .attribute("outbound_allowed", Attribute::bool().optional());

    Schema::new("")
        .attribute("inbound_trust", Attribute::single_nested(inbound_trust).optional())
        .attribute(
            "automatic_user_consent_settings",
            Attribute::single_nested(consent).optional(),
        )
        .attribute("b2b_collaboration_inbound", b2b_setting())
        .attribute("b2b_collaboration_outbound", b2b_setting())
        .attribute("b2b_direct_connect_inbound", b2b_setting())
        .attribute("b2b_direct_connect_outbound", b2b_setting())
}

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Cross-tenant access settings for one partner tenant")
        .attribute(
            "id",
            Attribute::string()
                .computed()
                .description("Same as tenant_id")
                .plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .attribute(
            "tenant_id",
            common::uuid()
                .required()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute("is_service_provider", Attribute::bool().optional())
        .attribute("is_in_multi_tenant_organization", Attribute::bool().computed())
        .extend(settings());

    ResourceDefinition::new(
        "cross_tenant_access_partner",
        "/policies/crossTenantAccessPolicy/partners",
        schema,
    )
    .create_method(CreateMethod::PostWithId { id_attribute: "tenant_id" })
    .graph_to_terraform(tenant_id_as_id)
    .lookup_by(&["tenant_id"])
}

/// Partners are addressed by tenant id and have no `id` of their own
fn tenant_id_as_id(params: &mut GraphToTerraformParams<'_>) -> Result<()> {
    if let Some(tenant_id) = params.raw.get("tenantId").cloned() {
        params.raw.insert("id".to_string(), tenant_id);
    }
    Ok(())
}
