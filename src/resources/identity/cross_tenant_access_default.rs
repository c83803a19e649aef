use super::cross_tenant_access_partner::settings;
use crate::generic::ResourceDefinition;
use crate::resources::common;
use crate::schema::{Attribute, Schema};

/// The tenant-wide default policy. It always exists: applying PATCHes it and
/// destroying only drops it from state.
pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Default cross-tenant access settings")
        .attribute("id", common::id())
        .attribute("is_service_default", Attribute::bool().computed())
        .extend(settings());

    ResourceDefinition::new(
        "cross_tenant_access_default",
        "/policies/crossTenantAccessPolicy/default",
        schema,
    )
    .singleton("default")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::{create_request, delete_request, entity_id};
    use crate::generic::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_singleton_requests() {
        let definition = resource();
        let planned = json!({ "automatic_user_consent_settings": { "inbound_allowed": false } });

        let request = create_request(&definition, &planned, "https://graph.microsoft.com/beta").unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.uri, "/policies/crossTenantAccessPolicy/default");

        assert_eq!(entity_id(&definition, &json!({})).unwrap(), "default");
        assert!(delete_request(&definition, "default").is_none());
    }
}
