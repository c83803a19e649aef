//! Conditional Access, authentication methods and cross-tenant access

pub mod authentication_context_class_reference;
pub mod authentication_method_configuration;
pub mod authentication_strength_policy;
pub mod conditional_access_policy;
pub mod cross_tenant_access_default;
pub mod cross_tenant_access_partner;
pub mod named_location;

use crate::generic::ResourceDefinition;

pub fn resources() -> Vec<ResourceDefinition> {
    vec![
        conditional_access_policy::resource(),
        named_location::resource(),
        authentication_strength_policy::resource(),
        authentication_context_class_reference::resource(),
        authentication_method_configuration::resource(),
        cross_tenant_access_partner::resource(),
        cross_tenant_access_default::resource(),
    ]
}
