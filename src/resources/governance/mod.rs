//! Entitlement management

pub mod access_package;
pub mod access_package_assignment_policy;
pub mod access_package_catalog;
pub mod connected_organization;

use crate::generic::ResourceDefinition;

pub fn resources() -> Vec<ResourceDefinition> {
    vec![
        connected_organization::resource(),
        access_package_catalog::resource(),
        access_package::resource(),
        access_package_assignment_policy::resource(),
    ]
}
