//! Resource definitions, one module per Graph entity type

pub mod common;
pub mod device_management;
pub mod directory;
pub mod governance;
pub mod identity;

use crate::generic::ResourceDefinition;

/// Every resource, unprefixed
pub fn all() -> Vec<ResourceDefinition> {
    let mut resources = directory::resources();
    resources.extend(identity::resources());
    resources.extend(device_management::resources());
    resources.extend(governance::resources());
    resources
}
