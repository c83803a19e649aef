//! Entra ID directory objects

pub mod administrative_unit;
pub mod application;
pub mod group;
pub mod role_assignment;
pub mod role_definition;
pub mod service_principal;
pub mod user;

use crate::generic::ResourceDefinition;

pub fn resources() -> Vec<ResourceDefinition> {
    vec![
        group::resource(),
        user::resource(),
        administrative_unit::resource(),
        application::resource(),
        service_principal::resource(),
        role_definition::resource(),
        role_assignment::resource(),
    ]
}
