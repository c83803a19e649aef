//! Intune device and app management

pub mod device_category;
pub mod device_compliance_policy;
pub mod device_configuration;
pub mod device_enrollment_configuration;
pub mod device_management_script;
pub mod device_shell_script;
pub mod mobile_app;
pub mod role_scope_tag;
pub mod windows_autopilot_deployment_profile;

use crate::generic::ResourceDefinition;

pub fn resources() -> Vec<ResourceDefinition> {
    vec![
        device_compliance_policy::resource(),
        device_configuration::resource(),
        mobile_app::resource(),
        device_management_script::resource(),
        device_shell_script::resource(),
        windows_autopilot_deployment_profile::resource(),
        device_enrollment_configuration::resource(),
        role_scope_tag::resource(),
        device_category::resource(),
    ]
}
