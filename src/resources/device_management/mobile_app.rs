use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let web_link = Schema::new("")
        .attribute(
            "app_url",
            Attribute::string()
                .required()
                .validator(Validator::regex(r"^https?://", "must be an http(s) URL")),
        )
        .attribute("use_managed_browser", Attribute::bool().optional().default_value(false));

    let device_type = Schema::new("")
        .attribute("i_pad", Attribute::bool().optional().graph_name("iPad"))
        .attribute(
            "i_phone_and_ipod",
            Attribute::bool().optional().graph_name("iPhoneAndIPod"),
        );

    let ios_store = Schema::new("")
        .attribute("app_store_url", Attribute::string().required())
        .attribute("bundle_id", Attribute::string().required())
        .attribute(
            "applicable_device_type",
            Attribute::single_nested(device_type).required(),
        );

    let android_store = Schema::new("")
        .attribute("app_store_url", Attribute::string().required())
        .attribute("package_id", Attribute::string().optional());

    let install_experience = Schema::new("").attribute(
        "run_as_account",
        Attribute::string()
            .required()
            .validator(Validator::one_of(&["system", "user"])),
    );

    let winget = Schema::new("")
        .attribute(
            "package_identifier",
            Attribute::string()
                .required()
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "install_experience",
            Attribute::single_nested(install_experience).required(),
        );

    let assignment = Schema::new("").attribute(
        "intent",
        Attribute::string().required().validator(Validator::one_of(&[
            "available",
            "required",
            "uninstall",
            "availableWithoutEnrollment",
        ])),
    );

    let schema = Schema::new("Intune app")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 200)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("publisher", Attribute::string().required())
        .attribute("developer", Attribute::string().optional())
        .attribute("owner", Attribute::string().optional())
        .attribute("notes", Attribute::string().optional())
        .attribute("information_url", Attribute::string().optional())
        .attribute("privacy_information_url", Attribute::string().optional())
        .attribute("is_featured", Attribute::bool().optional().default_value(false))
        .attribute("role_scope_tag_ids", common::role_scope_tag_ids())
        .attribute("publishing_state", Attribute::string().computed())
        .attribute(
            "web_link",
            Attribute::derived("#microsoft.graph.webApp", web_link),
        )
        .attribute(
            "ios_store",
            Attribute::derived("#microsoft.graph.iosStoreApp", ios_store),
        )
        .attribute(
            "android_store",
            Attribute::derived("#microsoft.graph.androidStoreApp", android_store),
        )
        .attribute(
            "winget",
            Attribute::derived("#microsoft.graph.winGetApp", winget),
        )
        .attribute(
            "assignments",
            common::assignments(assignment.odata_type("#microsoft.graph.mobileAppAssignment")),
        )
        .extend(common::timestamps());

    ResourceDefinition::new("mobile_app", "/deviceAppManagement/mobileApps", schema)
        .read_options(ReadOptions::default().expand("assignments"))
        .write_sub_action(WriteSubAction::assign().body_key("assignments", "mobileAppAssignments"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::sub_action_requests;
    use serde_json::json;

    #[test]
    fn test_assign_body() {
        let planned = json!({
            "display_name": "Company Portal",
            "publisher": "Microsoft",
            "winget": {
                "package_identifier": "9WZDNCRFJ3PZ",
                "install_experience": { "run_as_account": "user" }
            },
            "assignments": [{
                "intent": "required",
                "target": { "all_licensed_users": {} }
            }]
        });

        let subs = sub_action_requests(
            &resource(),
            "/deviceAppManagement/mobileApps/a-1",
            &planned,
            None,
            "https://graph.microsoft.com/beta",
        )
        .unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].uri, "/deviceAppManagement/mobileApps/a-1/assign");
        assert_eq!(
            subs[0].body,
            Some(json!({
                "mobileAppAssignments": [{
                    "@odata.type": "#microsoft.graph.mobileAppAssignment",
                    "intent": "required",
                    "target": { "@odata.type": "#microsoft.graph.allLicensedUsersAssignmentTarget" }
                }]
            }))
        );
    }
}
