use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, Schema, Validator};

fn oma_setting() -> Schema {
    Schema::new("OMA-URI setting")
        .attribute("display_name", Attribute::string().required())
        .attribute("description", Attribute::string().optional())
        .attribute(
            "oma_uri",
            Attribute::string()
                .required()
                .validator(Validator::regex(r"^\./", "must start with ./")),
        )
        .attribute(
            "integer",
            Attribute::derived(
                "#microsoft.graph.omaSettingInteger",
                Schema::new("").attribute("value", Attribute::int64().required()),
            ),
        )
        .attribute(
            "string",
            Attribute::derived(
                "#microsoft.graph.omaSettingString",
                Schema::new("").attribute("value", Attribute::string().required()),
            ),
        )
        .attribute(
            "boolean",
            Attribute::derived(
                "#microsoft.graph.omaSettingBoolean",
                Schema::new("").attribute("value", Attribute::bool().required()),
            ),
        )
}

fn custom_profile() -> Schema {
    Schema::new("")
        .attribute("payload_name", Attribute::string().required())
        .attribute("payload_file_name", Attribute::string().optional())
        .attribute(
            "payload",
            Attribute::string()
                .required()
                .description("Base64-encoded .mobileconfig")
                .validator(Validator::Base64),
        )
}

pub fn resource() -> ResourceDefinition {
    let windows10_custom = Schema::new("").attribute(
        "oma_settings",
        Attribute::list_nested(oma_setting())
            .required()
            .validator(Validator::SizeAtLeast { min: 1 }),
    );

    let edition_upgrade = Schema::new("")
        .attribute(
            "license_type",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["productKey", "licenseFile", "notConfigured"])),
        )
        .attribute(
            "target_edition",
            Attribute::string().required().validator(Validator::one_of(&[
                "windows10Enterprise",
                "windows10Education",
                "windows10Professional",
                "windows10ProfessionalEducation",
                "windows10ProfessionalWorkstation",
            ])),
        )
        .attribute("product_key", Attribute::string().optional().sensitive());

    let schema = Schema::new("Intune device configuration profile")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 200)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute("version", Attribute::int64().computed())
        .attribute("role_scope_tag_ids", common::role_scope_tag_ids())
        .attribute(
            "windows10_custom",
            Attribute::derived("#microsoft.graph.windows10CustomConfiguration", windows10_custom),
        )
        .attribute(
            "ios_custom",
            Attribute::derived("#microsoft.graph.iosCustomConfiguration", custom_profile()),
        )
        .attribute(
            "macos_custom",
            Attribute::derived("#microsoft.graph.macOSCustomConfiguration", custom_profile()),
        )
        .attribute(
            "edition_upgrade",
            Attribute::derived("#microsoft.graph.editionUpgradeConfiguration", edition_upgrade),
        )
        .attribute("assignments", common::assignments(Schema::new("")))
        .extend(common::timestamps());

    ResourceDefinition::new("device_configuration", "/deviceManagement/deviceConfigurations", schema)
        .read_options(ReadOptions::default().expand("assignments"))
        .write_sub_action(WriteSubAction::assign())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::convert::{graph_to_terraform, terraform_to_graph};
    use serde_json::json;

    #[test]
    fn test_nested_oma_settings_round_trip() {
        let definition = resource();
        let config = json!({
            "display_name": "Custom OMA",
            "windows10_custom": {
                "oma_settings": [
                    {
                        "display_name": "Disable camera",
                        "oma_uri": "./Vendor/MSFT/Policy/Config/Camera/AllowCamera",
                        "integer": { "value": 0 }
                    },
                    {
                        "display_name": "Lock screen text",
                        "oma_uri": "./Vendor/MSFT/Policy/Config/DeviceLock/Text",
                        "string": { "value": "Property of Contoso" }
                    }
                ]
            }
        });

        let body = terraform_to_graph(&definition.schema, &config).unwrap();
        assert_eq!(body["@odata.type"], "#microsoft.graph.windows10CustomConfiguration");
        assert_eq!(body["omaSettings"][0]["@odata.type"], "#microsoft.graph.omaSettingInteger");
        assert_eq!(body["omaSettings"][0]["value"], 0);
        assert_eq!(body["omaSettings"][1]["omaUri"], "./Vendor/MSFT/Policy/Config/DeviceLock/Text");

        let state = graph_to_terraform(&definition.schema, &body).unwrap();
        assert_eq!(state["windows10_custom"]["oma_settings"][1]["string"]["value"], "Property of Contoso");
        assert!(state["windows10_custom"]["oma_settings"][1]["integer"].is_null());
        assert!(state["ios_custom"].is_null());
    }
}
