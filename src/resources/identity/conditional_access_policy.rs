use crate::generic::ResourceDefinition;
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, Schema, Validator};

fn string_set() -> Attribute {
    Attribute::set(ElementKind::String).optional()
}

fn include_exclude(include: &'static str, exclude: &'static str) -> Schema {
    Schema::new("")
        .attribute(include, string_set())
        .attribute(exclude, string_set())
}

const RISK_LEVELS: &[&str] = &["low", "medium", "high", "hidden", "none", "unknownFutureValue"];

fn conditions() -> Schema {
    let applications = Schema::new("Cloud apps or actions")
        .attribute("include_applications", string_set())
        .attribute("exclude_applications", string_set())
        .attribute("include_user_actions", string_set())
        .attribute(
            "include_authentication_context_class_references",
            string_set(),
        );

    let users = Schema::new("Users, groups and roles in scope")
        .attribute("include_users", string_set())
        .attribute("exclude_users", string_set())
        .attribute("include_groups", common::uuid_set().optional())
        .attribute("exclude_groups", common::uuid_set().optional())
        .attribute("include_roles", common::uuid_set().optional())
        .attribute("exclude_roles", common::uuid_set().optional());

    let platforms = Schema::new("")
        .attribute(
            "include_platforms",
            Attribute::set(ElementKind::String)
                .required()
                .validator(Validator::each_one_of(&[
                    "android",
                    "iOS",
                    "windows",
                    "windowsPhone",
                    "macOS",
                    "linux",
                    "all",
                    "unknownFutureValue",
                ])),
        )
        .attribute("exclude_platforms", string_set());

    Schema::new("Conditions")
        .attribute(
            "client_app_types",
            Attribute::set(ElementKind::String)
                .required()
                .validator(Validator::each_one_of(&[
                    "all",
                    "browser",
                    "mobileAppsAndDesktopClients",
                    "exchangeActiveSync",
                    "easSupported",
                    "other",
                ])),
        )
        .attribute("applications", Attribute::single_nested(applications).required())
        .attribute("users", Attribute::single_nested(users).required())
        .attribute("platforms", Attribute::single_nested(platforms).optional())
        .attribute(
            "locations",
            Attribute::single_nested(include_exclude("include_locations", "exclude_locations")).optional(),
        )
        .attribute(
            "sign_in_risk_levels",
            Attribute::set(ElementKind::String)
                .optional()
                .validator(Validator::each_one_of(RISK_LEVELS)),
        )
        .attribute(
            "user_risk_levels",
            Attribute::set(ElementKind::String)
                .optional()
                .validator(Validator::each_one_of(RISK_LEVELS)),
        )
}

fn grant_controls() -> Schema {
    Schema::new("Grant controls")
        .attribute(
            "operator",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["AND", "OR"])),
        )
        .attribute(
            "built_in_controls",
            Attribute::set(ElementKind::String)
                .optional()
                .validator(Validator::each_one_of(&[
                    "block",
                    "mfa",
                    "compliantDevice",
                    "domainJoinedDevice",
                    "approvedApplication",
                    "compliantApplication",
                    "passwordChange",
                    "unknownFutureValue",
                ])),
        )
        .attribute("custom_authentication_factors", string_set())
        .attribute("terms_of_use", string_set())
        .attribute(
            "authentication_strength",
            Attribute::single_nested(Schema::new("").attribute("id", Attribute::string().required())).optional(),
        )
}

fn session_controls() -> Schema {
    let sign_in_frequency = Schema::new("")
        .attribute("is_enabled", Attribute::bool().required())
        .attribute("value", Attribute::int64().optional().validator(Validator::range(1, 365)))
        .attribute(
            "type",
            Attribute::string()
                .optional()
                .validator(Validator::one_of(&["days", "hours"])),
        )
        .attribute(
            "frequency_interval",
            Attribute::string()
                .optional()
                .default_value("timeBased")
                .validator(Validator::one_of(&["timeBased", "everyTime"])),
        )
        .attribute(
            "authentication_type",
            Attribute::string()
                .optional()
                .default_value("primaryAndSecondaryAuthentication")
                .validator(Validator::one_of(&["primaryAndSecondaryAuthentication", "secondaryAuthentication"])),
        );

    let persistent_browser = Schema::new("")
        .attribute("is_enabled", Attribute::bool().required())
        .attribute(
            "mode",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["always", "never"])),
        );

    Schema::new("Session controls")
        .attribute("sign_in_frequency", Attribute::single_nested(sign_in_frequency).optional())
        .attribute("persistent_browser", Attribute::single_nested(persistent_browser).optional())
        .attribute(
            "application_enforced_restrictions",
            Attribute::single_nested(Schema::new("").attribute("is_enabled", Attribute::bool().required())).optional(),
        )
        .attribute("disable_resilience_defaults", Attribute::bool().optional())
}

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Conditional Access policy")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute(
            "state",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["enabled", "disabled", "enabledForReportingButNotEnforced"])),
        )
        .attribute("conditions", Attribute::single_nested(conditions()).required())
        .attribute("grant_controls", Attribute::single_nested(grant_controls()).optional())
        .attribute("session_controls", Attribute::single_nested(session_controls()).optional())
        .attribute("created_date_time", common::created_date_time())
        .attribute("modified_date_time", common::last_modified_date_time());

    ResourceDefinition::new("conditional_access_policy", "/identity/conditionalAccess/policies", schema)
        .plural("conditional_access_policies")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::convert::terraform_to_graph;
    use crate::schema::validate_config;
    use serde_json::json;

    fn config() -> serde_json::Value {
        json!({
            "display_name": "Require MFA for admins",
            "state": "enabledForReportingButNotEnforced",
            "conditions": {
                "client_app_types": ["all"],
                "applications": { "include_applications": ["All"] },
                "users": { "include_roles": ["62e90394-69f5-4237-9190-012177145e10"] }
            },
            "grant_controls": {
                "operator": "OR",
                "built_in_controls": ["mfa"]
            }
        })
    }

    #[test]
    fn test_valid_policy() {
        let definition = resource();
        assert!(validate_config(&definition.schema, &config()).is_empty());
    }

    #[test]
    fn test_invalid_grant_control() {
        let mut config = config();
        config["grant_controls"]["built_in_controls"] = json!(["mfa", "sms"]);
        let diags = validate_config(&resource().schema, &config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].path, "grant_controls.built_in_controls[1]");
    }

    #[test]
    fn test_nested_payload() {
        let body = terraform_to_graph(&resource().schema, &config()).unwrap();
        assert_eq!(body["conditions"]["clientAppTypes"], json!(["all"]));
        assert_eq!(
            body["conditions"]["users"]["includeRoles"],
            json!(["62e90394-69f5-4237-9190-012177145e10"])
        );
        assert_eq!(body["grantControls"]["builtInControls"], json!(["mfa"]));
    }
}
