use crate::error::{ProviderError, Result};
use crate::generic::{CreateMethod, DeleteBehavior, ResourceDefinition, TerraformToGraphParams};
use crate::schema::{Attribute, PlanModifier, Schema, Validator};
use serde_json::json;

/// Method id and the derived type that configures it
const METHODS: &[(&str, &str)] = &[
    ("Fido2", "fido2"),
    ("MicrosoftAuthenticator", "microsoft_authenticator"),
    ("TemporaryAccessPass", "temporary_access_pass"),
    ("Email", "email"),
    ("Sms", "sms"),
];

const METHOD_IDS: &[&str] = &["Fido2", "MicrosoftAuthenticator", "TemporaryAccessPass", "Email", "Sms"];

fn include_target() -> Schema {
    Schema::new("")
        .attribute("id", Attribute::string().required())
        .attribute(
            "target_type",
            Attribute::string()
                .optional()
                .default_value("group")
                .validator(Validator::one_of(&["user", "group"])),
        )
        .attribute(
            "is_registration_required",
            Attribute::bool().optional().default_value(false),
        )
}

pub fn resource() -> ResourceDefinition {
    let fido2 = Schema::new("")
        .attribute("is_self_service_registration_allowed", Attribute::bool().optional())
        .attribute("is_attestation_enforced", Attribute::bool().optional());

    let authenticator = Schema::new("")
        .attribute("is_software_oath_enabled", Attribute::bool().optional());

    let temporary_access_pass = Schema::new("")
        .attribute(
            "default_lifetime_in_minutes",
            Attribute::int64().optional().validator(Validator::range(60, 43200)),
        )
        .attribute(
            "default_length",
            Attribute::int64().optional().validator(Validator::range(8, 48)),
        )
        .attribute(
            "minimum_lifetime_in_minutes",
            Attribute::int64().optional().validator(Validator::range(60, 43200)),
        )
        .attribute(
            "maximum_lifetime_in_minutes",
            Attribute::int64().optional().validator(Validator::range(60, 43200)),
        )
        .attribute("is_usable_once", Attribute::bool().optional());

    let email = Schema::new("").attribute(
        "allow_external_id_to_use_email_otp",
        Attribute::string()
            .optional()
            .validator(Validator::one_of(&["default", "enabled", "disabled"])),
    );

    let schema = Schema::new("Authentication method policy for one method")
        .attribute(
            "id",
            Attribute::string()
                .required()
                .validator(Validator::one_of(METHOD_IDS))
                .plan_modifier(PlanModifier::RequiresReplace),
        )
        .attribute(
            "state",
            Attribute::string()
                .required()
                .validator(Validator::one_of(&["enabled", "disabled"])),
        )
        .attribute(
            "include_targets",
            Attribute::set_nested(include_target()).optional(),
        )
        .attribute(
            "fido2",
            Attribute::derived("#microsoft.graph.fido2AuthenticationMethodConfiguration", fido2),
        )
        .attribute(
            "microsoft_authenticator",
            Attribute::derived(
                "#microsoft.graph.microsoftAuthenticatorAuthenticationMethodConfiguration",
                authenticator,
            ),
        )
        .attribute(
            "temporary_access_pass",
            Attribute::derived(
                "#microsoft.graph.temporaryAccessPassAuthenticationMethodConfiguration",
                temporary_access_pass,
            ),
        )
        .attribute(
            "email",
            Attribute::derived("#microsoft.graph.emailAuthenticationMethodConfiguration", email),
        )
        .attribute(
            "sms",
            Attribute::derived("#microsoft.graph.smsAuthenticationMethodConfiguration", Schema::new("")),
        );

    // Method configurations always exist; destroying one switches it off
    ResourceDefinition::new(
        "authentication_method_configuration",
        "/policies/authenticationMethodsPolicy/authenticationMethodConfigurations",
        schema,
    )
    .create_method(CreateMethod::PatchWithId { id_attribute: "id" })
    .delete_behavior(DeleteBehavior::Patch(json!({ "state": "disabled" })))
    .terraform_to_graph(check_method_matches_type)
    .lookup_by(&[])
}

/// The id lives in the URI; the configured branch must be the one for that id
fn check_method_matches_type(params: &mut TerraformToGraphParams<'_>) -> Result<()> {
    params.raw.remove("id");

    let Some(id) = params.planned.get("id").and_then(|v| v.as_str()) else {
        return Ok(());
    };
    let Some((_, branch)) = METHODS.iter().find(|(method, _)| *method == id) else {
        return Ok(());
    };
    if params.planned_attribute(branch).is_none() {
        return Err(ProviderError::conversion(
            *branch,
            format!("method '{}' must be configured through the '{}' block", id, branch),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::{create_request, delete_request};
    use crate::generic::HttpMethod;

    const ROOT: &str = "https://graph.microsoft.com/beta";

    #[test]
    fn test_create_is_patch_without_id_in_body() {
        let planned = json!({
            "id": "Fido2",
            "state": "enabled",
            "include_targets": [{ "id": "all_users", "target_type": "group", "is_registration_required": false }],
            "fido2": { "is_self_service_registration_allowed": true, "is_attestation_enforced": null },
            "microsoft_authenticator": null,
            "temporary_access_pass": null,
            "email": null,
            "sms": null
        });

        let request = create_request(&resource(), &planned, ROOT).unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        assert!(request.uri.ends_with("/authenticationMethodConfigurations/Fido2"));

        let body = request.body.unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["@odata.type"], "#microsoft.graph.fido2AuthenticationMethodConfiguration");
        assert_eq!(body["isSelfServiceRegistrationAllowed"], true);
        assert_eq!(body["includeTargets"][0]["targetType"], "group");
    }

    #[test]
    fn test_mismatched_branch_is_rejected() {
        let planned = json!({ "id": "Email", "state": "enabled", "sms": {} });
        assert!(create_request(&resource(), &planned, ROOT).is_err());
    }

    #[test]
    fn test_delete_disables() {
        let request = delete_request(&resource(), "Sms").unwrap();
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.body, Some(json!({ "state": "disabled" })));
    }
}
