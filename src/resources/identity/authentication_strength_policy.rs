use crate::generic::{ResourceDefinition, WriteSubAction};
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, Schema, Validator};

const COMBINATIONS: &[&str] = &[
    "password",
    "voice",
    "hardwareOath",
    "softwareOath",
    "sms",
    "fido2",
    "windowsHelloForBusiness",
    "microsoftAuthenticatorPush",
    "deviceBasedPush",
    "temporaryAccessPassOneTime",
    "temporaryAccessPassMultiUse",
    "email",
    "x509CertificateSingleFactor",
    "x509CertificateMultiFactor",
    "federatedSingleFactor",
    "federatedMultiFactor",
    "password,microsoftAuthenticatorPush",
    "password,softwareOath",
    "password,hardwareOath",
    "password,sms",
    "password,voice",
    "password,federatedSingleFactor",
    "microsoftAuthenticatorPush,federatedSingleFactor",
    "softwareOath,federatedSingleFactor",
    "hardwareOath,federatedSingleFactor",
    "sms,federatedSingleFactor",
    "voice,federatedSingleFactor",
];

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Custom authentication strength")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 30)),
        )
        .attribute("description", Attribute::string().optional())
        .attribute(
            "allowed_combinations",
            Attribute::set(ElementKind::String)
                .required()
                .validator(Validator::SizeAtLeast { min: 1 })
                .validator(Validator::each_one_of(COMBINATIONS)),
        )
        .attribute("policy_type", Attribute::string().computed())
        .attribute("requirements_satisfied", Attribute::string().computed())
        .extend(common::timestamps());

    // allowedCombinations is read-only for PATCH once the policy exists
    ResourceDefinition::new(
        "authentication_strength_policy",
        "/policies/authenticationStrengthPolicies",
        schema,
    )
    .write_sub_action(
        WriteSubAction::all_in_one("updateAllowedCombinations", &["allowed_combinations"]).update_only(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::{create_request, sub_action_requests, update_request};
    use serde_json::json;

    const ROOT: &str = "https://graph.microsoft.com/beta";

    fn state() -> serde_json::Value {
        json!({
            "id": "s-1",
            "display_name": "Phishing resistant",
            "description": null,
            "allowed_combinations": ["fido2", "windowsHelloForBusiness"],
            "policy_type": "custom",
            "requirements_satisfied": "mfa",
            "created_date_time": "2024-01-01T00:00:00Z",
            "last_modified_date_time": "2024-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_create_sends_combinations_inline() {
        let definition = resource();
        let body = create_request(&definition, &state(), ROOT).unwrap().body.unwrap();
        assert_eq!(body["allowedCombinations"], json!(["fido2", "windowsHelloForBusiness"]));
        assert!(sub_action_requests(&definition, "/p/s-1", &state(), None, ROOT)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_update_uses_action() {
        let definition = resource();
        let mut next = state();
        next["allowed_combinations"] = json!(["fido2"]);

        assert!(update_request(&definition, &next, &state(), ROOT).unwrap().is_none());

        let subs = sub_action_requests(
            &definition,
            "/policies/authenticationStrengthPolicies/s-1",
            &next,
            Some(&state()),
            ROOT,
        )
        .unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(
            subs[0].uri,
            "/policies/authenticationStrengthPolicies/s-1/updateAllowedCombinations"
        );
        assert_eq!(subs[0].body, Some(json!({ "allowedCombinations": ["fido2"] })));
    }
}
