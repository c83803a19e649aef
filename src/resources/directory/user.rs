use crate::error::Result;
use crate::generic::{ResourceDefinition, TerraformToGraphParams};
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, PlanModifier, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let password_profile = Schema::new("Initial password")
        .attribute("password", Attribute::string().required().sensitive())
        .attribute(
            "force_change_password_next_sign_in",
            Attribute::bool().optional().default_value(true),
        )
        .attribute(
            "force_change_password_next_sign_in_with_mfa",
            Attribute::bool().optional().default_value(false),
        );

    let schema = Schema::new("Member or guest user account")
        .attribute("id", common::id())
        .attribute("account_enabled", Attribute::bool().optional().default_value(true))
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute(
            "user_principal_name",
            Attribute::string()
                .required()
                .validator(Validator::regex(r"^[^@\s]+@[^@\s]+$", "must look like alias@domain")),
        )
        .attribute("mail_nickname", Attribute::string().required())
        .attribute(
            "password_profile",
            Attribute::single_nested(password_profile)
                .required()
                .sensitive()
                .write_only()
                .description("Never returned by Graph; kept as configured"),
        )
        .attribute("password_policies", Attribute::string().optional())
        .attribute("given_name", Attribute::string().optional())
        .attribute("surname", Attribute::string().optional())
        .attribute("job_title", Attribute::string().optional())
        .attribute("department", Attribute::string().optional())
        .attribute("company_name", Attribute::string().optional())
        .attribute("office_location", Attribute::string().optional())
        .attribute("mobile_phone", Attribute::string().optional())
        .attribute(
            "business_phones",
            Attribute::list(ElementKind::String)
                .optional()
                .validator(Validator::SizeAtMost { max: 1 }),
        )
        .attribute(
            "usage_location",
            Attribute::string().optional().validator(Validator::length(2, 2)),
        )
        .attribute("other_mails", Attribute::set(ElementKind::String).optional())
        .attribute(
            "user_type",
            Attribute::string()
                .optional()
                .computed()
                .validator(Validator::one_of(&["Member", "Guest"]))
                .plan_modifier(PlanModifier::UseStateForUnknown),
        )
        .attribute("mail", Attribute::string().computed())
        .attribute("created_date_time", common::created_date_time());

    ResourceDefinition::new("user", "/users", schema)
        .terraform_to_graph(keep_password_unless_changed)
        .lookup_by(&["user_principal_name", "mail_nickname"])
}

/// Graph resets the password whenever `passwordProfile` is written, so it only
/// goes out on create or when the password itself changed
fn keep_password_unless_changed(params: &mut TerraformToGraphParams<'_>) -> Result<()> {
    if !params.is_update {
        return Ok(());
    }

    let old = params
        .prior
        .and_then(|p| p.pointer("/password_profile/password"));
    let new = params.planned.pointer("/password_profile/password");
    if old == new {
        params.raw.remove("passwordProfile");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::request::update_request;
    use crate::generic::UpdateMethod;
    use serde_json::{json, Value};

    const ROOT: &str = "https://graph.microsoft.com/beta";

    fn state() -> Value {
        json!({
            "id": "u-1",
            "account_enabled": true,
            "display_name": "Adele Vance",
            "user_principal_name": "adele@contoso.com",
            "mail_nickname": "adele",
            "password_profile": {
                "password": "Initial-Pa55",
                "force_change_password_next_sign_in": true,
                "force_change_password_next_sign_in_with_mfa": false
            },
            "job_title": "Engineer"
        })
    }

    #[test]
    fn test_password_profile_only_sent_when_password_changes() {
        let definition = resource().update_method(UpdateMethod::Put);
        let mut next = state();
        next["job_title"] = json!("Lead");

        let body = update_request(&definition, &next, &state(), ROOT)
            .unwrap()
            .unwrap()
            .body
            .unwrap();
        assert_eq!(body["jobTitle"], "Lead");
        assert!(body.get("passwordProfile").is_none());

        next["password_profile"]["password"] = json!("Rotated-Pa55");
        let body = update_request(&definition, &next, &state(), ROOT)
            .unwrap()
            .unwrap()
            .body
            .unwrap();
        assert_eq!(body["passwordProfile"]["password"], "Rotated-Pa55");
    }

    #[test]
    fn test_password_profile_is_write_only() {
        let definition = resource();
        let attr = definition.schema.get("password_profile").unwrap();
        assert!(attr.write_only && attr.sensitive);
    }
}
