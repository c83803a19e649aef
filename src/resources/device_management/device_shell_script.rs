use super::device_management_script::{decode_script, encode_script, script_attributes};
use crate::generic::{ReadOptions, ResourceDefinition, WriteSubAction};
use crate::schema::{Attribute, Schema, Validator};

pub fn resource() -> ResourceDefinition {
    let schema = Schema::new("Intune shell script for macOS")
        .extend(script_attributes())
        .attribute(
            "block_execution_notifications",
            Attribute::bool().optional().default_value(false),
        )
        .attribute(
            "execution_frequency",
            Attribute::string()
                .optional()
                .description("ISO 8601 duration between runs, e.g. PT1H; unset runs once")
                .validator(Validator::IsoDuration),
        )
        .attribute(
            "retry_count",
            Attribute::int64().optional().validator(Validator::range(0, 3)),
        );

    ResourceDefinition::new("device_shell_script", "/deviceManagement/deviceShellScripts", schema)
        .read_options(ReadOptions::default().expand("assignments"))
        .write_sub_action(
            WriteSubAction::assign().body_key("assignments", "deviceManagementScriptAssignments"),
        )
        .terraform_to_graph(encode_script)
        .graph_to_terraform(decode_script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_config;
    use serde_json::json;

    #[test]
    fn test_execution_frequency_must_be_a_duration() {
        let mut config = json!({
            "display_name": "Rotate logs",
            "script_content": "#!/bin/sh\nlogrotate -f /etc/logrotate.conf",
            "file_name": "rotate.sh",
            "run_as_account": "system",
            "execution_frequency": "PT4H"
        });
        let definition = resource();
        assert!(validate_config(&definition.schema, &config).is_empty());

        config["execution_frequency"] = json!("every 4 hours");
        let diags = validate_config(&definition.schema, &config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].path, "execution_frequency");
    }
}
