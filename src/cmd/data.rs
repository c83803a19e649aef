//! Read a data source and print the result as JSON

use super::connect;
use super::progress::{create_spinner, finish_spinner_error, finish_spinner_success};
use clap::Args;
use msgraph_provider::generic::data_source::ODATA_FILTER;
use msgraph_provider::generic::GenericDataSource;
use msgraph_provider::{Provider, Result};
use serde_json::{Map, Value};

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Data source type, e.g. msgraph_group or msgraph_groups
    pub type_name: String,

    /// Lookup attribute as KEY=VALUE, e.g. --set display_name=Admins
    #[arg(long = "set", value_parser = parse_key_value)]
    pub attributes: Vec<(String, String)>,

    /// OData $filter for plural data sources
    #[arg(long)]
    pub filter: Option<String>,

    /// Tenant whose cached token to use
    #[arg(long)]
    pub tenant: Option<String>,
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

fn build_config(args: &ReadArgs) -> Value {
    let mut config = Map::new();
    for (key, value) in &args.attributes {
        config.insert(key.clone(), Value::String(value.clone()));
    }
    if let Some(filter) = &args.filter {
        config.insert(ODATA_FILTER.to_string(), Value::String(filter.clone()));
    }
    Value::Object(config)
}

pub async fn read(args: ReadArgs) -> Result<()> {
    let provider = Provider::new();
    let definition = provider.data_source(&args.type_name)?;
    let config = build_config(&args);

    let client = connect(args.tenant.as_deref())?;
    let spinner = create_spinner(&format!("Reading {}...", args.type_name));
    let result = GenericDataSource::new(&client, definition).read(&config).await;

    match result {
        Ok(value) => {
            finish_spinner_success(&spinner, &format!("Read {}", args.type_name));
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            finish_spinner_error(&spinner, &format!("Reading {} failed", args.type_name));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("display_name=Sales = EMEA").unwrap(),
            ("display_name".to_string(), "Sales = EMEA".to_string())
        );
        assert!(parse_key_value("=x").is_err());
        assert!(parse_key_value("display_name").is_err());
    }

    #[test]
    fn test_build_config() {
        let args = ReadArgs {
            type_name: "msgraph_groups".into(),
            attributes: vec![("id".into(), "g-1".into())],
            filter: Some("startswith(displayName,'Sales')".into()),
            tenant: None,
        };
        assert_eq!(
            build_config(&args),
            json!({ "id": "g-1", "odata_filter": "startswith(displayName,'Sales')" })
        );
    }
}
