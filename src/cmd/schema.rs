//! Offline commands: list types, dump schemas, validate configuration

use super::report_diagnostics;
use clap::Args;
use colored::Colorize;
use msgraph_provider::schema::validate_config;
use msgraph_provider::state::{parse_address, Manifest};
use msgraph_provider::{Provider, ProviderError, Result};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ResourcesArgs {
    /// List data sources instead of resources
    #[arg(long)]
    pub data_sources: bool,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Type name, e.g. msgraph_group
    pub type_name: String,

    /// Look the name up among data sources
    #[arg(long)]
    pub data_source: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration document (JSON or TOML)
    pub config: PathBuf,
}

pub fn resources(args: ResourcesArgs) -> Result<()> {
    let provider = Provider::new();
    let names: Vec<&str> = if args.data_sources {
        provider.data_source_names().collect()
    } else {
        provider.resource_names().collect()
    };

    for name in &names {
        println!("{}", name);
    }
    println!(
        "\n{} {}",
        names.len().to_string().cyan().bold(),
        if args.data_sources { "data sources" } else { "resources" }
    );
    Ok(())
}

pub fn schema(args: SchemaArgs) -> Result<()> {
    let provider = Provider::new();
    let schema = if args.data_source {
        &provider.data_source(&args.type_name)?.schema
    } else {
        &provider.resource(&args.type_name)?.schema
    };
    println!("{}", serde_json::to_string_pretty(&schema.to_json()?)?);
    Ok(())
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let provider = Provider::new();
    let manifest = Manifest::load(&args.config)?;
    println!("{} {}", "Validating".cyan().bold(), args.config.display());

    let mut failed = 0;
    for (address, config) in &manifest.resources {
        let (resource_type, _) = parse_address(address)?;
        let definition = provider.resource(resource_type)?;
        let diagnostics = validate_config(&definition.schema, config);
        if report_diagnostics(address, &diagnostics) {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(ProviderError::ConfigError(format!(
            "{} of {} resources are invalid",
            failed,
            manifest.resources.len()
        )));
    }

    println!(
        "{} {} resources are valid",
        "✓".green().bold(),
        manifest.resources.len()
    );
    Ok(())
}
