//! Subcommand implementations

pub mod data;
pub mod lifecycle;
pub mod progress;
pub mod schema;
pub mod token;

use colored::Colorize;
use msgraph_provider::config::ConfigManager;
use msgraph_provider::graph::GraphClient;
use msgraph_provider::schema::{Diagnostic, Severity};
use msgraph_provider::Result;

/// Client for the configured Graph endpoint, authenticated for `tenant`
pub fn connect(tenant: Option<&str>) -> Result<GraphClient> {
    let manager = ConfigManager::new()?;
    let config = manager.load_config()?;
    let token = manager.resolve_access_token(tenant)?;
    tracing::debug!("Using {}/{}", config.graph_base_url, config.api_version);
    Ok(GraphClient::from_config(&config, token))
}

/// Print diagnostics under `address`; true when any is an error
pub fn report_diagnostics(address: &str, diagnostics: &[Diagnostic]) -> bool {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!("  {} {}: {}", label, address.cyan(), diagnostic);
    }
    diagnostics.iter().any(Diagnostic::is_error)
}
