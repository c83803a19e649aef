mod cmd;

use clap::{Parser, Subcommand};
use colored::Colorize;
use msgraph_provider::config::ConfigManager;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "msgraph-provider",
    about = "Declarative Microsoft Graph (beta) resources",
    version,
    long_about = "Validate, plan and apply Microsoft Graph beta resources described in a\n\
                  JSON or TOML configuration document.\n\n\
                  Authenticates with MSGRAPH_ACCESS_TOKEN or a cached tenant token."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List resource or data source types
    Resources(cmd::schema::ResourcesArgs),

    /// Print the schema of a resource or data source as JSON
    Schema(cmd::schema::SchemaArgs),

    /// Validate a configuration document without contacting Graph
    Validate(cmd::schema::ValidateArgs),

    /// Show what apply would change
    Plan(cmd::lifecycle::PlanArgs),

    /// Create, update, replace and delete resources to match the configuration
    Apply(cmd::lifecycle::ApplyArgs),

    /// Bring an existing Graph entity under management
    Import(cmd::lifecycle::ImportArgs),

    /// Delete managed resources
    Destroy(cmd::lifecycle::DestroyArgs),

    /// Read a data source
    Read(cmd::data::ReadArgs),

    /// Manage cached bearer tokens
    #[command(subcommand)]
    Token(TokenCommands),
}

#[derive(Subcommand, Debug)]
enum TokenCommands {
    /// Cache a bearer token for a tenant
    Set(cmd::token::SetTokenArgs),

    /// Remove the cached token of a tenant
    Clear(cmd::token::ClearTokenArgs),
}

/// `log_level` from config.toml, warnings otherwise
fn configured_filter() -> EnvFilter {
    let level = ConfigManager::new()
        .and_then(|manager| manager.load_config())
        .map(|config| config.log_level)
        .unwrap_or_default();

    if level.is_empty() {
        return EnvFilter::new("warn");
    }
    EnvFilter::try_new(format!("msgraph_provider={}", level)).unwrap_or_else(|_| EnvFilter::new("warn"))
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> msgraph_provider::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("msgraph_provider=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Resources(args) => cmd::schema::resources(args)?,
        Commands::Schema(args) => cmd::schema::schema(args)?,
        Commands::Validate(args) => cmd::schema::validate(args)?,
        Commands::Plan(args) => cmd::lifecycle::plan_cmd(args).await?,
        Commands::Apply(args) => cmd::lifecycle::apply(args).await?,
        Commands::Import(args) => cmd::lifecycle::import(args).await?,
        Commands::Destroy(args) => cmd::lifecycle::destroy(args).await?,
        Commands::Read(args) => cmd::data::read(args).await?,
        Commands::Token(token_cmd) => match token_cmd {
            TokenCommands::Set(args) => cmd::token::set(args)?,
            TokenCommands::Clear(args) => cmd::token::clear(args)?,
        },
    }

    Ok(())
}
