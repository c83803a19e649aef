//! Cache bearer tokens per tenant. Acquiring them is left to other tools
//! (e.g. `az account get-access-token --resource https://graph.microsoft.com`).

use clap::Args;
use colored::Colorize;
use msgraph_provider::config::{ConfigManager, TokenCache};
use msgraph_provider::Result;

#[derive(Args, Debug)]
pub struct SetTokenArgs {
    /// Tenant name used as the cache key
    pub tenant: String,

    /// Bearer token for https://graph.microsoft.com
    #[arg(long, env = "MSGRAPH_ACCESS_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Directory (tenant) id, defaults to the tenant name
    #[arg(long)]
    pub tenant_id: Option<String>,

    /// Token lifetime in minutes
    #[arg(long, default_value_t = 60)]
    pub expires_in: i64,

    /// Make this the default tenant
    #[arg(long)]
    pub default: bool,
}

#[derive(Args, Debug)]
pub struct ClearTokenArgs {
    /// Tenant name
    pub tenant: String,
}

pub fn set(args: SetTokenArgs) -> Result<()> {
    let manager = ConfigManager::new()?;
    let token = TokenCache {
        access_token: args.token,
        refresh_token: None,
        expires_at: chrono::Utc::now() + chrono::Duration::minutes(args.expires_in),
        tenant_id: args.tenant_id.unwrap_or_else(|| args.tenant.clone()),
    };
    manager.save_token(&args.tenant, &token)?;

    if args.default {
        let mut config = manager.load_config()?;
        config.default_tenant = Some(args.tenant.clone());
        manager.save_config(&config)?;
    }

    println!(
        "{} Cached token for {} (expires {})",
        "✓".green().bold(),
        args.tenant.cyan().bold(),
        token.expires_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

pub fn clear(args: ClearTokenArgs) -> Result<()> {
    let manager = ConfigManager::new()?;
    manager.delete_token(&args.tenant)?;

    let mut config = manager.load_config()?;
    if config.default_tenant.as_deref() == Some(args.tenant.as_str()) {
        config.default_tenant = None;
        manager.save_config(&config)?;
        println!("{} {} is no longer the default tenant", "!".yellow(), args.tenant);
    }

    println!("{} Removed cached token for {}", "✓".green().bold(), args.tenant.cyan().bold());
    Ok(())
}
