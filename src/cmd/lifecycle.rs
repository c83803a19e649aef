//! plan / apply / import / destroy against the local state file

use super::progress::{create_progress_bar, create_spinner, finish_spinner_error, finish_spinner_success};
use super::{connect, report_diagnostics};
use clap::Args;
use colored::Colorize;
use msgraph_provider::generic::{plan, GenericResource, Plan, PlanAction, ResourceDefinition};
use msgraph_provider::graph::GraphClient;
use msgraph_provider::schema::validate_config;
use msgraph_provider::state::{parse_address, Manifest, StateFile};
use msgraph_provider::{Provider, ProviderError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_STATE_FILE: &str = "msgraph.state.json";

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Configuration document (JSON or TOML)
    pub config: PathBuf,

    /// State file
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Read current values from Graph before planning
    #[arg(long)]
    pub refresh: bool,

    /// Tenant whose cached token to use
    #[arg(long)]
    pub tenant: Option<String>,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Configuration document (JSON or TOML)
    pub config: PathBuf,

    /// State file
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Tenant whose cached token to use
    #[arg(long)]
    pub tenant: Option<String>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Address to import into, e.g. msgraph_group.admins
    pub address: String,

    /// Graph id of the existing entity
    pub id: String,

    /// State file
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Tenant whose cached token to use
    #[arg(long)]
    pub tenant: Option<String>,
}

#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// State file
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Only destroy these addresses
    #[arg(long = "target")]
    pub targets: Vec<String>,

    /// Tenant whose cached token to use
    #[arg(long)]
    pub tenant: Option<String>,
}

enum Change {
    Apply(Plan),
    Destroy,
}

struct Step<'p> {
    address: String,
    resource_type: String,
    definition: &'p ResourceDefinition,
    config: Value,
    prior: Option<Value>,
    change: Change,
}

impl Step<'_> {
    fn action_label(&self) -> colored::ColoredString {
        match &self.change {
            Change::Destroy => "- destroy".red().bold(),
            Change::Apply(p) => match p.action {
                PlanAction::Create => "+ create".green().bold(),
                PlanAction::Update => "~ update".yellow().bold(),
                PlanAction::Replace => "-/+ replace".red().bold(),
                PlanAction::NoOp => "  no changes".dimmed(),
            },
        }
    }

    fn is_noop(&self) -> bool {
        matches!(&self.change, Change::Apply(p) if !p.has_changes())
    }
}

pub async fn plan_cmd(args: PlanArgs) -> Result<()> {
    let provider = Provider::new();
    let manifest = Manifest::load(&args.config)?;
    let mut state = StateFile::load(&args.state)?;

    validate_manifest(&provider, &manifest)?;

    if args.refresh {
        let client = connect(args.tenant.as_deref())?;
        refresh(&provider, &client, &mut state).await?;
    }

    let steps = build_steps(&provider, &manifest, &state)?;
    print_plan(&steps);
    Ok(())
}

pub async fn apply(args: ApplyArgs) -> Result<()> {
    let provider = Provider::new();
    let manifest = Manifest::load(&args.config)?;
    let mut state = StateFile::load(&args.state)?;

    validate_manifest(&provider, &manifest)?;

    let client = connect(args.tenant.as_deref())?;
    refresh(&provider, &client, &mut state).await?;
    state.save(&args.state)?;

    let steps = build_steps(&provider, &manifest, &state)?;
    print_plan(&steps);

    let pending: Vec<&Step> = steps.iter().filter(|s| !s.is_noop()).collect();
    if pending.is_empty() {
        println!("\n{} Infrastructure is up to date", "✓".green().bold());
        return Ok(());
    }

    let bar = create_progress_bar(pending.len() as u64, "Applying");
    for step in pending {
        bar.set_message(step.address.clone());
        if let Err(e) = apply_step(&client, step, &mut state, &args.state).await {
            finish_spinner_error(&bar, &format!("{} failed", step.address));
            return Err(e);
        }
        bar.inc(1);
    }
    finish_spinner_success(&bar, "Apply complete");
    Ok(())
}

pub async fn import(args: ImportArgs) -> Result<()> {
    let provider = Provider::new();
    let (resource_type, _) = parse_address(&args.address)?;
    let definition = provider.resource(resource_type)?;

    let mut state = StateFile::load(&args.state)?;
    if state.get(&args.address).is_some() {
        return Err(ProviderError::InvalidState(format!(
            "{} is already managed",
            args.address
        )));
    }

    let client = connect(args.tenant.as_deref())?;
    let spinner = create_spinner(&format!("Importing {}...", args.address));
    match GenericResource::new(&client, definition).import(&args.id).await {
        Ok(attributes) => {
            state.insert(&args.address, resource_type, attributes);
            state.save(&args.state)?;
            finish_spinner_success(&spinner, &format!("Imported {} ({})", args.address, args.id));
            Ok(())
        }
        Err(e) => {
            finish_spinner_error(&spinner, &format!("Import of {} failed", args.address));
            Err(e)
        }
    }
}

pub async fn destroy(args: DestroyArgs) -> Result<()> {
    let provider = Provider::new();
    let mut state = StateFile::load(&args.state)?;

    let addresses: Vec<String> = state
        .resources
        .keys()
        .filter(|a| args.targets.is_empty() || args.targets.contains(a))
        .cloned()
        .collect();
    if addresses.is_empty() {
        println!("Nothing to destroy");
        return Ok(());
    }

    let client = connect(args.tenant.as_deref())?;
    let bar = create_progress_bar(addresses.len() as u64, "Destroying");
    for address in &addresses {
        bar.set_message(address.clone());
        let Some(entry) = state.get(address).cloned() else {
            continue;
        };
        let definition = provider.resource(&entry.resource_type)?;
        if let Err(e) = GenericResource::new(&client, definition).delete(&entry.attributes).await {
            finish_spinner_error(&bar, &format!("{} failed", address));
            return Err(e);
        }
        state.remove(address);
        state.save(&args.state)?;
        bar.println(format!("{} {}", "- destroyed".red(), address));
        bar.inc(1);
    }
    finish_spinner_success(&bar, &format!("Destroyed {} resources", addresses.len()));
    Ok(())
}

fn validate_manifest(provider: &Provider, manifest: &Manifest) -> Result<()> {
    let mut failed = 0;
    for (address, config) in &manifest.resources {
        let (resource_type, _) = parse_address(address)?;
        let definition = provider.resource(resource_type)?;
        if report_diagnostics(address, &validate_config(&definition.schema, config)) {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(ProviderError::ConfigError(format!(
            "{} resources have invalid configuration",
            failed
        )));
    }
    Ok(())
}

/// Replace every state entry with what Graph currently returns, dropping
/// entities that no longer exist
async fn refresh(provider: &Provider, client: &GraphClient, state: &mut StateFile) -> Result<()> {
    let addresses: Vec<String> = state.resources.keys().cloned().collect();
    let spinner = create_spinner("Refreshing state...");

    for address in addresses {
        let Some(entry) = state.get(&address).cloned() else {
            continue;
        };
        let definition = provider.resource(&entry.resource_type)?;
        match GenericResource::new(client, definition).read(&entry.attributes).await? {
            Some(current) => state.insert(&address, &entry.resource_type, current),
            None => {
                spinner.println(format!("{} {} was deleted outside of this tool", "!".yellow(), address));
                state.remove(&address);
            }
        }
    }

    finish_spinner_success(&spinner, &format!("Refreshed {} resources", state.resources.len()));
    Ok(())
}

fn build_steps<'p>(provider: &'p Provider, manifest: &Manifest, state: &StateFile) -> Result<Vec<Step<'p>>> {
    let mut steps = Vec::new();

    for (address, config) in &manifest.resources {
        let (resource_type, _) = parse_address(address)?;
        let definition = provider.resource(resource_type)?;
        let prior = state.get(address).map(|s| s.attributes.clone());
        let plan = plan(&definition.schema, config, prior.as_ref())?;
        debug!("{}: {:?}", address, plan.action);

        steps.push(Step {
            address: address.clone(),
            resource_type: resource_type.to_string(),
            definition,
            config: config.clone(),
            prior,
            change: Change::Apply(plan),
        });
    }

    for (address, entry) in &state.resources {
        if manifest.resources.contains_key(address) {
            continue;
        }
        steps.push(Step {
            address: address.clone(),
            resource_type: entry.resource_type.clone(),
            definition: provider.resource(&entry.resource_type)?,
            config: Value::Null,
            prior: Some(entry.attributes.clone()),
            change: Change::Destroy,
        });
    }

    Ok(steps)
}

fn print_plan(steps: &[Step]) {
    let mut counts = [0usize; 4];

    println!();
    for step in steps {
        println!("{} {}", step.action_label(), step.address);
        match &step.change {
            Change::Destroy => counts[3] += 1,
            Change::Apply(plan) => {
                match plan.action {
                    PlanAction::Create => counts[0] += 1,
                    PlanAction::Update => counts[1] += 1,
                    PlanAction::Replace => counts[2] += 1,
                    PlanAction::NoOp => continue,
                }
                for change in &plan.changes {
                    let after = if change.known_after_apply {
                        "(known after apply)".dimmed().to_string()
                    } else {
                        change.after.to_string()
                    };
                    let forces = if plan.requires_replace.iter().any(|p| p.starts_with(&change.attribute)) {
                        " # forces replacement".red().to_string()
                    } else {
                        String::new()
                    };
                    if change.before.is_null() {
                        println!("    {} = {}{}", change.attribute, after, forces);
                    } else {
                        println!("    {} = {} => {}{}", change.attribute, change.before, after, forces);
                    }
                }
            }
        }
    }

    println!(
        "\nPlan: {} to create, {} to update, {} to replace, {} to destroy",
        counts[0].to_string().green(),
        counts[1].to_string().yellow(),
        counts[2].to_string().red(),
        counts[3].to_string().red()
    );
}

/// Run one step and record the outcome in the state file immediately
async fn apply_step(client: &GraphClient, step: &Step<'_>, state: &mut StateFile, state_path: &Path) -> Result<()> {
    let resource = GenericResource::new(client, step.definition);

    match &step.change {
        Change::Destroy => {
            if let Some(prior) = &step.prior {
                resource.delete(prior).await?;
            }
            state.remove(&step.address);
        }
        Change::Apply(plan) => {
            let outcome = match (plan.action, &step.prior) {
                (PlanAction::Create, _) | (PlanAction::Update, None) | (PlanAction::Replace, None) => {
                    resource.create(&plan.planned_state).await
                }
                (PlanAction::Update, Some(prior)) => resource.update(&plan.planned_state, prior).await,
                (PlanAction::Replace, Some(prior)) => {
                    resource.delete(prior).await?;
                    state.remove(&step.address);
                    state.save(state_path)?;
                    // the old computed values belong to the deleted entity
                    let fresh = plan_fresh(step)?;
                    resource.create(&fresh.planned_state).await
                }
                (PlanAction::NoOp, _) => return Ok(()),
            };
            record_outcome(step, outcome, state, state_path)?;
        }
    }

    state.save(state_path)
}

/// Store the applied state. A create that failed half-way still leaves an entity
/// in Graph, so its partial state is saved before the error is returned.
fn record_outcome(
    step: &Step<'_>,
    outcome: Result<Value>,
    state: &mut StateFile,
    state_path: &Path,
) -> Result<()> {
    match outcome {
        Ok(applied) => {
            state.insert(&step.address, &step.resource_type, applied);
            Ok(())
        }
        Err(e) => {
            if let Some(partial) = e.partial_state() {
                state.insert(&step.address, &step.resource_type, partial.clone());
                state.save(state_path)?;
            }
            Err(e)
        }
    }
}

fn plan_fresh(step: &Step<'_>) -> Result<Plan> {
    plan(&step.definition.schema, &step.config, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named_location() -> Value {
        json!({
            "display_name": "Head office",
            "ip": {
                "is_trusted": true,
                "ip_ranges": [{ "ipv4": { "cidr_address": "203.0.113.0/24" } }]
            }
        })
    }

    #[test]
    fn test_steps_create_and_destroy() {
        let provider = Provider::new();
        let mut manifest = Manifest::default();
        manifest
            .resources
            .insert("msgraph_named_location.office".into(), named_location());

        let mut state = StateFile::default();
        state.insert("msgraph_device_category.old", "msgraph_device_category", json!({ "id": "c-1" }));

        let steps = build_steps(&provider, &manifest, &state).unwrap();
        assert_eq!(steps.len(), 2);

        assert_eq!(steps[0].address, "msgraph_named_location.office");
        assert!(matches!(&steps[0].change, Change::Apply(p) if p.action == PlanAction::Create));

        assert_eq!(steps[1].address, "msgraph_device_category.old");
        assert!(matches!(steps[1].change, Change::Destroy));
        assert_eq!(steps[1].prior, Some(json!({ "id": "c-1" })));
    }

    #[test]
    fn test_incomplete_create_is_recorded() {
        let provider = Provider::new();
        let mut manifest = Manifest::default();
        manifest
            .resources
            .insert("msgraph_named_location.office".into(), named_location());
        let steps = build_steps(&provider, &manifest, &StateFile::default()).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let mut state = StateFile::default();
        let failure = ProviderError::IncompleteCreate {
            id: "loc-1".into(),
            state: Box::new(json!({ "id": "loc-1", "display_name": "Head office" })),
            source: Box::new(ProviderError::GraphApiError {
                status: 400,
                message: "BadRequest".into(),
            }),
        };

        let result = record_outcome(&steps[0], Err(failure), &mut state, &path);
        assert!(matches!(result, Err(ProviderError::IncompleteCreate { .. })));

        let saved = StateFile::load(&path).unwrap();
        let entry = saved.get("msgraph_named_location.office").unwrap();
        assert_eq!(entry.resource_type, "msgraph_named_location");
        assert_eq!(entry.attributes["id"], "loc-1");
    }

    #[test]
    fn test_other_errors_leave_state_untouched() {
        let provider = Provider::new();
        let mut manifest = Manifest::default();
        manifest
            .resources
            .insert("msgraph_named_location.office".into(), named_location());
        let steps = build_steps(&provider, &manifest, &StateFile::default()).unwrap();

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let mut state = StateFile::default();

        let result = record_outcome(&steps[0], Err(ProviderError::TokenNotFound), &mut state, &path);
        assert!(result.is_err());
        assert!(state.resources.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_resource_type() {
        let provider = Provider::new();
        let mut manifest = Manifest::default();
        manifest.resources.insert("msgraph_printer.lobby".into(), json!({}));

        let result = build_steps(&provider, &manifest, &StateFile::default());
        assert!(matches!(result, Err(ProviderError::UnknownResource(_))));
    }

    #[test]
    fn test_validate_manifest_counts_invalid_resources() {
        let provider = Provider::new();
        let mut manifest = Manifest::default();
        manifest
            .resources
            .insert("msgraph_named_location.office".into(), named_location());
        manifest
            .resources
            .insert("msgraph_named_location.broken".into(), json!({}));

        match validate_manifest(&provider, &manifest) {
            Err(ProviderError::ConfigError(message)) => assert!(message.starts_with("1 resources")),
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }
}
