//! Generic resource machinery shared by every Graph entity
//!
//! A resource module only declares a [`ResourceDefinition`]: its schema, where the
//! entity lives in Graph, which attributes are written through sub-actions, and
//! optional middleware that reshapes payloads. Everything else (validation, planning,
//! conversion, request sequencing) is driven from that declaration.

pub mod convert;
pub mod data_source;
pub mod engine;
pub mod plan;
pub mod request;

pub use data_source::{DataSourceDefinition, DataSourceKind, GenericDataSource};
pub use engine::GenericResource;
pub use plan::{plan, Plan, PlanAction};
pub use request::{GraphRequest, HttpMethod};

use crate::error::Result;
use crate::schema::Schema;
use serde_json::{Map, Value};
use std::fmt;

/// Arguments handed to a resource's terraform-to-graph middleware.
///
/// `raw` is the Graph payload after generic conversion; middleware edits it in place.
pub struct TerraformToGraphParams<'a> {
    pub raw: &'a mut Map<String, Value>,
    pub planned: &'a Value,
    pub prior: Option<&'a Value>,
    pub is_update: bool,
    /// Graph API root, e.g. `https://graph.microsoft.com/beta`
    pub api_root: &'a str,
}

impl TerraformToGraphParams<'_> {
    /// Planned value of a top-level attribute, `None` when null
    pub fn planned_attribute(&self, name: &str) -> Option<&Value> {
        self.planned.get(name).filter(|v| !v.is_null())
    }

    /// True when the attribute differs from the prior state (always true on create)
    pub fn attribute_changed(&self, name: &str) -> bool {
        match self.prior {
            Some(prior) => self.planned.get(name) != prior.get(name),
            None => true,
        }
    }
}

/// Arguments handed to a resource's graph-to-terraform middleware.
///
/// `raw` is the entity as returned by Graph (plus extra reads), before conversion.
pub struct GraphToTerraformParams<'a> {
    pub raw: &'a mut Map<String, Value>,
}

pub type TerraformToGraphMiddleware = fn(&mut TerraformToGraphParams<'_>) -> Result<()>;
pub type GraphToTerraformMiddleware = fn(&mut GraphToTerraformParams<'_>) -> Result<()>;

/// How a new entity is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMethod {
    /// POST to the collection, Graph assigns the id
    Post,
    /// POST to the collection, the id is the value of a configured attribute
    PostWithId { id_attribute: &'static str },
    /// PATCH `{collection}/{id}` (upsert), the id is the value of a configured attribute
    PatchWithId { id_attribute: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMethod {
    /// PATCH with changed attributes only
    Patch,
    /// PUT with the complete entity
    Put,
}

/// What destroying the resource does in Graph
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteBehavior {
    Delete,
    /// Entity cannot be deleted; it is only dropped from state
    Forget,
    /// Entity cannot be deleted; PATCH it back to a neutral value instead
    Patch(Value),
}

/// Additional GET merged into the raw entity before conversion
#[derive(Debug, Clone)]
pub struct ExtraRead {
    pub uri_suffix: &'static str,
    pub graph_key: &'static str,
    /// Reduce each returned object to its `id`
    pub ids_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub odata_expand: Option<&'static str>,
    pub odata_select: Option<&'static str>,
    pub extra_reads: Vec<ExtraRead>,
}

impl ReadOptions {
    #[must_use]
    pub fn expand(mut self, expand: &'static str) -> Self {
        self.odata_expand = Some(expand);
        self
    }

    #[must_use]
    pub fn select(mut self, select: &'static str) -> Self {
        self.odata_select = Some(select);
        self
    }

    /// GET `{entity}/{uri_suffix}` and store the result under `graph_key`
    #[must_use]
    pub fn extra_read(mut self, uri_suffix: &'static str, graph_key: &'static str) -> Self {
        self.extra_reads.push(ExtraRead {
            uri_suffix,
            graph_key,
            ids_only: false,
        });
        self
    }

    /// GET `{entity}/{uri_suffix}` keeping only the ids of the referenced objects
    #[must_use]
    pub fn extra_read_ids(mut self, uri_suffix: &'static str, graph_key: &'static str) -> Self {
        self.extra_reads.push(ExtraRead {
            uri_suffix,
            graph_key,
            ids_only: true,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubActionKind {
    /// POST `{entity}/{uri_suffix}` with all attributes in one body
    AllInOne,
    /// Add/remove references one at a time through `{entity}/{uri_suffix}/$ref`
    RefSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubActionPhase {
    Always,
    UpdateOnly,
}

/// Write that cannot go through the entity's own POST/PATCH
#[derive(Debug, Clone)]
pub struct WriteSubAction {
    pub kind: SubActionKind,
    pub uri_suffix: &'static str,
    pub attributes: Vec<&'static str>,
    /// Body key overrides for `AllInOne` (attribute -> key)
    pub body_keys: Vec<(&'static str, &'static str)>,
    /// Collection the `$ref` ids point into for `RefSet`
    pub ref_collection: &'static str,
    pub phase: SubActionPhase,
}

impl WriteSubAction {
    pub fn all_in_one(uri_suffix: &'static str, attributes: &[&'static str]) -> Self {
        Self {
            kind: SubActionKind::AllInOne,
            uri_suffix,
            attributes: attributes.to_vec(),
            body_keys: Vec::new(),
            ref_collection: "",
            phase: SubActionPhase::Always,
        }
    }

    /// Intune `assign` action carrying the `assignments` attribute
    pub fn assign() -> Self {
        Self::all_in_one("assign", &["assignments"])
    }

    pub fn ref_set(uri_suffix: &'static str, attribute: &'static str) -> Self {
        Self {
            kind: SubActionKind::RefSet,
            uri_suffix,
            attributes: vec![attribute],
            body_keys: Vec::new(),
            ref_collection: "directoryObjects",
            phase: SubActionPhase::Always,
        }
    }

    #[must_use]
    pub fn body_key(mut self, attribute: &'static str, key: &'static str) -> Self {
        self.body_keys.push((attribute, key));
        self
    }

    #[must_use]
    pub fn update_only(mut self) -> Self {
        self.phase = SubActionPhase::UpdateOnly;
        self
    }

    pub fn runs_on(&self, is_update: bool) -> bool {
        is_update || self.phase == SubActionPhase::Always
    }

    pub fn handles(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| *a == attribute)
    }
}

/// Where and how a resource talks to Graph
#[derive(Clone)]
pub struct AccessParams {
    pub base_uri: &'static str,
    pub create_method: CreateMethod,
    pub update_method: UpdateMethod,
    pub delete_behavior: DeleteBehavior,
    /// Fixed id of a singleton entity living directly at `base_uri`
    pub singleton_id: Option<&'static str>,
    pub read: ReadOptions,
    pub write_sub_actions: Vec<WriteSubAction>,
    pub terraform_to_graph: Option<TerraformToGraphMiddleware>,
    pub graph_to_terraform: Option<GraphToTerraformMiddleware>,
}

impl fmt::Debug for AccessParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessParams")
            .field("base_uri", &self.base_uri)
            .field("create_method", &self.create_method)
            .field("update_method", &self.update_method)
            .field("delete_behavior", &self.delete_behavior)
            .field("singleton_id", &self.singleton_id)
            .field("read", &self.read)
            .field("write_sub_actions", &self.write_sub_actions)
            .field("terraform_to_graph", &self.terraform_to_graph.is_some())
            .field("graph_to_terraform", &self.graph_to_terraform.is_some())
            .finish()
    }
}

impl AccessParams {
    pub fn is_singleton(&self) -> bool {
        self.singleton_id.is_some()
    }

    pub fn entity_uri(&self, id: &str) -> String {
        if self.is_singleton() {
            self.base_uri.to_string()
        } else {
            format!("{}/{}", self.base_uri, id)
        }
    }

    /// Attributes written by a sub-action in the given phase (never in the entity body)
    pub fn sub_action_attributes(&self, is_update: bool) -> Vec<&'static str> {
        self.write_sub_actions
            .iter()
            .filter(|s| s.runs_on(is_update))
            .flat_map(|s| s.attributes.iter().copied())
            .collect()
    }
}

/// Declaration of one Graph entity as a managed resource
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    /// Type name without provider prefix, e.g. `group`
    pub type_name: &'static str,
    pub schema: Schema,
    pub access: AccessParams,
    /// Attributes a singular data source may look the entity up by (besides `id`)
    pub lookup_attributes: Vec<&'static str>,
    /// Plural data source name override (defaults to a simple English plural)
    pub plural_name: Option<&'static str>,
}

impl ResourceDefinition {
    pub fn new(type_name: &'static str, base_uri: &'static str, schema: Schema) -> Self {
        let lookup_attributes = if schema.get("display_name").is_some() {
            vec!["display_name"]
        } else {
            Vec::new()
        };

        Self {
            type_name,
            schema,
            access: AccessParams {
                base_uri,
                create_method: CreateMethod::Post,
                update_method: UpdateMethod::Patch,
                delete_behavior: DeleteBehavior::Delete,
                singleton_id: None,
                read: ReadOptions::default(),
                write_sub_actions: Vec::new(),
                terraform_to_graph: None,
                graph_to_terraform: None,
            },
            lookup_attributes,
            plural_name: None,
        }
    }

    #[must_use]
    pub fn create_method(mut self, method: CreateMethod) -> Self {
        self.access.create_method = method;
        self
    }

    #[must_use]
    pub fn update_method(mut self, method: UpdateMethod) -> Self {
        self.access.update_method = method;
        self
    }

    #[must_use]
    pub fn delete_behavior(mut self, behavior: DeleteBehavior) -> Self {
        self.access.delete_behavior = behavior;
        self
    }

    /// Entity that always exists at `base_uri`: create and update PATCH it,
    /// destroy only forgets it
    #[must_use]
    pub fn singleton(mut self, id: &'static str) -> Self {
        self.access.singleton_id = Some(id);
        self.access.delete_behavior = DeleteBehavior::Forget;
        self
    }

    #[must_use]
    pub fn read_options(mut self, read: ReadOptions) -> Self {
        self.access.read = read;
        self
    }

    #[must_use]
    pub fn write_sub_action(mut self, sub_action: WriteSubAction) -> Self {
        self.access.write_sub_actions.push(sub_action);
        self
    }

    #[must_use]
    pub fn terraform_to_graph(mut self, middleware: TerraformToGraphMiddleware) -> Self {
        self.access.terraform_to_graph = Some(middleware);
        self
    }

    #[must_use]
    pub fn graph_to_terraform(mut self, middleware: GraphToTerraformMiddleware) -> Self {
        self.access.graph_to_terraform = Some(middleware);
        self
    }

    #[must_use]
    pub fn lookup_by(mut self, attributes: &[&'static str]) -> Self {
        self.lookup_attributes = attributes.to_vec();
        self
    }

    #[must_use]
    pub fn plural(mut self, name: &'static str) -> Self {
        self.plural_name = Some(name);
        self
    }

    pub fn plural_type_name(&self) -> String {
        match self.plural_name {
            Some(name) => name.to_string(),
            None => pluralize(self.type_name),
        }
    }
}

fn pluralize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix('y') {
        if !stem.ends_with(&['a', 'e', 'i', 'o', 'u'][..]) {
            return format!("{}ies", stem);
        }
    }
    if name.ends_with('s') || name.ends_with('x') || name.ends_with("ch") {
        return format!("{}es", name);
    }
    format!("{}s", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attribute;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("group"), "groups");
        assert_eq!(pluralize("authentication_strength_policy"), "authentication_strength_policies");
        assert_eq!(pluralize("device_category"), "device_categories");
        assert_eq!(pluralize("access_package_catalog"), "access_package_catalogs");
        assert_eq!(pluralize("cross_tenant_access_default"), "cross_tenant_access_defaults");
    }

    #[test]
    fn test_singleton_entity_uri() {
        let def = ResourceDefinition::new("default", "/policies/crossTenantAccessPolicy/default", Schema::new(""))
            .singleton("default");
        assert_eq!(def.access.entity_uri("ignored"), "/policies/crossTenantAccessPolicy/default");
        assert_eq!(def.access.delete_behavior, DeleteBehavior::Forget);
    }

    #[test]
    fn test_sub_action_attributes_by_phase() {
        let def = ResourceDefinition::new("policy", "/policies", Schema::new(""))
            .write_sub_action(WriteSubAction::assign())
            .write_sub_action(
                WriteSubAction::all_in_one("updateAllowedCombinations", &["allowed_combinations"])
                    .update_only(),
            );
        assert_eq!(def.access.sub_action_attributes(false), vec!["assignments"]);
        assert_eq!(
            def.access.sub_action_attributes(true),
            vec!["assignments", "allowed_combinations"]
        );
    }

    #[test]
    fn test_default_lookup_attributes() {
        let with_name = ResourceDefinition::new(
            "group",
            "/groups",
            Schema::new("").attribute("display_name", Attribute::string().required()),
        );
        assert_eq!(with_name.lookup_attributes, vec!["display_name"]);

        let without = ResourceDefinition::new("thing", "/things", Schema::new(""));
        assert!(without.lookup_attributes.is_empty());
    }
}
