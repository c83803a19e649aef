//! Read-only views derived from resource definitions

use super::convert::graph_to_terraform;
use super::request::read_uri;
use super::{GraphToTerraformParams, ResourceDefinition};
use crate::error::{ProviderError, Result};
use crate::graph::GraphClient;
use crate::schema::validators::validate_config;
use crate::schema::{Attribute, Schema};
use serde_json::{Map, Value};
use tracing::debug;

pub const ODATA_FILTER: &str = "odata_filter";

#[derive(Debug, Clone)]
pub enum DataSourceKind {
    /// One entity, by `id` or by exactly one of the lookup attributes
    Singular { lookup_attributes: Vec<&'static str> },
    /// Every entity of the collection, under `items_attribute`
    Plural { items_attribute: &'static str },
}

#[derive(Debug, Clone)]
pub struct DataSourceDefinition {
    /// Type name without provider prefix
    pub type_name: String,
    /// Schema users configure and read back
    pub schema: Schema,
    pub kind: DataSourceKind,
    resource: ResourceDefinition,
}

impl DataSourceDefinition {
    /// Every resource attribute computed; `id` and the lookup attributes optional
    pub fn singular_from_resource(resource: &ResourceDefinition, lookup_attributes: &[&'static str]) -> Self {
        let mut schema = resource.schema.clone().into_computed();
        for name in std::iter::once("id").chain(lookup_attributes.iter().copied()) {
            if let Some(attr) = schema.attributes.get_mut(name) {
                attr.optional = true;
            }
        }

        Self {
            type_name: resource.type_name.to_string(),
            schema,
            kind: DataSourceKind::Singular {
                lookup_attributes: lookup_attributes.to_vec(),
            },
            resource: resource.clone(),
        }
    }

    /// List of the singular schema under the plural name, filterable with `$filter`
    pub fn plural_from_singular(singular: &DataSourceDefinition) -> Self {
        let items_attribute = "items";
        let item_schema = singular.resource.schema.clone().into_computed();
        let schema = Schema::new(singular.schema.description)
            .attribute(
                ODATA_FILTER,
                Attribute::string()
                    .optional()
                    .description("OData `$filter` expression passed to Graph"),
            )
            .attribute(items_attribute, Attribute::list_nested(item_schema).computed());

        Self {
            type_name: singular.resource.plural_type_name(),
            schema,
            kind: DataSourceKind::Plural { items_attribute },
            resource: singular.resource.clone(),
        }
    }

    pub fn resource(&self) -> &ResourceDefinition {
        &self.resource
    }
}

pub struct GenericDataSource<'a> {
    client: &'a GraphClient,
    definition: &'a DataSourceDefinition,
}

impl<'a> GenericDataSource<'a> {
    pub fn new(client: &'a GraphClient, definition: &'a DataSourceDefinition) -> Self {
        Self { client, definition }
    }

    pub async fn read(&self, config: &Value) -> Result<Value> {
        let diagnostics = validate_config(&self.definition.schema, config);
        if diagnostics.iter().any(|d| d.is_error()) {
            return Err(ProviderError::Validation(diagnostics));
        }

        match &self.definition.kind {
            DataSourceKind::Singular { lookup_attributes } => self.read_singular(config, lookup_attributes).await,
            DataSourceKind::Plural { items_attribute } => self.read_plural(config, items_attribute).await,
        }
    }

    async fn read_singular(&self, config: &Value, lookup_attributes: &[&'static str]) -> Result<Value> {
        let resource = &self.definition.resource;
        let access = &resource.access;

        let raw = if access.is_singleton() {
            self.get_object(&read_uri(resource, "")).await?
        } else if let Some(id) = config.get("id").and_then(Value::as_str) {
            self.get_object(&read_uri(resource, id)).await?
        } else {
            let (name, value) = lookup_attributes
                .iter()
                .find_map(|name| config.get(*name).and_then(Value::as_str).map(|v| (*name, v)))
                .ok_or_else(|| {
                    ProviderError::conversion(
                        "",
                        format!("one of id, {} must be set", lookup_attributes.join(", ")),
                    )
                })?;

            let graph_key = resource
                .schema
                .get(name)
                .map(|attr| attr.graph_key(name))
                .unwrap_or_else(|| name.to_string());
            let filter = format!("{} eq '{}'", graph_key, value.replace('\'', "''"));
            debug!("Looking up {} with $filter={}", resource.type_name, filter);

            let mut matches = self.list(Some(&filter)).await?;
            match matches.len() {
                1 => matches.remove(0),
                0 => {
                    return Err(ProviderError::NotFound(format!(
                        "no {} with {} = '{}'",
                        resource.type_name, name, value
                    )))
                }
                n => {
                    return Err(ProviderError::InvalidState(format!(
                        "{} {} entities match {} = '{}', expected exactly one",
                        n, resource.type_name, name, value
                    )))
                }
            }
        };

        let mut state = self.convert(raw)?;
        if let (Some(id), Some(object)) = (access.singleton_id, state.as_object_mut()) {
            if resource.schema.get("id").is_some() {
                object.insert("id".to_string(), Value::String(id.to_string()));
            }
        }
        Ok(state)
    }

    async fn read_plural(&self, config: &Value, items_attribute: &str) -> Result<Value> {
        let filter = config.get(ODATA_FILTER).and_then(Value::as_str);
        let items = self
            .list(filter)
            .await?
            .into_iter()
            .map(|raw| self.convert(raw))
            .collect::<Result<Vec<_>>>()?;

        let mut out = Map::new();
        out.insert(
            ODATA_FILTER.to_string(),
            filter.map_or(Value::Null, |f| Value::String(f.to_string())),
        );
        out.insert(items_attribute.to_string(), Value::Array(items));
        Ok(Value::Object(out))
    }

    async fn get_object(&self, uri: &str) -> Result<Map<String, Value>> {
        match self.client.get(uri).await? {
            Value::Object(map) => Ok(map),
            other => Err(ProviderError::InvalidState(format!("expected an object, got {}", other))),
        }
    }

    async fn list(&self, filter: Option<&str>) -> Result<Vec<Map<String, Value>>> {
        let base_uri = self.definition.resource.access.base_uri;
        let uri = match filter {
            Some(filter) => format!("{}?$filter={}", base_uri, urlencoding::encode(filter)),
            None => base_uri.to_string(),
        };

        Ok(self
            .client
            .get_all_pages(&uri)
            .await?
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }

    fn convert(&self, mut raw: Map<String, Value>) -> Result<Value> {
        let resource = &self.definition.resource;
        if let Some(middleware) = resource.access.graph_to_terraform {
            middleware(&mut GraphToTerraformParams { raw: &mut raw })?;
        }
        graph_to_terraform(&resource.schema, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PlanModifier;

    fn group() -> ResourceDefinition {
        ResourceDefinition::new(
            "group",
            "/groups",
            Schema::new("Group")
                .attribute(
                    "id",
                    Attribute::string()
                        .computed()
                        .plan_modifier(PlanModifier::UseStateForUnknown),
                )
                .attribute("display_name", Attribute::string().required())
                .attribute("mail_nickname", Attribute::string().required()),
        )
        .lookup_by(&["display_name", "mail_nickname"])
    }

    #[test]
    fn test_singular_schema() {
        let def = DataSourceDefinition::singular_from_resource(&group(), &["display_name"]);
        let display_name = def.schema.get("display_name").unwrap();
        assert!(display_name.optional && display_name.computed && !display_name.required);
        let nickname = def.schema.get("mail_nickname").unwrap();
        assert!(!nickname.optional && nickname.computed);
        assert!(def.schema.get("id").unwrap().optional);
    }

    #[test]
    fn test_plural_schema() {
        let singular = DataSourceDefinition::singular_from_resource(&group(), &["display_name"]);
        let plural = DataSourceDefinition::plural_from_singular(&singular);
        assert_eq!(plural.type_name, "groups");
        assert!(plural.schema.get(ODATA_FILTER).unwrap().optional);
        assert!(plural.schema.get("items").unwrap().computed);
    }
}
