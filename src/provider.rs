//! Provider registry: every resource and data source under the `msgraph_` prefix

use crate::error::{ProviderError, Result};
use crate::generic::{DataSourceDefinition, ResourceDefinition};
use crate::resources;
use std::collections::BTreeMap;

pub const TYPE_PREFIX: &str = "msgraph_";

pub struct Provider {
    resources: BTreeMap<String, ResourceDefinition>,
    data_sources: BTreeMap<String, DataSourceDefinition>,
}

impl Provider {
    pub fn new() -> Self {
        let mut provider = Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        };
        for definition in resources::all() {
            provider.register(definition);
        }
        provider
    }

    fn register(&mut self, definition: ResourceDefinition) {
        let singular = DataSourceDefinition::singular_from_resource(&definition, &definition.lookup_attributes);
        if !definition.access.is_singleton() {
            let plural = DataSourceDefinition::plural_from_singular(&singular);
            self.data_sources
                .insert(format!("{}{}", TYPE_PREFIX, plural.type_name), plural);
        }
        self.data_sources
            .insert(format!("{}{}", TYPE_PREFIX, singular.type_name), singular);
        self.resources
            .insert(format!("{}{}", TYPE_PREFIX, definition.type_name), definition);
    }

    pub fn resource(&self, name: &str) -> Result<&ResourceDefinition> {
        self.resources
            .get(name)
            .ok_or_else(|| ProviderError::UnknownResource(name.to_string()))
    }

    pub fn data_source(&self, name: &str) -> Result<&DataSourceDefinition> {
        self.data_sources
            .get(name)
            .ok_or_else(|| ProviderError::UnknownDataSource(name.to_string()))
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn data_source_names(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeKind, Schema};
    use std::collections::HashSet;

    #[test]
    fn test_registers_every_resource() {
        let provider = Provider::new();
        assert_eq!(provider.resource_names().count(), 27);
        assert!(provider.resource("msgraph_group").is_ok());
        assert!(matches!(
            provider.resource("group"),
            Err(ProviderError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_data_sources() {
        let provider = Provider::new();
        assert!(provider.data_source("msgraph_group").is_ok());
        assert!(provider.data_source("msgraph_groups").is_ok());
        assert!(provider.data_source("msgraph_device_compliance_policies").is_ok());
        assert!(provider.data_source("msgraph_cross_tenant_access_default").is_ok());
        assert!(provider.data_source("msgraph_cross_tenant_access_defaults").is_err());
        // one singular per resource, one plural per non-singleton
        assert_eq!(provider.data_source_names().count(), 27 * 2 - 1);
    }

    fn derived_types_unique(schema: &Schema, type_name: &str) {
        let mut seen = HashSet::new();
        for (name, attr) in &schema.attributes {
            if let Some(odata_type) = attr.derived_type {
                assert!(seen.insert(odata_type), "{}: duplicate derived type {}", type_name, odata_type);
            }
            if let AttributeKind::SingleNested(nested)
            | AttributeKind::ListNested(nested)
            | AttributeKind::SetNested(nested) = &attr.kind
            {
                derived_types_unique(nested, &format!("{}.{}", type_name, name));
            }
        }
    }

    #[test]
    fn test_definitions_are_consistent() {
        let provider = Provider::new();
        for name in provider.resource_names() {
            let definition = provider.resource(name).unwrap();
            let schema = &definition.schema;

            assert!(schema.get("id").is_some(), "{} has no id attribute", name);

            for sub_action in &definition.access.write_sub_actions {
                for attribute in &sub_action.attributes {
                    assert!(
                        schema.get(attribute).is_some(),
                        "{}: sub-action {} names unknown attribute {}",
                        name,
                        sub_action.uri_suffix,
                        attribute
                    );
                }
            }

            for lookup in &definition.lookup_attributes {
                assert!(schema.get(lookup).is_some(), "{}: unknown lookup {}", name, lookup);
            }

            for attr in schema.attributes.values() {
                assert!(
                    attr.required || attr.optional || attr.computed,
                    "{}: attribute without presence",
                    name
                );
            }

            derived_types_unique(schema, name);
            assert!(schema.to_json().is_ok());
        }
    }
}
