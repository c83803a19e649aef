use super::convert::graph_to_terraform;
use super::request::{
    create_request, delete_request, entity_id, planned_id, read_uri, sub_action_requests, update_request,
};
use super::{GraphToTerraformParams, ResourceDefinition};
use crate::error::{ProviderError, Result};
use crate::graph::GraphClient;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Drives the create/read/update/delete lifecycle of one resource type
pub struct GenericResource<'a> {
    client: &'a GraphClient,
    definition: &'a ResourceDefinition,
}

impl<'a> GenericResource<'a> {
    pub fn new(client: &'a GraphClient, definition: &'a ResourceDefinition) -> Self {
        Self { client, definition }
    }

    pub async fn create(&self, planned: &Value) -> Result<Value> {
        let api_root = self.client.api_root();
        let request = create_request(self.definition, planned, &api_root)?;
        info!("Creating {} via {}", self.definition.type_name, request);

        let response = self.client.execute(&request).await?;
        let id = planned_id(self.definition, planned)
            .or_else(|| {
                response
                    .as_ref()
                    .and_then(|r| r.get("id"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                ProviderError::InvalidState(format!(
                    "Graph did not return an id for the new {}",
                    self.definition.type_name
                ))
            })?;

        let entity_uri = self.definition.access.entity_uri(&id);
        for sub in sub_action_requests(self.definition, &entity_uri, planned, None, &api_root)? {
            debug!("Sub-action {}", sub);
            if let Err(e) = self.client.execute(&sub).await {
                warn!("{} {} created, but {} failed", self.definition.type_name, id, sub);
                return Err(ProviderError::IncompleteCreate {
                    state: Box::new(self.unconfigured_state(planned, &id)),
                    id,
                    source: Box::new(e),
                });
            }
        }

        self.read_entity(&id, Some(planned))
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("{} {} vanished after create", self.definition.type_name, id)))
    }

    /// Current state, `None` when the entity no longer exists
    pub async fn read(&self, state: &Value) -> Result<Option<Value>> {
        let id = entity_id(self.definition, state)?;
        self.read_entity(&id, Some(state)).await
    }

    pub async fn import(&self, id: &str) -> Result<Value> {
        let id = self.definition.access.singleton_id.unwrap_or(id);
        self.read_entity(id, None)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("{} {}", self.definition.type_name, id)))
    }

    pub async fn update(&self, planned: &Value, prior: &Value) -> Result<Value> {
        let api_root = self.client.api_root();
        let id = entity_id(self.definition, prior)?;

        match update_request(self.definition, planned, prior, &api_root)? {
            Some(request) => {
                info!("Updating {} via {}", self.definition.type_name, request);
                self.client.execute(&request).await?;
            }
            None => debug!("No entity body changes for {} {}", self.definition.type_name, id),
        }

        let entity_uri = self.definition.access.entity_uri(&id);
        for sub in sub_action_requests(self.definition, &entity_uri, planned, Some(prior), &api_root)? {
            debug!("Sub-action {}", sub);
            self.client.execute(&sub).await?;
        }

        self.read_entity(&id, Some(planned))
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("{} {} vanished after update", self.definition.type_name, id)))
    }

    pub async fn delete(&self, state: &Value) -> Result<()> {
        let id = entity_id(self.definition, state)?;

        let Some(request) = delete_request(self.definition, &id) else {
            info!("{} {} cannot be deleted, removing from state only", self.definition.type_name, id);
            return Ok(());
        };

        info!("Deleting {} via {}", self.definition.type_name, request);
        match self.client.execute(&request).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!("{} {} was already gone", self.definition.type_name, id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Planned state of a new entity whose sub-actions did not complete. The
    /// sub-action attributes are cleared so the next plan writes them again.
    fn unconfigured_state(&self, planned: &Value, id: &str) -> Value {
        let mut state = planned.clone();
        if let Some(object) = state.as_object_mut() {
            object.insert("id".to_string(), Value::String(id.to_string()));
            for name in self.definition.access.sub_action_attributes(false) {
                object.insert(name.to_string(), Value::Null);
            }
        }
        state
    }

    /// GET the entity plus its extra reads and convert it. `carry` supplies values
    /// for attributes Graph never returns.
    async fn read_entity(&self, id: &str, carry: Option<&Value>) -> Result<Option<Value>> {
        let access = &self.definition.access;

        let mut raw = match self.client.get(&read_uri(self.definition, id)).await {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(ProviderError::InvalidState(format!(
                    "expected an object for {} {}, got {}",
                    self.definition.type_name, id, other
                )))
            }
            Err(e) if e.is_not_found() => {
                debug!("{} {} not found", self.definition.type_name, id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let entity_uri = access.entity_uri(id);
        for extra in &access.read.extra_reads {
            let items = self
                .client
                .get_all_pages(&format!("{}/{}", entity_uri, extra.uri_suffix))
                .await?;
            let items = if extra.ids_only {
                items
                    .into_iter()
                    .filter_map(|item| item.get("id").cloned())
                    .collect()
            } else {
                items
            };
            raw.insert(extra.graph_key.to_string(), Value::Array(items));
        }

        if let Some(middleware) = access.graph_to_terraform {
            middleware(&mut GraphToTerraformParams { raw: &mut raw })?;
        }

        let mut state = graph_to_terraform(&self.definition.schema, &raw)?;
        if let Some(object) = state.as_object_mut() {
            if access.is_singleton() && self.definition.schema.get("id").is_some() {
                object.insert("id".to_string(), Value::String(id.to_string()));
            }
            if let Some(carry) = carry.and_then(Value::as_object) {
                carry_write_only(self.definition, object, carry);
            }
        }

        Ok(Some(state))
    }
}

fn carry_write_only(definition: &ResourceDefinition, state: &mut Map<String, Value>, carry: &Map<String, Value>) {
    for (name, attr) in &definition.schema.attributes {
        if !attr.write_only {
            continue;
        }
        if let Some(value) = carry.get(*name) {
            state.insert(name.to_string(), value.clone());
        }
    }
}
