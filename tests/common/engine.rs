//! In-process declarative engine for integration tests.
//!
//! [`LocalEngine`] parses the configuration text and reconciles each block
//! against an [`InMemorySnyk`], recording what it created in a [`State`]. It
//! reproduces the parts of real engine behavior the acceptance steps rely on:
//! references resolve through state, resources created before a failure stay
//! in state, and unchanged resources are not recreated on the next apply.

use log::debug;
use snyk_acctest::client::InMemorySnyk;
use snyk_acctest::harness::{Apply, ApplyError};
use snyk_acctest::hcl::{Document, INTEGRATION_RESOURCE, ORGANIZATION_RESOURCE, ResourceBlock};
use snyk_acctest::resource::{IntegrationCredentials, IntegrationType, ResourceId};
use snyk_acctest::state::{ResourceState, State};

pub struct LocalEngine {
    remote: InMemorySnyk,
    state: State,
    applies: usize,
}

impl LocalEngine {
    pub fn new(remote: InMemorySnyk) -> Self {
        Self {
            remote,
            state: State::new(),
            applies: 0,
        }
    }

    pub fn remote(&self) -> &InMemorySnyk {
        &self.remote
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Number of `apply` calls so far, successful or not.
    pub fn applies(&self) -> usize {
        self.applies
    }

    async fn apply_organization(&mut self, block: &ResourceBlock) -> Result<(), ApplyError> {
        let name = literal(block, "name")?;
        let group_id = literal(block, "group_id").unwrap_or_default();
        let address = block.address();

        if let Some(existing) = self.state.resource(&address) {
            if existing.attribute("name") == Some(name.as_str())
                && existing.attribute("group_id").unwrap_or_default() == group_id
            {
                debug!("{} unchanged", address);
                return Ok(());
            }
            // Replacement: the old organization goes first.
            if let Some(id) = existing.primary_id() {
                let id = resource_id(id)?;
                self.remote.delete_organization(&id).await.map_err(diagnostic)?;
            }
            self.state.remove(&address);
        }

        let organization = self
            .remote
            .create_organization(&name, Some(group_id.as_str()))
            .await
            .map_err(diagnostic)?;

        self.state.insert(
            ResourceState::new(&block.resource_type, &block.name)
                .with_id(organization.id.as_str())
                .with_attribute("name", name)
                .with_attribute("group_id", group_id),
        );
        Ok(())
    }

    async fn apply_integration(&mut self, block: &ResourceBlock) -> Result<(), ApplyError> {
        let organization_id = self.resolve(block, "organization_id")?;
        let type_name = literal(block, "type")?;
        let url = literal(block, "url")?;
        let token = literal(block, "token").unwrap_or_default();

        let integration_type: IntegrationType = type_name
            .parse()
            .map_err(|e| ApplyError::Diagnostics(format!("Error: {}", e)))?;

        let integration = self
            .remote
            .create_integration(
                &resource_id(&organization_id)?,
                integration_type,
                IntegrationCredentials::new(url.clone(), token),
            )
            .await
            .map_err(diagnostic)?;

        self.state.insert(
            ResourceState::new(&block.resource_type, &block.name)
                .with_id(integration.id.as_str())
                .with_attribute("organization_id", organization_id)
                .with_attribute("type", integration.integration_type.as_str())
                .with_attribute("url", url),
        );
        Ok(())
    }

    /// Resolve a `<type>.<name>.<attribute>` reference through state.
    fn resolve(&self, block: &ResourceBlock, key: &str) -> Result<String, ApplyError> {
        let expression = block
            .get(key)
            .ok_or_else(|| missing_argument(block, key))?;

        if let Some(value) = expression.as_literal() {
            return Ok(value.to_string());
        }

        let path = expression.as_reference().unwrap_or_default();
        let [resource_type, name, attribute] = path else {
            return Err(ApplyError::Diagnostics(format!(
                "Error: Invalid reference {} in {}",
                expression,
                block.address()
            )));
        };

        self.state
            .resource(&format!("{}.{}", resource_type, name))
            .and_then(|resource| resource.attribute(attribute))
            .map(str::to_string)
            .ok_or_else(|| {
                ApplyError::Diagnostics(format!(
                    "Error: Reference to undeclared resource {}",
                    expression
                ))
            })
    }
}

impl Apply for LocalEngine {
    async fn apply(&mut self, config: &str) -> Result<State, ApplyError> {
        self.applies += 1;
        let document = Document::parse(config)
            .map_err(|e| ApplyError::Diagnostics(format!("Error: {}", e)))?;

        for block in &document.blocks {
            match block.resource_type.as_str() {
                ORGANIZATION_RESOURCE => self.apply_organization(block).await?,
                INTEGRATION_RESOURCE => self.apply_integration(block).await?,
                other => {
                    return Err(ApplyError::Diagnostics(format!(
                        "Error: Invalid resource type \"{}\"",
                        other
                    )));
                }
            }
        }

        Ok(self.state.clone())
    }

    async fn destroy(&mut self) -> Result<(), ApplyError> {
        let organization_ids: Vec<String> = self
            .state
            .resources
            .values()
            .filter(|resource| resource.resource_type == ORGANIZATION_RESOURCE)
            .filter_map(|resource| resource.primary_id().map(str::to_string))
            .collect();

        for id in organization_ids {
            self.remote
                .delete_organization(&resource_id(&id)?)
                .await
                .map_err(diagnostic)?;
        }

        self.state = State::new();
        Ok(())
    }
}

fn literal(block: &ResourceBlock, key: &str) -> Result<String, ApplyError> {
    block
        .get(key)
        .and_then(|expression| expression.as_literal())
        .map(str::to_string)
        .ok_or_else(|| missing_argument(block, key))
}

fn missing_argument(block: &ResourceBlock, key: &str) -> ApplyError {
    ApplyError::Diagnostics(format!(
        "Error: Missing required argument \"{}\" in {}",
        key,
        block.address()
    ))
}

fn resource_id(id: &str) -> Result<ResourceId, ApplyError> {
    ResourceId::new(id).map_err(|e| ApplyError::Diagnostics(format!("Error: {}", e)))
}

fn diagnostic(error: impl std::fmt::Display) -> ApplyError {
    ApplyError::Diagnostics(format!("Error: {}", error))
}
