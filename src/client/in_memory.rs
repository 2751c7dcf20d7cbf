//! In-memory stand-in for the remote service.
//!
//! Keeps organizations and their integrations behind an async `RwLock` so a
//! single instance can be shared between a test's apply step and its
//! verifier. Create operations reproduce the remote validation the
//! acceptance steps depend on, most importantly the rejection of empty
//! credentials.
//!
//! ```rust
//! use snyk_acctest::client::{InMemorySnyk, SnykApi};
//! use snyk_acctest::resource::{IntegrationCredentials, IntegrationType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = InMemorySnyk::new();
//! let org = remote.create_organization("tf-test-acc_abc", Some("grp-123")).await?;
//!
//! let rejected = remote
//!     .create_integration(
//!         &org.id,
//!         IntegrationType::GitLab,
//!         IntegrationCredentials::new("https://testing.gitlab.local", ""),
//!     )
//!     .await;
//! assert!(rejected.is_err());
//!
//! let listed = remote.list_integrations(&org.id).await?;
//! assert!(listed.is_empty());
//! # Ok(())
//! # }
//! ```

use super::{ApiError, SnykApi};
use crate::resource::{
    Group, Integration, IntegrationCredentials, IntegrationList, IntegrationType, Organization,
    ResourceId,
};
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Message the remote service answers with when integration credentials are
/// rejected.
pub const WRONG_CREDENTIALS: &str = "Wrong credentials for given integration type";

/// Thread-safe in-memory remote.
#[derive(Clone, Default)]
pub struct InMemorySnyk {
    inner: Arc<RwLock<Remote>>,
}

#[derive(Default)]
struct Remote {
    // Listing order is creation order, like the live service.
    organizations: Vec<StoredOrganization>,
    unavailable: bool,
}

struct StoredOrganization {
    organization: Organization,
    integrations: BTreeMap<IntegrationType, StoredIntegration>,
}

struct StoredIntegration {
    id: ResourceId,
    credentials: IntegrationCredentials,
}

impl Remote {
    fn organization_mut(&mut self, id: &ResourceId) -> Option<&mut StoredOrganization> {
        self.organizations
            .iter_mut()
            .find(|stored| &stored.organization.id == id)
    }

    fn check_available(&self, method: &str, path: &str) -> Result<(), ApiError> {
        if self.unavailable {
            return Err(http_error(method, path, 503, "Service unavailable"));
        }
        Ok(())
    }
}

fn http_error(method: &str, path: &str, status: u16, message: &str) -> ApiError {
    ApiError::Http {
        method: method.to_string(),
        url: path.to_string(),
        status,
        message: message.to_string(),
    }
}

impl InMemorySnyk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an organization, optionally inside a group.
    pub async fn create_organization(
        &self,
        name: &str,
        group_id: Option<&str>,
    ) -> Result<Organization, ApiError> {
        let mut remote = self.inner.write().await;
        remote.check_available("POST", "org")?;

        if name.trim().is_empty() {
            return Err(http_error("POST", "org", 400, "Organization name is required"));
        }

        let mut organization = Organization::new(ResourceId::generate(), name);
        organization.slug = Some(name.to_lowercase().replace('_', "-"));
        if let Some(group_id) = group_id.filter(|g| !g.is_empty()) {
            organization = organization.with_group(Group {
                id: group_id.to_string(),
                name: String::new(),
            });
        }

        info!(
            "Created organization '{}' with id '{}'",
            organization.name, organization.id
        );
        remote.organizations.push(StoredOrganization {
            organization: organization.clone(),
            integrations: BTreeMap::new(),
        });
        Ok(organization)
    }

    /// Add or update an integration on an organization.
    ///
    /// An organization holds at most one integration per type; configuring a
    /// type again replaces the credentials and keeps the id.
    ///
    /// # Arguments
    ///
    /// * `organization_id` - The organization to configure
    /// * `integration_type` - Which integration to add
    /// * `credentials` - Endpoint URL and token; both must be non-empty
    ///
    /// # Returns
    ///
    /// * `Ok(Integration)` - The id and type of the configured integration
    /// * `Err(ApiError::Http)` - 404 for an unknown organization, 422 with
    ///   [`WRONG_CREDENTIALS`] for empty credentials, or 503 while unavailable
    ///
    /// # Examples
    ///
    /// ```rust
    /// use snyk_acctest::client::{InMemorySnyk, WRONG_CREDENTIALS};
    /// use snyk_acctest::resource::{IntegrationCredentials, IntegrationType};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let snyk = InMemorySnyk::new();
    ///     let org = snyk.create_organization("tf-test-acc_abc", Some("grp-123")).await?;
    ///
    ///     let rejected = snyk
    ///         .create_integration(
    ///             &org.id,
    ///             IntegrationType::GitLab,
    ///             IntegrationCredentials::new("https://testing.gitlab.local", ""),
    ///         )
    ///         .await;
    ///     assert!(rejected.unwrap_err().to_string().contains(WRONG_CREDENTIALS));
    ///
    ///     let integration = snyk
    ///         .create_integration(
    ///             &org.id,
    ///             IntegrationType::GitLab,
    ///             IntegrationCredentials::new("https://testing.gitlab.local", "secret"),
    ///         )
    ///         .await?;
    ///     assert_eq!(integration.integration_type, IntegrationType::GitLab);
    ///     Ok(())
    /// }
    /// ```
    pub async fn create_integration(
        &self,
        organization_id: &ResourceId,
        integration_type: IntegrationType,
        credentials: IntegrationCredentials,
    ) -> Result<Integration, ApiError> {
        let path = format!("org/{}/integrations", organization_id);
        let mut remote = self.inner.write().await;
        remote.check_available("POST", &path)?;

        let stored = remote
            .organization_mut(organization_id)
            .ok_or_else(|| http_error("POST", &path, 404, "Org not found"))?;

        if credentials.token.is_empty() || credentials.url.is_empty() {
            debug!(
                "Rejecting {} integration for organization '{}': empty credentials",
                integration_type, organization_id
            );
            return Err(http_error("POST", &path, 422, WRONG_CREDENTIALS));
        }

        let entry = stored
            .integrations
            .entry(integration_type.clone())
            .or_insert_with(|| StoredIntegration {
                id: ResourceId::generate(),
                credentials: credentials.clone(),
            });
        entry.credentials = credentials;

        info!(
            "Configured {} integration '{}' for organization '{}'",
            integration_type, entry.id, organization_id
        );
        Ok(Integration::new(entry.id.clone(), integration_type))
    }

    /// Delete an organization together with its integrations.
    pub async fn delete_organization(&self, organization_id: &ResourceId) -> Result<(), ApiError> {
        let path = format!("org/{}", organization_id);
        let mut remote = self.inner.write().await;
        remote.check_available("DELETE", &path)?;

        let before = remote.organizations.len();
        remote
            .organizations
            .retain(|stored| &stored.organization.id != organization_id);
        if remote.organizations.len() == before {
            return Err(http_error("DELETE", &path, 404, "Org not found"));
        }

        info!("Deleted organization '{}'", organization_id);
        Ok(())
    }

    /// Credentials currently stored for an organization's integration type.
    pub async fn integration_credentials(
        &self,
        organization_id: &ResourceId,
        integration_type: &IntegrationType,
    ) -> Option<IntegrationCredentials> {
        let remote = self.inner.read().await;
        remote
            .organizations
            .iter()
            .find(|stored| &stored.organization.id == organization_id)?
            .integrations
            .get(integration_type)
            .map(|entry| entry.credentials.clone())
    }

    /// Make every subsequent call fail with `503 Service unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.inner.write().await.unavailable = unavailable;
    }

    pub async fn organization_count(&self) -> usize {
        self.inner.read().await.organizations.len()
    }

    /// Clear all data (useful for testing).
    pub async fn clear(&self) {
        let mut remote = self.inner.write().await;
        remote.organizations.clear();
        remote.unavailable = false;
    }
}

impl SnykApi for InMemorySnyk {
    type Error = ApiError;

    async fn list_organizations(&self) -> Result<Vec<Organization>, Self::Error> {
        let remote = self.inner.read().await;
        remote.check_available("GET", "orgs")?;
        Ok(remote
            .organizations
            .iter()
            .map(|stored| stored.organization.clone())
            .collect())
    }

    async fn list_integrations(
        &self,
        organization_id: &ResourceId,
    ) -> Result<IntegrationList, Self::Error> {
        let path = format!("org/{}/integrations", organization_id);
        let remote = self.inner.read().await;
        remote.check_available("GET", &path)?;

        let stored = remote
            .organizations
            .iter()
            .find(|stored| &stored.organization.id == organization_id)
            .ok_or_else(|| http_error("GET", &path, 404, "Org not found"))?;

        Ok(IntegrationList::from_pairs(
            stored
                .integrations
                .iter()
                .map(|(integration_type, entry)| (integration_type.clone(), entry.id.clone())),
        ))
    }
}
