//! Remote API seam.
//!
//! The verifier only needs two reads from the remote service: the list of
//! organizations visible to the API token, and the integrations configured on
//! one organization. [`SnykApi`] captures exactly that so the verifier can run
//! against the live service ([`HttpClient`]) or a local fake
//! ([`InMemorySnyk`]).

pub mod error;
pub mod http;
pub mod in_memory;

pub use error::ApiError;
pub use http::{ClientConfig, HttpClient};
pub use in_memory::{InMemorySnyk, WRONG_CREDENTIALS};

use crate::resource::{IntegrationList, Organization, ResourceId};
use std::future::Future;

/// Read access to organizations and their integrations.
pub trait SnykApi {
    type Error: std::error::Error + Send + Sync + 'static;

    /// List every organization visible to the caller.
    fn list_organizations(
        &self,
    ) -> impl Future<Output = Result<Vec<Organization>, Self::Error>> + Send;

    /// List the integrations configured on one organization.
    fn list_integrations(
        &self,
        organization_id: &ResourceId,
    ) -> impl Future<Output = Result<IntegrationList, Self::Error>> + Send;
}
