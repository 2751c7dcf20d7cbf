//! Remote object model for organizations and their integrations.
//!
//! These are the shapes the verifier reads back from the Snyk API. An
//! [`Integration`] doubles as the verification record a passing step hands
//! back to its caller.

pub mod integration;
pub mod organization;
pub mod resource_id;

pub use integration::{Integration, IntegrationCredentials, IntegrationList, IntegrationType};
pub use organization::{Group, Organization};
pub use resource_id::ResourceId;

/// Validation failures for remote object values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Resource ids must not be empty
    #[error("Resource id cannot be empty")]
    EmptyId,

    /// Integration type tags must not be empty
    #[error("Integration type cannot be empty")]
    EmptyIntegrationType,
}
