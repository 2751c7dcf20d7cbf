//! Error types for acceptance-test verification.
//!
//! Each layer carries its own error enum ([`ApiError`](crate::client::ApiError),
//! [`ApplyError`], [`HclError`], [`SettingsError`]); [`AccError`] is the
//! top-level type a test step fails with and wraps all of them.

use crate::client::ApiError;
use crate::harness::ApplyError;
use crate::hcl::HclError;
use crate::settings::SettingsError;
use std::fmt;

/// Main error type for acceptance-test steps.
#[derive(Debug, thiserror::Error)]
pub enum AccError {
    /// The resource is absent from the applied state or has an empty id
    #[error("integration ID is not set ({resource})")]
    MissingId { resource: String },

    /// The resource is absent from the applied state
    #[error("resource {address} not found in state")]
    NotInState { address: String },

    /// Errors returned by the remote API, propagated unchanged
    #[error(transparent)]
    Remote(Box<dyn std::error::Error + Send + Sync>),

    /// No remote organization carries the expected display name
    #[error("organization ({organization}) for integration ({integration}) not found")]
    OrganizationNotFound {
        organization: String,
        integration: String,
    },

    /// The organization's integration list does not contain the recorded id
    #[error("integration ({id}) not found")]
    IntegrationNotFound { id: String },

    /// A state attribute did not hold the expected value
    #[error("{resource}: attribute '{key}' expected \"{expected}\", got \"{actual}\"")]
    AttributeMismatch {
        resource: String,
        key: String,
        expected: String,
        actual: String,
    },

    /// A state attribute that must be set is missing or empty
    #[error("{resource}: attribute '{key}' expected to be set")]
    AttributeNotSet { resource: String, key: String },

    /// The declarative engine failed to apply or destroy a configuration
    #[error(transparent)]
    Apply(#[from] ApplyError),

    /// A step expected the apply to fail but it succeeded
    #[error("step {step}: expected an error matching /{pattern}/, got none")]
    ExpectedErrorNotRaised { step: usize, pattern: String },

    /// A step expected an error but the raised one did not match
    #[error("step {step}: expected an error matching /{pattern}/, got: {actual}")]
    UnexpectedError {
        step: usize,
        pattern: String,
        actual: String,
    },

    /// Several checks of one step failed
    #[error("{0}")]
    Aggregate(AggregateError),

    /// Configuration text could not be rendered or parsed
    #[error(transparent)]
    Hcl(#[from] HclError),

    /// Environment configuration is incomplete
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Result type for acceptance-test operations.
pub type AccResult<T> = Result<T, AccError>;

/// Collection of check failures reported together.
///
/// Displays one failure per line, prefixed with its position in the step's
/// check list, the way Terraform's aggregate check function reports them.
#[derive(Debug)]
pub struct AggregateError {
    pub errors: Vec<AccError>,
}

impl AggregateError {
    pub fn new(errors: Vec<AccError>) -> Self {
        Self { errors }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} check(s) failed:", self.errors.len())?;
        for (index, error) in self.errors.iter().enumerate() {
            write!(f, "\n  {}. {}", index + 1, error)?;
        }
        Ok(())
    }
}

impl From<ApiError> for AccError {
    fn from(error: ApiError) -> Self {
        AccError::Remote(Box::new(error))
    }
}

impl AccError {
    /// Wrap an error raised by any [`SnykApi`](crate::client::SnykApi)
    /// implementation.
    pub fn remote<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        AccError::Remote(Box::new(error))
    }

    /// The underlying [`ApiError`] when this is a remote failure raised by one
    /// of the crate's clients.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            AccError::Remote(source) => source.downcast_ref::<ApiError>(),
            _ => None,
        }
    }

    /// Collapse a list of failures into one error.
    ///
    /// Returns `None` for an empty list and the error itself for a single
    /// failure.
    pub fn aggregate(mut errors: Vec<AccError>) -> Option<AccError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(AccError::Aggregate(AggregateError::new(errors))),
        }
    }

    /// Whether this error means the remote object could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AccError::OrganizationNotFound { .. } | AccError::IntegrationNotFound { .. }
        )
    }
}
