//! Acceptance-test harness for the Snyk Terraform provider's integration
//! resource.
//!
//! Generates the declarative configuration for an organization with a nested
//! integration, drives a declarative engine through apply steps, and verifies
//! the applied state against the remote service.
//!
//! # Core Components
//!
//! - [`hcl::integration_config`] - Configuration generator
//! - [`verify::check_integration_exists`] - Two-phase remote state verifier
//! - [`harness::TestCase`] - Step driver with expected-error and check support
//! - [`client::SnykApi`] - Remote API seam, with [`client::HttpClient`] and
//!   [`client::InMemorySnyk`] implementations
//!
//! # Quick Start
//!
//! ```rust
//! use snyk_acctest::client::InMemorySnyk;
//! use snyk_acctest::resource::{IntegrationCredentials, IntegrationType};
//! use snyk_acctest::state::{ResourceState, State};
//! use snyk_acctest::verify::check_integration_exists;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = InMemorySnyk::new();
//! let org = remote.create_organization("tf-test-acc_abcdefghij", Some("grp-123")).await?;
//! let created = remote
//!     .create_integration(
//!         &org.id,
//!         IntegrationType::GitLab,
//!         IntegrationCredentials::new("https://testing.gitlab.local", "abcdefghijklmnopqrst"),
//!     )
//!     .await?;
//!
//! let mut state = State::new();
//! state.insert(ResourceState::new("snyk_integration", "test").with_id(created.id.as_str()));
//!
//! let verified =
//!     check_integration_exists(&remote, &state, "snyk_integration.test", "tf-test-acc_abcdefghij")
//!         .await?;
//! assert_eq!(verified.integration_type, IntegrationType::GitLab);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod harness;
pub mod hcl;
pub mod resource;
pub mod settings;
pub mod state;
pub mod verify;

pub use client::{ApiError, ClientConfig, HttpClient, InMemorySnyk, SnykApi};
pub use error::{AccError, AccResult, AggregateError};
pub use harness::{Apply, ApplyError, Check, TerraformCli, TestCase, TestReport, TestStep};
pub use hcl::{Document, integration_config};
pub use resource::{Integration, IntegrationType, Organization, ResourceId};
pub use settings::AccSettings;
pub use state::{ResourceState, State};
