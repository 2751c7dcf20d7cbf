//! Shared fixtures for integration tests.

use snyk_acctest::client::InMemorySnyk;
use snyk_acctest::resource::{Integration, IntegrationCredentials, IntegrationType, Organization};
use std::sync::Once;

static LOGGING: Once = Once::new();

/// Install `env_logger` once per test binary; honours `RUST_LOG`.
pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A remote holding one organization with a GitLab integration, plus an
/// unrelated organization with its own integration.
pub async fn seeded_remote(organization_name: &str) -> (InMemorySnyk, Organization, Integration) {
    let remote = InMemorySnyk::new();

    let other = remote
        .create_organization("unrelated-org", Some("grp-999"))
        .await
        .expect("seed unrelated organization");
    remote
        .create_integration(
            &other.id,
            IntegrationType::GitHub,
            IntegrationCredentials::new("https://github.com", "other-token"),
        )
        .await
        .expect("seed unrelated integration");

    let organization = remote
        .create_organization(organization_name, Some("grp-123"))
        .await
        .expect("seed organization");
    let integration = remote
        .create_integration(
            &organization.id,
            IntegrationType::GitLab,
            IntegrationCredentials::new("https://testing.gitlab.local", "abcdefghijklmnopqrst"),
        )
        .await
        .expect("seed integration");

    (remote, organization, integration)
}
