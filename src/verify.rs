//! State verification against the remote service.
//!
//! [`check_integration_exists`] confirms that an integration recorded in
//! local state also exists remotely. It runs as two lookups, each a pure
//! function over a remote listing:
//!
//! 1. [`resolve_organization`]: find the organization by display name.
//! 2. [`resolve_integration`]: find the recorded id in that organization's
//!    integration list.
//!
//! The first failure ends the check. On success the matched [`Integration`]
//! is returned to the caller as the verification record.

use crate::client::SnykApi;
use crate::error::{AccError, AccResult};
use crate::resource::{Integration, IntegrationList, Organization, ResourceId};
use crate::state::State;
use log::{debug, info};

/// Pick the organization whose name equals `organization_name`.
///
/// `integration_id` only feeds the error message.
pub fn resolve_organization(
    organizations: &[Organization],
    organization_name: &str,
    integration_id: &str,
) -> AccResult<Organization> {
    organizations
        .iter()
        .find(|org| org.name == organization_name)
        .cloned()
        .ok_or_else(|| AccError::OrganizationNotFound {
            organization: organization_name.to_string(),
            integration: integration_id.to_string(),
        })
}

/// Pick the integration whose id equals `integration_id`.
pub fn resolve_integration(
    integrations: &IntegrationList,
    integration_id: &str,
) -> AccResult<Integration> {
    integrations
        .find(integration_id)
        .cloned()
        .ok_or_else(|| AccError::IntegrationNotFound {
            id: integration_id.to_string(),
        })
}

/// Read the recorded id of `resource_address` from state.
///
/// An absent resource and an empty id both count as "not set".
pub fn recorded_id<'a>(state: &'a State, resource_address: &str) -> AccResult<&'a str> {
    state
        .resource(resource_address)
        .and_then(|resource| resource.primary_id())
        .ok_or_else(|| AccError::MissingId {
            resource: resource_address.to_string(),
        })
}

/// Confirm the integration at `resource_address` exists remotely under the
/// organization named `organization_name`.
pub async fn check_integration_exists<A: SnykApi>(
    api: &A,
    state: &State,
    resource_address: &str,
    organization_name: &str,
) -> AccResult<Integration> {
    let integration_id = recorded_id(state, resource_address)?;
    debug!(
        "Verifying {} ({}) under organization '{}'",
        resource_address, integration_id, organization_name
    );

    let organizations = api.list_organizations().await.map_err(AccError::remote)?;
    let organization = resolve_organization(&organizations, organization_name, integration_id)?;

    let integration = find_integration(api, &organization.id, integration_id).await?;

    info!(
        "Verified {} integration '{}' in organization '{}'",
        integration.integration_type, integration.id, organization.name
    );
    Ok(integration)
}

/// Check that `key` on `resource_address` equals `expected`.
pub fn check_resource_attr(
    state: &State,
    resource_address: &str,
    key: &str,
    expected: &str,
) -> AccResult<()> {
    let resource = state
        .resource(resource_address)
        .ok_or_else(|| AccError::NotInState {
            address: resource_address.to_string(),
        })?;

    match resource.attribute(key) {
        Some(actual) if actual == expected => Ok(()),
        actual => Err(AccError::AttributeMismatch {
            resource: resource_address.to_string(),
            key: key.to_string(),
            expected: expected.to_string(),
            actual: actual.unwrap_or_default().to_string(),
        }),
    }
}

/// Check that `key` on `resource_address` is present and non-empty.
pub fn check_resource_attr_set(state: &State, resource_address: &str, key: &str) -> AccResult<()> {
    let resource = state
        .resource(resource_address)
        .ok_or_else(|| AccError::NotInState {
            address: resource_address.to_string(),
        })?;

    match resource.attribute(key) {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(AccError::AttributeNotSet {
            resource: resource_address.to_string(),
            key: key.to_string(),
        }),
    }
}

/// List the integrations of `organization_id` and pick out `integration_id`.
pub async fn find_integration<A: SnykApi>(
    api: &A,
    organization_id: &ResourceId,
    integration_id: &str,
) -> AccResult<Integration> {
    let integrations = api
        .list_integrations(organization_id)
        .await
        .map_err(AccError::remote)?;
    resolve_integration(&integrations, integration_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::IntegrationType;
    use crate::state::ResourceState;

    fn org(id: &str, name: &str) -> Organization {
        Organization::new(ResourceId::new(id).unwrap(), name)
    }

    fn state_with(id: &str) -> State {
        let mut state = State::new();
        state.insert(
            ResourceState::new("snyk_integration", "test")
                .with_id(id)
                .with_attribute("type", "gitlab"),
        );
        state
    }

    #[test]
    fn test_resolve_organization_by_name() {
        let orgs = vec![org("org-1", "other"), org("org-2", "tf-test-acc_abc")];
        let found = resolve_organization(&orgs, "tf-test-acc_abc", "int-1").unwrap();
        assert_eq!(found.id, "org-2");
    }

    #[test]
    fn test_resolve_organization_missing() {
        let orgs = vec![org("org-1", "other")];
        let err = resolve_organization(&orgs, "tf-test-acc_abc", "int-1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "organization (tf-test-acc_abc) for integration (int-1) not found"
        );
    }

    #[test]
    fn test_resolve_organization_is_exact() {
        let orgs = vec![org("org-1", "tf-test-acc_ABC")];
        assert!(resolve_organization(&orgs, "tf-test-acc_abc", "int-1").is_err());
    }

    #[test]
    fn test_resolve_integration_by_id() {
        let list = IntegrationList::from_pairs([
            (IntegrationType::GitHub, ResourceId::new("int-0").unwrap()),
            (IntegrationType::GitLab, ResourceId::new("int-1").unwrap()),
        ]);

        let found = resolve_integration(&list, "int-1").unwrap();
        assert_eq!(found.integration_type, IntegrationType::GitLab);

        let err = resolve_integration(&list, "int-9").unwrap_err();
        assert_eq!(err.to_string(), "integration (int-9) not found");
    }

    #[test]
    fn test_recorded_id_absent_or_empty() {
        let empty = State::new();
        assert!(matches!(
            recorded_id(&empty, "snyk_integration.test"),
            Err(AccError::MissingId { .. })
        ));

        let blank = state_with("");
        assert!(matches!(
            recorded_id(&blank, "snyk_integration.test"),
            Err(AccError::MissingId { .. })
        ));

        let set = state_with("int-1");
        assert_eq!(recorded_id(&set, "snyk_integration.test").unwrap(), "int-1");
    }

    #[test]
    fn test_attribute_checks() {
        let state = state_with("int-1");

        assert!(check_resource_attr(&state, "snyk_integration.test", "type", "gitlab").is_ok());
        assert!(check_resource_attr_set(&state, "snyk_integration.test", "id").is_ok());

        let err = check_resource_attr(&state, "snyk_integration.test", "type", "github").unwrap_err();
        assert!(matches!(err, AccError::AttributeMismatch { ref actual, .. } if actual == "gitlab"));

        let err = check_resource_attr(&state, "snyk_integration.test", "url", "x").unwrap_err();
        assert!(matches!(err, AccError::AttributeMismatch { ref actual, .. } if actual.is_empty()));

        let err = check_resource_attr_set(&state, "snyk_integration.test", "url").unwrap_err();
        assert!(matches!(err, AccError::AttributeNotSet { .. }));

        let err = check_resource_attr_set(&state, "snyk_integration.other", "id").unwrap_err();
        assert!(matches!(err, AccError::NotInState { .. }));
    }
}
