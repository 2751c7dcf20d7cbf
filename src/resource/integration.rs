//! Integrations: connectors to source-control hosts and registries scoped
//! under an organization.
//!
//! The remote service lists an organization's integrations as a JSON object
//! mapping type tag to integration id, e.g.
//! `{"gitlab": "9a3e5d90-b782-468a-a042-9a2073736f0b"}`. [`IntegrationList`]
//! decodes that mapping into typed [`Integration`] records.

use super::{ResourceId, ValidationError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Integration type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntegrationType {
    GitHub,
    GitHubEnterprise,
    GitLab,
    BitbucketCloud,
    BitbucketServer,
    AzureRepos,
    DockerHub,
    Ecr,
    Acr,
    Gcr,
    ArtifactoryCr,
    HarborCr,
    QuayCr,
    NexusCr,
    GitHubCr,
    GitLabCr,
    DigitalOceanCr,
    /// A tag this crate does not know about, kept verbatim
    Other(String),
}

impl IntegrationType {
    pub fn as_str(&self) -> &str {
        match self {
            IntegrationType::GitHub => "github",
            IntegrationType::GitHubEnterprise => "github-enterprise",
            IntegrationType::GitLab => "gitlab",
            IntegrationType::BitbucketCloud => "bitbucket-cloud",
            IntegrationType::BitbucketServer => "bitbucket-server",
            IntegrationType::AzureRepos => "azure-repos",
            IntegrationType::DockerHub => "docker-hub",
            IntegrationType::Ecr => "ecr",
            IntegrationType::Acr => "acr",
            IntegrationType::Gcr => "gcr",
            IntegrationType::ArtifactoryCr => "artifactory-cr",
            IntegrationType::HarborCr => "harbor-cr",
            IntegrationType::QuayCr => "quay-cr",
            IntegrationType::NexusCr => "nexus-cr",
            IntegrationType::GitHubCr => "github-cr",
            IntegrationType::GitLabCr => "gitlab-cr",
            IntegrationType::DigitalOceanCr => "digitalocean-cr",
            IntegrationType::Other(tag) => tag,
        }
    }

    /// Whether the integration connects a container registry rather than a
    /// source-control host.
    pub fn is_container_registry(&self) -> bool {
        matches!(
            self,
            IntegrationType::DockerHub
                | IntegrationType::Ecr
                | IntegrationType::Acr
                | IntegrationType::Gcr
                | IntegrationType::ArtifactoryCr
                | IntegrationType::HarborCr
                | IntegrationType::QuayCr
                | IntegrationType::NexusCr
                | IntegrationType::GitHubCr
                | IntegrationType::GitLabCr
                | IntegrationType::DigitalOceanCr
        )
    }
}

impl FromStr for IntegrationType {
    type Err = ValidationError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let parsed = match tag {
            "" => return Err(ValidationError::EmptyIntegrationType),
            "github" => IntegrationType::GitHub,
            "github-enterprise" => IntegrationType::GitHubEnterprise,
            "gitlab" => IntegrationType::GitLab,
            "bitbucket-cloud" => IntegrationType::BitbucketCloud,
            "bitbucket-server" => IntegrationType::BitbucketServer,
            "azure-repos" => IntegrationType::AzureRepos,
            "docker-hub" => IntegrationType::DockerHub,
            "ecr" => IntegrationType::Ecr,
            "acr" => IntegrationType::Acr,
            "gcr" => IntegrationType::Gcr,
            "artifactory-cr" => IntegrationType::ArtifactoryCr,
            "harbor-cr" => IntegrationType::HarborCr,
            "quay-cr" => IntegrationType::QuayCr,
            "nexus-cr" => IntegrationType::NexusCr,
            "github-cr" => IntegrationType::GitHubCr,
            "gitlab-cr" => IntegrationType::GitLabCr,
            "digitalocean-cr" => IntegrationType::DigitalOceanCr,
            other => IntegrationType::Other(other.to_string()),
        };
        Ok(parsed)
    }
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IntegrationType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IntegrationType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// A remote-confirmed integration: its id and type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub integration_type: IntegrationType,
}

impl Integration {
    pub fn new(id: ResourceId, integration_type: IntegrationType) -> Self {
        Self {
            id,
            integration_type,
        }
    }
}

/// Credentials sent when an integration is created.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationCredentials {
    pub url: String,
    pub token: String,
}

impl IntegrationCredentials {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }
}

// The token stays out of logs and panic messages.
impl fmt::Debug for IntegrationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationCredentials")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// An organization's integrations, ordered by type tag.
///
/// The remote mapping is keyed by type, so each type appears at most once.
/// Ids are expected to be unique across entries but that is the remote
/// service's guarantee, not something checked here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationList {
    entries: Vec<Integration>,
}

impl IntegrationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from `(type, id)` pairs. A later pair with the same type
    /// replaces an earlier one.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (IntegrationType, ResourceId)>,
    {
        let map: BTreeMap<IntegrationType, ResourceId> = pairs.into_iter().collect();
        Self {
            entries: map
                .into_iter()
                .map(|(integration_type, id)| Integration::new(id, integration_type))
                .collect(),
        }
    }

    /// Find the entry whose id equals `id`.
    pub fn find(&self, id: &str) -> Option<&Integration> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Find the entry for a given type tag.
    pub fn by_type(&self, integration_type: &IntegrationType) -> Option<&Integration> {
        self.entries
            .iter()
            .find(|entry| &entry.integration_type == integration_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Integration> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for IntegrationList {
    type Item = Integration;
    type IntoIter = std::vec::IntoIter<Integration>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for IntegrationList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let map: BTreeMap<&str, &ResourceId> = self
            .entries
            .iter()
            .map(|entry| (entry.integration_type.as_str(), &entry.id))
            .collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for IntegrationList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<IntegrationType, ResourceId>::deserialize(deserializer)?;
        Ok(Self::from_pairs(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_tags_round_through_from_str() {
        for tag in ["github", "gitlab", "bitbucket-server", "azure-repos", "quay-cr"] {
            let parsed: IntegrationType = tag.parse().unwrap();
            assert_eq!(parsed.as_str(), tag);
        }
        assert!("".parse::<IntegrationType>().is_err());
    }

    #[test]
    fn test_unknown_tag_is_kept() {
        let parsed: IntegrationType = "jira".parse().unwrap();
        assert_eq!(parsed, IntegrationType::Other("jira".to_string()));
        assert_eq!(parsed.to_string(), "jira");
        assert!(!parsed.is_container_registry());
        assert!(IntegrationType::Ecr.is_container_registry());
    }

    #[test]
    fn test_decodes_type_to_id_mapping() {
        let list: IntegrationList = serde_json::from_value(json!({
            "gitlab": "9a3e5d90-b782-468a-a042-9a2073736f0b",
            "github": "3b2f6a34-0b0a-4d1e-8f3a-1f1f1f1f1f1f",
            "new-scm": "c0ffee00-0000-0000-0000-000000000000"
        }))
        .unwrap();

        assert_eq!(list.len(), 3);
        let gitlab = list.find("9a3e5d90-b782-468a-a042-9a2073736f0b").unwrap();
        assert_eq!(gitlab.integration_type, IntegrationType::GitLab);
        assert_eq!(
            list.by_type(&IntegrationType::Other("new-scm".to_string()))
                .unwrap()
                .id,
            "c0ffee00-0000-0000-0000-000000000000"
        );
        assert!(list.find("missing").is_none());
    }

    #[test]
    fn test_serializes_back_to_mapping() {
        let list = IntegrationList::from_pairs([(
            IntegrationType::GitLab,
            ResourceId::new("int-1").unwrap(),
        )]);
        assert_eq!(serde_json::to_value(&list).unwrap(), json!({"gitlab": "int-1"}));
    }

    #[test]
    fn test_credentials_debug_hides_token() {
        let creds = IntegrationCredentials::new("https://testing.gitlab.local", "s3cr3t");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("https://testing.gitlab.local"));
        assert!(!debug.contains("s3cr3t"));
    }
}
