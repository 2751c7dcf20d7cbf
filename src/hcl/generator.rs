//! Configuration generator for the integration acceptance steps.
//!
//! [`integration_config`] declares one organization and one GitLab
//! integration that references the organization's computed id. It is a pure
//! formatting function: nothing is validated, so an empty token reaches the
//! remote service and is rejected there.

use super::{Document, Expression, ResourceBlock};
use rand::seq::SliceRandom;

pub const ORGANIZATION_RESOURCE: &str = "snyk_organization";
pub const INTEGRATION_RESOURCE: &str = "snyk_integration";

/// Target URL of the GitLab integration under test.
pub const TEST_GITLAB_URL: &str = "https://testing.gitlab.local";

/// Prefix of generated organization names.
pub const NAME_PREFIX: &str = "tf-test-acc";

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Build the organization + integration document.
pub fn integration_document(organization_name: &str, group_id: &str, token: &str) -> Document {
    let organization_id = format!("{}.test.id", ORGANIZATION_RESOURCE);

    Document::new()
        .block(
            ResourceBlock::new(ORGANIZATION_RESOURCE, "test")
                .attribute("name", Expression::literal(organization_name))
                .attribute("group_id", Expression::literal(group_id)),
        )
        .block(
            ResourceBlock::new(INTEGRATION_RESOURCE, "test")
                .attribute("organization_id", Expression::reference(&organization_id))
                .blank_line()
                .attribute("type", Expression::literal("gitlab"))
                .attribute("url", Expression::literal(TEST_GITLAB_URL))
                .attribute("token", Expression::literal(token)),
        )
}

/// Render the organization + integration configuration text.
///
/// ```rust
/// use snyk_acctest::hcl::integration_config;
///
/// let config = integration_config("tf-test-acc_abcdefghij", "grp-123", "");
/// assert!(config.contains("organization_id = snyk_organization.test.id"));
/// assert!(config.contains("token = \"\""));
/// ```
pub fn integration_config(organization_name: &str, group_id: &str, token: &str) -> String {
    integration_document(organization_name, group_id, token).to_string()
}

/// Random lower-case alphabetic string of `len` characters.
pub fn rand_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .filter_map(|_| ALPHA.choose(&mut rng))
        .map(|&byte| byte as char)
        .collect()
}

/// `<prefix>_<10 random characters>`, unique enough for parallel test runs.
pub fn random_name(prefix: &str) -> String {
    format!("{}_{}", prefix, rand_string(10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_expected_configuration() {
        let config = integration_config("tf-test-acc_AbCdEfGhIj", "grp-123", "s3cr3t-token-1234567");

        let expected = concat!(
            "resource \"snyk_organization\" \"test\" {\n",
            "  name     = \"tf-test-acc_AbCdEfGhIj\"\n",
            "  group_id = \"grp-123\"\n",
            "}\n",
            "\n",
            "resource \"snyk_integration\" \"test\" {\n",
            "  organization_id = snyk_organization.test.id\n",
            "\n",
            "  type  = \"gitlab\"\n",
            "  url   = \"https://testing.gitlab.local\"\n",
            "  token = \"s3cr3t-token-1234567\"\n",
            "}\n",
        );
        assert_eq!(config, expected);
    }

    #[test]
    fn test_same_inputs_render_identically() {
        let a = integration_config("tf-test-acc_AbCdEfGhIj", "grp-123", "");
        let b = integration_config("tf-test-acc_AbCdEfGhIj", "grp-123", "");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_token_passes_through() {
        let doc = integration_document("org", "grp-123", "");
        let token = doc
            .resource("snyk_integration.test")
            .and_then(|block| block.get("token"))
            .and_then(Expression::as_literal);
        assert_eq!(token, Some(""));
    }

    #[test]
    fn test_rand_string_alphabet_and_length() {
        let value = rand_string(20);
        assert_eq!(value.len(), 20);
        assert!(value.bytes().all(|b| b.is_ascii_lowercase()));
        assert!(rand_string(0).is_empty());
    }

    #[test]
    fn test_random_name_has_prefix() {
        let name = random_name(NAME_PREFIX);
        assert!(name.starts_with("tf-test-acc_"));
        assert_eq!(name.len(), "tf-test-acc_".len() + 10);
        assert_ne!(random_name(NAME_PREFIX), random_name(NAME_PREFIX));
    }
}
