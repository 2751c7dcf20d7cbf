//! [`Apply`] implementation driving the `terraform` binary.
//!
//! Each instance owns a temporary working directory. `apply` writes the
//! configuration to `main.tf`, initializes the directory on first use, runs
//! `terraform apply -auto-approve` and reads the resulting state back with
//! `terraform show -json`. Dropping the instance removes the directory.
//!
//! The generated configuration only holds resource blocks. Before `init`, a
//! `terraform.tf` declaring the provider's registry source is written next to
//! it so the `snyk_*` resource types resolve to the provider under test:
//!
//! ```text
//! terraform {
//!   required_providers {
//!     snyk = {
//!       source = "pavel-snyk/snyk"
//!     }
//!   }
//! }
//! ```

use super::{Apply, ApplyError};
use crate::settings::{AccSettings, DEFAULT_PROVIDER_SOURCE};
use crate::state::State;
use log::{debug, trace};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;
use tokio::time::timeout;

const CONFIG_FILE: &str = "main.tf";
const PROVIDERS_FILE: &str = "terraform.tf";

/// Declarative engine backed by the `terraform` CLI.
#[derive(Debug)]
pub struct TerraformCli {
    binary: PathBuf,
    work_dir: TempDir,
    env: Vec<(String, String)>,
    timeout: Duration,
    provider_source: String,
    initialized: bool,
}

impl TerraformCli {
    /// Create an engine using `binary` and a fresh working directory.
    pub fn new(binary: impl Into<PathBuf>) -> Result<Self, ApplyError> {
        let work_dir = tempfile::Builder::new()
            .prefix("snyk-acctest-")
            .tempdir()?;

        Ok(Self {
            binary: binary.into(),
            work_dir,
            env: vec![("TF_IN_AUTOMATION".to_string(), "1".to_string())],
            timeout: Duration::from_secs(600),
            provider_source: DEFAULT_PROVIDER_SOURCE.to_string(),
            initialized: false,
        })
    }

    /// Create an engine configured from the acceptance settings, passing the
    /// provider its token and endpoint.
    pub fn from_settings(settings: &AccSettings) -> Result<Self, ApplyError> {
        let mut cli = Self::new(settings.terraform_path.clone())?
            .with_provider_source(settings.provider_source.clone());
        cli.env.extend(settings.provider_env());
        Ok(cli)
    }

    /// Registry source the `snyk` provider is installed from, e.g.
    /// `pavel-snyk/snyk`.
    pub fn with_provider_source(mut self, source: impl Into<String>) -> Self {
        self.provider_source = source.into();
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn working_dir(&self) -> &Path {
        self.work_dir.path()
    }

    async fn run(&self, args: &[&str]) -> Result<String, ApplyError> {
        let command = format!("terraform {}", args.join(" "));
        debug!("Running {} in {}", command, self.work_dir.path().display());

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(self.work_dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| ApplyError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                return Err(ApplyError::Timeout {
                    command,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.trim().is_empty() {
            trace!("{}: {}", command, stderr.trim());
        }

        if !output.status.success() {
            return Err(ApplyError::Failed {
                command,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

impl Apply for TerraformCli {
    async fn apply(&mut self, config: &str) -> Result<State, ApplyError> {
        tokio::fs::write(self.work_dir.path().join(CONFIG_FILE), config).await?;

        if !self.initialized {
            tokio::fs::write(
                self.work_dir.path().join(PROVIDERS_FILE),
                provider_requirements(&self.provider_source),
            )
            .await?;
            self.run(&["init", "-input=false", "-no-color"]).await?;
            self.initialized = true;
        }

        self.run(&["apply", "-auto-approve", "-input=false", "-no-color"])
            .await?;
        let json = self.run(&["show", "-json", "-no-color"]).await?;
        Ok(State::from_show_json(&json)?)
    }

    async fn destroy(&mut self) -> Result<(), ApplyError> {
        // Nothing can exist before the first init.
        if !self.initialized {
            return Ok(());
        }
        self.run(&["destroy", "-auto-approve", "-input=false", "-no-color"])
            .await?;
        Ok(())
    }
}

fn provider_requirements(source: &str) -> String {
    format!(
        concat!(
            "terraform {{\n",
            "  required_providers {{\n",
            "    snyk = {{\n",
            "      source = \"{}\"\n",
            "    }}\n",
            "  }}\n",
            "}}\n",
        ),
        source
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_a_spawn_error() {
        let mut cli = TerraformCli::new("/nonexistent/terraform-binary").unwrap();
        let err = cli.apply("").await.unwrap_err();
        assert!(matches!(err, ApplyError::Spawn { .. }));
        assert!(err.to_string().starts_with("Failed to run terraform init"));
    }

    #[tokio::test]
    async fn test_destroy_before_init_is_a_no_op() {
        let mut cli = TerraformCli::new("/nonexistent/terraform-binary").unwrap();
        assert!(cli.destroy().await.is_ok());
    }

    #[test]
    fn test_from_settings_forwards_provider_env() {
        let settings = AccSettings {
            token: Some("token".to_string()),
            provider_source: "registry.example.com/acme/snyk".to_string(),
            ..AccSettings::default()
        };
        let cli = TerraformCli::from_settings(&settings).unwrap();
        assert_eq!(cli.provider_source, "registry.example.com/acme/snyk");
        assert!(
            cli.env
                .contains(&("SNYK_TOKEN".to_string(), "token".to_string()))
        );
        assert!(cli.working_dir().exists());
    }

    #[cfg(unix)]
    mod with_fake_binary {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        const SCRIPT: &str = r#"#!/bin/sh
case "$1" in
  init)
    grep -q 'source = "pavel-snyk/snyk"' terraform.tf || exit 1
    echo "Terraform has been successfully initialized!"
    ;;
  apply)
    if grep -q 'token = ""' main.tf; then
      echo "Error: Wrong credentials for given integration type" >&2
      exit 1
    fi
    ;;
  show)
    echo '{"format_version":"1.0","values":{"root_module":{"resources":[{"address":"snyk_integration.test","type":"snyk_integration","name":"test","values":{"id":"int-1","type":"gitlab"}}]}}}'
    ;;
  destroy) ;;
  *) exit 2 ;;
esac
"#;

        fn fake_terraform() -> (TempDir, PathBuf) {
            script(SCRIPT)
        }

        fn script(body: &str) -> (TempDir, PathBuf) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("terraform");
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            (dir, path)
        }

        #[tokio::test]
        async fn test_apply_reads_state_back() {
            let (_dir, binary) = fake_terraform();
            let mut cli = TerraformCli::new(binary).unwrap();

            let config = crate::hcl::integration_config("org", "grp-123", "abcdefghijklmnopqrst");
            let state = cli.apply(&config).await.unwrap();

            let integration = state.resource("snyk_integration.test").unwrap();
            assert_eq!(integration.primary_id(), Some("int-1"));
            assert_eq!(integration.attribute("type"), Some("gitlab"));

            let written = std::fs::read_to_string(cli.working_dir().join("main.tf")).unwrap();
            assert_eq!(written, config);

            let providers =
                std::fs::read_to_string(cli.working_dir().join("terraform.tf")).unwrap();
            assert_eq!(
                providers,
                "terraform {\n  required_providers {\n    snyk = {\n      source = \"pavel-snyk/snyk\"\n    }\n  }\n}\n"
            );
            assert!(cli.destroy().await.is_ok());
        }

        #[tokio::test]
        async fn test_failed_apply_carries_stderr() {
            let (_dir, binary) = fake_terraform();
            let mut cli = TerraformCli::new(binary).unwrap();

            let config = crate::hcl::integration_config("org", "grp-123", "");
            let err = cli.apply(&config).await.unwrap_err();

            match &err {
                ApplyError::Failed { code, stderr, .. } => {
                    assert_eq!(*code, Some(1));
                    assert_eq!(stderr, "Error: Wrong credentials for given integration type");
                }
                other => panic!("Expected Failed, got {:?}", other),
            }
            assert!(
                err.to_string()
                    .contains("Wrong credentials for given integration type")
            );
        }

        #[tokio::test]
        async fn test_init_fails_without_matching_provider_source() {
            let (_dir, binary) = fake_terraform();
            let mut cli = TerraformCli::new(binary)
                .unwrap()
                .with_provider_source("hashicorp/snyk");

            let err = cli
                .apply(&crate::hcl::integration_config("org", "grp-123", "token"))
                .await
                .unwrap_err();
            assert!(err.to_string().starts_with("terraform init"));
        }

        #[tokio::test]
        async fn test_slow_command_times_out() {
            let (_dir, binary) = script("#!/bin/sh\nsleep 5\n");
            let mut cli = TerraformCli::new(binary)
                .unwrap()
                .with_timeout(Duration::from_millis(100));

            let err = cli.apply("").await.unwrap_err();
            assert!(matches!(err, ApplyError::Timeout { seconds: 0, .. }));
        }
    }
}
