//! Acceptance-test driver.
//!
//! A [`TestCase`] is a sequence of [`TestStep`]s. Each step hands its
//! configuration to an [`Apply`] implementation (the declarative engine) and
//! then either expects the apply to fail with a matching error, or runs its
//! [`Check`]s against the resulting state and the remote service.
//!
//! ```rust,no_run
//! use regex::Regex;
//! use snyk_acctest::client::HttpClient;
//! use snyk_acctest::harness::{Check, TerraformCli, TestCase, TestStep};
//! use snyk_acctest::hcl::{NAME_PREFIX, integration_config, rand_string, random_name};
//! use snyk_acctest::settings::AccSettings;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = AccSettings::from_env();
//! settings.pre_check()?;
//!
//! let api = HttpClient::new(settings.client_config())?;
//! let mut terraform = TerraformCli::from_settings(&settings)?;
//! let organization = random_name(NAME_PREFIX);
//!
//! let report = TestCase::new()
//!     .step(
//!         TestStep::new(integration_config(&organization, settings.group_id(), ""))
//!             .expect_error(Regex::new("Wrong credentials for given integration type")?),
//!     )
//!     .step(
//!         TestStep::new(integration_config(&organization, settings.group_id(), &rand_string(20)))
//!             .check(Check::integration_exists("snyk_integration.test", &organization))
//!             .check(Check::resource_attr_set("snyk_integration.test", "id"))
//!             .check(Check::resource_attr("snyk_integration.test", "type", "gitlab")),
//!     )
//!     .run(&mut terraform, &api)
//!     .await?;
//!
//! assert_eq!(report.verified_integrations().count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod terraform;

pub use terraform::TerraformCli;

use crate::client::SnykApi;
use crate::error::{AccError, AccResult};
use crate::resource::Integration;
use crate::state::State;
use crate::verify;
use log::{debug, info, warn};
use regex::Regex;
use std::future::Future;

/// Errors raised by the declarative engine.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// The engine ran and reported failure
    #[error("{command} failed (exit code {code:?}): {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The engine did not finish in time
    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    /// The engine binary could not be started
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Diagnostics reported by an in-process engine
    #[error("{0}")]
    Diagnostics(String),

    #[error("Failed to decode state: {0}")]
    State(#[from] serde_json::Error),

    #[error("Working directory error: {0}")]
    Io(#[from] std::io::Error),
}

/// The declarative engine seam.
///
/// `apply` reconciles the given configuration and returns the resulting
/// state. `destroy` removes everything the engine created so far.
pub trait Apply {
    fn apply(&mut self, config: &str) -> impl Future<Output = Result<State, ApplyError>> + Send;

    fn destroy(&mut self) -> impl Future<Output = Result<(), ApplyError>> + Send;
}

/// An assertion run after a successful apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// The attribute equals a value
    ResourceAttr {
        address: String,
        key: String,
        value: String,
    },
    /// The attribute is present and non-empty
    ResourceAttrSet { address: String, key: String },
    /// The integration exists remotely under the named organization
    IntegrationExists {
        address: String,
        organization_name: String,
    },
}

impl Check {
    pub fn resource_attr(address: &str, key: &str, value: &str) -> Self {
        Check::ResourceAttr {
            address: address.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn resource_attr_set(address: &str, key: &str) -> Self {
        Check::ResourceAttrSet {
            address: address.to_string(),
            key: key.to_string(),
        }
    }

    pub fn integration_exists(address: &str, organization_name: &str) -> Self {
        Check::IntegrationExists {
            address: address.to_string(),
            organization_name: organization_name.to_string(),
        }
    }

    /// Evaluate against the applied state. Remote checks return the
    /// integration they confirmed.
    pub async fn evaluate<A: SnykApi>(
        &self,
        api: &A,
        state: &State,
    ) -> AccResult<Option<Integration>> {
        match self {
            Check::ResourceAttr {
                address,
                key,
                value,
            } => verify::check_resource_attr(state, address, key, value).map(|_| None),
            Check::ResourceAttrSet { address, key } => {
                verify::check_resource_attr_set(state, address, key).map(|_| None)
            }
            Check::IntegrationExists {
                address,
                organization_name,
            } => verify::check_integration_exists(api, state, address, organization_name)
                .await
                .map(Some),
        }
    }
}

/// One apply step.
#[derive(Debug, Clone)]
pub struct TestStep {
    pub config: String,
    pub expect_error: Option<Regex>,
    pub checks: Vec<Check>,
}

impl TestStep {
    pub fn new(config: impl Into<String>) -> Self {
        Self {
            config: config.into(),
            expect_error: None,
            checks: Vec::new(),
        }
    }

    /// Expect the apply to fail with an error matching `pattern`.
    ///
    /// The step then passes only if the apply fails and the rendered error
    /// matches; its checks are skipped.
    ///
    /// # Arguments
    ///
    /// * `pattern` - Regular expression searched for in the apply error
    ///
    /// # Returns
    ///
    /// The step, for further chaining.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use regex::Regex;
    /// use snyk_acctest::harness::TestStep;
    ///
    /// fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let step = TestStep::new("resource \"snyk_organization\" \"test\" {}")
    ///         .expect_error(Regex::new("Wrong credentials for given integration type")?);
    ///     assert!(step.expect_error.is_some());
    ///     assert!(step.checks.is_empty());
    ///     Ok(())
    /// }
    /// ```
    pub fn expect_error(mut self, pattern: Regex) -> Self {
        self.expect_error = Some(pattern);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }
}

/// What a passing step produced.
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// 1-based position in the test case
    pub index: usize,
    /// State after a successful apply
    pub state: Option<State>,
    /// Error text of an expected failure
    pub error: Option<String>,
    /// Integrations confirmed remotely by this step's checks
    pub verified: Vec<Integration>,
}

/// Reports of every step of a passing test case.
#[derive(Debug, Clone, Default)]
pub struct TestReport {
    pub steps: Vec<StepReport>,
}

impl TestReport {
    pub fn verified_integrations(&self) -> impl Iterator<Item = &Integration> {
        self.steps.iter().flat_map(|step| step.verified.iter())
    }

    /// State after the last successful apply.
    pub fn final_state(&self) -> Option<&State> {
        self.steps.iter().rev().find_map(|step| step.state.as_ref())
    }
}

type PreCheck = Box<dyn FnOnce() -> AccResult<()> + Send>;

/// An ordered list of steps sharing one engine working state.
#[derive(Default)]
pub struct TestCase {
    pre_check: Option<PreCheck>,
    steps: Vec<TestStep>,
}

impl TestCase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `check` before the first step; its failure aborts the case.
    pub fn pre_check<F>(mut self, check: F) -> Self
    where
        F: FnOnce() -> AccResult<()> + Send + 'static,
    {
        self.pre_check = Some(Box::new(check));
        self
    }

    pub fn step(mut self, step: TestStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Run every step, then destroy whatever the engine created.
    ///
    /// Destroy runs even when a step fails. The step failure wins over a
    /// destroy failure.
    pub async fn run<P, A>(self, applier: &mut P, api: &A) -> AccResult<TestReport>
    where
        P: Apply,
        A: SnykApi,
    {
        if let Some(pre_check) = self.pre_check {
            pre_check()?;
        }

        let outcome = run_steps(&self.steps, applier, api).await;
        let destroyed = applier.destroy().await;

        match (outcome, destroyed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(destroy_error)) => Err(destroy_error.into()),
            (Err(step_error), Err(destroy_error)) => {
                warn!("Destroy after failed test case also failed: {}", destroy_error);
                Err(step_error)
            }
            (Err(step_error), Ok(())) => Err(step_error),
        }
    }
}

async fn run_steps<P, A>(steps: &[TestStep], applier: &mut P, api: &A) -> AccResult<TestReport>
where
    P: Apply,
    A: SnykApi,
{
    let mut report = TestReport::default();
    for (position, step) in steps.iter().enumerate() {
        let index = position + 1;
        debug!("Step {}/{}: applying configuration", index, steps.len());
        report.steps.push(run_step(index, step, applier, api).await?);
        info!("Step {}/{} passed", index, steps.len());
    }
    Ok(report)
}

async fn run_step<P, A>(index: usize, step: &TestStep, applier: &mut P, api: &A) -> AccResult<StepReport>
where
    P: Apply,
    A: SnykApi,
{
    let applied = applier.apply(&step.config).await;

    if let Some(pattern) = &step.expect_error {
        return match applied {
            Ok(_) => Err(AccError::ExpectedErrorNotRaised {
                step: index,
                pattern: pattern.as_str().to_string(),
            }),
            Err(error) => {
                let actual = error.to_string();
                if pattern.is_match(&actual) {
                    debug!("Step {}: got expected error: {}", index, actual);
                    Ok(StepReport {
                        index,
                        error: Some(actual),
                        ..StepReport::default()
                    })
                } else {
                    Err(AccError::UnexpectedError {
                        step: index,
                        pattern: pattern.as_str().to_string(),
                        actual,
                    })
                }
            }
        };
    }

    let state = applied?;
    let mut verified = Vec::new();
    let mut failures = Vec::new();

    // Aggregate semantics: every check runs, all failures are reported.
    for check in &step.checks {
        match check.evaluate(api, &state).await {
            Ok(Some(integration)) => verified.push(integration),
            Ok(None) => {}
            Err(error) => failures.push(error),
        }
    }

    if let Some(error) = AccError::aggregate(failures) {
        return Err(error);
    }

    Ok(StepReport {
        index,
        state: Some(state),
        error: None,
        verified,
    })
}
