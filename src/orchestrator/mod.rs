//! Batch release across the flavors of one configuration.
//!
//! A batch runs in two phases. [`BatchOrchestrator::plan`] resolves every
//! flavor locally, so configuration problems stop the batch before any network
//! call. [`BatchOrchestrator::execute`] then publishes the ready flavors one at
//! a time, in configuration order.

mod confirm;
mod plan;
mod template;

pub use confirm::{AutoConfirm, Confirm, StdinConfirm, is_affirmative};
pub use plan::{
    FlavorPlan, SkipReason, confirmation_prompt, plan_flavor, resolve_countries, resolve_locales,
    resolve_path, resolve_release_notes,
};
pub use template::{render_package_name, render_template};

use crate::config::Configuration;
use crate::error::{ConfigError, ReleaseError, Result};
use crate::metadata::MetadataReader;
use crate::play::PlayService;
use crate::transaction::{PublishReceipt, Transactor};

/// What happened to one flavor
#[derive(Debug, Clone)]
pub enum FlavorOutcome {
    /// Edit committed
    Published {
        /// Flavor id
        flavor: String,
        /// Commit details
        receipt: PublishReceipt,
    },
    /// Not attempted
    Skipped {
        /// Flavor id
        flavor: String,
        /// Why
        reason: SkipReason,
    },
    /// Transaction failed and the batch continued
    Failed {
        /// Flavor id
        flavor: String,
        /// Rendered failure
        error: String,
    },
}

impl FlavorOutcome {
    /// Flavor id
    pub fn flavor(&self) -> &str {
        match self {
            FlavorOutcome::Published { flavor, .. }
            | FlavorOutcome::Skipped { flavor, .. }
            | FlavorOutcome::Failed { flavor, .. } => flavor,
        }
    }
}

/// Per-flavor outcomes of a completed batch, in configuration order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    outcomes: Vec<FlavorOutcome>,
}

impl BatchReport {
    /// All outcomes
    pub fn outcomes(&self) -> &[FlavorOutcome] {
        &self.outcomes
    }

    /// Number of committed flavors
    pub fn published(&self) -> usize {
        self.count(|o| matches!(o, FlavorOutcome::Published { .. }))
    }

    /// Number of skipped flavors
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FlavorOutcome::Skipped { .. }))
    }

    /// Number of failed flavors
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FlavorOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&FlavorOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

/// Drives a [`Transactor`] over every flavor of a configuration
pub struct BatchOrchestrator<'c, C> {
    config: &'c Configuration,
    confirm: C,
}

impl<'c, C: Confirm> BatchOrchestrator<'c, C> {
    /// Create an orchestrator; `confirm` is consulted unless the configuration is unattended
    pub fn new(config: &'c Configuration, confirm: C) -> Self {
        Self { config, confirm }
    }

    /// Resolve every flavor without touching the network
    pub fn plan(&self) -> std::result::Result<Vec<FlavorPlan>, ConfigError> {
        log::info!("Base folder is: [{}]", self.config.base_folder().display());
        self.config
            .flavors
            .iter()
            .map(|flavor| plan_flavor(self.config, flavor))
            .collect()
    }

    /// Plan and execute the batch
    pub async fn run<S, M>(&self, transactor: &Transactor<S, M>) -> Result<BatchReport>
    where
        S: PlayService,
        M: MetadataReader,
    {
        let plans = self.plan()?;
        self.execute(plans, transactor).await
    }

    /// Publish planned flavors in order.
    ///
    /// With `abortOnError` the first failed transaction ends the batch with
    /// [`ReleaseError::BatchAborted`]; otherwise failures are recorded and the
    /// next flavor runs.
    pub async fn execute<S, M>(
        &self,
        plans: Vec<FlavorPlan>,
        transactor: &Transactor<S, M>,
    ) -> Result<BatchReport>
    where
        S: PlayService,
        M: MetadataReader,
    {
        let mut report = BatchReport::default();

        for (position, plan) in plans.into_iter().enumerate() {
            let (flavor, request) = match plan {
                FlavorPlan::Skipped { flavor, reason } => {
                    log::warn!("Skipped [{}]: {}", flavor, reason);
                    report.outcomes.push(FlavorOutcome::Skipped { flavor, reason });
                    continue;
                }
                FlavorPlan::Ready { flavor, request } => (flavor, request),
            };

            if !self.config.unattended && !self.confirm.confirm(&confirmation_prompt(&request)) {
                log::info!("Skipped [{}]", flavor);
                report.outcomes.push(FlavorOutcome::Skipped {
                    flavor,
                    reason: SkipReason::Declined,
                });
                continue;
            }

            match transactor.publish(request).await {
                Ok(receipt) => {
                    log::info!(
                        "Published [{}] as version code {}",
                        flavor,
                        receipt.version_code
                    );
                    report.outcomes.push(FlavorOutcome::Published { flavor, receipt });
                }
                Err(error) if self.config.abort_on_error => {
                    log::error!("Aborting batch at [{}]: {}", flavor, error);
                    return Err(ReleaseError::BatchAborted {
                        flavor,
                        index: position + 1,
                        source: error,
                    });
                }
                Err(error) => {
                    log::error!("Failed [{}]: {}", flavor, error);
                    report.outcomes.push(FlavorOutcome::Failed {
                        flavor,
                        error: error.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Batch finished: {} published, {} skipped, {} failed",
            report.published(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }
}
