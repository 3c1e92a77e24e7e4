//! Publishing every flavor of a batch configuration.

use crate::cli::{Args, RuntimeConfig};
use crate::config::Configuration;
use crate::error::Result;
use crate::orchestrator::{BatchOrchestrator, FlavorOutcome, FlavorPlan, StdinConfirm};

use super::helpers::{connect, print_request};

/// Execute a batch publish
pub(super) async fn execute_batch(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let configuration = Configuration::load(&args.file)?;

    config.section("Configuration");
    for line in configuration.summary() {
        config.indent(&line);
    }

    let orchestrator = BatchOrchestrator::new(&configuration, StdinConfirm);
    let plans = orchestrator.plan()?;
    config.info_println(&format!(
        "Flavors: {}",
        plans.iter().map(FlavorPlan::flavor).collect::<Vec<_>>().join(", ")
    ));

    if args.dry_run {
        config.section("Dry run");
        for plan in &plans {
            match plan {
                FlavorPlan::Ready { flavor, request } => {
                    config.println(&format!("{}:", flavor));
                    print_request(config, request);
                }
                FlavorPlan::Skipped { flavor, reason } => {
                    config.warning_println(&format!("{}: skipped, {}", flavor, reason));
                }
            }
        }
        config.success_println("Nothing was published");
        return Ok(0);
    }

    let transactor = connect(&args.key)?;
    let report = orchestrator.execute(plans, &transactor).await?;

    config.section("Summary");
    for outcome in report.outcomes() {
        match outcome {
            FlavorOutcome::Published { flavor, receipt } => config.success_println(&format!(
                "{}: {} version code {}",
                flavor, receipt.package_identifier, receipt.version_code
            )),
            FlavorOutcome::Skipped { flavor, reason } => {
                config.warning_println(&format!("{}: skipped, {}", flavor, reason))
            }
            FlavorOutcome::Failed { flavor, error } => {
                config.error_println(&format!("{}: {}", flavor, error))
            }
        }
    }
    config.println(&format!(
        "{} published, {} skipped, {} failed",
        report.published(),
        report.skipped(),
        report.failed()
    ));

    Ok(0)
}
