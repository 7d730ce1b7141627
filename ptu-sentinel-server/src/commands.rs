use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use ptu_sentinel_core::modules::intake::parse_events;
use ptu_sentinel_core::{reconcile, BufferSink, Severity};
use ptu_sentinel_types::{
    AccountLocator, DeploymentEvent, DeploymentSurface, ScanMode, SentinelConfig,
};

use crate::api::events::{process_events, EventOutcome};
use crate::state::{arm_capabilities, AppState};

/// Account named on the `check` command line.
pub struct CheckTarget {
    pub subscription: String,
    pub resource_group: String,
    pub account: String,
    pub deployment: Option<String>,
    pub workspace: bool,
    pub all_accounts: bool,
}

impl CheckTarget {
    fn into_event(self) -> DeploymentEvent {
        let (surface, operation) = if self.workspace {
            (
                DeploymentSurface::MachineLearning,
                "Microsoft.MachineLearningServices/workspaces/onlineEndpoints/deployments/write",
            )
        } else {
            (
                DeploymentSurface::CognitiveServices,
                "Microsoft.CognitiveServices/accounts/deployments/write",
            )
        };
        DeploymentEvent {
            event_id: "cli-check".to_string(),
            event_type: "ManualCheck".to_string(),
            account: AccountLocator {
                subscription_id: self.subscription,
                resource_group: self.resource_group,
                name: self.account,
                surface,
            },
            deployment_name: self.deployment,
            operation_name: operation.to_string(),
            status: "Succeeded".to_string(),
        }
    }
}

pub async fn handle_check(mut config: SentinelConfig, target: CheckTarget, json: bool) -> Result<()> {
    if target.all_accounts {
        config.scan_mode = ScanMode::Subscription;
    }
    let capabilities = arm_capabilities(&config)?;
    let event = target.into_event();
    let sink = BufferSink::new();

    let report = reconcile(&event, &capabilities, &config, &sink)
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", e, e.kind()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_lines(&sink);
    }
    Ok(())
}

pub async fn handle_replay(config: SentinelConfig, file: &Path, json: bool) -> Result<()> {
    let body = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let events = parse_events(&body).map_err(|e| anyhow::anyhow!(e))?;

    let capabilities = arm_capabilities(&config)?;
    let sink = Arc::new(BufferSink::new());
    let state = AppState::new_with_components(config, capabilities, sink.clone());
    let outcomes = process_events(&state, &events).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        print_lines(&sink);
        println!();
        for outcome in &outcomes {
            print_outcome(outcome);
        }
    }

    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} events failed", failed, outcomes.len());
    }
    Ok(())
}

fn print_lines(sink: &BufferSink) {
    for (severity, line) in sink.lines() {
        match severity {
            Severity::Info => println!("{}", line),
            Severity::Warn => println!("{}", line.yellow()),
            Severity::Error => println!("{}", line.red().bold()),
        }
    }
}

fn print_outcome(outcome: &EventOutcome) {
    match outcome {
        EventOutcome::Skipped { event_id, reason } => {
            println!("{} {} skipped: {}", "-".dimmed(), event_id, reason);
        },
        EventOutcome::Reported { event_id, status, partial, .. } => {
            let suffix = if *partial { " (partial)" } else { "" };
            println!("{} {} reported: {}{}", "✓".green(), event_id, status, suffix);
        },
        EventOutcome::Failed { event_id, kind, error } => {
            println!("{} {} failed [{}]: {}", "✗".red(), event_id, kind, error);
        },
    }
}
