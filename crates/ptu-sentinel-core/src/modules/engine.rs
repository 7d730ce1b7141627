//! Reconciliation entry point.
//!
//! ```text
//! DeploymentEvent ──► resolve accounts ──┬─► scan_accounts ─────┐
//!                                        └─► read_reservations ─┴─► compare ─► report ─► sink
//! ```
//!
//! Account discovery and both reads share one deadline. Nothing survives
//! between passes.

use std::sync::Arc;
use std::time::Duration;

use ptu_sentinel_types::{
    AccountLocator, Annotation, DeploymentEvent, ReconciliationReport, ScanMode, SentinelConfig,
};
use tokio::time::Instant;

use crate::error::{AppError, AppResult};
use crate::modules::comparator::compare;
use crate::modules::reporter::emit_report;
use crate::modules::reservations::{read_reservations, ReservationRead};
use crate::modules::scanner::{provisioned_total, scan_accounts};
use crate::traits::{AccountDiscovery, DeploymentLister, LogSink, ReservationLister};

/// Read capabilities the engine is allowed to use.
#[derive(Clone)]
pub struct Capabilities {
    pub deployments: Arc<dyn DeploymentLister>,
    pub reservations: Arc<dyn ReservationLister>,
    /// Required only for [`ScanMode::Subscription`]
    pub discovery: Option<Arc<dyn AccountDiscovery>>,
}

impl Capabilities {
    pub fn new(
        deployments: Arc<dyn DeploymentLister>,
        reservations: Arc<dyn ReservationLister>,
    ) -> Self {
        Self { deployments, reservations, discovery: None }
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn AccountDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }
}

/// Run one reconciliation pass for a validated event.
///
/// Returns an error only when no account's deployments could be read or
/// subscription mode has no discovery capability. Discovery, reservation and
/// per-account failures become report annotations.
pub async fn reconcile(
    event: &DeploymentEvent,
    capabilities: &Capabilities,
    config: &SentinelConfig,
    sink: &dyn LogSink,
) -> AppResult<ReconciliationReport> {
    tracing::info!(
        event_id = %event.event_id,
        account = %event.account,
        deployment = event.deployment_name.as_deref().unwrap_or("-"),
        "Starting PTU reconciliation"
    );

    let deadline = Instant::now() + Duration::from_secs(config.timeout_secs);
    let resolved = resolve_accounts(event, capabilities, config, deadline).await?;
    let scope = config.reservation_scope.resolve(&event.account.subscription_id);

    let (scans, reservations) = tokio::join!(
        scan_accounts(
            Arc::clone(&capabilities.deployments),
            &resolved.accounts,
            config.max_parallel_scans,
            deadline,
        ),
        tokio::time::timeout_at(
            deadline,
            read_reservations(
                capabilities.reservations.as_ref(),
                &scope,
                &config.reservation_sku_filter,
            ),
        ),
    );

    let reservations = reservations.unwrap_or_else(|_| {
        tracing::warn!(scope = %scope, "Reservation read timed out");
        ReservationRead::degraded(Annotation::ReservationsTimedOut)
    });

    if scans.completed.is_empty() {
        if let Some((account, error)) = scans.failed.first() {
            tracing::error!(
                event_id = %event.event_id,
                account = %account,
                scope = %scope,
                kind = error.kind(),
                "No deployments could be read: {}",
                error
            );
            return Err(AppError::Scan(error.clone()));
        }
    }

    let mut annotations: Vec<Annotation> = resolved.annotation.into_iter().collect();
    annotations.extend(scans.failed.iter().map(|(account, error)| Annotation::AccountSkipped {
        account: account.to_string(),
        kind: error.kind().to_string(),
        message: error.to_string(),
    }));
    if !scans.omitted.is_empty() {
        annotations.push(Annotation::Partial {
            omitted: scans.omitted.iter().map(ToString::to_string).collect(),
        });
    }
    annotations.extend(reservations.annotation.clone());

    let accounts_scanned: Vec<String> =
        scans.completed.iter().map(|(account, _)| account.name.clone()).collect();
    let deployments: Vec<_> =
        scans.completed.into_iter().flat_map(|(_, records)| records).collect();

    let deployed_units = provisioned_total(&deployments);
    let reserved_units = reservations.total();
    let comparison = compare(deployed_units, reserved_units);

    let triggering_capacity = event
        .deployment_name
        .as_deref()
        .and_then(|name| {
            deployments.iter().find(|d| d.account == event.account.name && d.name == name)
        })
        .map(|d| d.provisioned_capacity())
        .unwrap_or(0);

    let report = ReconciliationReport {
        event_id: Some(event.event_id.clone()),
        triggering_deployment: event.deployment_name.clone(),
        triggering_capacity,
        accounts_scanned,
        deployments,
        reservations: reservations.records,
        deployed_units,
        reserved_units,
        utilization_percent: comparison.utilization_percent,
        status: comparison.status,
        annotations,
        generated_at: chrono::Utc::now(),
    };

    tracing::info!(
        event_id = %event.event_id,
        status = %report.status,
        deployed = report.deployed_units,
        reserved = report.reserved_units,
        partial = report.is_partial(),
        "PTU reconciliation complete"
    );
    emit_report(&report, sink);
    Ok(report)
}

/// Accounts chosen for one pass, plus a note when discovery fell back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAccounts {
    pub accounts: Vec<AccountLocator>,
    pub annotation: Option<Annotation>,
}

impl ResolvedAccounts {
    fn only(accounts: Vec<AccountLocator>) -> Self {
        Self { accounts, annotation: None }
    }

    fn triggering(event: &DeploymentEvent, annotation: Annotation) -> Self {
        Self { accounts: vec![event.account.clone()], annotation: Some(annotation) }
    }
}

/// Accounts to scan for this event under the configured scan mode.
///
/// Discovery runs under the pass deadline. When it fails or times out the
/// pass continues with the triggering account alone.
pub async fn resolve_accounts(
    event: &DeploymentEvent,
    capabilities: &Capabilities,
    config: &SentinelConfig,
    deadline: Instant,
) -> AppResult<ResolvedAccounts> {
    match &config.scan_mode {
        ScanMode::TriggeringAccount => Ok(ResolvedAccounts::only(vec![event.account.clone()])),
        ScanMode::Explicit { accounts } => Ok(ResolvedAccounts::only(accounts.clone())),
        ScanMode::Subscription => {
            let discovery = capabilities.discovery.as_ref().ok_or_else(|| {
                AppError::Config("subscription scan mode requires account discovery".to_string())
            })?;
            let subscription = &event.account.subscription_id;
            let discovered =
                tokio::time::timeout_at(deadline, discovery.list_accounts(subscription)).await;

            let mut accounts = match discovered {
                Ok(Ok(accounts)) => accounts,
                Ok(Err(e)) => {
                    tracing::warn!(
                        subscription = %subscription,
                        kind = e.kind(),
                        "Account discovery failed, scanning triggering account only: {}",
                        e
                    );
                    return Ok(ResolvedAccounts::triggering(
                        event,
                        Annotation::AccountDiscoveryFailed {
                            kind: e.kind().to_string(),
                            message: e.to_string(),
                        },
                    ));
                },
                Err(_) => {
                    tracing::warn!(
                        subscription = %subscription,
                        "Account discovery timed out, scanning triggering account only"
                    );
                    return Ok(ResolvedAccounts::triggering(
                        event,
                        Annotation::AccountDiscoveryTimedOut,
                    ));
                },
            };

            // Keep the triggering account first even if discovery cannot see its surface.
            accounts.retain(|a| a != &event.account);
            accounts.insert(0, event.account.clone());
            tracing::info!(
                subscription = %subscription,
                accounts = accounts.len(),
                "Resolved accounts for subscription scan"
            );
            Ok(ResolvedAccounts::only(accounts))
        },
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
