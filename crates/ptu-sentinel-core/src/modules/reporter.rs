//! Report rendering. Output is deterministic for a given report; the only
//! side effect is writing lines to the supplied sink.

use ptu_sentinel_types::{CoverageStatus, ReconciliationReport};

use crate::modules::comparator::format_utilization;
use crate::traits::{LogSink, Severity};

pub const REPORT_HEADER: &str = "PTU capacity vs reservations report";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub severity: Severity,
    pub text: String,
}

impl ReportLine {
    fn info(text: impl Into<String>) -> Self {
        Self { severity: Severity::Info, text: text.into() }
    }

    fn warn(text: impl Into<String>) -> Self {
        Self { severity: Severity::Warn, text: text.into() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { severity: Severity::Error, text: text.into() }
    }
}

pub fn render(report: &ReconciliationReport) -> Vec<ReportLine> {
    let mut lines = vec![ReportLine::info(REPORT_HEADER)];

    if !report.accounts_scanned.is_empty() {
        lines.push(ReportLine::info(format!(
            "Accounts scanned: {}",
            report.accounts_scanned.join(", ")
        )));
    }

    lines.push(ReportLine::info("Deployments:"));
    if report.deployments.is_empty() {
        lines.push(ReportLine::info("  (none)"));
    }
    for d in &report.deployments {
        let suffix = if d.billing_mode.is_provisioned() {
            String::new()
        } else {
            format!(" [{}]", d.billing_mode)
        };
        lines.push(ReportLine::info(format!(
            "  {}/{}: {} units ({}){}",
            d.account, d.name, d.capacity, d.model_name, suffix
        )));
    }

    lines.push(ReportLine::info("Reservations:"));
    if report.reservations.is_empty() {
        lines.push(ReportLine::info("  (none)"));
    }
    for r in &report.reservations {
        lines.push(ReportLine::info(format!("  {}: {} units", r.name, r.quantity)));
    }

    lines.push(summary_line(report));
    if let Some(line) = triggering_line(report) {
        lines.push(line);
    }

    for annotation in &report.annotations {
        lines.push(ReportLine::warn(format!("Note: {}", annotation)));
    }
    lines
}

fn summary_line(report: &ReconciliationReport) -> ReportLine {
    let totals = format!(
        "deployed {} units, reserved {} units",
        report.deployed_units, report.reserved_units
    );
    let utilization = report
        .utilization_percent
        .map(|p| format!(", utilization {}", format_utilization(p)))
        .unwrap_or_default();

    match report.status {
        CoverageStatus::NoReservations => ReportLine::warn(format!(
            "Summary: {}, {}; all {} deployed units billed hourly",
            report.status, totals, report.deployed_units
        )),
        CoverageStatus::UnderUtilized { surplus } => ReportLine::info(format!(
            "Summary: {}, {}, surplus {} units{}",
            report.status, totals, surplus, utilization
        )),
        CoverageStatus::FullyCovered => ReportLine::info(format!(
            "Summary: {}, {}, surplus 0 units{}",
            report.status, totals, utilization
        )),
        CoverageStatus::OverAllocated { deficit } => ReportLine::error(format!(
            "Summary: {}, {}, deficit {} units billed hourly{}",
            report.status, totals, deficit, utilization
        )),
    }
}

fn triggering_line(report: &ReconciliationReport) -> Option<ReportLine> {
    let name = report.triggering_deployment.as_deref()?;
    let units = report.triggering_capacity;
    match report.status {
        CoverageStatus::UnderUtilized { .. } | CoverageStatus::FullyCovered => Some(
            ReportLine::info(format!("New deployment '{}' ({} units) is covered", name, units)),
        ),
        CoverageStatus::OverAllocated { .. } if units > 0 => Some(ReportLine::error(format!(
            "New deployment '{}' ({} units) may be partially or fully billed hourly",
            name, units
        ))),
        _ => None,
    }
}

/// Write the rendered report to `sink`.
pub fn emit_report(report: &ReconciliationReport, sink: &dyn LogSink) {
    for line in render(report) {
        sink.emit(line.severity, &line.text);
    }
}

pub fn render_text(report: &ReconciliationReport) -> String {
    render(report).into_iter().map(|l| l.text).collect::<Vec<_>>().join("\n")
}
