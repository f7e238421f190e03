//! Output renderers and formatting helpers for CLI commands.

use std::collections::BTreeMap;

use anyhow::anyhow;
use linewatch_api::LineSummary;
use linewatch_core::{MachineEntry, ReloadOutcome};
use linewatch_events::{Alert, AlertKind, CfxMessage};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};
use crate::commands::monitor::LineView;

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_lines(lines: &[LineSummary], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(lines)?,
        OutputFormat::Table => {
            println!("{:<16} {:<24} MACHINES", "ID", "NAME");
            for line in lines {
                println!("{:<16} {:<24} {}", line.id, line.name, line.machines.join(", "));
            }
        }
    }
    Ok(())
}

pub(crate) fn render_machines(
    machines: &BTreeMap<String, MachineEntry>,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(machines)?,
        OutputFormat::Table => print_machine_rows(machines.values()),
    }
    Ok(())
}

fn print_machine_rows<'a>(entries: impl IntoIterator<Item = &'a MachineEntry>) {
    println!("{:<20} {:<12} {:>6}", "MACHINE", "STATUS", "EFF");
    for entry in entries {
        println!(
            "{:<20} {:<12} {:>5.1}%",
            entry.name,
            entry.status.as_str(),
            entry.efficiency
        );
    }
}

pub(crate) fn render_events(events: &[CfxMessage], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(events)?,
        OutputFormat::Table => {
            println!("{:<24} {:<36} {:<16} MESSAGE", "TIMESTAMP", "ID", "SOURCE");
            for event in events {
                println!(
                    "{:<24} {:<36} {:<16} {}",
                    event.time_stamp, event.unique_id, event.source, event.message_name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_alerts(alerts: &[Alert], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(alerts)?,
        OutputFormat::Table => print_alert_rows(alerts),
    }
    Ok(())
}

fn print_alert_rows(alerts: &[Alert]) {
    if alerts.is_empty() {
        println!("no alerts");
        return;
    }
    for alert in alerts {
        println!(
            "{:<10} {:<8} {}",
            alert.time,
            alert_kind_to_str(alert.kind),
            alert.message
        );
    }
}

pub(crate) fn render_reload(outcome: &ReloadOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(outcome)?,
        OutputFormat::Table => match outcome {
            ReloadOutcome::Applied(report) => println!(
                "applied: {} duplicates: {} unroutable: {} alerts: {}",
                report.applied, report.duplicates, report.unroutable, report.alerts_raised
            ),
            ReloadOutcome::Stale => {
                println!("batch discarded: the session changed while it was fetched");
            }
        },
    }
    Ok(())
}

pub(crate) fn render_line_views(views: &[LineView], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(views)?,
        OutputFormat::Table => {
            for (index, view) in views.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                println!("{} ({}) events: {}", view.name, view.id, view.events);
                print_machine_rows(&view.machines);
                print_alert_rows(&view.alerts);
            }
        }
    }
    Ok(())
}

#[must_use]
pub(crate) const fn alert_kind_to_str(kind: AlertKind) -> &'static str {
    match kind {
        AlertKind::Error => "error",
        AlertKind::Warning => "warning",
        AlertKind::Info => "info",
        AlertKind::Success => "success",
    }
}
