use std::collections::BTreeMap;

use linewatch_api::LineSummary;
use linewatch_core::MachineEntry;
use linewatch_events::{Alert, CfxMessage};

use crate::cli::{EventsArgs, LineArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_alerts, render_events, render_lines, render_machines};

pub(crate) async fn handle_lines(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let url = ctx.endpoint("/api/lines")?;
    let lines = ctx.get_json::<Vec<LineSummary>>(url).await?;
    render_lines(&lines, output)
}

pub(crate) async fn handle_machines(
    ctx: &AppContext,
    args: LineArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let url = line_endpoint(ctx, &args.line, "machines")?;
    let machines = ctx.get_json::<BTreeMap<String, MachineEntry>>(url).await?;
    render_machines(&machines, output)
}

pub(crate) async fn handle_events(
    ctx: &AppContext,
    args: EventsArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let mut url = line_endpoint(ctx, &args.line, "events")?;
    if let Some(limit) = args.limit {
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
    }
    let events = ctx.get_json::<Vec<CfxMessage>>(url).await?;
    render_events(&events, output)
}

pub(crate) async fn handle_alerts(
    ctx: &AppContext,
    args: LineArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let url = line_endpoint(ctx, &args.line, "alerts")?;
    let alerts = ctx.get_json::<Vec<Alert>>(url).await?;
    render_alerts(&alerts, output)
}

fn line_endpoint(ctx: &AppContext, line: &str, view: &str) -> CliResult<reqwest::Url> {
    let mut url = ctx.endpoint("/api/lines")?;
    url.path_segments_mut()
        .map_err(|()| CliError::validation("API URL cannot be a base"))?
        .push(line)
        .push(view);
    Ok(url)
}
