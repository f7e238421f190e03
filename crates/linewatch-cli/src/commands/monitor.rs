//! Client-side monitoring: pull the server's raw CFX batch and derive line
//! state locally, the way a dashboard does.

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use linewatch_api::LineSummary;
use linewatch_config::{ConfigError, LineConfig, MachineConfig, Topology, load_topology};
use linewatch_core::{BatchSource, MachineEntry, MonitorSession, SourceError};
use linewatch_events::{Alert, CfxMessage};
use reqwest::{Client, Url};
use serde::Serialize;

use crate::cli::{MonitorArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_line_views;

/// Derived state of one line as rendered by `monitor`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct LineView {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) machines: Vec<MachineEntry>,
    pub(crate) alerts: Vec<Alert>,
    pub(crate) events: usize,
}

/// [`BatchSource`] backed by the server's `/api/cfx-data` endpoint.
pub(crate) struct RemoteBatchSource {
    client: Client,
    url: Url,
}

impl RemoteBatchSource {
    pub(crate) fn new(ctx: &AppContext) -> CliResult<Self> {
        Ok(Self {
            client: ctx.client.clone(),
            url: ctx.endpoint("/api/cfx-data")?,
        })
    }
}

#[async_trait]
impl BatchSource for RemoteBatchSource {
    async fn fetch(&self) -> Result<Vec<CfxMessage>, SourceError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| SourceError::failed("cfx_data.request", err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable {
                operation: "cfx_data.status",
                detail: format!("server answered with status {status}"),
            });
        }
        response
            .json::<Vec<CfxMessage>>()
            .await
            .map_err(|err| SourceError::invalid_payload("cfx_data.decode", err))
    }
}

/// Local session fed from a [`BatchSource`].
pub(crate) struct LocalMonitor<S> {
    session: MonitorSession,
    source: S,
    line: Option<String>,
}

impl<S: BatchSource> LocalMonitor<S> {
    pub(crate) fn new(topology: Topology, source: S, line: Option<String>) -> CliResult<Self> {
        if let Some(line) = &line
            && !topology.lines.iter().any(|candidate| &candidate.id == line)
        {
            return Err(CliError::validation(format!(
                "line '{line}' is not in the topology"
            )));
        }
        for collision in &topology.collisions {
            eprintln!(
                "warning: machine '{}' is configured on '{}' and '{}'; routing to '{}'",
                collision.machine,
                collision.previous_line,
                collision.winning_line,
                collision.winning_line
            );
        }
        let mut session = MonitorSession::default();
        session.apply_topology(topology.lines);
        Ok(Self {
            session,
            source,
            line,
        })
    }

    /// Fetch the current batch, dispatch it and return the selected lines.
    pub(crate) async fn poll(&mut self) -> CliResult<Vec<LineView>> {
        let batch = self.source.fetch().await.map_err(|err| {
            CliError::failure(anyhow::Error::new(err).context("failed to fetch the CFX batch"))
        })?;
        self.session.dispatch(&batch);
        Ok(self.views())
    }

    fn views(&self) -> Vec<LineView> {
        self.session
            .lines()
            .iter()
            .filter(|line| self.line.as_ref().is_none_or(|selected| *selected == line.id))
            .map(|line| LineView {
                id: line.id.clone(),
                name: line.name.clone(),
                machines: self.session.machine_states(&line.id).unwrap_or_default(),
                alerts: self.session.alerts(&line.id).unwrap_or_default(),
                events: self.session.events(&line.id).map_or(0, |events| events.len()),
            })
            .collect()
    }
}

pub(crate) async fn handle_monitor(
    ctx: &AppContext,
    args: MonitorArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let topology = match &args.topology {
        Some(path) => load_topology(path).map_err(topology_error)?,
        None => remote_topology(ctx).await?,
    };
    let mut monitor = LocalMonitor::new(topology, RemoteBatchSource::new(ctx)?, args.line)?;

    loop {
        let views = monitor.poll().await?;
        render_line_views(&views, output)?;
        let Some(secs) = args.watch else {
            return Ok(());
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            () = tokio::time::sleep(Duration::from_secs(secs.max(1))) => println!(),
        }
    }
}

async fn remote_topology(ctx: &AppContext) -> CliResult<Topology> {
    let url = ctx.endpoint("/api/lines")?;
    let summaries = ctx.get_json::<Vec<LineSummary>>(url).await?;
    let lines = summaries
        .into_iter()
        .map(|summary| LineConfig {
            id: summary.id,
            name: summary.name,
            machines: summary.machines.into_iter().map(MachineConfig::named).collect(),
            connections: Vec::new(),
        })
        .collect();
    Topology::new(lines).map_err(topology_error)
}

fn topology_error(err: ConfigError) -> CliError {
    match err {
        ConfigError::InvalidTopology {
            line,
            field,
            reason,
        } => CliError::validation(format!(
            "invalid topology: line '{line}' field '{field}' ({reason})"
        )),
        ConfigError::Parse { .. } => CliError::validation(format!(
            "{:#}",
            anyhow::Error::new(err).context("topology file is not valid JSON")
        )),
        other => CliError::failure(anyhow!(other).context("failed to load topology")),
    }
}
