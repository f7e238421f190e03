use std::time::Duration;

use anyhow::anyhow;
use linewatch_config::{MqttConfig, parse_broker_url};
use linewatch_ingest::{IngestError, publish_dir};

use crate::cli::PublishArgs;
use crate::client::{CliError, CliResult};

pub(crate) async fn handle_publish(args: PublishArgs) -> CliResult<()> {
    let config = publish_config(&args)?;
    let count = publish_dir(
        &config,
        &args.dir,
        Duration::from_secs(args.ack_timeout_secs),
    )
    .await
    .map_err(publish_error)?;

    if count == 0 {
        println!("no *.json files found in {}", args.dir.display());
    } else {
        println!("published {count} file(s) to '{}'", config.topic);
    }
    Ok(())
}

fn publish_config(args: &PublishArgs) -> CliResult<MqttConfig> {
    let broker = parse_broker_url("--broker", &args.broker)
        .map_err(|_| CliError::validation(format!("invalid broker URL '{}'", args.broker)))?;
    let topic = args.topic.trim();
    if topic.is_empty() || topic.contains(['#', '+']) {
        return Err(CliError::validation(
            "publish topic must be non-empty and must not contain wildcards",
        ));
    }
    Ok(MqttConfig {
        broker,
        topic: topic.to_string(),
        client_id: args.client_id.clone(),
    })
}

fn publish_error(err: IngestError) -> CliError {
    match err {
        IngestError::Decode {
            path: Some(path), ..
        } => CliError::validation(format!("{} is not a CFX payload", path.display())),
        other => CliError::failure(anyhow!(other).context("publishing mock data failed")),
    }
}
