//! Publishing mock data files to the broker.

use std::fs;
use std::path::Path;
use std::time::Duration;

use linewatch_config::MqttConfig;
use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, QoS};
use tracing::{info, warn};

use crate::consumer::mqtt_options;
use crate::decode::decode_payload;
use crate::error::{IngestError, IngestResult};
use crate::mock::mock_files;

/// Publish every `*.json` file of `dir` as one QoS 1 message to
/// `config.topic` and wait until the broker acknowledged all of them.
/// Returns the number of files sent.
///
/// Files are validated as CFX payloads before anything is sent.
///
/// # Errors
///
/// Returns I/O and decode failures, MQTT client or connection errors, and
/// [`IngestError::PublishTimeout`] when acknowledgements do not arrive in time.
pub async fn publish_dir(
    config: &MqttConfig,
    dir: &Path,
    ack_timeout: Duration,
) -> IngestResult<usize> {
    let mut payloads = Vec::new();
    for path in mock_files(dir)? {
        let bytes =
            fs::read(&path).map_err(|err| IngestError::io("publish.read_file", &path, err))?;
        decode_payload(&bytes)
            .map_err(|err| IngestError::decode("publish.validate", Some(path.clone()), err))?;
        payloads.push((path, bytes));
    }
    let expected = payloads.len();
    if expected == 0 {
        return Ok(0);
    }

    let (client, mut event_loop) = AsyncClient::new(mqtt_options(config), expected);
    for (path, bytes) in payloads {
        client
            .publish(config.topic.as_str(), QoS::AtLeastOnce, false, bytes)
            .await
            .map_err(|source| IngestError::Client {
                operation: "publish.enqueue",
                source,
            })?;
        info!(file = %path.display(), topic = %config.topic, "queued mock file");
    }

    let mut acknowledged = 0;
    let drive = async {
        while acknowledged < expected {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::PubAck(_))) => acknowledged += 1,
                Ok(_) => {}
                Err(source) => {
                    return Err(IngestError::Connection {
                        operation: "publish.poll",
                        source,
                    });
                }
            }
        }
        Ok(())
    };
    let finished = tokio::time::timeout(ack_timeout, drive).await;
    match finished {
        Ok(result) => result?,
        Err(_) => {
            return Err(IngestError::PublishTimeout {
                acknowledged,
                expected,
            });
        }
    }

    info!(count = expected, "published mock data");
    if let Err(err) = disconnect(&client, &mut event_loop, ack_timeout).await {
        warn!(error = %err, "broker disconnect did not complete");
    }
    Ok(expected)
}

/// Queue a DISCONNECT and drive the event loop until it is written.
async fn disconnect(
    client: &AsyncClient,
    event_loop: &mut EventLoop,
    deadline: Duration,
) -> IngestResult<()> {
    client
        .disconnect()
        .await
        .map_err(|source| IngestError::Client {
            operation: "publish.disconnect",
            source,
        })?;
    let flush = async {
        loop {
            match event_loop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                Ok(_) => {}
                Err(source) => {
                    return Err(IngestError::Connection {
                        operation: "publish.disconnect",
                        source,
                    });
                }
            }
        }
    };
    tokio::time::timeout(deadline, flush)
        .await
        .unwrap_or(Err(IngestError::DisconnectTimeout))
}
