//! Batch dispatch: dedup gate, routing, history, classification, alerts.

use linewatch_events::{Alert, CfxBody, CfxMessage, MachineStatus, classify};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::session::MonitorSession;

/// A machine whose status changed while dispatching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusChange {
    /// Line owning the machine.
    pub line_id: String,
    /// Machine name.
    pub machine: String,
    /// Status before the message.
    pub previous: MachineStatus,
    /// Status after the message.
    pub status: MachineStatus,
    /// Message that caused the change.
    pub unique_id: String,
}

/// An alert appended while dispatching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineAlert {
    /// Line whose feed received the alert.
    pub line_id: String,
    /// The appended alert.
    pub alert: Alert,
}

/// Counts and changes produced by one dispatch pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchReport {
    /// Messages routed and recorded.
    pub applied: usize,
    /// Messages skipped as already seen.
    pub duplicates: usize,
    /// Messages whose source matched no machine.
    pub unroutable: usize,
    /// Status writes to existing machine entries.
    pub status_updates: usize,
    /// Alerts appended.
    pub alerts_raised: usize,
    /// Status writes that changed the value, in processing order.
    pub status_changes: Vec<StatusChange>,
    /// Appended alerts, in processing order.
    pub alerts: Vec<LineAlert>,
}

impl MonitorSession {
    /// Process a batch in array order.
    ///
    /// Per message: skip if its id was already seen; skip if its source is
    /// not routable; otherwise record it in the line's history, apply the
    /// kind-specific update, and mark the id seen. Unroutable messages are not
    /// marked seen, so they apply once their machine appears in the topology.
    pub fn dispatch(&mut self, batch: &[CfxMessage]) -> DispatchReport {
        let mut report = DispatchReport::default();
        for message in batch {
            if self.dedup.seen(&message.unique_id) {
                report.duplicates += 1;
                continue;
            }
            let Some(line_id) = self.directory.get(&message.source).map(str::to_string) else {
                debug!(
                    unique_id = %message.unique_id,
                    source = %message.source,
                    "dropping message from unknown machine"
                );
                report.unroutable += 1;
                continue;
            };

            self.history.append(&line_id, message.clone());
            match message.body() {
                CfxBody::StationStateChanged { new_state } => {
                    let status = classify(&new_state);
                    if let Some(previous) =
                        self.statuses
                            .update_status(&line_id, &message.source, status)
                    {
                        report.status_updates += 1;
                        if previous != status {
                            report.status_changes.push(StatusChange {
                                line_id: line_id.clone(),
                                machine: message.source.clone(),
                                previous,
                                status,
                                unique_id: message.unique_id.clone(),
                            });
                        }
                    }
                }
                CfxBody::FaultOccurred { fault_code } => {
                    let alert = Alert::fault(message, &fault_code);
                    if self.alerts.append(&line_id, alert.clone()) {
                        report.alerts_raised += 1;
                        report.alerts.push(LineAlert {
                            line_id: line_id.clone(),
                            alert,
                        });
                    }
                }
                CfxBody::Unrecognized => {}
            }
            self.dedup.mark_seen(&message.unique_id);
            report.applied += 1;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linewatch_config::{LineConfig, MachineConfig};
    use linewatch_events::{AlertKind, FAULT_OCCURRED, STATION_STATE_CHANGED};
    use serde_json::{Value, json};

    fn line(id: &str, machines: &[&str]) -> LineConfig {
        LineConfig {
            id: id.to_string(),
            name: id.to_string(),
            machines: machines.iter().map(|name| MachineConfig::named(*name)).collect(),
            connections: Vec::new(),
        }
    }

    fn message(name: &str, id: &str, source: &str, body: Value) -> CfxMessage {
        CfxMessage {
            message_name: name.to_string(),
            version: None,
            time_stamp: "2024-01-15T14:23:15Z".to_string(),
            unique_id: id.to_string(),
            source: source.to_string(),
            target: None,
            request_id: None,
            message_body: body,
        }
    }

    fn state(id: &str, source: &str, code: &str) -> CfxMessage {
        message(STATION_STATE_CHANGED, id, source, json!({ "NewState": code }))
    }

    fn fault(id: &str, source: &str, code: &str) -> CfxMessage {
        message(
            FAULT_OCCURRED,
            id,
            source,
            json!({ "Fault": { "FaultCode": code } }),
        )
    }

    fn session(lines: Vec<LineConfig>) -> MonitorSession {
        let mut session = MonitorSession::default();
        session.apply_topology(lines);
        session
    }

    fn status_of(session: &MonitorSession, line_id: &str, machine: &str) -> Option<MachineStatus> {
        session
            .machine_states(line_id)?
            .into_iter()
            .find(|entry| entry.name == machine)
            .map(|entry| entry.status)
    }

    #[test]
    fn state_change_updates_status_and_history() {
        let mut session = session(vec![line("line-A", &["SPI"])]);
        let report = session.dispatch(&[state("u1", "SPI", "1200")]);

        assert_eq!(status_of(&session, "line-A", "SPI"), Some(MachineStatus::Running));
        let events = session.events("line-A").expect("known line");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].unique_id, "u1");
        assert!(session.alerts("line-A").expect("known line").is_empty());
        assert_eq!(report.applied, 1);
        assert_eq!(report.status_updates, 1);
        assert_eq!(
            report.status_changes,
            vec![StatusChange {
                line_id: "line-A".into(),
                machine: "SPI".into(),
                previous: MachineStatus::Unknown,
                status: MachineStatus::Running,
                unique_id: "u1".into(),
            }]
        );
    }

    #[test]
    fn fault_raises_error_alert() {
        let mut session = session(vec![line("line-A", &["Reflow"])]);
        let mut fault = fault("u2", "Reflow", "E201");
        fault.time_stamp = "2024-01-15T14:24:00Z".to_string();
        let report = session.dispatch(&[fault]);

        let alerts = session.alerts("line-A").expect("known line");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "u2");
        assert_eq!(alerts[0].kind, AlertKind::Error);
        assert_eq!(alerts[0].message, "Fault on Reflow: E201");
        assert_eq!(alerts[0].time, "14:24:00");
        assert_eq!(report.alerts_raised, 1);
        assert_eq!(status_of(&session, "line-A", "Reflow"), Some(MachineStatus::Unknown));
    }

    #[test]
    fn dispatching_twice_is_a_no_op() {
        let mut session = session(vec![line("a", &["SPI", "Reflow"])]);
        let batch = [
            state("u1", "SPI", "1200"),
            fault("u2", "Reflow", "E201"),
            message("CFX.Production.WorkStarted", "u3", "SPI", json!({})),
        ];
        session.dispatch(&batch);
        let events = session.events("a");
        let alerts = session.alerts("a");
        let states = session.machine_states("a");

        let second = session.dispatch(&batch);
        assert_eq!(second.duplicates, 3);
        assert_eq!(second.applied, 0);
        assert_eq!(session.events("a"), events);
        assert_eq!(session.alerts("a"), alerts);
        assert_eq!(session.machine_states("a"), states);
    }

    #[test]
    fn unroutable_messages_touch_nothing() {
        let mut session = session(vec![line("a", &["SPI"]), line("b", &["AOI"])]);
        let report = session.dispatch(&[state("u1", "Oven", "1200"), fault("u2", "Oven", "E1")]);
        assert_eq!(report.unroutable, 2);
        assert_eq!(report.applied, 0);
        for line_id in ["a", "b"] {
            assert!(session.events(line_id).expect("known").is_empty());
            assert!(session.alerts(line_id).expect("known").is_empty());
        }
        assert_eq!(session.processed(), 0);
    }

    #[test]
    fn unrecognized_kinds_are_history_only() {
        let mut session = session(vec![line("a", &["SPI"])]);
        let report = session.dispatch(&[
            message("CFX.Production.UnitsProcessed", "u1", "SPI", json!({})),
            message(STATION_STATE_CHANGED, "u2", "SPI", json!({})),
            message(FAULT_OCCURRED, "u3", "SPI", json!({ "Fault": {} })),
        ]);
        assert_eq!(report.applied, 3);
        assert_eq!(report.status_updates, 0);
        assert_eq!(report.alerts_raised, 0);
        assert_eq!(session.events("a").map(|events| events.len()), Some(3));
        assert_eq!(session.processed(), 3);
    }

    #[test]
    fn unparseable_state_resolves_to_unknown() {
        let mut session = session(vec![line("a", &["SPI"])]);
        session.dispatch(&[state("u1", "SPI", "1200")]);
        let report = session.dispatch(&[state("u2", "SPI", "abc")]);
        assert_eq!(status_of(&session, "a", "SPI"), Some(MachineStatus::Unknown));
        assert_eq!(report.status_changes[0].previous, MachineStatus::Running);
    }

    #[test]
    fn batch_order_is_processing_order() {
        let mut session = session(vec![line("a", &["SPI"])]);
        let report = session.dispatch(&[
            state("u1", "SPI", "1200"),
            state("u2", "SPI", "4100"),
            state("u1", "SPI", "2100"),
        ]);
        assert_eq!(status_of(&session, "a", "SPI"), Some(MachineStatus::Down));
        assert_eq!(report.duplicates, 1);
        let ids: Vec<_> = session
            .events("a")
            .unwrap_or_default()
            .into_iter()
            .map(|event| event.unique_id)
            .collect();
        assert_eq!(ids, vec!["u2", "u1"]);
    }

    #[test]
    fn history_is_capped_per_line() {
        let mut session = session(vec![line("a", &["SPI"])]);
        let batch: Vec<_> = (1..=101)
            .map(|index| message("CFX.Heartbeat", &format!("u{index}"), "SPI", json!({})))
            .collect();
        session.dispatch(&batch);
        let events = session.events("a").unwrap_or_default();
        assert_eq!(events.len(), 100);
        assert_eq!(events[0].unique_id, "u101");
        assert_eq!(events[99].unique_id, "u2");
    }

    #[test]
    fn reset_clears_everything_and_allows_replay() {
        let mut session = session(vec![line("a", &["SPI"])]);
        let batch = [state("u1", "SPI", "3000"), fault("u2", "SPI", "E9")];
        session.dispatch(&batch);
        session.reset();

        assert!(session.events("a").unwrap_or_default().is_empty());
        assert!(session.alerts("a").unwrap_or_default().is_empty());
        assert_eq!(status_of(&session, "a", "SPI"), Some(MachineStatus::Unknown));
        assert_eq!(session.processed(), 0);

        let replay = session.dispatch(&batch);
        assert_eq!(replay.applied, 2);
        assert_eq!(status_of(&session, "a", "SPI"), Some(MachineStatus::Engineering));
    }

    #[test]
    fn colliding_names_route_to_later_line() {
        let mut session = session(vec![line("a", &["SPI"]), line("b", &["SPI"])]);
        assert_eq!(session.collisions().len(), 1);
        session.dispatch(&[state("u1", "SPI", "5000")]);
        assert_eq!(status_of(&session, "a", "SPI"), Some(MachineStatus::Unknown));
        assert_eq!(status_of(&session, "b", "SPI"), Some(MachineStatus::Down));
        assert!(session.events("a").unwrap_or_default().is_empty());
    }
}
