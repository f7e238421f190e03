//! Discrete machine status and the SEMI E58 state code classifier.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::cfx::StateCode;

/// Coarse machine status derived from equipment state codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MachineStatus {
    /// Productive time (1000–1999).
    Running,
    /// Standby (2100).
    Idle,
    /// Engineering time (3000–3999).
    Engineering,
    /// Scheduled or unscheduled downtime (4100–4900, 5000).
    Down,
    /// Not yet observed, or an unclassifiable code.
    #[default]
    Unknown,
}

impl MachineStatus {
    /// Render the status as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Idle => "Idle",
            Self::Engineering => "Engineering",
            Self::Down => "Down",
            Self::Unknown => "Unknown",
        }
    }
}

impl Display for MachineStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Map a numeric equipment state code to a machine status.
///
/// Ranges are inclusive. Anything outside the known bands is `Unknown`.
#[must_use]
pub const fn classify_code(code: i64) -> MachineStatus {
    match code {
        1000..=1999 => MachineStatus::Running,
        2100 => MachineStatus::Idle,
        3000..=3999 => MachineStatus::Engineering,
        4100..=4900 | 5000 => MachineStatus::Down,
        _ => MachineStatus::Unknown,
    }
}

/// Classify a wire state code; values that do not parse as an integer are `Unknown`.
#[must_use]
pub fn classify(state: &StateCode) -> MachineStatus {
    state.as_code().map_or(MachineStatus::Unknown, classify_code)
}
