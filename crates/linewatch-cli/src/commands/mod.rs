//! Command handlers grouped by concern.

pub(crate) mod lines;
pub(crate) mod monitor;
pub(crate) mod publish;
pub(crate) mod reload;
