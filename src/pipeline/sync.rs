//! Data synchronization checker.
//!
//! Before each step the core peeks (without removing) the head datum of every
//! required, connected input and decides whether the process's own step hook
//! may run. The checker never consumes data and never fails; its output is a
//! [`Verdict`] the lifecycle acts on.

use crate::pipeline::datum::{DatumStatus, EdgeDatum, Stamp};
use crate::pipeline::port::Frequency;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much the core checks incoming data. Each level includes the ones below.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DataCheck {
    /// Never inspect inputs; the step hook is always called.
    None,
    /// Require the heads of all required inputs to carry the same stamp.
    Sync,
    /// Additionally require every head to be ordinary data.
    #[default]
    Valid,
}

impl fmt::Display for DataCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCheck::None => f.write_str("none"),
            DataCheck::Sync => f.write_str("sync"),
            DataCheck::Valid => f.write_str("valid"),
        }
    }
}

/// Aggregate facts about a set of head datums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataInfo {
    /// All present heads carry the same stamp.
    pub in_sync: bool,
    /// Highest-severity status; an empty edge counts as `Empty`.
    pub max_status: DatumStatus,
}

/// Head of one required input, as peeked before a step.
#[derive(Debug, Clone)]
pub struct InputHead {
    pub port: String,
    pub frequency: Frequency,
    /// `None` when the edge is currently empty.
    pub head: Option<EdgeDatum>,
}

impl InputHead {
    fn stamp(&self) -> Option<Stamp> {
        self.head.as_ref().map(|h| h.stamp)
    }

    fn status(&self) -> DatumStatus {
        self.head
            .as_ref()
            .map(EdgeDatum::status)
            .unwrap_or(DatumStatus::Empty)
    }
}

/// What the lifecycle should do with this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Run the step hook.
    Step,
    /// Heads disagree on position: emit an error datum and drain every
    /// required input by its frequency.
    Desync,
    /// Some head is not ordinary data: emit a datum with this status and
    /// drain every required input.
    Propagate(DatumStatus),
}

/// Compute sync and status facts for `heads`.
pub fn data_info(heads: &[InputHead]) -> DataInfo {
    let mut stamps = heads.iter().filter_map(InputHead::stamp);
    let in_sync = match stamps.next() {
        Some(first) => stamps.all(|s| s == first),
        None => true,
    };
    let max_status = heads
        .iter()
        .map(InputHead::status)
        .max()
        .unwrap_or(DatumStatus::Data);
    DataInfo {
        in_sync,
        max_status,
    }
}

/// Decide the step outcome for `level`.
///
/// `check_sync` is false for processes that opted out of synchronization
/// (the `unsync_input` property); validity is still enforced at `Valid`.
pub fn verdict(level: DataCheck, check_sync: bool, heads: &[InputHead]) -> Verdict {
    if level == DataCheck::None || heads.is_empty() {
        return Verdict::Step;
    }
    let info = data_info(heads);
    if check_sync && !info.in_sync {
        return Verdict::Desync;
    }
    if level == DataCheck::Valid && info.max_status != DatumStatus::Data {
        return Verdict::Propagate(info.max_status);
    }
    Verdict::Step
}
