//! Forwarding paths, per-cycle hazard records, stall flags and statistics.

use super::stage::Stage;

/// The five supported forwarding paths, nearest producer first. Priority
/// falls out of the hazard scan: the nearest producer arms the shortest
/// distance, which resolves over the earliest of these paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardPath {
    ExDfToRfEx,
    DfDsToExDf,
    DfDsToRfEx,
    DsWbToExDf,
    DsWbToRfEx,
}

impl ForwardPath {
    pub const ALL: [ForwardPath; 5] = [
        ForwardPath::ExDfToRfEx,
        ForwardPath::DfDsToExDf,
        ForwardPath::DfDsToRfEx,
        ForwardPath::DsWbToExDf,
        ForwardPath::DsWbToRfEx,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            ForwardPath::ExDfToRfEx => "EX/DF -> RF/EX",
            ForwardPath::DfDsToExDf => "DF/DS -> EX/DF",
            ForwardPath::DfDsToRfEx => "DF/DS -> RF/EX",
            ForwardPath::DsWbToExDf => "DS/WB -> EX/DF",
            ForwardPath::DsWbToRfEx => "DS/WB -> RF/EX",
        }
    }

    /// The path that delivers a value from the instruction currently in
    /// `from` to the instruction acting in `to`, if such a path exists.
    pub fn between(from: Stage, to: Stage) -> Option<ForwardPath> {
        match (from, to) {
            (Stage::Df, Stage::Ex) => Some(ForwardPath::ExDfToRfEx),
            (Stage::Ds, Stage::Df) => Some(ForwardPath::DfDsToExDf),
            (Stage::Ds, Stage::Ex) => Some(ForwardPath::DfDsToRfEx),
            (Stage::Wb, Stage::Df) => Some(ForwardPath::DsWbToExDf),
            (Stage::Wb, Stage::Ex) => Some(ForwardPath::DsWbToRfEx),
            _ => None,
        }
    }
}

/// Cumulative stall and forwarding statistics, printed at the end of
/// every trace block. Stall counters increment once when the stall is
/// armed; forwarding counters once per path per cycle.
#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub load_stalls: u64,
    pub branch_stalls: u64,
    pub other_stalls: u64,
    pub forwards: [u64; 5],
}

/// Per-cycle record of hazard activity, reset at the top of every cycle.
/// `detected` lists the (producer, consumer) pairs armed at ID this cycle;
/// `fired` holds the display text for each path that delivered a value.
#[derive(Debug, Default, Clone)]
pub struct Forwarding {
    pub detected: Vec<(String, String)>,
    pub fired: [Option<String>; 5],
}

impl Forwarding {
    pub fn reset(&mut self) {
        self.detected.clear();
        self.fired = Default::default();
    }
}

/// Stall bookkeeping. A RAW stall freezes every stage at or before
/// `stop_stage`; a branch stall is a display/statistics window, armed by
/// any taken control transfer.
#[derive(Debug, Default, Clone)]
pub struct StallState {
    pub raw_stalled: bool,
    pub raw_remaining: u32,
    pub stop_stage: Option<Stage>,
    pub branch_stalled: bool,
    pub branch_remaining: u32,
}

impl StallState {
    pub fn any(&self) -> bool {
        self.raw_stalled || self.branch_stalled
    }

    /// Count a cycle off each active stall; a counter already at zero
    /// clears its flag instead.
    pub fn tick(&mut self) {
        if self.raw_stalled {
            if self.raw_remaining == 0 {
                self.raw_stalled = false;
                self.stop_stage = None;
            } else {
                self.raw_remaining -= 1;
            }
        }
        if self.branch_stalled {
            if self.branch_remaining == 0 {
                self.branch_stalled = false;
            } else {
                self.branch_remaining -= 1;
            }
        }
    }
}
