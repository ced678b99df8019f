//! Analysis report

use crate::bound::StackBound;
use serde::{Deserialize, Serialize};

/// Exploration counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// `(pc, height)` states entered
    pub states_explored: u64,

    /// Deepest ledger seen on any path
    pub max_ledger_len: usize,

    /// Deepest work-stack seen
    pub max_work_stack: usize,

    /// Edges skipped because their target could not be resolved
    pub unresolved_edges: u64,
}

/// Result of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub bound: StackBound,

    /// Word address where the bound was first reached
    pub peak_pc: u32,

    pub stats: AnalysisStats,
}

impl AnalysisReport {
    pub fn is_bounded(&self) -> bool {
        !self.bound.is_unbounded()
    }
}
