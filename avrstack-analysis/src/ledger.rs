//! Path-scoped visit ledger
//!
//! Records `(instruction, successor, height)` for every ledger-checked
//! control transfer on the current path. The ledger is a stack: an entry is
//! visible to every state explored below the node that added it, and is
//! discarded by [`Ledger::truncate`] before a sibling subtree is explored.

use avrstack_isa::Instruction;
use serde::{Deserialize, Serialize};

/// One ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub instruction: Instruction,

    /// Address of the sequential successor; locates the instruction
    pub successor: u32,

    /// Stack height on entry to the instruction
    pub height: i64,
}

/// How a control transfer relates to earlier visits on the same path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Revisit {
    /// No matching entry; record and explore
    Fresh,

    /// Seen at the same height; the cycle is stack-neutral
    Stable,

    /// Seen at a higher height; this path cannot exceed it
    Dominated,

    /// Seen at a lower height on a back-edge; the stack grows without limit
    Growing,
}

impl Revisit {
    /// Check whether exploration of this transfer stops here
    pub fn stops(self) -> bool {
        !matches!(self, Revisit::Fresh)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<VisitRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&mut self, record: VisitRecord) {
        self.records.push(record);
    }

    /// Drop every entry added after the ledger had `len` entries
    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    /// Classify a transfer against the entries for the same instruction.
    ///
    /// `backward` is true when the transfer's target is at or before the
    /// address of the instruction itself.
    pub fn classify(
        &self,
        instruction: &Instruction,
        successor: u32,
        height: i64,
        backward: bool,
    ) -> Revisit {
        let mut lower = false;
        let mut higher = false;

        for record in self
            .records
            .iter()
            .filter(|r| r.successor == successor && r.instruction == *instruction)
        {
            if record.height == height {
                return Revisit::Stable;
            }
            if record.height < height {
                lower = true;
            } else {
                higher = true;
            }
        }

        if lower && backward {
            Revisit::Growing
        } else if higher {
            Revisit::Dominated
        } else {
            Revisit::Fresh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOP: Instruction = Instruction::Rjmp { k: Some(-3) };

    fn ledger_with(heights: &[i64]) -> Ledger {
        let mut ledger = Ledger::new();
        for &height in heights {
            ledger.record(VisitRecord {
                instruction: LOOP,
                successor: 5,
                height,
            });
        }
        ledger
    }

    #[test]
    fn test_fresh_when_empty() {
        assert_eq!(Ledger::new().classify(&LOOP, 5, 0, true), Revisit::Fresh);
    }

    #[test]
    fn test_stable_at_equal_height() {
        let ledger = ledger_with(&[1, 2]);
        assert_eq!(ledger.classify(&LOOP, 5, 2, true), Revisit::Stable);
        assert_eq!(ledger.classify(&LOOP, 5, 2, false), Revisit::Stable);
    }

    #[test]
    fn test_growing_needs_back_edge() {
        let ledger = ledger_with(&[0]);
        assert_eq!(ledger.classify(&LOOP, 5, 1, true), Revisit::Growing);
        // A forward transfer seen lower on the path is explored again
        assert_eq!(ledger.classify(&LOOP, 5, 1, false), Revisit::Fresh);
    }

    #[test]
    fn test_dominated_by_higher_entry() {
        let ledger = ledger_with(&[4]);
        assert_eq!(ledger.classify(&LOOP, 5, 2, true), Revisit::Dominated);
        assert_eq!(ledger.classify(&LOOP, 5, 2, false), Revisit::Dominated);
    }

    #[test]
    fn test_growing_takes_precedence_over_dominated() {
        let ledger = ledger_with(&[0, 4]);
        assert_eq!(ledger.classify(&LOOP, 5, 2, true), Revisit::Growing);
        assert_eq!(ledger.classify(&LOOP, 5, 2, false), Revisit::Dominated);
    }

    #[test]
    fn test_match_requires_same_location_and_instruction() {
        let ledger = ledger_with(&[0]);
        assert_eq!(ledger.classify(&LOOP, 6, 0, true), Revisit::Fresh);
        let other = Instruction::Rjmp { k: Some(-4) };
        assert_eq!(ledger.classify(&other, 5, 0, true), Revisit::Fresh);
    }

    #[test]
    fn test_truncate_restores_snapshot() {
        let mut ledger = ledger_with(&[0]);
        let snapshot = ledger.len();
        ledger.record(VisitRecord {
            instruction: LOOP,
            successor: 5,
            height: 3,
        });
        assert_eq!(ledger.classify(&LOOP, 5, 3, true), Revisit::Stable);
        ledger.truncate(snapshot);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.classify(&LOOP, 5, 3, true), Revisit::Growing);
        assert!(Revisit::Growing.stops());
        assert!(!Revisit::Fresh.stops());
    }
}
