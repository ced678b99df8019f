//! Control-flow traverser
//!
//! Depth-first exploration of `(pc, height)` states over an
//! [`InstructionStream`]. Native recursion is replaced by a work-stack of
//! frames; each frame remembers the ledger length at the time it was
//! scheduled so that ledger entries never leak into sibling subtrees.

use avrstack_decoder::InstructionStream;
use avrstack_isa::{Effect, Instruction};
use tracing::{debug, trace, warn};

use crate::bound::StackBound;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::ledger::{Ledger, Revisit, VisitRecord};
use crate::report::{AnalysisReport, AnalysisStats};

/// Pending exploration state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    pc: u32,
    height: i64,
    ledger_len: usize,
}

/// Single-use traverser for one analysis run
pub struct Traverser<'a, S: InstructionStream + ?Sized> {
    stream: &'a S,

    config: AnalysisConfig,

    ledger: Ledger,

    work: Vec<Frame>,

    bound: StackBound,

    peak_pc: u32,

    stats: AnalysisStats,
}

impl<'a, S: InstructionStream + ?Sized> Traverser<'a, S> {
    pub fn new(stream: &'a S, config: AnalysisConfig) -> Self {
        Self {
            stream,
            config,
            ledger: Ledger::new(),
            work: Vec::new(),
            bound: StackBound::default(),
            peak_pc: config.entry_point,
            stats: AnalysisStats::default(),
        }
    }

    /// Explore every path from the entry point
    pub fn run(mut self) -> Result<AnalysisReport> {
        self.config.validate()?;

        debug!(
            entry = self.config.entry_point,
            words = self.stream.len_words(),
            call_cost = self.config.call_cost(),
            "starting stack analysis"
        );

        self.schedule(self.config.entry_point, 0);

        while let Some(frame) = self.work.pop() {
            if self.bound.is_unbounded() {
                debug!(pending = self.work.len() + 1, "result unbounded; stopping early");
                break;
            }
            self.ledger.truncate(frame.ledger_len);
            self.step(frame.pc, frame.height)?;
        }

        debug!(
            bound = %self.bound,
            peak_pc = self.peak_pc,
            states = self.stats.states_explored,
            "stack analysis finished"
        );

        Ok(AnalysisReport {
            bound: self.bound,
            peak_pc: self.peak_pc,
            stats: self.stats,
        })
    }

    fn schedule(&mut self, pc: u32, height: i64) {
        self.work.push(Frame {
            pc,
            height,
            ledger_len: self.ledger.len(),
        });
        self.stats.max_work_stack = self.stats.max_work_stack.max(self.work.len());
    }

    fn step(&mut self, pc: u32, height: i64) -> Result<()> {
        self.stats.states_explored += 1;
        if self.bound.raise(height) {
            self.peak_pc = pc;
        }

        if pc >= self.stream.len_words() {
            trace!(pc, height, "path left the image");
            return Ok(());
        }

        let instr = self.decode(pc)?;
        let next = pc + instr.width();
        let effect = instr.effect();
        trace!(pc, height, %instr, "visit");

        // Successors are scheduled in reverse so the target is explored first
        match effect {
            Effect::Branch(_) => match self.resolve(pc, effect, next) {
                None => self.schedule(next, height),
                Some(target) => {
                    if self.already_visited(&instr, pc, next, height, target <= pc) {
                        return Ok(());
                    }
                    self.record(instr, next, height);
                    self.schedule(next, height);
                    self.schedule(target, height);
                }
            },

            // The skipped successor is one word on, even past a two-word follower
            Effect::Skip => {
                self.schedule(next + 1, height);
                self.schedule(next, height);
            }

            Effect::RelativeJump(_) | Effect::AbsoluteJump(_) => {
                let Some(target) = self.resolve(pc, effect, next) else {
                    return Ok(());
                };
                if self.already_visited(&instr, pc, next, height, target <= pc) {
                    return Ok(());
                }
                self.record(instr, next, height);
                self.schedule(target, height);
            }

            Effect::RelativeCall(_) | Effect::AbsoluteCall(_) => {
                match self.resolve(pc, effect, next) {
                    None => self.schedule(next, height),
                    Some(target) => {
                        if self.already_visited(&instr, pc, next, height, target <= pc) {
                            return Ok(());
                        }
                        self.record(instr, next, height);
                        self.schedule(next, height);
                        self.schedule(target, height + self.config.call_cost());
                    }
                }
            }

            Effect::Return => {}

            Effect::Push | Effect::Pop | Effect::Next => {
                self.schedule(next, height + effect.stack_delta());
            }
        }

        Ok(())
    }

    fn decode(&self, pc: u32) -> Result<Instruction> {
        self.stream
            .decode_at(pc)
            .map_err(|source| AnalysisError::Decode { pc, source })
    }

    fn resolve(&mut self, pc: u32, effect: Effect, next: u32) -> Option<u32> {
        let target = effect.target(next);
        if target.is_none() {
            self.stats.unresolved_edges += 1;
            match effect {
                Effect::Branch(Some(k))
                | Effect::RelativeJump(Some(k))
                | Effect::RelativeCall(Some(k)) => {
                    warn!(pc, k, "relative target below address 0; edge not explored");
                }
                _ => debug!(pc, "unresolved target; edge not explored"),
            }
        }
        target
    }

    fn already_visited(
        &mut self,
        instr: &Instruction,
        pc: u32,
        next: u32,
        height: i64,
        backward: bool,
    ) -> bool {
        if self.bound.is_unbounded() {
            return true;
        }

        let revisit = self.ledger.classify(instr, next, height, backward);
        match revisit {
            Revisit::Fresh => {}
            Revisit::Growing => {
                debug!(pc, height, %instr, "stack grows around back-edge; result unbounded");
                self.bound = self.bound.merge(StackBound::Unbounded);
            }
            Revisit::Stable | Revisit::Dominated => {
                trace!(pc, height, ?revisit, "path already covered");
            }
        }
        revisit.stops()
    }

    fn record(&mut self, instruction: Instruction, successor: u32, height: i64) {
        self.ledger.record(VisitRecord {
            instruction,
            successor,
            height,
        });
        self.stats.max_ledger_len = self.stats.max_ledger_len.max(self.ledger.len());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use avrstack_decoder::Listing;
    use avrstack_isa::Register;
    use proptest::prelude::*;

    fn stack_op(push: bool) -> Instruction {
        if push {
            Instruction::Push { rr: Register::R24 }
        } else {
            Instruction::Pop { rd: Register::R24 }
        }
    }

    /// Highest prefix sum of +1/-1 steps, starting from zero
    fn peak(ops: &[bool]) -> u64 {
        let mut height: i64 = 0;
        let mut max: i64 = 0;
        for &push in ops {
            height += if push { 1 } else { -1 };
            max = max.max(height);
        }
        max as u64
    }

    fn run(listing: &Listing) -> AnalysisReport {
        Traverser::new(listing, AnalysisConfig::default())
            .run()
            .unwrap()
    }

    proptest! {
        #[test]
        fn test_straight_line_prefix_maximum(ops in prop::collection::vec(any::<bool>(), 0..64)) {
            let mut program: Vec<Instruction> = ops.iter().map(|&p| stack_op(p)).collect();
            program.push(Instruction::Ret);

            let report = run(&Listing::new(program));
            prop_assert_eq!(report.bound, StackBound::Bounded(peak(&ops)));
            prop_assert_eq!(report.stats.states_explored, ops.len() as u64 + 1);
        }

        #[test]
        fn test_branch_takes_larger_arm(
            taken in prop::collection::vec(any::<bool>(), 0..32),
            fallthrough in prop::collection::vec(any::<bool>(), 0..32),
        ) {
            // brne over the fallthrough arm (and its ret) into the taken arm
            let mut program = vec![Instruction::Brbc { s: 1, k: Some(fallthrough.len() as i8 + 1) }];
            program.extend(fallthrough.iter().map(|&p| stack_op(p)));
            program.push(Instruction::Ret);
            program.extend(taken.iter().map(|&p| stack_op(p)));
            program.push(Instruction::Ret);

            let report = run(&Listing::new(program));
            let expected = peak(&taken).max(peak(&fallthrough));
            prop_assert_eq!(report.bound, StackBound::Bounded(expected));
        }

        #[test]
        fn test_call_adds_return_address(
            body in prop::collection::vec(any::<bool>(), 0..32),
            cost in 1u8..=4,
        ) {
            // rcall body; ret; body...; ret
            let mut program = vec![Instruction::Rcall { k: Some(1) }, Instruction::Ret];
            program.extend(body.iter().map(|&p| stack_op(p)));
            program.push(Instruction::Ret);

            let config = AnalysisConfig::new().with_return_address_bytes(cost);
            let report = Traverser::new(&Listing::new(program), config).run().unwrap();

            let callee_peak = body
                .iter()
                .scan(i64::from(cost), |h, &p| {
                    *h += if p { 1 } else { -1 };
                    Some(*h)
                })
                .fold(i64::from(cost), i64::max);
            prop_assert_eq!(report.bound, StackBound::Bounded(callee_peak as u64));
        }
    }
}
