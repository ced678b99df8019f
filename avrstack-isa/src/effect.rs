//! Control-flow and stack effect classes
//!
//! Every [`Instruction`](crate::Instruction) maps onto exactly one class.
//! Targets are carried as `Option`: `None` marks a destination the decoder
//! could not resolve (indirect jumps and calls, truncated operands).

use serde::{Deserialize, Serialize};

/// Effect of one instruction on control flow and stack height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Conditional branch; displacement in words from the next instruction
    Branch(Option<i32>),

    /// Conditionally skips the following instruction
    Skip,

    /// Unconditional jump relative to the next instruction
    RelativeJump(Option<i32>),

    /// Unconditional jump to a word address
    AbsoluteJump(Option<u32>),

    /// Call relative to the next instruction
    RelativeCall(Option<i32>),

    /// Call to a word address
    AbsoluteCall(Option<u32>),

    /// Return or return-from-interrupt; ends the path
    Return,

    /// One byte pushed
    Push,

    /// One byte popped
    Pop,

    /// Control continues with the next instruction
    Next,
}

impl Effect {
    /// Height change applied on the sequential successor edge
    #[inline]
    pub fn stack_delta(&self) -> i64 {
        match self {
            Effect::Push => 1,
            Effect::Pop => -1,
            _ => 0,
        }
    }

    /// Resolve the target word address for an instruction whose sequential
    /// successor is `next`.
    ///
    /// Returns `None` for unresolved targets, for effects without a target,
    /// and for relative targets that land below address zero.
    pub fn target(&self, next: u32) -> Option<u32> {
        match *self {
            Effect::Branch(k) | Effect::RelativeJump(k) | Effect::RelativeCall(k) => {
                let k = k?;
                u32::try_from(i64::from(next) + i64::from(k)).ok()
            }
            Effect::AbsoluteJump(k) | Effect::AbsoluteCall(k) => k,
            _ => None,
        }
    }
}
