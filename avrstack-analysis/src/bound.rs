//! Worst-case stack bound

use serde::{Deserialize, Serialize};
use std::fmt;

/// Running result of an analysis
///
/// Merging is monotonic: once `Unbounded`, always `Unbounded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackBound {
    /// Maximum stack height in bytes over every explored path
    Bounded(u64),

    /// Some cycle grows the stack without limit
    Unbounded,
}

impl Default for StackBound {
    fn default() -> Self {
        StackBound::Bounded(0)
    }
}

impl StackBound {
    pub fn merge(self, other: StackBound) -> StackBound {
        match (self, other) {
            (StackBound::Bounded(a), StackBound::Bounded(b)) => StackBound::Bounded(a.max(b)),
            _ => StackBound::Unbounded,
        }
    }

    /// Raise the bound to `height`; returns true if this is a new peak.
    /// Heights at or below zero never raise it.
    pub fn raise(&mut self, height: i64) -> bool {
        match self {
            StackBound::Bounded(max) => match u64::try_from(height) {
                Ok(h) if h > *max => {
                    *max = h;
                    true
                }
                _ => false,
            },
            StackBound::Unbounded => false,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, StackBound::Unbounded)
    }

    /// Finite bound, if any
    pub fn bytes(&self) -> Option<u64> {
        match self {
            StackBound::Bounded(max) => Some(*max),
            StackBound::Unbounded => None,
        }
    }

    /// Check the bound against a byte budget
    pub fn fits(&self, limit: u64) -> bool {
        self.bytes().is_some_and(|max| max <= limit)
    }
}

impl fmt::Display for StackBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackBound::Bounded(max) => write!(f, "{} bytes", max),
            StackBound::Unbounded => write!(f, "unbounded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_monotonic() {
        let a = StackBound::Bounded(3);
        let b = StackBound::Bounded(5);
        assert_eq!(a.merge(b), StackBound::Bounded(5));
        assert_eq!(a.merge(StackBound::Unbounded), StackBound::Unbounded);
        assert_eq!(StackBound::Unbounded.merge(b), StackBound::Unbounded);
    }

    #[test]
    fn test_raise() {
        let mut bound = StackBound::default();
        assert!(!bound.raise(-4));
        assert!(!bound.raise(0));
        assert!(bound.raise(2));
        assert!(!bound.raise(1));
        assert_eq!(bound, StackBound::Bounded(2));

        let mut unbounded = StackBound::Unbounded;
        assert!(!unbounded.raise(100));
        assert!(unbounded.is_unbounded());
    }

    #[test]
    fn test_fits() {
        assert!(StackBound::Bounded(64).fits(64));
        assert!(!StackBound::Bounded(65).fits(64));
        assert!(!StackBound::Unbounded.fits(u64::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(StackBound::Bounded(5).to_string(), "5 bytes");
        assert_eq!(StackBound::Unbounded.to_string(), "unbounded");
    }
}
