//! # AVR Stack Analysis
//!
//! Compute a conservative worst-case stack height for AVR firmware by
//! exploring every control-flow path from the entry point.
//!
//! ## Features
//!
//! - **Path-scoped ledger**: revisits of a transfer on the same path are
//!   classified as stable, dominated or growing
//! - **Unbounded detection**: a back-edge revisited at a higher height
//!   yields [`StackBound::Unbounded`]
//! - **No native recursion**: exploration runs on an explicit work-stack
//!
//! ## Example
//!
//! ```rust
//! use avrstack_analysis::{analyze_image, StackBound};
//! use avrstack_isa::FirmwareImage;
//!
//! // push r16; pop r16; ret
//! let image = FirmwareImage::from_words(&[0x930F, 0x910F, 0x9508]);
//! let report = analyze_image(&image).unwrap();
//! assert_eq!(report.bound, StackBound::Bounded(1));
//! ```

pub mod error;
pub mod config;
pub mod bound;
pub mod ledger;
pub mod report;
pub mod traverser;

pub use error::{AnalysisError, Result};
pub use config::AnalysisConfig;
pub use bound::StackBound;
pub use ledger::{Ledger, Revisit, VisitRecord};
pub use report::{AnalysisReport, AnalysisStats};
pub use traverser::Traverser;

use avrstack_decoder::InstructionStream;
use avrstack_isa::FirmwareImage;

/// Analyze an instruction stream
pub fn analyze<S: InstructionStream + ?Sized>(
    stream: &S,
    config: AnalysisConfig,
) -> Result<AnalysisReport> {
    Traverser::new(stream, config).run()
}

/// Analyze a firmware image from address 0 with the default configuration
pub fn analyze_image(image: &FirmwareImage) -> Result<AnalysisReport> {
    analyze(image, AnalysisConfig::default())
}
