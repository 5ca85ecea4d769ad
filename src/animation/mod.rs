//! Animation sequencing
//!
//! - [`step`]: the atomic, data-bound [`AnimationStep`]
//! - [`compiler`]: expands decoded events into step sequences
//! - [`queue`]: FIFO between compiler and driver
//! - [`driver`]: pops one step per tick or requests more trace
//!
//! ```text
//! DecodedEvent → StepCompiler → AnimationQueue → PlaybackDriver → DisplaySurface
//!                                                      │
//!                                                      └─ env / step → interpreter
//! ```

pub mod compiler;
pub mod driver;
pub mod queue;
pub mod step;

pub use compiler::StepCompiler;
pub use driver::{Command, CommandSink, DriveOutcome, DriverState, PlaybackDriver};
pub use queue::AnimationQueue;
pub use step::AnimationStep;
