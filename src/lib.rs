//! # Introduction
//!
//! cpuviz drives an external bytecode interpreter one instruction at a time
//! and animates what it reports: the fetch cycle through PC, MAR, MDR and CIR,
//! the decoded mnemonic, and the effect of each executed operation on
//! registers, comparison flags and memory. The UI is a terminal application
//! built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Pipeline
//!
//! ```text
//! interpreter stdout → EventDecoder → StepCompiler → AnimationQueue → PlaybackDriver → MachineView → TUI
//!        ▲                                                                   │
//!        └──────────────────────── env / step ───────────────────────────────┘
//! ```
//!
//! 1. [`protocol`]: decodes trace lines into typed events.
//! 2. [`animation`]: compiles events into atomic steps, queues them, and
//!    plays them back one per tick, asking the interpreter for more when the
//!    queue runs dry.
//! 3. [`display`]: the display model the steps mutate, and the step renderer.
//! 4. [`session`]: the interpreter process and its message channel.
//! 5. [`visualizer`]: owns one run's pipeline state.
//! 6. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! Supporting modules: [`machine`] (register and flag names), [`environment`]
//! (out-of-band state snapshots), [`config`], [`errors`].

pub mod animation;
pub mod config;
pub mod display;
pub mod environment;
pub mod errors;
pub mod machine;
pub mod protocol;
pub mod session;
pub mod ui;
pub mod visualizer;
