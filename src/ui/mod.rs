//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, playback ticks,
//!   polling of interpreter output
//! - **[`panes`]**: stateless render functions for each visible pane (registers,
//!   memory, commentary, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a
//! [`Visualizer`] and a started [`InterpreterSession`], then call [`App::run`]
//! to start the event loop.
//!
//! [`Visualizer`]: crate::visualizer::Visualizer
//! [`InterpreterSession`]: crate::session::InterpreterSession
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
