//! TUI pane rendering modules
//!
//! Each pane reads the [`MachineView`](crate::display::MachineView) and draws
//! one part of it:
//!
//! - [`registers`]: PC/MAR/MDR/CIR, the general registers and comparison flags
//! - [`memory`]: the memory grid, following the cells the last step touched
//! - [`commentary`]: notification history
//! - [`status`]: status bar with keybindings and playback state

pub mod commentary;
pub mod memory;
pub mod registers;
pub mod status;

pub use commentary::render_commentary_pane;
pub use memory::{render_memory_pane, MemoryScrollState};
pub use registers::render_registers_pane;
pub use status::{render_status_bar, StatusRenderData};
