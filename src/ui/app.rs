//! Main TUI application state and logic

use crate::animation::DriveOutcome;
use crate::environment::EnvironmentSource;
use crate::session::{InterpreterSession, SessionMessage};
use crate::ui::panes::{self, MemoryScrollState, StatusRenderData};
use crate::visualizer::Visualizer;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Registers,
    Memory,
    Commentary,
}

impl FocusedPane {
    /// Move focus to the next pane
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Registers => FocusedPane::Memory,
            FocusedPane::Memory => FocusedPane::Commentary,
            FocusedPane::Commentary => FocusedPane::Registers,
        }
    }
}

/// The main application state
pub struct App<E> {
    /// Decoder, queue, driver and display model
    pub visualizer: Visualizer<E>,

    /// The running interpreter
    pub session: InterpreterSession,

    /// Output of the interpreter
    messages: Receiver<SessionMessage>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    pub memory_scroll: MemoryScrollState,
    pub commentary_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Time between steps in play mode
    pub tick: Duration,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,
}

impl<E: EnvironmentSource> App<E> {
    pub fn new(
        visualizer: Visualizer<E>,
        session: InterpreterSession,
        messages: Receiver<SessionMessage>,
        tick: Duration,
    ) -> Self {
        App {
            visualizer,
            session,
            messages,
            focused_pane: FocusedPane::Memory,
            memory_scroll: MemoryScrollState::default(),
            commentary_scroll: usize::MAX,
            should_quit: false,
            status_message: String::from("Ready! Press → to step or space to play"),
            is_playing: false,
            tick,
            last_play_time: Instant::now(),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.pump_session();

            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            // Handle auto-play mode
            if self.is_playing && self.last_play_time.elapsed() >= self.tick {
                self.step();
                self.last_play_time = Instant::now();
            }

            // Use poll with timeout to allow auto-play to work
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Feed everything the interpreter has printed since the last frame
    fn pump_session(&mut self) {
        loop {
            match self.messages.try_recv() {
                Ok(SessionMessage::TraceLine(line)) => {
                    self.visualizer.ingest(&line);
                }
                Ok(SessionMessage::Diagnostic(line)) => {
                    info!(target: "cpuviz::process", "{}", line);
                }
                Ok(SessionMessage::ProcessExited { code }) => {
                    self.session.mark_exited(code);
                    self.visualizer.session_ended(code);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.session.is_running() {
                        self.session.mark_exited(None);
                        self.visualizer.session_ended(None);
                    }
                    break;
                }
            }
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes above, status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        // Registers on the left, memory and commentary on the right
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(0)])
            .split(main_chunks[0]);

        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[1]);

        let view = self.visualizer.view();

        panes::render_registers_pane(
            frame,
            columns[0],
            view,
            self.focused_pane == FocusedPane::Registers,
        );

        panes::render_memory_pane(
            frame,
            right_rows[0],
            view,
            self.focused_pane == FocusedPane::Memory,
            &mut self.memory_scroll,
        );

        panes::render_commentary_pane(
            frame,
            right_rows[1],
            view.commentary(),
            self.focused_pane == FocusedPane::Commentary,
            &mut self.commentary_scroll,
        );

        panes::render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                steps_rendered: view.steps_rendered(),
                queued: self.visualizer.queue().len(),
                driver_state: self.visualizer.driver().state(),
                is_playing: self.is_playing,
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Right | KeyCode::Char('n') => {
                self.is_playing = false;
                self.step();
            }
            KeyCode::Char(' ') => {
                self.is_playing = !self.is_playing;
                if self.is_playing {
                    // Take the first step on the next loop iteration
                    self.last_play_time = Instant::now()
                        .checked_sub(self.tick)
                        .unwrap_or(Instant::now());
                    self.status_message = "Playing...".to_string();
                } else {
                    self.status_message = "Paused".to_string();
                }
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Memory => {
                    self.memory_scroll.offset = self.memory_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Commentary => {
                    self.commentary_scroll = self.commentary_scroll.saturating_sub(1);
                }
                FocusedPane::Registers => {}
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Memory => {
                    self.memory_scroll.offset = self.memory_scroll.offset.saturating_add(1);
                }
                FocusedPane::Commentary => {
                    self.commentary_scroll = self.commentary_scroll.saturating_add(1);
                }
                FocusedPane::Registers => {}
            },
            KeyCode::PageUp if self.focused_pane == FocusedPane::Memory => {
                self.memory_scroll.offset = self.memory_scroll.offset.saturating_sub(10);
            }
            KeyCode::PageDown if self.focused_pane == FocusedPane::Memory => {
                self.memory_scroll.offset = self.memory_scroll.offset.saturating_add(10);
            }
            _ => {}
        }
    }

    /// One animation tick
    fn step(&mut self) {
        match self.visualizer.tick(&mut self.session) {
            Ok(DriveOutcome::Stepped(step)) => {
                self.status_message = step.to_string();
                // Auto-scroll commentary to bottom
                self.commentary_scroll = usize::MAX;
            }
            Ok(DriveOutcome::Requested) => {
                self.status_message = "Requested next instruction".to_string();
            }
            Ok(DriveOutcome::Waiting) => {
                self.status_message = "Waiting for the interpreter...".to_string();
            }
            Ok(DriveOutcome::Finished) => {
                self.is_playing = false;
                self.status_message = "Program finished".to_string();
            }
            Err(err) => {
                error!(error = %err, "interpreter command failed");
                self.is_playing = false;
                self.status_message = format!("Interpreter error: {}", err);
            }
        }
    }
}
