//! Owned pipeline state for one visualized run
//!
//! [`Visualizer`] ties the decoder, compiler, queue, driver and display model
//! together. Trace text goes in through [`Visualizer::ingest`]; each animation
//! tick calls [`Visualizer::tick`]. Nothing here is global, so independent
//! runs (and tests) never share state.

use crate::animation::step::notify;
use crate::animation::{AnimationQueue, CommandSink, DriveOutcome, PlaybackDriver, StepCompiler};
use crate::display::MachineView;
use crate::environment::EnvironmentSource;
use crate::errors::ProcessError;
use crate::protocol::{DecodedEvent, DecoderStats, EventDecoder};
use tracing::{debug, error, warn};

pub struct Visualizer<E> {
    decoder: EventDecoder,
    compiler: StepCompiler,
    queue: AnimationQueue,
    driver: PlaybackDriver,
    view: MachineView,
    environment: E,
    compile_failures: usize,
}

impl<E: EnvironmentSource> Visualizer<E> {
    pub fn new(environment: E) -> Self {
        Visualizer {
            decoder: EventDecoder::new(),
            compiler: StepCompiler::new(),
            queue: AnimationQueue::new(),
            driver: PlaybackDriver::new(),
            view: MachineView::new(),
            environment,
            compile_failures: 0,
        }
    }

    /// Decode raw interpreter output and queue the resulting steps.
    ///
    /// Returns the number of steps appended.
    pub fn ingest(&mut self, raw: &str) -> usize {
        self.decoder
            .decode(raw)
            .into_iter()
            .map(|event| self.apply(event))
            .sum()
    }

    /// Handle one decoded event: state loads go straight to the display
    /// model, everything else is compiled and appended as a whole.
    pub fn apply(&mut self, event: DecodedEvent) -> usize {
        match event {
            DecodedEvent::Config { memory_kb } => {
                self.view.resize_memory(memory_kb);
                0
            }
            DecodedEvent::MemoryDump(dump) => {
                debug!(bytes = dump.bytes.len(), "loading memory dump");
                self.view.load_memory(&dump);
                0
            }
            DecodedEvent::Environment => {
                match self.environment.fetch() {
                    Ok(env) => self.view.apply_environment(&env),
                    Err(err) => error!(error = %err, "failed to load environment snapshot"),
                }
                0
            }
            event => match self.compiler.compile(&event) {
                Ok(steps) => {
                    let count = steps.len();
                    self.queue.extend(steps);
                    debug!(tag = event.tag(), count, queued = self.queue.len(), "queued steps");
                    count
                }
                Err(err) => {
                    self.compile_failures += 1;
                    warn!(tag = event.tag(), error = %err, "event produced no steps");
                    0
                }
            },
        }
    }

    /// One animation tick
    pub fn tick<S: CommandSink + ?Sized>(&mut self, sink: &mut S) -> Result<DriveOutcome, ProcessError> {
        self.driver.drive(&mut self.queue, &mut self.view, sink)
    }

    /// The interpreter has gone: stop requesting and tell the user once the
    /// queued steps have played
    pub fn session_ended(&mut self, code: Option<i32>) {
        self.driver.stop();
        let message = match code {
            Some(code) => format!("Interpreter exited (code {})", code),
            None => "Interpreter was terminated".to_string(),
        };
        self.queue.push(notify(message));
    }

    pub fn view(&self) -> &MachineView {
        &self.view
    }

    pub fn queue(&self) -> &AnimationQueue {
        &self.queue
    }

    pub fn driver(&self) -> &PlaybackDriver {
        &self.driver
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn compile_failures(&self) -> usize {
        self.compile_failures
    }
}
