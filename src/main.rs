// cpuviz: fetch/decode/execute visualizer for an external interpreter

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use cpuviz::config::{AppConfig, Cli};
use cpuviz::environment::EnvironmentFile;
use cpuviz::session::InterpreterSession;
use cpuviz::ui::App;
use cpuviz::visualizer::Visualizer;

/// Log to a file: the terminal belongs to the UI
fn init_logging(path: &Path, level: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !cli.bytecode.exists() {
        eprintln!("Error: File '{}' not found", cli.bytecode.display());
        std::process::exit(1);
    }

    init_logging(&cli.log_file, cli.log_level.as_deref())?;

    let config = match AppConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(?config, "starting");

    let mut session = InterpreterSession::new();
    let messages = match session.start(&config.launch_spec()) {
        Ok(messages) => messages,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let visualizer = Visualizer::new(EnvironmentFile::new(&config.env_file));

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(visualizer, session, messages, config.tick);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    let stats = app.visualizer.decoder_stats();
    tracing::info!(
        decoded = stats.decoded,
        ignored = stats.ignored,
        malformed = stats.malformed,
        compile_failures = app.visualizer.compile_failures(),
        "session finished"
    );

    Ok(())
}
