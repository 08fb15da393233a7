use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::EnableMouseCapture,
    execute,
    terminal::{EnterAlternateScreen, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{Config, WriteLogger};

use mangaview::TempWorkspace;
use mangaview::event_source::TerminalEventSource;
use mangaview::main_app::{App, FrameRequest, run_app_with_event_source};
use mangaview::navigation::ReadingDirection;
use mangaview::panic_handler::{initialize_panic_handler, restore_terminal};
use mangaview::session::ReadingSession;
use mangaview::settings::{Settings, load_settings};

#[derive(Parser, Debug)]
#[command(
    name = "mangaview",
    version,
    about = "Page through image folders and PDF scans in the terminal"
)]
struct Args {
    /// Folder of images or a PDF file to open
    path: Option<PathBuf>,

    /// Read right-to-left (inverts every page-turn input)
    #[arg(long)]
    rtl: bool,

    /// Settings file (defaults to <config dir>/mangaview/config.yaml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (mut settings, settings_error) = match load_settings(args.config.as_deref()) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    if let Some(log_file) = args.log_file {
        settings.log_file = log_file;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if args.rtl {
        settings.reading_direction = ReadingDirection::RightToLeft;
    }

    WriteLogger::init(
        settings.log_level_filter(),
        Config::default(),
        File::create(&settings.log_file)
            .with_context(|| format!("Failed to create log file {:?}", settings.log_file))?,
    )?;
    info!("Starting mangaview");
    if let Some(e) = settings_error {
        error!("{e}; using default settings");
    }

    initialize_panic_handler();

    let workspace = match &settings.workspace_parent {
        Some(parent) => TempWorkspace::new_in(parent),
        None => TempWorkspace::new(),
    }
    .context("Failed to create extraction workspace")?;
    let session = ReadingSession::with_display(workspace, FrameRequest::default());
    let mut app = App::new(session, &settings);

    if let Some(path) = args.path.as_deref() {
        app.open_source(path);
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_with_event_source(&mut terminal, &mut app, &mut TerminalEventSource);

    restore_terminal();
    terminal.show_cursor()?;
    app.shutdown();

    if let Err(err) = res {
        error!("Application error: {err:?}");
        eprintln!("{err:?}");
    }

    info!("Shutting down mangaview");
    Ok(())
}
