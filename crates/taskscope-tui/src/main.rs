//! TaskScope Terminal UI.
//!
//! Lists tasks from the gateway and follows one task live over its event
//! stream.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use taskscope_client::ClientConfig;
use taskscope_core::{CoreError, TaskId, TaskStatus};

mod app;
mod backend;
mod event;
mod state;
mod theme;
mod ui;
mod utils;

use app::App;
use event::{BackendCommand, UiEvent};

#[derive(Parser)]
#[command(name = "taskscope")]
#[command(about = "Follow gateway tasks from the terminal")]
#[command(version)]
struct Cli {
    /// Gateway base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Only list tasks with this status (e.g. running)
    #[arg(short, long, value_parser = parse_status)]
    status: Option<TaskStatus>,

    /// Open this task directly
    #[arg(short, long)]
    task: Option<String>,

    /// Task list refresh interval in seconds
    #[arg(short, long, default_value = "5")]
    refresh: u64,

    /// Request timeout in seconds for list and detail loads
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Delay in seconds before the event stream reconnects
    #[arg(long, default_value = "3")]
    reconnect_delay: u64,

    /// Log file (logs never go to the terminal)
    #[arg(long, default_value = "/tmp/taskscope.log")]
    log_file: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    init_logging(&cli.log_file);

    let config = ClientConfig {
        request_timeout: Duration::from_secs(cli.timeout),
        reconnect_delay: Duration::from_secs(cli.reconnect_delay),
        list_refresh: Duration::from_secs(cli.refresh.max(1)),
        ..ClientConfig::default()
    }
    .with_base_url(cli.base_url);

    run_tui(config, cli.status, cli.task.map(TaskId::from))
}

fn parse_status(s: &str) -> Result<TaskStatus, CoreError> {
    s.to_ascii_uppercase().parse()
}

/// Write tracing output to a file to avoid terminal interference.
fn init_logging(path: &Path) {
    let Ok(file) = std::fs::File::create(path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("taskscope_tui=debug,taskscope_client=debug"));

    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
}

fn run_tui(
    config: ClientConfig,
    status_filter: Option<TaskStatus>,
    initial_task: Option<TaskId>,
) -> Result<(), Box<dyn Error>> {
    info!(base_url = %config.base_url, "Starting TaskScope TUI");

    // Create channels for UI <-> backend communication
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(100);
    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>(100);

    // The sync core runs on one cooperative event loop
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let backend_config = config.clone();
    let backend_filter = status_filter;
    let backend_task = initial_task.clone();
    let bg_handle = std::thread::spawn(move || {
        rt.block_on(backend::run_backend(
            backend_config,
            backend_filter,
            backend_task,
            ui_tx,
            cmd_rx,
        ));
    });

    // Initialize terminal (enters alternate screen, enables raw mode)
    let terminal = ratatui::init();

    let mut app = App::new(ui_rx, cmd_tx, status_filter, initial_task);
    let result = app.run(terminal);

    // Restore terminal (exits alternate screen, disables raw mode)
    ratatui::restore();

    let _ = bg_handle.join();

    info!("TUI shutdown complete");

    result.map_err(|e| e.into())
}
