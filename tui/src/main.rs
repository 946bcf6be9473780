//! Stego TUI Entry Point
//!
//! Launches the terminal client for hiding messages in images and
//! revealing them again through the stego service.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (service at http://localhost:5000)
//! stego-tui
//!
//! # Another service, dark theme
//! stego-tui --service-url http://stego.internal:8080 --dark
//!
//! # Verbose logging (written to the log file, never the screen)
//! RUST_LOG=debug stego-tui
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use stego_core::config::{default_log_path, load_config_from_path};
use stego_core::{ClientConfig, ConfigOverrides};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stego_tui::{App, StegoClient, UiOptions};

/// Stego TUI - hide and reveal messages in images
#[derive(Parser, Debug)]
#[command(name = "stego-tui")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the encode/decode service
    #[arg(short = 'u', long, value_name = "URL")]
    service_url: Option<String>,

    /// Whole-request timeout in seconds
    #[arg(short = 't', long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "STEGO_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start in the dark theme
    #[arg(long, conflicts_with = "light")]
    dark: bool,

    /// Start in the light theme
    #[arg(long)]
    light: bool,

    /// Number of background stars (0 disables them)
    #[arg(long, value_name = "COUNT")]
    stars: Option<usize>,

    /// Where saved images go
    #[arg(short = 'o', long, value_name = "DIR")]
    download_dir: Option<PathBuf>,

    /// Log file path
    #[arg(long, env = "STEGO_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "STEGO_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(url) = &self.service_url {
            overrides = overrides.with_service_url(url.clone());
        }
        if let Some(secs) = self.timeout {
            overrides = overrides.with_timeout_secs(secs);
        }
        if self.dark {
            overrides = overrides.with_dark_mode(true);
        } else if self.light {
            overrides = overrides.with_dark_mode(false);
        }
        if let Some(count) = self.stars {
            overrides = overrides.with_star_count(count);
        }
        if let Some(dir) = &self.download_dir {
            overrides = overrides.with_download_dir(dir.clone());
        }
        overrides
    }
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: &Path, level: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stego_tui={level},stego_core={level}")));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .init();

    Ok(())
}

/// Defaults, file, environment, then command line
fn load_client_config(args: &Args) -> Result<ClientConfig> {
    let mut config = load_config_from_path(args.config.clone())
        .context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command line option")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path, &args.log_level)?;

    let config = load_client_config(&args)?;
    tracing::info!(
        service = %config.service.base_url,
        source = %config.source(),
        "Configuration loaded"
    );

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: stego-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means stdin or stdout is piped, or SSH ran without -t.");
        std::process::exit(1);
    }

    // Restore the terminal before a panic message is printed
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &config).await;
    restore_terminal(&mut terminal)?;

    if result.is_ok() {
        println!("Logs: {}", log_path.display());
    }
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
) -> Result<()> {
    let client = StegoClient::from_config(config)?;
    let size = crossterm::terminal::size()?;
    let mut app = App::new(client, UiOptions::from(config), size);
    app.run(terminal).await
}
