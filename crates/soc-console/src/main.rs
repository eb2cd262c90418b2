mod format;
mod state;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use serde::Deserialize;
use soc_client::api::ApiClient;
use soc_client::engine::{EngineConfig, EngineMsg, SyncEngine};
use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_SERVER: &str = "https://127.0.0.1:1793";
const DEFAULT_CONFIG_FILE: &str = "soc-console.toml";

#[derive(Parser, Debug)]
#[command(name = "soc-console")]
struct Args {
    #[arg(long, default_value = "")]
    server: String,
    #[arg(long, default_value = "")]
    config: String,
    #[arg(long, default_value_t = 0)]
    records_interval: u64,
    #[arg(long, default_value_t = 0)]
    status_interval: u64,
}

#[derive(Debug, Deserialize, Default)]
struct ConsoleConfig {
    #[serde(default)]
    server: Option<String>,
    #[serde(default)]
    records_interval_secs: Option<u64>,
    #[serde(default)]
    status_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = load_config(&config_path(&args));

    let server = if args.server.trim().is_empty() {
        config.server.clone().unwrap_or_else(|| DEFAULT_SERVER.to_string())
    } else {
        args.server.trim().to_string()
    };

    let mut engine_config = EngineConfig::default();
    if let Some(secs) = pick_interval(args.records_interval, config.records_interval_secs) {
        engine_config.records_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = pick_interval(args.status_interval, config.status_interval_secs) {
        engine_config.status_interval = Duration::from_secs(secs);
    }

    let api = ApiClient::new(server).context("failed to build API client")?;
    let (tx, rx) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(api, tx, engine_config);

    let mut terminal = setup_terminal()?;
    let result = run(&mut terminal, engine, rx).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut engine: SyncEngine,
    mut rx: UnboundedReceiver<EngineMsg>,
) -> Result<()> {
    let mut app = state::App::new();
    let mut input = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_secs(1));

    loop {
        app.clamp_selection(&engine.dashboard);
        terminal.draw(|f| ui::render(f, &app, &engine))?;

        tokio::select! {
            maybe_msg = rx.recv() => {
                let Some(msg) = maybe_msg else { break; };
                for event in engine.handle_msg(msg) {
                    app.apply(event);
                }
            }
            maybe_event = input.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key)))
                        if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                    {
                        for command in app.handle_key(key, &engine.dashboard) {
                            for event in engine.handle_command(command) {
                                app.apply(event);
                            }
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(error = %err, "input stream failed");
                        break;
                    }
                    None => break,
                }
            }
            _ = redraw.tick() => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn pick_interval(arg_secs: u64, config_secs: Option<u64>) -> Option<u64> {
    if arg_secs > 0 {
        return Some(arg_secs);
    }
    config_secs.filter(|secs| *secs > 0)
}

fn config_path(args: &Args) -> PathBuf {
    if !args.config.trim().is_empty() {
        return PathBuf::from(args.config.trim());
    }
    if let Ok(value) = std::env::var("SOC_CONSOLE_CONFIG") {
        if !value.trim().is_empty() {
            return PathBuf::from(value.trim());
        }
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn load_config(path: &Path) -> ConsoleConfig {
    if !path.exists() {
        return ConsoleConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => ConsoleConfig::default(),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("SOC_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}
