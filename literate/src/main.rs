//! Literate: live narrative object extraction.
//!
//! A terminal editor that watches narrative text as you type and keeps a
//! reconciled list of the people, places and things it mentions.
//!
//! # Headless Mode
//!
//! Run with `--headless` to read text from stdin instead:
//!
//! ```bash
//! cat chapter1.txt | cargo run -p literate -- --headless --save objects.json
//! ```

mod app;
mod events;
mod headless;
mod ui;

use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::{
    event::{self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use literate_core::{spawn_orchestrator, LiterateConfig, ObjectManager};
use llm_client::Provider;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::{App, MessageKind};
use events::{handle_event, EventResult};
use ui::render::render;

const DEFAULT_LOG_FILE: &str = "literate.log";
const DEFAULT_LOG_FILTER: &str = "info,literate_core=debug";

/// Command line options layered over the environment configuration
#[derive(Debug, Default)]
struct CliArgs {
    headless: bool,
    help: bool,
    provider: Option<String>,
    model: Option<String>,
    save_file: Option<PathBuf>,
    remove_missing: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "-h" | "--help" => cli.help = true,
            "--headless" => cli.headless = true,
            "--remove-missing" => cli.remove_missing = true,
            "--provider" => cli.provider = Some(value("--provider")?),
            "--model" => cli.model = Some(value("--model")?),
            "--save" => cli.save_file = Some(PathBuf::from(value("--save")?)),
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    Ok(cli)
}

fn build_config(cli: &CliArgs) -> Result<LiterateConfig, String> {
    let mut config = LiterateConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(provider) = &cli.provider {
        let provider: Provider = provider.parse().map_err(|e: llm_client::Error| e.to_string())?;
        config = config.with_provider(provider);
    }
    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    if let Some(path) = &cli.save_file {
        config = config.with_save_file(path.clone());
    }
    if cli.remove_missing {
        config = config.with_remove_missing(true);
    }
    Ok(config)
}

/// Headless logs go to stderr; the TUI owns the terminal, so it logs to a file.
fn init_logging(headless: bool) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        let path = std::env::var("LITERATE_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    if cli.help {
        print_help();
        return Ok(());
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(cli.headless)?;

    let model = match config.build_model() {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error: {e}");
            if let llm_client::Error::NoApiKey(var) = e {
                eprintln!("Please set it in .env file or with: export {var}=your_key_here");
            }
            std::process::exit(1);
        }
    };

    info!(
        provider = %config.provider,
        model = config.model_name(),
        "starting literate"
    );
    let backend_url = model.client().base_url().to_string();
    let reachable = model.client().ping().await;
    if !reachable {
        warn!(provider = %config.provider, url = %backend_url, "model backend not reachable");
    }

    let manager = ObjectManager::open(config.save_file.clone())
        .await
        .with_remove_missing(config.remove_missing);
    let initial_objects = manager.all_objects();
    let (handle, events) = spawn_orchestrator(Arc::new(model), manager, config.orchestrator_config());

    if cli.headless {
        if !reachable {
            println!("[WARN] Cannot reach {} at {backend_url}", config.provider);
        }
        return headless::run_headless(handle, events).await;
    }

    let mut app = App::new(handle, events, initial_objects);
    if !reachable {
        app.push_message(
            MessageKind::Warning,
            format!("Cannot reach {} at {backend_url}. Is it running?", config.provider),
        );
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    app.handle.shutdown().await.ok();

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let mut service_running = true;

    loop {
        if service_running && !app.drain_events() {
            service_running = false;
            app.push_message(MessageKind::Error, "Extraction service stopped");
        }

        terminal.draw(|f| render(f, app))?;

        if let Some(text) = app.take_text_change() {
            if app.handle.text_changed(text).await.is_err() {
                app.push_message(MessageKind::Error, "Extraction service stopped");
            }
        }

        // Poll for events with a timeout so orchestrator events keep flowing
        if event::poll(Duration::from_millis(100))? {
            match handle_event(app, event::read()?) {
                EventResult::Quit => return Ok(()),
                EventResult::Retry(name) => {
                    if app.handle.retry(name).await.is_err() {
                        app.push_message(MessageKind::Error, "Extraction service stopped");
                    }
                }
                EventResult::Clear => {
                    if app.handle.clear().await.is_err() {
                        app.push_message(MessageKind::Error, "Extraction service stopped");
                    }
                }
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }
    }
}

fn print_help() {
    println!("Literate - Narrative Text Analyzer");
    println!();
    println!("USAGE:");
    println!("  literate [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help           Show this help message");
    println!("  --headless           Read text from stdin instead of running the TUI");
    println!("  --provider <NAME>    Model provider: ollama, openai, anthropic (default: ollama)");
    println!("  --model <MODEL>      Model name (default depends on provider)");
    println!("  --save <PATH>        Load objects from and autosave them to PATH");
    println!("  --remove-missing     Drop objects missing from the latest extraction");
    println!();
    println!("ENVIRONMENT:");
    println!("  LITERATE_PROVIDER, LITERATE_MODEL, LITERATE_TEMPERATURE,");
    println!("  LITERATE_TIMEOUT_SECS, LITERATE_DEBOUNCE_MS, LITERATE_MAX_INPUT_CHARS,");
    println!("  LITERATE_SAVE_FILE, LITERATE_REMOVE_MISSING, LITERATE_LOG_FILE, RUST_LOG");
    println!("  OPENAI_API_KEY, ANTHROPIC_API_KEY, OLLAMA_BASE_URL");
    println!();
    println!("TUI KEYS:");
    println!("  Ctrl+R   Retry an object by number");
    println!("  Ctrl+X   Clear all objects");
    println!("  Ctrl+Q   Quit");
    println!();
    println!("EXAMPLES:");
    println!("  literate                                  # Interactive TUI with local Ollama");
    println!("  literate --provider openai --save out.json");
    println!("  cat story.txt | literate --headless");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("literate")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_args() {
        let cli = parse_args(&args(&["--headless", "--provider", "openai", "--save", "out.json"])).unwrap();
        assert!(cli.headless);
        assert_eq!(cli.provider.as_deref(), Some("openai"));
        assert_eq!(cli.save_file, Some(PathBuf::from("out.json")));
        assert!(!cli.remove_missing);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(&args(&["--model"])).is_err());
        assert!(parse_args(&args(&["--bogus"])).is_err());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let cli = CliArgs {
            provider: Some("mystery".to_string()),
            ..CliArgs::default()
        };
        assert!(build_config(&cli).is_err());
    }
}
