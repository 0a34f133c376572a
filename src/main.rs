//! gdbstream - replay a captured debugger transcript through the parser
//!
//! Reads GDB console output from a file (or stdin), feeds it to a debugger
//! session in fragments and prints one line per parser event.

use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use gdbstream::patterns::file;
use gdbstream::patterns::watcher::PatternFileWatcher;
use gdbstream::{
    handle_startup_error, Command, Config, ConfigLoader, DebuggerSession, Parser, ParserEvent,
    ParserEventBus,
};

/// Command line options
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Pattern table file, overriding the configuration
    patterns_path: Option<PathBuf>,
    /// Fragment size in characters; whole input when unset
    chunk: Option<usize>,
    /// Commands queued before replay, as (caller, command)
    queue: Vec<(String, String)>,
    /// Print the active pattern table and exit
    dump_patterns: bool,
    /// Enable debug logging
    debug: bool,
    /// Transcript file; stdin when unset
    transcript: Option<PathBuf>,
}

impl AppArgs {
    fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    let value = args.get(i + 1).context("Missing config file path")?;
                    app_args.config_path = Some(PathBuf::from(value));
                    i += 1;
                }
                "--patterns" | "-p" => {
                    let value = args.get(i + 1).context("Missing pattern file path")?;
                    app_args.patterns_path = Some(PathBuf::from(value));
                    i += 1;
                }
                "--chunk" => {
                    let value = args.get(i + 1).context("Missing chunk size")?;
                    let size: usize = value
                        .parse()
                        .with_context(|| format!("Invalid chunk size: {}", value))?;
                    if size == 0 {
                        anyhow::bail!("Chunk size must be greater than 0");
                    }
                    app_args.chunk = Some(size);
                    i += 1;
                }
                "--queue" | "-q" => {
                    let value = args.get(i + 1).context("Missing CALLER=COMMAND")?;
                    let (caller, command) = value
                        .split_once('=')
                        .with_context(|| format!("Expected CALLER=COMMAND, got: {}", value))?;
                    app_args.queue.push((caller.to_string(), command.to_string()));
                    i += 1;
                }
                "--dump-patterns" => {
                    app_args.dump_patterns = true;
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--help" | "-?" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("gdbstream v{}", gdbstream::VERSION);
                    process::exit(0);
                }
                arg if arg.starts_with('-') && arg != "-" => {
                    anyhow::bail!("Unknown option: {}", arg);
                }
                arg => {
                    if app_args.transcript.is_some() {
                        anyhow::bail!("Only one transcript can be replayed");
                    }
                    if arg != "-" {
                        app_args.transcript = Some(PathBuf::from(arg));
                    }
                }
            }
            i += 1;
        }

        Ok(app_args)
    }
}

fn print_help() {
    println!("gdbstream - replay debugger console output through the event parser");
    println!();
    println!("USAGE:");
    println!("    gdbstream [OPTIONS] [TRANSCRIPT]");
    println!();
    println!("ARGS:");
    println!("    TRANSCRIPT                    Captured GDB output (default: stdin)");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>           Path to configuration file");
    println!("    -p, --patterns <PATH>         Pattern table file (TOML or JSON)");
    println!("        --chunk <N>               Feed the transcript in N-character fragments");
    println!("    -q, --queue <CALLER=COMMAND>  Queue a command before replay (repeatable)");
    println!("        --dump-patterns           Print the active pattern table as TOML");
    println!("    -d, --debug                   Enable debug logging");
    println!("    -?, --help                    Print this help message");
    println!("    -v, --version                 Print version information");
    println!();
    println!("ENVIRONMENT:");
    println!("    GDBSTREAM_DEBUG    Enable debug logging (1 or true)");
    println!("    RUST_LOG           Set logging level (error, warn, info, debug, trace)");
}

fn init_logging(debug: bool) {
    let debug = debug
        || env::var("GDBSTREAM_DEBUG").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let level = if debug { "debug" } else { "warn" };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_configuration(args: &AppArgs) -> gdbstream::Result<Config> {
    let mut config = match &args.config_path {
        Some(path) => ConfigLoader::load_from_path(path)?,
        None => ConfigLoader::load().unwrap_or_else(|e| {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        }),
    };

    if let Some(path) = &args.patterns_path {
        config.patterns.file = Some(path.clone());
    }
    Ok(config)
}

async fn read_transcript(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read transcript {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read transcript from stdin")?;
            Ok(input)
        }
    }
}

/// Split `text` into fragments of at most `size` characters
fn fragments(text: &str, size: Option<usize>) -> Vec<String> {
    match size {
        None => vec![text.to_string()],
        Some(size) => {
            let chars: Vec<char> = text.chars().collect();
            chars.chunks(size).map(|c| c.iter().collect()).collect()
        }
    }
}

fn format_event(event: &ParserEvent) -> String {
    format!(
        "{:<17} #{:<4} {:<12} {}",
        event.kind.as_str(),
        event.correlation_id,
        event.caller_id.as_deref().unwrap_or("-"),
        event.text
    )
}

fn format_command(command: &Command) -> String {
    format!(
        "{:<17} #{:<4} {:<12} {}",
        "send", command.correlation_id, command.caller_id, command.text
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("Failed to parse arguments: {}", e);
        print_help();
        process::exit(1);
    });

    init_logging(args.debug);
    info!("Starting gdbstream v{}", gdbstream::VERSION);

    let config = load_configuration(&args).unwrap_or_else(|e| {
        eprintln!("{}", handle_startup_error(&e));
        process::exit(1);
    });
    let mut parser = Parser::from_config(&config).unwrap_or_else(|e| {
        eprintln!("{}", handle_startup_error(&e));
        process::exit(1);
    });

    if args.dump_patterns {
        print!("{}", file::to_toml_string(&parser.patterns().records())?);
        return Ok(());
    }

    let transcript = read_transcript(args.transcript.as_ref()).await?;
    debug!("Replaying {} bytes", transcript.len());

    let watch = match (&config.patterns.file, config.patterns.watch) {
        (Some(path), true) if path.exists() => Some(
            PatternFileWatcher::start_background_watch(path.clone(), parser.patterns().clone())?,
        ),
        _ => None,
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ParserEvent>();
    parser.subscribe(event_tx);
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();

    // One printer for both streams keeps the output in arrival order
    let printer = tokio::spawn(async move {
        let mut events_open = true;
        let mut commands_open = true;
        while events_open || commands_open {
            tokio::select! {
                event = event_rx.recv(), if events_open => match event {
                    Some(event) => println!("{}", format_event(&event)),
                    None => events_open = false,
                },
                command = command_rx.recv(), if commands_open => match command {
                    Some(command) => println!("{}", format_command(&command)),
                    None => commands_open = false,
                },
            }
        }
    });

    let session = DebuggerSession::start(
        parser,
        ParserEventBus::new(config.session.event_capacity),
        command_tx,
    );

    for (caller, command) in &args.queue {
        session.queue_command(caller.as_str(), command.as_str())?;
    }
    for fragment in fragments(&transcript, args.chunk) {
        session.send_output(fragment)?;
    }

    let parser = session.finish().await?;
    let state = parser.state();
    drop(parser);
    printer.await?;

    if !state.pending_buffer.is_empty() {
        warn!(
            "{} bytes left without a block terminator",
            state.pending_buffer.len()
        );
    }
    if let Some((flag, handle)) = watch {
        flag.store(false, std::sync::atomic::Ordering::SeqCst);
        handle.abort();
    }

    Ok(())
}
