use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::watch;
use tracing::info;

use metro_panel::config::{Overrides, PanelConfig};
use metro_panel::logging::{self, Verbosity};
use metro_panel::pipeline::{self, shutdown_signal, supervise};
use metro_panel::sink::{FrameSink, LogSink, TerminalSink};
use metro_panel::{error, PanelError};

#[derive(Parser, Debug)]
#[command(name = "metro-panel", version)]
#[command(about = "Real-time metro line status on an RGB LED matrix")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Station identifier (e.g. "berri-uqam")
    #[arg(short, long, global = true)]
    station: Option<String>,

    /// Refresh interval (e.g. "30s", "1m")
    #[arg(short, long, global = true)]
    refresh: Option<String>,

    /// Use canned demo data instead of the STM feed
    #[arg(long, global = true)]
    demo: bool,

    /// Where frames are drawn
    #[arg(long, value_enum, default_value_t = SinkKind::Terminal, global = true)]
    sink: SinkKind,

    /// Debug-level logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Producer and renderer in one process (default)
    Run,
    /// Fetch status and write one JSON record per line to stdout
    Produce,
    /// Read records from stdin and drive the panel
    Display,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum SinkKind {
    /// Half-block preview in this terminal
    Terminal,
    /// Frame text through the log
    Log,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Run);

    // The terminal preview owns the screen; keep stderr quiet unless asked
    let draws_to_terminal = command != Command::Produce && args.sink == SinkKind::Terminal;
    let verbosity = if draws_to_terminal && !args.verbose {
        Verbosity::Quiet
    } else {
        Verbosity::from_flags(args.verbose, args.quiet)
    };
    logging::init(verbosity);

    let result = run(&args, command);
    if let Err(e) = &result {
        eprintln!("metro-panel: {:#}", e);
    }
    error::to_exit_code(result)
}

fn run(args: &Args, command: Command) -> Result<()> {
    let overrides = Overrides {
        station: args.station.clone(),
        refresh: args.refresh.clone(),
        demo: args.demo,
    };
    let config =
        PanelConfig::load(args.config.as_deref(), &overrides).map_err(PanelError::from)?;
    info!(
        station = config.station.id,
        refresh = ?config.timing.refresh,
        demo = config.demo,
        command = ?command,
        "starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_command(command, &config, args.sink));

    // A blocking stdin read cannot be cancelled; do not wait on it forever
    runtime.shutdown_timeout(config.shutdown_timeout);
    result
}

fn make_sink(kind: SinkKind, config: &PanelConfig) -> Box<dyn FrameSink> {
    match kind {
        SinkKind::Terminal => Box::new(TerminalSink::new(format!(
            "{} - Ctrl-C to quit",
            config.display_name
        ))),
        SinkKind::Log => Box::new(LogSink::new()),
    }
}

async fn run_command(command: Command, config: &PanelConfig, sink: SinkKind) -> Result<()> {
    let (stop_tx, stop_rx) = watch::channel(false);
    let request_stop = move || {
        stop_tx.send_replace(true);
    };
    let grace = config.shutdown_timeout;

    let finished = match command {
        Command::Run => {
            let producer = pipeline::build_producer(config)?;
            let mut renderer = pipeline::build_renderer(config, make_sink(sink, config));
            let work = pipeline::run_in_process(
                producer,
                &mut renderer,
                config.channel_capacity,
                stop_rx,
            );
            supervise(work, shutdown_signal(), request_stop, grace)
                .await
                .map(|r| r.map_err(PanelError::from))
        }
        Command::Produce => {
            let producer = pipeline::build_producer(config)?;
            let work = pipeline::run_producer(producer, stop_rx);
            supervise(work, shutdown_signal(), request_stop, grace)
                .await
                .map(Ok)
        }
        Command::Display => {
            let mut renderer = pipeline::build_renderer(config, make_sink(sink, config));
            let work = pipeline::run_display(&mut renderer, stop_rx);
            supervise(work, shutdown_signal(), request_stop, grace)
                .await
                .map(|r| r.map_err(PanelError::from))
        }
    };

    match finished {
        Some(result) => {
            result?;
            info!("stopped");
            Ok(())
        }
        None => bail!("shutdown did not finish within {:?}", grace),
    }
}
