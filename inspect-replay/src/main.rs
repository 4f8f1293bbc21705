use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use inspect_replay::{RenderOptions, ReplayError, Session};
use inspect_tree::SyncConfig;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

/// Replay a recorded view inspector session and print the inspect tree
/// after every step.
#[derive(Debug, Parser)]
#[command(name = "inspect-replay", version)]
struct Args {
    /// Session file (JSON).
    session: PathBuf,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Also draw the contents of collapsed nodes.
    #[arg(long)]
    show_collapsed: bool,

    /// Show fake roots as a node instead of listing their children.
    #[arg(long)]
    keep_fake_roots: bool,

    /// Do not expand ancestors of the selected node.
    #[arg(long)]
    no_reveal: bool,
}

impl Args {
    fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new();
        if self.keep_fake_roots {
            config = config.keep_fake_roots();
        }
        if self.no_reveal {
            config = config.without_reveal();
        }
        config
    }
}

fn init_logging(args: &Args) -> Result<(), ReplayError> {
    match &args.log_file {
        Some(path) => {
            let file = File::create(path)?;
            WriteLogger::init(args.log_level, Config::default(), file)?;
        }
        None => TermLogger::init(
            args.log_level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), ReplayError> {
    init_logging(args)?;

    let session = Session::load(&args.session)?;
    let options = RenderOptions {
        show_collapsed: args.show_collapsed,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    inspect_replay::run(session, args.sync_config(), &options, &mut out)
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
