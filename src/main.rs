mod cli;
mod config;
mod controller;
mod error;
mod history;
mod lock;
mod pool;
mod setter;
mod store;

use std::{fs::OpenOptions, process::ExitCode, sync::Mutex};

use clap::Parser;
use cli::Args;
use config::{Layout, Settings};
use controller::Controller;
use error::Result;
use setter::CommandSetter;
use store::FileStore;
use tracing::{debug, warn};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

fn main() -> ExitCode {
    let args = Args::parse();
    let layout = Layout::from_env();

    // Initialize logging
    init_logging(layout.as_ref().ok());

    match layout.and_then(|layout| run(&args, &layout)) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            warn!("Run failed: {err}");
            eprintln!("{err}");
            ExitCode::from(&err)
        }
    }
}

fn run(args: &Args, layout: &Layout) -> Result<Vec<String>> {
    layout.ensure_root()?;

    let settings = Settings::load(layout)?;
    let setter = CommandSetter::from_command_line(&settings.setter)?;
    let action = args.action();
    debug!("Dispatching {:?}", action);

    Controller::new(layout, &settings, FileStore::new(layout), setter).run(&action)
}

/// Log to stderr per RUST_LOG, and append info-level events to the state log when it exists.
fn init_logging(layout: Option<&Layout>) {
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());

    let file = layout
        .filter(|layout| layout.root.is_dir())
        .and_then(|layout| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&layout.log)
                .ok()
        })
        .map(|log| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(log))
                .with_filter(LevelFilter::INFO)
        });

    tracing_subscriber::registry().with(stderr).with(file).init();
}
