mod app;
mod clock;
mod config;
mod input;
mod model;
mod render;
mod sim;
mod storage;

use anyhow::Result;
use clap::Parser;
use std::{fs::OpenOptions, path::Path, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lumipod")]
#[command(about = "A glowing virtual pet that lives in your terminal")]
struct Cli {
    /// Directory for the save, settings and log (defaults to the per-user data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Draw the creature with plain characters instead of braille
    #[arg(long, default_value_t = false)]
    ascii: bool,

    /// Force monochrome output
    #[arg(long, default_value_t = false)]
    no_color: bool,

    /// Discard the existing save and hatch a new pet
    #[arg(long, default_value_t = false)]
    reset: bool,

    /// Print the pet's current state and exit
    #[arg(long, default_value_t = false)]
    status: bool,
}

/// The terminal belongs to the UI, so log lines go to a file.
fn init_logging(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = config::project_paths(cli.data_dir.as_deref())?;
    init_logging(&paths.log_path);

    app::run(
        paths,
        app::LaunchOptions {
            ascii: cli.ascii,
            no_color: cli.no_color,
            reset: cli.reset,
            status: cli.status,
        },
    )
}
