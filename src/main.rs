//! Reorder FX CLI
//!
//! Offline host for the reorderable effect chain.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reorder_fx::cli::commands::{self, ProcessOptions};
use reorder_fx::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Reorder FX v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Reorder FX v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Process {
            input,
            output,
            order,
            state,
            set,
            bypass,
            block_size,
            config,
            bit_depth,
        } => {
            let options = ProcessOptions {
                input,
                output,
                order,
                state,
                set,
                bypass,
                block_size,
                config,
                bit_depth,
            };
            commands::process(&options)
                .with_context(|| format!("processing {}", options.input.display()))
        }
        Commands::DefaultState { path } => commands::write_default_state(&path)
            .with_context(|| format!("writing {}", path.display())),
        Commands::ShowState { path } => {
            commands::show_state(&path).with_context(|| format!("reading {}", path.display()))
        }
        Commands::Params => Ok(commands::list_params()?),
    }
}
