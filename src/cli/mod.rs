//! CLI Module
//!
//! Offline host for the effect chain: render WAV files and inspect state.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reorder FX - stereo effect chain with a runtime-reorderable order
#[derive(Parser, Debug)]
#[command(name = "reorder-fx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a WAV file through the effect chain
    #[command(name = "process")]
    Process {
        /// Input WAV file (mono is upmixed to stereo)
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,

        /// Processing order, comma separated (e.g. "ladder,overdrive,phaser,chorus,filter")
        #[arg(short, long)]
        order: Option<String>,

        /// State file written by `default-state` or a previous session
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Parameter override as "name=value", repeatable
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,

        /// Bypass a module, repeatable
        #[arg(long = "bypass", value_name = "OPTION")]
        bypass: Vec<String>,

        /// Host block size in samples
        #[arg(short, long, default_value_t = 512)]
        block_size: usize,

        /// Processor configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output bit depth (16, 24 or 32 float)
        #[arg(long, default_value_t = 24)]
        bit_depth: u16,
    },

    /// Write the default state to a file
    #[command(name = "default-state")]
    DefaultState {
        /// Destination file
        path: PathBuf,
    },

    /// Print a state file
    #[command(name = "show-state")]
    ShowState {
        /// State file
        path: PathBuf,
    },

    /// List every parameter with range and default
    #[command(name = "params")]
    Params,
}
