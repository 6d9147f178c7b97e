//! Command-line interface for dragon_client.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dragon_client::GameMode;

/// Dragon client - play formula rewriting games from the terminal
#[derive(Parser, Debug)]
#[command(name = "dragon_client")]
#[command(about = "Console client for the formula rewriting game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Game API base URL, overriding config and environment
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Game mode as typed on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Timed play
    Normal,
    /// Untimed play, theorems can be created
    Theorem,
}

impl From<ModeArg> for GameMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => GameMode::Normal,
            ModeArg::Theorem => GameMode::Theorem,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a game and play it interactively
    Play {
        /// Game mode
        #[arg(long, value_enum, default_value_t = ModeArg::Normal)]
        mode: ModeArg,

        /// Rule set the server applies
        #[arg(long)]
        rule_set: String,

        /// Formula to solve
        #[arg(long)]
        formula_id: String,

        /// Allow user theorems as rules
        #[arg(long)]
        use_theorem: bool,

        /// Formula text shown before the first state arrives
        #[arg(long)]
        formula_latex: Option<String>,

        /// Countdown length for this game, in seconds
        #[arg(long)]
        remaining_secs: Option<u64>,
    },

    /// Print the effective configuration as TOML
    Config,
}
