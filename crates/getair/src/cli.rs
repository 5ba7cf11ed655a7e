//! Clap derive structures for the `getair` CLI.

use clap::{Args, Parser, Subcommand};

// ── Top-level CLI ────────────────────────────────────────────────────

/// getair -- drive getAir SmartControl ventilation systems
#[derive(Debug, Parser)]
#[command(
    name = "getair",
    version,
    about = "Control getAir SmartControl ventilation systems from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile from the config file
    #[arg(long, short = 'p', env = "GETAIR_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device id (overrides the profile)
    #[arg(long, short = 'd', env = "GETAIR_DEVICE_ID", global = true)]
    pub device_id: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Command tree ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show system-level state
    #[command(alias = "st")]
    Status,

    /// Show per-zone state
    #[command(alias = "z")]
    Zones,

    /// List all entities with their current values
    #[command(alias = "ent")]
    Entities,

    /// List devices registered to the account
    Devices,

    /// Write a zone property
    #[command(subcommand)]
    Set(SetCommand),

    /// Reset a zone counter
    #[command(subcommand)]
    Reset(ResetCommand),

    /// Poll continuously and print snapshot summaries
    #[command(alias = "w")]
    Watch,
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Fan speed as a percentage (snaps to the nearest step)
    Speed {
        /// Zone index (1-3)
        zone: u8,
        /// 0-100
        percentage: u8,
    },

    /// Operating mode (label or wire value, e.g. "Auto" or "auto")
    Mode {
        /// Zone index (1-3)
        zone: u8,
        mode: String,
    },

    /// Active time profile, by name
    Profile {
        /// Zone index (1-3)
        zone: u8,
        name: String,
    },

    /// Target temperature in °C (10.0-30.0)
    TargetTemp {
        /// Zone index (1-3)
        zone: u8,
        celsius: f64,
    },

    /// Target humidity level (Off, Low, Medium, High)
    Humidity {
        /// Zone index (1-3)
        zone: u8,
        level: String,
    },

    /// Zone display name (1-50 characters)
    Name {
        /// Zone index (1-3)
        zone: u8,
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ResetCommand {
    /// Reset the filter runtime counter to zero
    Filter {
        /// Zone index (1-3)
        zone: u8,
    },

    /// Clear the armed mode deadline
    Deadline {
        /// Zone index (1-3)
        zone: u8,
    },
}
