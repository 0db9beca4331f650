//! Clap derive structures for the `intesis` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use intesis_core::Capability;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// intesis -- bridge IntesisHome HVAC units from the command line
#[derive(Debug, Parser)]
#[command(
    name = "intesis",
    version,
    about = "Control IntesisHome HVAC units from the command line",
    long_about = "Reads and writes IntesisHome cloud devices through the same\n\
        synchronization core a smart-home bridge uses: OAuth2 token refresh,\n\
        a coalesced config cache, and value mapping to host characteristics.",
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

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "INTESIS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Cloud base URL (overrides apiBaseURL)
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Account username (overrides the config file)
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Account password (prefer INTESIS_PASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "INTESIS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and inspect HVAC units
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Read one capability of a unit
    Get(GetArgs),

    /// Write one capability of a unit
    Set(SetArgs),

    /// Poll the cloud and print characteristic changes
    Watch(WatchArgs),

    /// Run the motion debounce filter over raw events read from stdin
    Motion(MotionArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List units with their current values
    #[command(alias = "ls")]
    List,

    /// Show every service reported for a unit
    Show {
        /// Device ID or name
        device: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GET / SET
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Device ID or name
    pub device: String,

    /// power, mode, fan-speed, heating-threshold, cooling-threshold,
    /// current-temperature
    pub capability: Capability,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Device ID or name
    pub device: String,

    /// power, mode, fan-speed, heating-threshold, cooling-threshold
    pub capability: Capability,

    /// New value: on/off, auto/heat/cool, 1-4, or degrees Celsius
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only print changes for this device (ID or name)
    pub device: Option<String>,

    /// Poll interval in seconds (defaults to the config cache lifetime)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many polls
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MOTION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MotionArgs {
    /// Accessory name (overrides motion.name)
    #[arg(long)]
    pub name: Option<String>,

    /// Hold presence this long after the raw signal drops (ms)
    #[arg(long)]
    pub stop_delay_ms: Option<u64>,

    /// Ignore new motion this long after each drop (ms)
    #[arg(long, alias = "fuse-ms")]
    pub start_after_stop_fuse_ms: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration (secrets redacted)
    Show,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
