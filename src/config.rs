//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::services::NotificationPermission;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "taskwise-timer")]
#[command(about = "A pomodoro timer kept in sync across every instance sharing a data directory")]
#[command(version)]
pub struct Config {
    /// Port to bind the presentation API to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the shared timer_state and timer_settings records
    #[arg(short, long, default_value = ".taskwise")]
    pub data_dir: PathBuf,

    /// Desktop notification permission; `default` probes for notify-send
    #[arg(long, value_enum, default_value_t = NotificationPermission::Default)]
    pub notifications: NotificationPermission,

    /// Sound file played with paplay on completion (terminal bell when unset)
    #[arg(long)]
    pub alarm_sound: Option<PathBuf>,

    /// Start the instance in the background (no ticking until made visible)
    #[arg(long)]
    pub background: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
