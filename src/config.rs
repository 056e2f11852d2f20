//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::state::{CyclePolicy, TimerSettings};

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "focus-timer")]
#[command(about = "A background-durable Pomodoro timer authority")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Focus phase length in minutes
    #[arg(short, long, default_value = "25")]
    pub focus_minutes: u32,

    /// Short break length in minutes
    #[arg(long, default_value = "5")]
    pub short_break_minutes: u32,

    /// Long break length in minutes
    #[arg(long, default_value = "15")]
    pub long_break_minutes: u32,

    /// Focus sessions before a long break is owed
    #[arg(short, long, default_value = "4")]
    pub sessions_per_cycle: u32,

    /// Only run focus phases, never breaks
    #[arg(long)]
    pub focus_only: bool,

    /// Stop in the next phase after expiry instead of running straight on
    #[arg(long)]
    pub manual_advance: bool,

    /// Authority tick interval in milliseconds
    #[arg(long, default_value = "1000")]
    pub tick_ms: u64,

    /// File to persist the cycle position in across restarts
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Disable desktop notifications entirely
    #[arg(long)]
    pub no_notifications: bool,

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

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }

    /// Timer settings with every length at least one minute
    pub fn timer_settings(&self) -> TimerSettings {
        let policy = if self.focus_only {
            CyclePolicy::FocusOnly
        } else {
            CyclePolicy::Full {
                sessions_per_cycle: self.sessions_per_cycle.max(1),
            }
        };

        TimerSettings {
            focus_seconds: self.focus_minutes.max(1).saturating_mul(60),
            short_break_seconds: self.short_break_minutes.max(1).saturating_mul(60),
            long_break_seconds: self.long_break_minutes.max(1).saturating_mul(60),
            policy,
            manual_advance: self.manual_advance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let config = Config::try_parse_from(["focus-timer"]).unwrap();
        assert_eq!(config.timer_settings(), TimerSettings::default());
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.tick(), Duration::from_secs(1));
    }

    #[test]
    fn huge_lengths_saturate() {
        let config = Config::try_parse_from([
            "focus-timer",
            "--focus-minutes",
            "4294967295",
            "--long-break-minutes",
            "100000000",
        ])
        .unwrap();
        let settings = config.timer_settings();
        assert_eq!(settings.focus_seconds, u32::MAX);
        assert_eq!(settings.long_break_seconds, u32::MAX);
        assert_eq!(settings.short_break_seconds, 300);
    }

    #[test]
    fn zero_lengths_are_clamped() {
        let config = Config::try_parse_from([
            "focus-timer",
            "--focus-minutes",
            "0",
            "--sessions-per-cycle",
            "0",
            "--tick-ms",
            "0",
        ])
        .unwrap();
        let settings = config.timer_settings();
        assert_eq!(settings.focus_seconds, 60);
        assert_eq!(settings.policy.sessions_per_cycle(), Some(1));
        assert_eq!(config.tick(), Duration::from_millis(10));
    }

    #[test]
    fn focus_only_flag_selects_degenerate_cycle() {
        let config = Config::try_parse_from(["focus-timer", "--focus-only", "-v"]).unwrap();
        assert_eq!(config.timer_settings().policy, CyclePolicy::FocusOnly);
        assert_eq!(config.log_level(), "debug");
    }
}
