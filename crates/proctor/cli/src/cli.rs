//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use proctor_monitor::StrictnessProfile;

use crate::output::OutputFormat;

/// Proctor CLI application
#[derive(Debug, Parser)]
#[command(name = "proctor")]
#[command(about = "Proctor - exam-integrity monitor replay tool", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Monitor configuration file (TOML)
    #[arg(short, long, env = "PROCTOR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Strictness profile used when no configuration file is found
    #[arg(short, long, value_enum, default_value = "standard", global = true)]
    pub profile: Profile,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a scripted session and print its telemetry
    Replay {
        /// Replay script (TOML)
        script: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,

        /// Assessment identifier
        #[arg(long, default_value = "replay")]
        assessment: String,

        /// Candidate identifier
        #[arg(long, default_value = "candidate")]
        subject: String,
    },

    /// Print the effective monitor configuration
    Config,
}

/// Strictness profiles selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    Standard,
    Strict,
    Lenient,
}

impl From<Profile> for StrictnessProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Standard => StrictnessProfile::Standard,
            Profile::Strict => StrictnessProfile::Strict,
            Profile::Lenient => StrictnessProfile::Lenient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "proctor",
            "replay",
            "session.toml",
            "--output",
            "json",
            "--profile",
            "strict",
        ])
        .unwrap();
        assert_eq!(cli.profile, Profile::Strict);
        match cli.command {
            Commands::Replay { script, output, .. } => {
                assert_eq!(script, PathBuf::from("session.toml"));
                assert_eq!(output, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_replay_requires_script() {
        assert!(Cli::try_parse_from(["proctor", "replay"]).is_err());
    }
}
