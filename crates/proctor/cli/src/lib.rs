//! # Proctor CLI
//!
//! Replays scripted sessions against the exam-integrity monitor on a virtual
//! clock, with headless providers standing in for the camera, fullscreen
//! control and face model. Useful for checking a policy configuration before
//! it reaches candidates.
//!
//! ```text
//! proctor replay session.toml --config monitor.toml --output json
//! proctor config --profile strict
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod replay;
pub mod script;

use std::io::Write;

use proctor_types::{AssessmentId, AttemptId, SessionIds, SubjectId};

pub use cli::{Cli, Commands, Profile};
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
pub use replay::{replay, ReplayEvent, ReplayReport};
pub use script::{Action, ReplayScript, ScriptStep};

/// Execute a parsed command, writing results to `out`.
pub async fn execute<W: Write>(cli: Cli, out: &mut W) -> CliResult<()> {
    let config = config::load(cli.config.as_deref(), cli.profile.into())?;

    match cli.command {
        Commands::Replay {
            script,
            output,
            assessment,
            subject,
        } => {
            let script = ReplayScript::load(&script)?;
            let ids = SessionIds::new(
                AssessmentId::new(assessment),
                AttemptId::generate(),
                SubjectId::new(subject),
            );
            let report = replay(&script, config, ids).await?;
            output::write_report(out, &report, output)
        }
        Commands::Config => {
            out.write_all(config::render(&config)?.as_bytes())?;
            Ok(())
        }
    }
}
