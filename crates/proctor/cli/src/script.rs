//! Replay scripts.
//!
//! A script is a TOML file listing timed steps against a headless session:
//!
//! ```toml
//! duration_ms = 120000
//!
//! [[steps]]
//! at_ms = 0
//! action = "start"
//!
//! [[steps]]
//! at_ms = 30000
//! action = "faces"
//! count = 0
//! ```
//!
//! Steps either deliver a platform event to the monitor or change what the
//! headless camera, fullscreen control and face model report.

use std::path::Path;

use proctor_types::ClipboardAction;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// A scripted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayScript {
    /// Virtual time at which the replay stops if the session is still live.
    pub duration_ms: u64,

    /// Detection loop cadence; defaults to the monitor config's.
    #[serde(default)]
    pub frame_interval_ms: Option<u64>,

    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// One timed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

/// What happens at a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Candidate presses start; camera, fullscreen and model are set up.
    Start,
    FullscreenExit,
    FullscreenEnter,
    TabHidden,
    TabVisible,
    Clipboard { clipboard: ClipboardAction },
    AcknowledgeWarning,
    ScreenConfiguration { extended: bool },
    /// Stop generating mouse and keyboard activity.
    GoIdle,
    /// Resume activity.
    Resume,
    Submit,

    /// Number of faces the model reports from now on.
    Faces { count: usize },
    AudioLevel { level: f64 },
    FreezeCamera { frozen: bool },
    PauseCamera { paused: bool },
    BlankCamera { blank: bool },
    /// Next camera acquisition is refused.
    DenyCamera { message: String },
    /// Next fullscreen request is refused.
    DenyFullscreen { message: String },
    /// Model fails to load.
    FailModelLoad { message: String },
    /// The next inference call fails.
    InferenceError,
    /// Stream drops mid-session.
    CameraLost { message: String },
}

impl ReplayScript {
    pub fn parse(contents: &str) -> CliResult<Self> {
        let script: ReplayScript =
            toml::from_str(contents).map_err(|e| CliError::Script(e.to_string()))?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    fn validate(&self) -> CliResult<()> {
        if self.frame_interval_ms == Some(0) {
            return Err(CliError::Script("frame_interval_ms must be positive".into()));
        }
        if let Some(step) = self.steps.iter().find(|s| s.at_ms > self.duration_ms) {
            return Err(CliError::Script(format!(
                "step at {}ms is past the script duration of {}ms",
                step.at_ms, self.duration_ms
            )));
        }
        Ok(())
    }

    /// Steps in time order; steps sharing a timestamp keep file order.
    pub fn ordered_steps(&self) -> Vec<ScriptStep> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|s| s.at_ms);
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = ReplayScript::parse(
            r#"
duration_ms = 60000
frame_interval_ms = 250

[[steps]]
at_ms = 0
action = "start"

[[steps]]
at_ms = 5000
action = "clipboard"
clipboard = "paste"

[[steps]]
at_ms = 8000
action = "faces"
count = 2
"#,
        )
        .unwrap();

        assert_eq!(script.frame_interval_ms, Some(250));
        assert_eq!(script.steps.len(), 3);
        assert_eq!(script.steps[0].action, Action::Start);
        assert_eq!(
            script.steps[1].action,
            Action::Clipboard {
                clipboard: ClipboardAction::Paste
            }
        );
        assert_eq!(script.steps[2].action, Action::Faces { count: 2 });
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = ReplayScript::parse(
            "duration_ms = 1000\n[[steps]]\nat_ms = 0\naction = \"teleport\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Script(_)));
    }

    #[test]
    fn test_step_past_duration_rejected() {
        let err = ReplayScript::parse(
            "duration_ms = 1000\n[[steps]]\nat_ms = 2000\naction = \"submit\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("past the script duration"));
    }

    #[test]
    fn test_steps_ordered_stably() {
        let script = ReplayScript::parse(
            r#"
duration_ms = 10000

[[steps]]
at_ms = 500
action = "submit"

[[steps]]
at_ms = 0
action = "start"

[[steps]]
at_ms = 500
action = "tab_hidden"
"#,
        )
        .unwrap();
        let actions: Vec<_> = script.ordered_steps().into_iter().map(|s| s.action).collect();
        assert_eq!(actions, vec![Action::Start, Action::Submit, Action::TabHidden]);
    }
}
