//! External mirror tool
//!
//! The builder hands every copy to a `Mirror`. The production
//! implementation runs `robocopy` in mirror mode; tests substitute a
//! recording fake. Only the exit status and the captured output streams
//! are consumed, and `CopyOutcome::classify` is the single place that
//! turns an exit status into success, warning or failure.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;

use crate::config::CopySettings;
use crate::error::{BackupError, BackupResult};

/// Highest exit status that is a silent success
pub const SUCCESS_MAX: i32 = 1;
/// Lowest exit status that is a hard failure
pub const FAILURE_MIN: i32 = 8;
/// Warning output is truncated to this many characters
pub const WARNING_MAX_CHARS: usize = 500;

/// One copy to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRequest {
    /// Source folder, or volume root with trailing separator
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Raw result of one mirror tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorStatus {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl MirrorStatus {
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }
}

/// Classified result of a copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Success,
    /// Copy finished with something worth reporting; the run continues
    Warning { code: i32, message: String },
    /// Copy failed; the run must abort
    Failure { code: Option<i32>, message: String },
}

impl CopyOutcome {
    /// Apply the exit status policy: 0-1 success, 2-7 warning, 8+ failure
    pub fn classify(status: &MirrorStatus) -> Self {
        match status.code {
            Some(code) if (0..=SUCCESS_MAX).contains(&code) => Self::Success,
            Some(code) if code > SUCCESS_MAX && code < FAILURE_MIN => Self::Warning {
                code,
                message: truncate_chars(&status.stdout, WARNING_MAX_CHARS),
            },
            Some(code) => Self::Failure {
                code: Some(code),
                message: format!("robocopy failed with code {}: {}", code, status.stderr.trim()),
            },
            None => Self::Failure {
                code: None,
                message: format!("robocopy was terminated: {}", status.stderr.trim()),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// Runs one mirror copy
pub trait Mirror {
    /// Copy `request.source` onto `request.destination`, making the
    /// destination an exact mirror
    ///
    /// An `Err` means the tool could not be run at all.
    fn mirror(&self, request: &MirrorRequest) -> BackupResult<MirrorStatus>;
}

impl<M: Mirror + ?Sized> Mirror for &M {
    fn mirror(&self, request: &MirrorRequest) -> BackupResult<MirrorStatus> {
        (**self).mirror(request)
    }
}

/// `Mirror` backed by the `robocopy` executable
#[derive(Debug, Clone)]
pub struct RobocopyMirror {
    program: OsString,
    settings: CopySettings,
}

impl RobocopyMirror {
    pub fn new(settings: CopySettings) -> Self {
        Self {
            program: OsString::from("robocopy"),
            settings,
        }
    }

    /// Use a different executable (a wrapper script, a full path)
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Command-line arguments for one request
    pub fn args(&self, request: &MirrorRequest) -> Vec<OsString> {
        vec![
            request.source.clone().into_os_string(),
            request.destination.clone().into_os_string(),
            "/MIR".into(),
            format!("/R:{}", self.settings.retries).into(),
            format!("/W:{}", self.settings.wait_secs).into(),
            "/NP".into(),
            "/NJH".into(),
            "/NJS".into(),
        ]
    }
}

impl Mirror for RobocopyMirror {
    fn mirror(&self, request: &MirrorRequest) -> BackupResult<MirrorStatus> {
        let output = Command::new(&self.program)
            .args(self.args(request))
            .output()
            .map_err(|e| {
                BackupError::Mirror(format!(
                    "Failed to run {}: {}",
                    self.program.to_string_lossy(),
                    e
                ))
            })?;

        Ok(MirrorStatus {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
