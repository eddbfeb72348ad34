use std::path::PathBuf;

use thiserror::Error;

/// A single problem found while validating a job draft.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationIssue {
    #[error("room {index}: name is empty")]
    EmptyRoomName { index: usize },

    #[error("room \"{name}\" is listed more than once")]
    DuplicateRoomName { name: String },

    #[error("{scope}: file `{}` is missing or is not a readable file", .path.display())]
    UnreadableFile { scope: String, path: PathBuf },

    #[error("{scope}: camera angle {index} has no name")]
    EmptyAngleName { scope: String, index: usize },

    #[error("no camera angles defined anywhere in the job")]
    NoCameraAngles,
}

/// All validation problems for a draft, reported together so the caller
/// can fix everything in one pass.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("job validation failed with {} issue(s){}", .issues.len(), render_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn render_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(|issue| format!("\n  - {issue}")).collect()
}

/// Failure while turning a job section + camera angle into a request.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("job has no room at index {0}")]
    UnknownRoom(usize),

    #[error("{scope} has no camera angle at index {index}")]
    UnknownAngle { scope: String, index: usize },

    #[error("failed to read reference file `{}`: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
