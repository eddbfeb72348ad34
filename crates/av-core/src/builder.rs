//! Turns raw caller-collected state into a validated [`RenderJob`].
//!
//! Validation is aggregated: every violation is collected before the
//! builder returns, so a user can fix all of them in one pass.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;

use crate::error::{ValidationError, ValidationIssue};
use crate::files::kind_from_path;
use crate::job::{
    CameraAngle, DEFAULT_MODEL, DEFAULT_PROJECT_NAME, EXTERIOR_LABEL, ExteriorInput, FileInput,
    FinishEntry, FinishSpec, RenderJob, RoomInput,
};

/// Raw camera angle as supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AngleDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Raw inputs for one section (exterior or a room).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionDraft {
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub finishes: Vec<FinishEntry>,
    #[serde(default)]
    pub angles: Vec<AngleDraft>,
}

/// Raw inputs for one room.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomDraft {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub section: SectionDraft,
}

/// Everything the presentation layer collected, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDraft {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub style_notes: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub exterior: SectionDraft,
    #[serde(default)]
    pub rooms: Vec<RoomDraft>,
}

/// Validate a draft and build the immutable job from it.
///
/// Blank project name and model id are defaulted, not rejected. No side
/// effects beyond reading file metadata.
pub fn build(draft: &JobDraft) -> Result<RenderJob, ValidationError> {
    let mut issues = Vec::new();

    let mut seen_names = HashSet::new();
    for (index, room) in draft.rooms.iter().enumerate() {
        let name = room.name.trim();
        if name.is_empty() {
            issues.push(ValidationIssue::EmptyRoomName { index });
        } else if !seen_names.insert(name.to_lowercase()) {
            issues.push(ValidationIssue::DuplicateRoomName { name: name.to_string() });
        }
    }

    check_section(EXTERIOR_LABEL, &draft.exterior, &mut issues);
    for room in &draft.rooms {
        let scope = if room.name.trim().is_empty() { "room" } else { room.name.trim() };
        check_section(scope, &room.section, &mut issues);
    }

    let total_angles = draft.exterior.angles.len()
        + draft.rooms.iter().map(|r| r.section.angles.len()).sum::<usize>();
    if total_angles == 0 {
        issues.push(ValidationIssue::NoCameraAngles);
    }

    if !issues.is_empty() {
        return Err(ValidationError { issues });
    }

    Ok(RenderJob {
        project_name: non_blank(&draft.project_name, DEFAULT_PROJECT_NAME),
        style_notes: draft.style_notes.trim().to_string(),
        model_id: non_blank(&draft.model_id, DEFAULT_MODEL),
        exterior: ExteriorInput {
            reference_files: file_inputs(&draft.exterior.files),
            notes: draft.exterior.notes.trim().to_string(),
            finishes: FinishSpec { entries: draft.exterior.finishes.clone() },
            camera_angles: camera_angles(&draft.exterior.angles),
        },
        rooms: draft
            .rooms
            .iter()
            .map(|room| RoomInput {
                name: room.name.trim().to_string(),
                reference_files: file_inputs(&room.section.files),
                notes: room.section.notes.trim().to_string(),
                finishes: FinishSpec { entries: room.section.finishes.clone() },
                camera_angles: camera_angles(&room.section.angles),
            })
            .collect(),
        created_at: Utc::now(),
    })
}

fn check_section(scope: &str, section: &SectionDraft, issues: &mut Vec<ValidationIssue>) {
    for path in &section.files {
        if !is_readable_file(path) {
            issues.push(ValidationIssue::UnreadableFile {
                scope: scope.to_string(),
                path: path.clone(),
            });
        }
    }
    for (index, angle) in section.angles.iter().enumerate() {
        if angle.name.trim().is_empty() {
            issues.push(ValidationIssue::EmptyAngleName { scope: scope.to_string(), index });
        }
    }
}

fn is_readable_file(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}

fn non_blank(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() { default.to_string() } else { trimmed.to_string() }
}

fn file_inputs(paths: &[PathBuf]) -> Vec<FileInput> {
    paths
        .iter()
        .map(|path| FileInput { path: path.clone(), kind: kind_from_path(path) })
        .collect()
}

fn camera_angles(drafts: &[AngleDraft]) -> Vec<CameraAngle> {
    drafts
        .iter()
        .map(|draft| CameraAngle {
            name: draft.name.trim().to_string(),
            description: draft.description.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::FileKind;
    use std::io::Write;

    fn angle(name: &str) -> AngleDraft {
        AngleDraft { name: name.into(), description: String::new() }
    }

    fn room(name: &str, angles: Vec<AngleDraft>) -> RoomDraft {
        RoomDraft {
            name: name.into(),
            section: SectionDraft { angles, ..Default::default() },
        }
    }

    #[test]
    fn test_build_minimal_valid_draft() {
        let draft = JobDraft {
            exterior: SectionDraft { angles: vec![angle("front")], ..Default::default() },
            ..Default::default()
        };
        let job = build(&draft).unwrap();
        assert_eq!(job.project_name, DEFAULT_PROJECT_NAME);
        assert_eq!(job.model_id, DEFAULT_MODEL);
        assert_eq!(job.angle_count(), 1);
    }

    #[test]
    fn test_reject_draft_without_angles() {
        let draft = JobDraft {
            rooms: vec![room("Kitchen", Vec::new())],
            ..Default::default()
        };
        let err = build(&draft).unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::NoCameraAngles]);
    }

    #[test]
    fn test_reject_duplicate_room_names_case_insensitive() {
        let draft = JobDraft {
            rooms: vec![
                room("Kitchen", vec![angle("corner")]),
                room("kitchen", Vec::new()),
            ],
            ..Default::default()
        };
        let err = build(&draft).unwrap_err();
        assert!(err
            .issues
            .contains(&ValidationIssue::DuplicateRoomName { name: "kitchen".into() }));
    }

    #[test]
    fn test_reject_missing_file() {
        let draft = JobDraft {
            exterior: SectionDraft {
                files: vec![PathBuf::from("/definitely/not/here.png")],
                angles: vec![angle("front")],
                ..Default::default()
            },
            ..Default::default()
        };
        let err = build(&draft).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(matches!(err.issues[0], ValidationIssue::UnreadableFile { .. }));
    }

    #[test]
    fn test_all_violations_reported_together() {
        let draft = JobDraft {
            rooms: vec![
                room("", Vec::new()),
                RoomDraft {
                    name: "Study".into(),
                    section: SectionDraft {
                        files: vec![PathBuf::from("/missing.pdf")],
                        angles: vec![angle("")],
                        ..Default::default()
                    },
                },
            ],
            ..Default::default()
        };
        let err = build(&draft).unwrap_err();
        // empty room name, missing file, empty angle name; the named angle
        // slot still counts toward the angle total.
        assert_eq!(err.issues.len(), 3);
    }

    #[test]
    fn test_accepts_existing_file_and_classifies_it() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"not really a png").unwrap();

        let draft = JobDraft {
            exterior: SectionDraft {
                files: vec![file.path().to_path_buf()],
                angles: vec![angle("front")],
                ..Default::default()
            },
            ..Default::default()
        };
        let job = build(&draft).unwrap();
        assert_eq!(job.exterior.reference_files[0].kind, FileKind::Image);
    }
}
