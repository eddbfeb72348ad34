use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::files::FileKind;

/// Model used when the draft leaves the field blank.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Project name used when the draft leaves the field blank.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// Directory label and report label for the exterior section.
pub const EXTERIOR_LABEL: &str = "exterior";

/// A user-provided plan or reference file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInput {
    pub path: PathBuf,
    pub kind: FileKind,
}

/// A named viewpoint for which one render is generated.
///
/// Angles are immutable once part of a job and are identified by their
/// position in the owning section's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraAngle {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One surface/material category and its free-text description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishEntry {
    pub surface: String,
    pub description: String,
}

/// Ordered material notes, e.g. "exterior walls" -> "white stucco".
///
/// Order is the user's order and is preserved: prompt output depends on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinishSpec {
    pub entries: Vec<FinishEntry>,
}

impl FinishSpec {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Inputs for the building exterior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExteriorInput {
    pub reference_files: Vec<FileInput>,
    pub notes: String,
    pub finishes: FinishSpec,
    pub camera_angles: Vec<CameraAngle>,
}

/// Inputs for one interior room. Names are unique within a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInput {
    pub name: String,
    pub reference_files: Vec<FileInput>,
    pub notes: String,
    pub finishes: FinishSpec,
    pub camera_angles: Vec<CameraAngle>,
}

/// A full render request: exterior plus rooms, built once from a draft
/// and consumed read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub project_name: String,
    pub style_notes: String,
    pub model_id: String,
    pub exterior: ExteriorInput,
    pub rooms: Vec<RoomInput>,
    pub created_at: DateTime<Utc>,
}

/// Identifies which part of a job a camera angle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Exterior,
    Room(usize),
}

/// Borrowed view of one job section, uniform across exterior and rooms.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub label: &'a str,
    pub files: &'a [FileInput],
    pub notes: &'a str,
    pub finishes: &'a FinishSpec,
    pub angles: &'a [CameraAngle],
}

impl RenderJob {
    /// Total camera angles across the exterior and all rooms.
    pub fn angle_count(&self) -> usize {
        self.exterior.camera_angles.len()
            + self.rooms.iter().map(|r| r.camera_angles.len()).sum::<usize>()
    }

    /// Resolve a selector to its section, if it exists in this job.
    pub fn section(&self, selector: Selector) -> Option<Section<'_>> {
        match selector {
            Selector::Exterior => Some(Section {
                label: EXTERIOR_LABEL,
                files: &self.exterior.reference_files,
                notes: &self.exterior.notes,
                finishes: &self.exterior.finishes,
                angles: &self.exterior.camera_angles,
            }),
            Selector::Room(index) => self.rooms.get(index).map(|room| Section {
                label: &room.name,
                files: &room.reference_files,
                notes: &room.notes,
                finishes: &room.finishes,
                angles: &room.camera_angles,
            }),
        }
    }

    /// All sections in render order: exterior first, then rooms as listed.
    pub fn sections(&self) -> impl Iterator<Item = (Selector, Section<'_>)> {
        let exterior = (
            Selector::Exterior,
            Section {
                label: EXTERIOR_LABEL,
                files: &self.exterior.reference_files,
                notes: &self.exterior.notes,
                finishes: &self.exterior.finishes,
                angles: &self.exterior.camera_angles,
            },
        );
        let rooms = self.rooms.iter().enumerate().map(|(index, room)| {
            (
                Selector::Room(index),
                Section {
                    label: &room.name,
                    files: &room.reference_files,
                    notes: &room.notes,
                    finishes: &room.finishes,
                    angles: &room.camera_angles,
                },
            )
        });
        std::iter::once(exterior).chain(rooms)
    }
}
