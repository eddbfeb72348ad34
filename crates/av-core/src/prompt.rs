//! Maps one (job, section, camera angle) triple to a generation request.
//!
//! The template is fixed: style, then materials, then section context,
//! then camera instructions. Output is deterministic for identical
//! inputs; reference files are re-read on every build because they may
//! have moved since the job was validated.

use std::fmt::Write as _;
use std::fs;

use crate::error::PromptError;
use crate::job::{RenderJob, Section, Selector};

/// One reference attachment, ready for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceBlob {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Ephemeral payload for a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model_id: String,
    pub prompt: String,
    pub references: Vec<ReferenceBlob>,
}

/// Build the request for one camera angle of one section.
pub fn build_request(
    job: &RenderJob,
    selector: Selector,
    angle_index: usize,
) -> Result<GenerationRequest, PromptError> {
    let section = match (job.section(selector), selector) {
        (Some(section), _) => section,
        (None, Selector::Room(index)) => return Err(PromptError::UnknownRoom(index)),
        // The exterior section always resolves.
        (None, Selector::Exterior) => unreachable!(),
    };
    let angle = section.angles.get(angle_index).ok_or_else(|| PromptError::UnknownAngle {
        scope: section.label.to_string(),
        index: angle_index,
    })?;

    let prompt = render_prompt(job, selector, &section, &angle.name, &angle.description);

    let mut references = Vec::with_capacity(section.files.len());
    for file in section.files {
        let bytes = fs::read(&file.path).map_err(|source| PromptError::FileAccess {
            path: file.path.clone(),
            source,
        })?;
        references.push(ReferenceBlob {
            mime: crate::files::guess_mime(&file.path).to_string(),
            bytes,
        });
    }
    log::debug!(
        "built prompt for {}/{} ({} reference file(s), {} chars)",
        section.label,
        angle.name,
        references.len(),
        prompt.len()
    );

    Ok(GenerationRequest { model_id: job.model_id.clone(), prompt, references })
}

fn render_prompt(
    job: &RenderJob,
    selector: Selector,
    section: &Section<'_>,
    angle_name: &str,
    angle_desc: &str,
) -> String {
    let scope = match selector {
        Selector::Exterior => "exterior",
        Selector::Room(_) => "room",
    };

    let mut out = String::new();
    out.push_str("You are an architectural visualization rendering assistant.\n\n");
    out.push_str("Goal: generate a photorealistic render that is CONSISTENT across views.\n\n");

    let _ = writeln!(out, "PROJECT: {}", job.project_name);
    out.push_str("STYLE / CONSISTENCY NOTES:\n");
    let _ = writeln!(out, "{}", job.style_notes);
    out.push('\n');

    if !section.finishes.is_empty() {
        out.push_str("MATERIALS AND FINISHES:\n");
        for entry in &section.finishes.entries {
            let _ = writeln!(out, "- {}: {}", entry.surface, entry.description);
        }
        out.push('\n');
    }

    let _ = writeln!(out, "SCOPE: {scope}");
    let _ = writeln!(out, "SCOPE NAME: {}", section.label);
    if !section.notes.is_empty() {
        out.push_str("SCOPE NOTES:\n");
        let _ = writeln!(out, "{}", section.notes);
    }
    out.push('\n');

    let _ = writeln!(out, "CAMERA ANGLE NAME: {angle_name}");
    let _ = writeln!(out, "CAMERA ANGLE DETAILS: {angle_desc}");
    out.push('\n');

    out.push_str("Instructions:\n");
    out.push_str("- Maintain consistent materials, colors, and style across all generated images.\n");
    out.push_str("- Use the provided plan and material notes as ground truth.\n");
    out.push_str("- Do not invent rooms or materials that are not described.\n");
    out.push_str("- Produce a high quality, realistic render.\n\n");
    out.push_str("Return only the final image.");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{AngleDraft, JobDraft, RoomDraft, SectionDraft, build};
    use crate::job::FinishEntry;
    use std::io::Write;
    use std::path::PathBuf;

    fn draft_with_room_file(file: Option<PathBuf>) -> JobDraft {
        JobDraft {
            project_name: "Hillside House".into(),
            style_notes: "warm evening light".into(),
            rooms: vec![RoomDraft {
                name: "Kitchen".into(),
                section: SectionDraft {
                    files: file.into_iter().collect(),
                    notes: "open plan".into(),
                    finishes: vec![FinishEntry {
                        surface: "countertops".into(),
                        description: "honed granite".into(),
                    }],
                    angles: vec![AngleDraft {
                        name: "corner".into(),
                        description: "eye level, 35mm".into(),
                    }],
                },
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_prompt_contains_template_sections_in_order() {
        let job = build(&draft_with_room_file(None)).unwrap();
        let request = build_request(&job, Selector::Room(0), 0).unwrap();

        let style = request.prompt.find("STYLE / CONSISTENCY NOTES:").unwrap();
        let materials = request.prompt.find("MATERIALS AND FINISHES:").unwrap();
        let scope = request.prompt.find("SCOPE NAME: Kitchen").unwrap();
        let camera = request.prompt.find("CAMERA ANGLE NAME: corner").unwrap();
        assert!(style < materials && materials < scope && scope < camera);
        assert!(request.prompt.contains("- countertops: honed granite"));
        assert!(request.prompt.contains("eye level, 35mm"));
        assert!(request.prompt.ends_with("Return only the final image."));
    }

    #[test]
    fn test_build_request_is_deterministic() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG\r\n\x1a\nfixture").unwrap();
        let job = build(&draft_with_room_file(Some(file.path().to_path_buf()))).unwrap();

        let first = build_request(&job, Selector::Room(0), 0).unwrap();
        let second = build_request(&job, Selector::Room(0), 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.references.len(), 1);
        assert_eq!(first.references[0].mime, "image/png");
    }

    #[test]
    fn test_missing_file_is_reported_at_build_time() {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        let path = file.path().to_path_buf();
        let job = build(&draft_with_room_file(Some(path))).unwrap();

        // The file disappears between job build and prompt build.
        drop(file);

        let err = build_request(&job, Selector::Room(0), 0).unwrap_err();
        assert!(matches!(err, PromptError::FileAccess { .. }));
    }

    #[test]
    fn test_unknown_angle_index() {
        let job = build(&draft_with_room_file(None)).unwrap();
        let err = build_request(&job, Selector::Room(0), 5).unwrap_err();
        assert!(matches!(err, PromptError::UnknownAngle { .. }));
    }
}
