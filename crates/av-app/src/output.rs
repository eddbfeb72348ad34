//! Output directory layout: one timestamped directory per run, one
//! subdirectory per section, one image file per camera angle.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::OutputError;

const RUN_DIR_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Reduce a section or angle name to a safe path component.
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() { "untitled".to_string() } else { trimmed.to_string() }
}

/// Create `root/<timestamp>/` for this run, appending a counter when an
/// earlier run already claimed the same second.
pub fn create_run_dir(root: &Path, started_at: DateTime<Utc>) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(root)
        .map_err(|source| OutputError { path: root.to_path_buf(), source })?;

    let stamp = started_at.format(RUN_DIR_FORMAT).to_string();
    let mut candidate = root.join(&stamp);
    let mut counter = 2;
    while candidate.exists() {
        candidate = root.join(format!("{stamp}-{counter}"));
        counter += 1;
    }
    fs::create_dir(&candidate)
        .map_err(|source| OutputError { path: candidate.clone(), source })?;
    Ok(candidate)
}

/// File name for one rendered angle.
///
/// The 1-based position prefix keeps same-named angles within a section
/// from colliding; the extension is sniffed from the returned bytes.
pub fn angle_file_name(position: usize, angle_name: &str, bytes: &[u8]) -> String {
    format!("{position:02}-{}.{}", sanitize(angle_name), extension_for(bytes))
}

fn extension_for(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(format) => format.extensions_str().first().copied().unwrap_or("png"),
        Err(_) => "png",
    }
}

/// Write image bytes under `dir`, creating it as needed.
///
/// Writes to a dot-prefixed temp name and renames into place, so a
/// failed angle cannot leave a partial file at the final path.
pub fn write_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(dir)
        .map_err(|source| OutputError { path: dir.to_path_buf(), source })?;

    let final_path = dir.join(file_name);
    let tmp_path = dir.join(format!(".{file_name}.tmp"));
    if let Err(source) = fs::write(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(OutputError { path: final_path, source });
    }
    if let Err(source) = fs::rename(&tmp_path, &final_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(OutputError { path: final_path, source });
    }
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0";

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Living Room"), "Living_Room");
        assert_eq!(sanitize("Front 45°"), "Front_45");
        assert_eq!(sanitize("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize("***"), "untitled");
    }

    #[test]
    fn test_angle_file_name_extensions() {
        assert_eq!(angle_file_name(1, "front", PNG_MAGIC), "01-front.png");
        assert_eq!(angle_file_name(12, "corner view", JPEG_MAGIC), "12-corner_view.jpg");
        // Unknown payloads still get a usable name.
        assert_eq!(angle_file_name(2, "x", b"??"), "02-x.png");
    }

    #[test]
    fn test_create_run_dir_never_reuses_a_directory() {
        let root = tempfile::tempdir().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let first = create_run_dir(root.path(), at).unwrap();
        let second = create_run_dir(root.path(), at).unwrap();
        assert_ne!(first, second);
        assert!(first.ends_with("20240501-120000"));
        assert!(second.ends_with("20240501-120000-2"));
    }

    #[test]
    fn test_write_image_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exterior");
        let path = write_image(&target, "01-front.png", PNG_MAGIC).unwrap();
        assert_eq!(fs::read(&path).unwrap(), PNG_MAGIC);

        let names: Vec<String> = fs::read_dir(&target)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01-front.png".to_string()]);
    }
}
