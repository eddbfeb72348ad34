use std::path::Path;

use serde::{Deserialize, Serialize};

/// Broad category of a user-provided reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
    Other,
}

impl Default for FileKind {
    fn default() -> Self {
        Self::Other
    }
}

/// Classify a reference file by its extension.
pub fn kind_from_path(path: &Path) -> FileKind {
    match extension_lowercase(path).as_deref() {
        Some("pdf") => FileKind::Pdf,
        Some("png" | "jpg" | "jpeg" | "webp") => FileKind::Image,
        _ => FileKind::Other,
    }
}

/// Mime type for a reference file, guessed from its extension.
///
/// Falls back to `application/octet-stream` for anything unrecognized,
/// which the generation endpoint accepts as an opaque attachment.
pub fn guess_mime(path: &Path) -> &'static str {
    match extension_lowercase(path).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(kind_from_path(Path::new("plan.pdf")), FileKind::Pdf);
        assert_eq!(kind_from_path(Path::new("photo.JPG")), FileKind::Image);
        assert_eq!(kind_from_path(Path::new("ref.webp")), FileKind::Image);
        assert_eq!(kind_from_path(Path::new("notes.txt")), FileKind::Other);
        assert_eq!(kind_from_path(&PathBuf::from("no_extension")), FileKind::Other);
    }

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a.png")), "image/png");
        assert_eq!(guess_mime(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("plan.pdf")), "application/pdf");
        assert_eq!(guess_mime(Path::new("mystery.bin")), "application/octet-stream");
    }
}
