//! Extension based file classification.

/// Extensions of files treated as the feature video.
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mkv", "mp4"];

/// Extensions of files treated as subtitles.
pub const SUBTITLE_EXTENSIONS: &[&str] = &["sub", "idx", "srt", "smi", "ssa", "ass", "vtt"];

/// Content category of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Subtitle,
    Other,
}

/// Final segment of a `/` separated path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part of a `/` separated path, empty when there is none.
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Lower-cased extension of the final path segment.
///
/// Returns an empty string when the file name has no `.`.
pub fn extension(path: &str) -> String {
    file_name(path)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

pub fn is_video(path: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&extension(path).as_str())
}

pub fn is_subtitle(path: &str) -> bool {
    SUBTITLE_EXTENSIONS.contains(&extension(path).as_str())
}

pub fn classify(path: &str) -> FileKind {
    let ext = extension(path);
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Video
    } else if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        FileKind::Subtitle
    } else {
        FileKind::Other
    }
}
