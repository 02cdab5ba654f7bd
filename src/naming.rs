//! Filename and directory conventions
//!
//! Album directories are `ALBUM_<Sanitized_Title>`; per-track artifacts
//! are `NN_Title.wav` / `NN_Title.json`. Sanitization keeps alphanumerics,
//! space, underscore and hyphen, then collapses spaces to underscores so
//! names survive every filesystem the output lands on.

/// Strip a string down to filesystem-safe characters.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

/// Directory name for one album.
pub fn album_dir_name(album_title: &str) -> String {
    let safe = sanitize(album_title);
    if safe.is_empty() {
        "ALBUM_Untitled".to_string()
    } else {
        format!("ALBUM_{safe}")
    }
}

/// Base name (no extension) for a track artifact pair.
pub fn track_basename(track_num: usize, title: &str) -> String {
    let safe = sanitize(title);
    if safe.is_empty() {
        format!("{track_num:02}_Untitled_{track_num}")
    } else {
        format!("{track_num:02}_{safe}")
    }
}
