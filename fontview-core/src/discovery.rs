//! Font file recognition shared by listing, search and the startup argument.

use std::path::Path;

/// Extensions (lowercase, without the dot) that the catalog treats as fonts.
pub const FONT_EXTENSIONS: [&str; 5] = ["ttf", "otf", "ttc", "woff", "woff2"];

/// True when `path` carries one of [`FONT_EXTENSIONS`], compared case-insensitively.
pub fn is_font(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return false,
    };

    FONT_EXTENSIONS.contains(&ext.as_str())
}

/// Same check for a bare file name, as reported by a directory listing.
pub fn is_font_name(name: &str) -> bool {
    is_font(Path::new(name))
}

/// Accept a path handed to us from outside the sandbox ("open with").
///
/// No confinement applies here: the file only has to exist and look like a font.
pub fn is_openable_font(path: &Path) -> bool {
    path.is_file() && is_font(path)
}
