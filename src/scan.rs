//! Image discovery.
//!
//! First step of every build. Lists the images sitting directly in the source
//! directory; subdirectories and other files are ignored:
//!
//! ```text
//! images/
//! ├── a.jpg          ✓
//! ├── B.PNG          ✓  (extension match is case-insensitive)
//! ├── logo.svg       ✓
//! ├── notes.txt      ✗  (not an image extension)
//! └── drafts/        ✗  (not scanned)
//!     └── c.jpg
//! ```
//!
//! The result is sorted by filename so the manifest, and therefore the
//! generated page, is identical from one build to the next.
//!
//! An unreadable source directory is not an error: the build goes ahead with
//! zero images and a warning.

use std::fs;
use std::path::Path;
use tracing::warn;

/// Extensions (lower-case, without the dot) that count as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];

/// An image found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImageAsset {
    /// File name including extension, e.g. `Logo.PNG`.
    pub filename: String,
    /// Lower-cased extension, e.g. `png`.
    pub extension: String,
}

impl ImageAsset {
    /// Build an asset from a file name, or `None` if the extension is not an image type.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = image_extension(Path::new(filename))?;
        Some(Self {
            filename: filename.to_string(),
            extension,
        })
    }
}

/// Lower-cased extension of `path` if it is on the image allow-list.
pub fn image_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Whether `path` names an image by extension. Does not touch the filesystem.
pub fn is_image_path(path: &Path) -> bool {
    image_extension(path).is_some()
}

/// List images directly inside `dir`, sorted by filename.
///
/// Never fails: a missing or unreadable directory logs a warning and returns
/// an empty list.
pub fn scan_images(dir: &Path) -> Vec<ImageAsset> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read images directory {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut images: Vec<ImageAsset> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {e}", dir.display());
                None
            }
        })
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name();
            match name.to_str() {
                Some(name) => ImageAsset::from_filename(name),
                None => {
                    warn!("Skipping non UTF-8 file name {:?}", name);
                    None
                }
            }
        })
        .collect();

    images.sort_by(|a, b| a.filename.cmp(&b.filename));
    images
}
