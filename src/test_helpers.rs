//! Shared test utilities for the brand-gallery test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = fixture_config(tmp.path());
//! build(&config).unwrap();
//!
//! let html = std::fs::read_to_string(config.index_path()).unwrap();
//! assert_eq!(embedded_manifest(&html), vec!["a.jpg", "b.png", "c.GIF", "logo.svg"]);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::GalleryConfig;
use crate::scan::ImageAsset;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/project/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/project");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

/// Config pointing at a fixture copy: `images/`, `index.template.html`, `dist/`.
pub fn fixture_config(root: &Path) -> GalleryConfig {
    GalleryConfig::rooted_at(root)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Extractors
// =========================================================================

/// Filenames of scanned assets, in order.
pub fn filenames(images: &[ImageAsset]) -> Vec<&str> {
    images.iter().map(|i| i.filename.as_str()).collect()
}

/// Sorted entry names of a directory. Panics if it cannot be read.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot list {}: {e}", dir.display()))
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Sorted `(name, contents)` pairs of the files in a directory.
pub fn dir_snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    dir_listing(dir)
        .into_iter()
        .map(|name| {
            let contents = std::fs::read(dir.join(&name)).unwrap();
            (name, contents)
        })
        .collect()
}

/// Parse the array assigned to `const imageFiles` in a generated page.
pub fn embedded_manifest(html: &str) -> Vec<String> {
    let marker = "const imageFiles = ";
    let start = html
        .find(marker)
        .unwrap_or_else(|| panic!("no `{marker}` in page"))
        + marker.len();
    let end = start + html[start..].find(';').expect("unterminated manifest");
    serde_json::from_str(&html[start..end]).unwrap()
}
