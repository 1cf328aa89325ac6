//! One full build: scan → copy → render → write.
//!
//! ```text
//! images/            ──scan──▶  manifest ["a.jpg", "b.png"]
//!   ├── a.jpg        ──copy──▶  dist/images/a.jpg
//!   ├── b.png        ──copy──▶  dist/images/b.png
//!   └── notes.txt              (ignored)
//! index.template.html ─render─▶  dist/index.html
//! ```
//!
//! Every build is a full rebuild. The page is written to a temporary file in
//! the output directory and renamed into place, so the dev server never hands
//! out a half-written `index.html`.
//!
//! Builds are not reentrant: two concurrent builds into the same output
//! directory would race. Callers that rebuild repeatedly go through
//! [`crate::watch::Debouncer`], which runs builds one at a time.

use crate::config::GalleryConfig;
use crate::copy::{CopyReport, copy_images};
use crate::render::{Manifest, load_template, render};
use crate::scan::scan_images;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Render error: {0}")]
    Render(#[from] serde_json::Error),
}

/// What a build produced.
#[derive(Debug)]
pub struct BuildReport {
    pub manifest: Manifest,
    pub copy: CopyReport,
    pub output_file: PathBuf,
    pub used_builtin_template: bool,
}

impl BuildReport {
    pub fn image_count(&self) -> usize {
        self.manifest.len()
    }

    pub fn copied_count(&self) -> usize {
        self.copy.copied
    }
}

/// Run a full build for `config`.
pub fn build(config: &GalleryConfig) -> Result<BuildReport, BuildError> {
    fs::create_dir_all(&config.output)?;

    let images = scan_images(&config.source);
    let copy = copy_images(&config.source, &config.images_output_dir(), &images)?;

    let template = load_template(&config.template);
    let manifest = Manifest::from_assets(&images);
    let html = render(&template, &manifest)?;

    let output_file = config.index_path();
    write_atomic(&output_file, html.as_bytes())?;

    Ok(BuildReport {
        manifest,
        copy,
        output_file,
        used_builtin_template: template.is_builtin(),
    })
}

/// Write `contents` to `path` via a sibling temp file and rename.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    // Temp files are created 0600; the page should be world-readable like a normal write
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PLACEHOLDER;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    #[test]
    fn builds_fixture_project() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());

        let report = build(&config).unwrap();

        assert_eq!(
            report.manifest.filenames,
            vec!["a.jpg", "b.png", "c.GIF", "logo.svg"]
        );
        assert_eq!(report.copied_count(), 4);
        assert!(!report.used_builtin_template);
        assert_eq!(
            dir_listing(&config.images_output_dir()),
            vec!["a.jpg", "b.png", "c.GIF", "logo.svg"]
        );

        let html = fs::read_to_string(config.index_path()).unwrap();
        assert!(html.contains("<title>Fixture Gallery</title>"));
        assert_eq!(embedded_manifest(&html), report.manifest.filenames);
    }

    #[test]
    fn concrete_scenario_excludes_non_images() {
        let tmp = TempDir::new().unwrap();
        let config = GalleryConfig::rooted_at(tmp.path());
        fs::create_dir(&config.source).unwrap();
        for name in ["b.png", "a.jpg", "notes.txt"] {
            fs::write(config.source.join(name), name).unwrap();
        }

        let report = build(&config).unwrap();

        assert_eq!(report.manifest.filenames, vec!["a.jpg", "b.png"]);
        assert_eq!(
            dir_listing(&config.images_output_dir()),
            vec!["a.jpg", "b.png"]
        );
    }

    #[test]
    fn build_is_idempotent() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());

        build(&config).unwrap();
        let first_html = fs::read(config.index_path()).unwrap();
        let first_images = dir_snapshot(&config.images_output_dir());

        build(&config).unwrap();
        assert_eq!(fs::read(config.index_path()).unwrap(), first_html);
        assert_eq!(dir_snapshot(&config.images_output_dir()), first_images);
    }

    #[test]
    fn missing_template_uses_builtin() {
        let tmp = setup_fixtures();
        let mut config = fixture_config(tmp.path());
        config.template = tmp.path().join("no-such-template.html");

        let report = build(&config).unwrap();

        assert!(report.used_builtin_template);
        let html = fs::read_to_string(config.index_path()).unwrap();
        assert!(!html.contains(PLACEHOLDER));
        assert_eq!(embedded_manifest(&html), report.manifest.filenames);
    }

    #[test]
    fn missing_source_builds_empty_gallery() {
        let tmp = TempDir::new().unwrap();
        let config = GalleryConfig::rooted_at(tmp.path());

        let report = build(&config).unwrap();

        assert_eq!(report.image_count(), 0);
        assert_eq!(report.copied_count(), 0);
        let html = fs::read_to_string(config.index_path()).unwrap();
        assert!(html.contains("const imageFiles = [];"));
    }

    #[test]
    fn copy_count_never_exceeds_scan_count() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());

        let report = build(&config).unwrap();

        assert!(report.copied_count() <= report.image_count());
        assert_eq!(
            report.copied_count() < report.image_count(),
            !report.copy.is_complete()
        );
    }

    #[test]
    fn no_temp_files_left_behind() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());

        build(&config).unwrap();

        assert_eq!(dir_listing(&config.output), vec!["images", "index.html"]);
    }
}
