//! Removes the build output directory.
//!
//! Traversal is depth-first with contents before their directory
//! (`walkdir`'s `contents_first`), so every directory is empty by the time it
//! is removed and the root goes last. Symlinks are removed, never followed.
//! Cleaning a directory that does not exist is a no-op.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Whether there was anything to remove.
    pub existed: bool,
    pub files_removed: usize,
    /// Directories removed, the root included.
    pub dirs_removed: usize,
}

/// Recursively delete `dir` and everything beneath it.
pub fn clean(dir: &Path) -> Result<CleanReport, CleanError> {
    let meta = match fs::symlink_metadata(dir) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CleanReport::default()),
        Err(e) => return Err(e.into()),
    };
    if !meta.is_dir() {
        return Err(CleanError::NotADirectory(dir.to_path_buf()));
    }

    let mut report = CleanReport {
        existed: true,
        ..CleanReport::default()
    };
    for entry in WalkDir::new(dir).contents_first(true).follow_root_links(false) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
            report.dirs_removed += 1;
        } else {
            fs::remove_file(entry.path())?;
            report.files_removed += 1;
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    #[test]
    fn removes_nested_tree() {
        let tmp = TempDir::new().unwrap();
        let dist = tmp.path().join("dist");
        fs::create_dir_all(dist.join("images/deeper")).unwrap();
        fs::write(dist.join("index.html"), "x").unwrap();
        fs::write(dist.join("images/a.jpg"), "x").unwrap();
        fs::write(dist.join("images/deeper/b.png"), "x").unwrap();

        let report = clean(&dist).unwrap();

        assert!(!dist.exists());
        assert_eq!(
            report,
            CleanReport {
                existed: true,
                files_removed: 3,
                dirs_removed: 3,
            }
        );
    }

    #[test]
    fn missing_directory_is_noop() {
        let tmp = TempDir::new().unwrap();
        let report = clean(&tmp.path().join("dist")).unwrap();
        assert!(!report.existed);
    }

    #[test]
    fn regular_file_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("dist");
        fs::write(&file, "not a dir").unwrap();

        assert!(matches!(clean(&file), Err(CleanError::NotADirectory(_))));
        assert!(file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_removed_not_followed() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("keep");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("precious.txt"), "x").unwrap();
        let dist = tmp.path().join("dist");
        fs::create_dir(&dist).unwrap();
        std::os::unix::fs::symlink(&outside, dist.join("link")).unwrap();

        clean(&dist).unwrap();

        assert!(!dist.exists());
        assert!(outside.join("precious.txt").exists());
    }

    #[test]
    fn clean_then_build_matches_plain_build() {
        let tmp = setup_fixtures();
        let config = fixture_config(tmp.path());

        build(&config).unwrap();
        let html = fs::read(config.index_path()).unwrap();
        let images = dir_snapshot(&config.images_output_dir());

        clean(&config.output).unwrap();
        assert!(!config.output.exists());
        build(&config).unwrap();

        assert_eq!(fs::read(config.index_path()).unwrap(), html);
        assert_eq!(dir_snapshot(&config.images_output_dir()), images);
    }
}
