//! Copies scanned images into the output directory.
//!
//! Each file is copied independently (in parallel with rayon), overwriting
//! whatever is already there. A failed copy is logged and recorded; it never
//! stops the others. The number of successful copies can therefore be lower
//! than the number of scanned images, but never higher.

use crate::scan::ImageAsset;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::error;

/// Outcome of one copy pass.
#[derive(Debug, Default)]
pub struct CopyReport {
    /// Number of files copied successfully.
    pub copied: usize,
    /// Files that failed, in manifest order, with the reason.
    pub failures: Vec<(String, std::io::Error)>,
}

impl CopyReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copy every asset from `source_dir` to `dest_dir` under the same name.
///
/// Only creating `dest_dir` can fail the whole call; per-file errors end up
/// in [`CopyReport::failures`].
pub fn copy_images(
    source_dir: &Path,
    dest_dir: &Path,
    images: &[ImageAsset],
) -> std::io::Result<CopyReport> {
    fs::create_dir_all(dest_dir)?;

    let results: Vec<(&ImageAsset, std::io::Result<u64>)> = images
        .par_iter()
        .map(|image| {
            let src = source_dir.join(&image.filename);
            let dest = dest_dir.join(&image.filename);
            (image, fs::copy(&src, &dest))
        })
        .collect();

    let mut report = CopyReport::default();
    for (image, result) in results {
        match result {
            Ok(_) => report.copied += 1,
            Err(e) => {
                error!("Error copying {}: {e}", image.filename);
                report.failures.push((image.filename.clone(), e));
            }
        }
    }
    Ok(report)
}
