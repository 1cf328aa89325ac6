//! # Brand Gallery
//!
//! Turns a folder of images into a single-page gallery. Drop images into
//! `images/`, run a build, and `dist/` holds an `index.html` listing them
//! plus a copy of every image.
//!
//! # Pipeline
//!
//! ```text
//! images/*.{jpg,png,...}  ──scan──▶  manifest  ──render──▶  dist/index.html
//!                         ──copy──────────────────────────▶  dist/images/
//! ```
//!
//! Every build is a full rebuild; nothing is cached between runs. The
//! manifest is the sorted list of image filenames, so the same inputs always
//! produce byte-identical output.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `gallery.toml` loading, defaults, `PORT` override |
//! | [`scan`] | Lists images in the source directory |
//! | [`copy`] | Copies scanned images into the output directory |
//! | [`render`] | Injects the manifest into the HTML template |
//! | [`build`] | Runs scan → copy → render → write |
//! | [`clean`] | Removes the output directory |
//! | [`serve`] | Development HTTP server with SPA fallback |
//! | [`watch`] | Debounced rebuild on file changes |
//! | [`output`] | CLI output formatting |
//!
//! # Templates
//!
//! A template is any HTML file containing `/* IMAGE_FILES_PLACEHOLDER */`.
//! The marker is replaced with a JSON array of filenames; the page decides
//! how to display them. Without a template file the built-in page is used: a
//! responsive card grid showing each image with its pixel dimensions.
//!
//! # Development Loop
//!
//! `brand-gallery serve` builds once, then serves `dist/` and rebuilds when
//! the images, the template, or `gallery.toml` change. A failed initial build
//! stops the server from starting; a failed rebuild is logged and the old
//! output keeps being served.

pub mod build;
pub mod clean;
pub mod config;
pub mod copy;
pub mod output;
pub mod render;
pub mod scan;
pub mod serve;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
