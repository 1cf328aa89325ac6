//! Page rendering.
//!
//! The template is plain HTML with one well-known marker,
//! [`PLACEHOLDER`], usually sitting in a script block:
//!
//! ```text
//! const imageFiles = /* IMAGE_FILES_PLACEHOLDER */;
//! ```
//!
//! Rendering swaps the marker for the manifest as a JSON array, indented so
//! the emitted page stays readable:
//!
//! ```text
//! const imageFiles = [
//!                 "a.jpg",
//!                 "b.png"
//!         ];
//! ```
//!
//! A missing or unreadable template file is not fatal. The built-in
//! `static/default.template.html`, embedded at compile time, is used instead.

use crate::scan::ImageAsset;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Marker replaced by the serialized manifest.
pub const PLACEHOLDER: &str = "/* IMAGE_FILES_PLACEHOLDER */";

/// Indentation used both inside the JSON array and as continuation prefix.
const INDENT: &str = "        ";

const DEFAULT_TEMPLATE: &str = include_str!("../static/default.template.html");

/// Ordered image filenames embedded in the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    pub filenames: Vec<String>,
}

impl Manifest {
    /// Manifest in the order the assets were scanned (already sorted).
    pub fn from_assets(images: &[ImageAsset]) -> Self {
        Self {
            filenames: images.iter().map(|i| i.filename.clone()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }
}

/// Where the template text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    BuiltIn,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub text: String,
    pub source: TemplateSource,
}

impl Template {
    pub fn builtin() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
            source: TemplateSource::BuiltIn,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.source == TemplateSource::BuiltIn
    }
}

/// Read the template at `path`, falling back to the built-in one.
pub fn load_template(path: &Path) -> Template {
    match fs::read_to_string(path) {
        Ok(text) => Template {
            text,
            source: TemplateSource::File(path.to_path_buf()),
        },
        Err(e) => {
            warn!(
                "Cannot read template {}: {e}; using the built-in template",
                path.display()
            );
            Template::builtin()
        }
    }
}

/// Serialize the manifest as an 8-space indented JSON array whose lines
/// after the first carry an extra 8-space prefix.
pub fn serialize_manifest(manifest: &Manifest) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT.as_bytes()));
    manifest.serialize(&mut ser)?;
    let json = String::from_utf8_lossy(&buf);

    Ok(json
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.to_string()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Substitute the manifest for the first [`PLACEHOLDER`] in `template`.
///
/// A template without the marker is returned unchanged, with a warning.
pub fn render(template: &Template, manifest: &Manifest) -> Result<String, serde_json::Error> {
    if !template.text.contains(PLACEHOLDER) {
        warn!("Template has no {PLACEHOLDER} marker; images will not be listed");
        return Ok(template.text.clone());
    }
    let json = serialize_manifest(manifest)?;
    Ok(template.text.replacen(PLACEHOLDER, &json, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(names: &[&str]) -> Manifest {
        Manifest {
            filenames: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn file_template(text: &str) -> Template {
        Template {
            text: text.to_string(),
            source: TemplateSource::File(PathBuf::from("t.html")),
        }
    }

    #[test]
    fn serializes_with_continuation_indent() {
        let json = serialize_manifest(&manifest(&["a.jpg", "b.png"])).unwrap();
        assert_eq!(
            json,
            "[\n                \"a.jpg\",\n                \"b.png\"\n        ]"
        );
    }

    #[test]
    fn empty_manifest_is_bare_brackets() {
        assert_eq!(serialize_manifest(&Manifest::default()).unwrap(), "[]");
    }

    #[test]
    fn filenames_are_json_escaped() {
        let json = serialize_manifest(&manifest(&["say \"hi\".png"])).unwrap();
        assert!(json.contains(r#""say \"hi\".png""#));
    }

    #[test]
    fn render_replaces_placeholder() {
        let template = file_template("const files = /* IMAGE_FILES_PLACEHOLDER */;");
        let html = render(&template, &manifest(&["a.jpg"])).unwrap();
        assert_eq!(
            html,
            "const files = [\n                \"a.jpg\"\n        ];"
        );
    }

    #[test]
    fn render_replaces_only_first_placeholder() {
        let template = file_template(&format!("{PLACEHOLDER} {PLACEHOLDER}"));
        let html = render(&template, &Manifest::default()).unwrap();
        assert_eq!(html, format!("[] {PLACEHOLDER}"));
    }

    #[test]
    fn render_without_placeholder_returns_template() {
        let template = file_template("<p>static</p>");
        let html = render(&template, &manifest(&["a.jpg"])).unwrap();
        assert_eq!(html, "<p>static</p>");
    }

    #[test]
    fn builtin_template_has_exactly_one_placeholder() {
        assert_eq!(DEFAULT_TEMPLATE.matches(PLACEHOLDER).count(), 1);
    }

    #[test]
    fn builtin_render_leaves_no_placeholder() {
        let html = render(&Template::builtin(), &manifest(&["a.jpg", "b.png"])).unwrap();
        assert!(!html.contains(PLACEHOLDER));
        assert!(html.contains("\"a.jpg\""));
        assert!(html.contains("naturalWidth"));
    }

    #[test]
    fn missing_template_falls_back_to_builtin() {
        let tmp = TempDir::new().unwrap();
        let template = load_template(&tmp.path().join("missing.html"));
        assert!(template.is_builtin());
    }

    #[test]
    fn load_template_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.template.html");
        fs::write(&path, "<html>custom</html>").unwrap();

        let template = load_template(&path);
        assert_eq!(template.text, "<html>custom</html>");
        assert_eq!(template.source, TemplateSource::File(path));
    }

    #[test]
    fn manifest_preserves_scan_order() {
        let assets = vec![
            ImageAsset::from_filename("a.jpg").unwrap(),
            ImageAsset::from_filename("b.png").unwrap(),
        ];
        assert_eq!(Manifest::from_assets(&assets), manifest(&["a.jpg", "b.png"]));
    }
}
