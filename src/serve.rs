//! Development HTTP server over the build output directory.
//!
//! ## Request Mapping
//!
//! | Request | Result |
//! |---------|--------|
//! | `/` | `index.html` |
//! | `/images/a.jpg` | file, `Content-Type` from [`MIME_TYPES`] |
//! | `/../../etc/passwd` | 403, path escapes the output root |
//! | `/missing.css` | 404 |
//! | `/some/route` (no extension, missing) | 200 with `index.html` (SPA fallback) |
//! | read error other than "not found" | 500 `Server Error: <OS error>` |
//!
//! ## Traversal Guard
//!
//! The request path is percent-decoded, joined onto the absolute output root,
//! and normalized lexically (`..` pops a component). The result must still
//! start with the root, compared component-wise. Symlinks inside the output
//! directory are *not* resolved, so a link pointing elsewhere is served. Fine
//! for a local dev server over a directory the build itself writes; not a
//! sandbox.
//!
//! Requests are answered one at a time on the calling thread. A rebuild may
//! rewrite files while they are served; `index.html` is replaced atomically so
//! the worst case is a stale page, never a truncated one.

use crate::config::{INDEX_FILE, ServeConfig, normalize};
use std::fs;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{debug, warn};

/// Extension → `Content-Type`. Anything else is `application/octet-stream`.
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("js", "text/javascript"),
    ("css", "text/css"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
];

const FALLBACK_MIME: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot listen on {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

/// A response, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body,
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: TEXT_PLAIN,
            body: body.into().into_bytes(),
        }
    }

    fn forbidden() -> Self {
        Self::text(403, "Forbidden")
    }

    fn not_found() -> Self {
        Self::text(404, "404 Not Found")
    }
}

/// Content type for `path` by (case-insensitive) extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

/// Join `request_path` onto `root`, normalizing `.` and `..` lexically.
///
/// Returns `None` when the result leaves `root`. `root` should be absolute
/// and already normalized.
pub fn contained_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(request_path).components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => resolved.push(part),
            Component::Prefix(_) => return None,
        }
    }
    resolved.starts_with(root).then_some(resolved)
}

/// Map a request URL to a reply, reading from `root`.
pub fn resolve_request(root: &Path, url: &str) -> Reply {
    let raw_path = url.split(['?', '#']).next().unwrap_or_default();
    let Ok(decoded) = urlencoding::decode(raw_path) else {
        return Reply::not_found();
    };
    let request_path = match decoded.as_ref() {
        "" | "/" => INDEX_FILE,
        other => other,
    };

    let Some(file) = contained_path(root, request_path) else {
        return Reply::forbidden();
    };

    match fs::read(&file) {
        Ok(body) => Reply::ok(content_type_for(&file), body),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            if file.extension().is_some() {
                return Reply::not_found();
            }
            match fs::read(root.join(INDEX_FILE)) {
                Ok(body) => Reply::ok("text/html", body),
                Err(_) => Reply::not_found(),
            }
        }
        Err(e) => Reply::text(500, format!("Server Error: {e}")),
    }
}

/// Blocking static file server for the output directory.
pub struct DevServer {
    server: Server,
    root: PathBuf,
}

impl DevServer {
    /// Listen on `config.host:config.port`, serving files from `root`.
    pub fn bind(config: &ServeConfig, root: &Path) -> Result<Self, ServeError> {
        let root = normalize(&std::path::absolute(root)?);
        let addr = format!("{}:{}", config.host, config.port);
        let server = Server::http(addr.as_str()).map_err(|e| ServeError::Bind {
            addr: addr.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { server, root })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answer requests until the listener closes.
    pub fn run(&self) {
        for request in self.server.incoming_requests() {
            self.respond(request);
        }
    }

    fn respond(&self, request: Request) {
        let reply = resolve_request(&self.root, request.url());
        debug!("{} {} -> {}", request.method(), request.url(), reply.status);

        let mut response =
            Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
            response = response.with_header(header);
        }
        if let Err(e) = request.respond(response) {
            warn!("Failed to send response: {e}");
        }
    }
}
