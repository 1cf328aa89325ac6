//! Rebuild on change.
//!
//! ## What Is Watched
//!
//! | Target | How | Variant |
//! |--------|-----|---------|
//! | source directory | recursively | both |
//! | template file | its parent directory, non-recursively, filtered to the file | both |
//! | `gallery.toml` | same as the template | dev server only |
//!
//! Watching the template's directory rather than the file itself keeps the
//! watch alive when an editor saves by replacing the file.
//!
//! In the standalone variant (`build --watch`) only changes to image files in
//! the source directory count; the dev server reacts to anything there.
//! Access events (opens, reads) never count, otherwise reading the template
//! during a rebuild would schedule the next one.
//!
//! ## Debounce
//!
//! ```text
//!          event            event            quiet window elapses
//!   Idle ─────────▶ Pending ─────▶ Pending ─────────────────────▶ Rebuilding ──▶ Idle
//!                    (arm)         (re-arm)
//! ```
//!
//! [`Debouncer::run`] drives this on a single thread and calls the rebuild
//! inline, so two rebuilds never overlap. Events that arrive mid-rebuild wait
//! in the channel and lead to exactly one follow-up rebuild.

use crate::build::{BuildReport, build};
use crate::config::{ConfigSource, GalleryConfig, ServeConfig};
use crate::output;
use crate::scan::is_image_path;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Watch error: {0}")]
    Notify(#[from] notify::Error),
}

/// Which entry point is watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchVariant {
    /// `build --watch`: rebuild immediately, image changes only.
    Standalone,
    /// `serve`: debounced, any source change, also the config file.
    DevServer,
}

impl WatchVariant {
    pub fn quiet_window(self, serve: &ServeConfig) -> Duration {
        match self {
            WatchVariant::Standalone => Duration::ZERO,
            WatchVariant::DevServer => serve.debounce(),
        }
    }
}

/// Absolute paths to watch and the rules deciding which events matter.
#[derive(Debug, Clone)]
pub struct WatchTargets {
    source: PathBuf,
    template: PathBuf,
    config_file: Option<PathBuf>,
    variant: WatchVariant,
}

impl WatchTargets {
    pub fn new(config: &GalleryConfig, variant: WatchVariant) -> std::io::Result<Self> {
        let config_file = match (&config.config_file, variant) {
            (Some(path), WatchVariant::DevServer) => Some(std::path::absolute(path)?),
            _ => None,
        };
        Ok(Self {
            source: std::path::absolute(&config.source)?,
            template: std::path::absolute(&config.template)?,
            config_file,
            variant,
        })
    }

    /// Paths whose changes trigger a rebuild, for display.
    pub fn watched_files(&self) -> Vec<&Path> {
        let mut files = vec![self.source.as_path(), self.template.as_path()];
        files.extend(self.config_file.as_deref());
        files
    }

    /// Whether `event` should schedule a rebuild.
    pub fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| self.is_relevant_path(path))
    }

    fn is_relevant_path(&self, path: &Path) -> bool {
        if path == self.template || self.config_file.as_deref() == Some(path) {
            return true;
        }
        if path.starts_with(&self.source) {
            return match self.variant {
                WatchVariant::Standalone => is_image_path(path),
                WatchVariant::DevServer => true,
            };
        }
        false
    }

    /// Directories to register with the OS watcher, without overlaps.
    ///
    /// A non-recursive watch on a directory already covered by the recursive
    /// source watch would replace it, so those are skipped.
    pub fn registrations(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let mut regs = vec![(self.source.clone(), RecursiveMode::Recursive)];
        let files = std::iter::once(&self.template).chain(self.config_file.as_ref());
        for file in files {
            let Some(parent) = file.parent() else { continue };
            if parent.starts_with(&self.source) || regs.iter().any(|(p, _)| p == parent) {
                continue;
            }
            regs.push((parent.to_path_buf(), RecursiveMode::NonRecursive));
        }
        regs
    }
}

/// Coalesces bursts of events into single actions.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    quiet: Duration,
}

impl Debouncer {
    /// A zero window runs the action as soon as an event arrives, folding in
    /// only the events already queued.
    pub fn new(quiet: Duration) -> Self {
        Self { quiet }
    }

    /// Run `action` once per burst of events on `events`.
    ///
    /// Returns the number of actions run once every sender is gone; a burst
    /// still pending at that point is flushed first.
    pub fn run<T, F>(&self, events: &Receiver<T>, mut action: F) -> usize
    where
        F: FnMut(),
    {
        let mut runs = 0;
        loop {
            // Idle
            if events.recv().is_err() {
                return runs;
            }

            // Pending
            let disconnected = if self.quiet.is_zero() {
                drain(events)
            } else {
                wait_quiet(events, self.quiet)
            };

            // Rebuilding
            action();
            runs += 1;
            if disconnected {
                return runs;
            }
        }
    }
}

/// Swallow already-queued events. Returns true if the channel disconnected.
fn drain<T>(events: &Receiver<T>) -> bool {
    loop {
        match events.try_recv() {
            Ok(_) => continue,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => return true,
        }
    }
}

/// Wait until no event arrives for `quiet`. Returns true if the channel disconnected.
fn wait_quiet<T>(events: &Receiver<T>, quiet: Duration) -> bool {
    loop {
        match events.recv_timeout(quiet) {
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => return true,
        }
    }
}

/// Pass a relevant event's first path to the debouncer. Returns whether
/// anything was sent.
fn forward(filter: &WatchTargets, tx: &Sender<PathBuf>, res: notify::Result<Event>) -> bool {
    match res {
        Ok(event) if filter.is_relevant(&event) => {
            let Some(path) = event.paths.first() else {
                return false;
            };
            debug!("Change detected: {:?} {}", event.kind, path.display());
            match tx.send(path.clone()) {
                Ok(()) => true,
                Err(e) => {
                    debug!("Dropped change event: {e}");
                    false
                }
            }
        }
        Ok(_) => false,
        Err(e) => {
            warn!("Watch error: {e}");
            false
        }
    }
}

/// Runs one rebuild per burst, re-reading the config first when it has a
/// [`ConfigSource`].
///
/// Paths registered with the OS watcher and the directory the dev server
/// serves are fixed at startup; a reloaded config only changes what the
/// build reads and writes.
#[derive(Debug)]
pub struct Rebuilder {
    config: GalleryConfig,
    reload: Option<ConfigSource>,
}

impl Rebuilder {
    pub fn new(config: GalleryConfig, reload: Option<ConfigSource>) -> Self {
        Self { config, reload }
    }

    /// The config the next rebuild will start from.
    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    /// One rebuild. Failures are logged and the watch goes on.
    ///
    /// A config that fails to load or validate is reported and the previous
    /// one is kept.
    pub fn rebuild(&mut self) -> Option<BuildReport> {
        info!("Changes detected, rebuilding...");
        if let Some(source) = &self.reload {
            match source.resolve() {
                Ok(config) => {
                    if config.output != self.config.output {
                        info!("Output changed to {}", config.output.display());
                    }
                    self.config = config;
                }
                Err(e) => warn!(
                    "Keeping previous config, {} did not load: {e}",
                    source.file.display()
                ),
            }
        }

        match build(&self.config) {
            Ok(report) => {
                output::print_build_report(&report, &self.config.images_output_dir());
                info!("Rebuild complete");
                Some(report)
            }
            Err(e) => {
                error!("Rebuild failed: {e}");
                None
            }
        }
    }
}

/// Watch the configured paths and rebuild on change. Blocks for the life of
/// the process.
pub fn watch(mut rebuilder: Rebuilder, variant: WatchVariant) -> Result<(), WatchError> {
    let targets = WatchTargets::new(rebuilder.config(), variant)?;
    let (tx, rx) = mpsc::channel::<PathBuf>();

    let filter = targets.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        forward(&filter, &tx, res);
    })?;

    for (path, mode) in targets.registrations() {
        match watcher.watch(&path, mode) {
            Ok(()) => debug!("Watching {} ({mode:?})", path.display()),
            Err(e) => warn!("Cannot watch {}: {e}", path.display()),
        }
    }
    output::print_watch_targets(&targets);

    let quiet = variant.quiet_window(&rebuilder.config().serve);
    Debouncer::new(quiet).run(&rx, || {
        rebuilder.rebuild();
    });
    Ok(())
}
