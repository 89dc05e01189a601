//! # Shader Hot Reload
//!
//! WGSL files on disk are watched with `notify`. Saving one rebuilds the
//! pipelines of every stage that uses it, while the app keeps running.
//!
//! ```text
//! notify thread ──► mpsc channel ──► poll()        (main thread, per frame)
//!                                      │
//!                                      ▼
//!                                  Debouncer       path → last event time
//!                                      │  quiet for 100 ms
//!                                      ▼
//!                                  ready()  ──► DeferredRenderer::reload_shader
//! ```
//!
//! Editors save atomically (write temp, rename), which fires several events
//! per save. Each event resets the path's timer, so one save gives one
//! reload.
//!
//! If the watcher cannot start, shaders still load from the embedded
//! sources; they just never reload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::render::shader::ShaderKind;

pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// Outcome of one reload attempt, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReloadEvent {
    pub timestamp_secs: f32,
    pub path: String,
    pub kind: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Collapses bursts of events per key into one, once the key has been
/// quiet for the debounce window.
#[derive(Debug)]
pub struct Debouncer<K> {
    window: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Eq + std::hash::Hash + Clone> Debouncer<K> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record an event for `key` at `now`, restarting its timer.
    pub fn touch(&mut self, key: K, now: Instant) {
        self.pending.insert(key, now);
    }

    /// Remove and return keys whose last event is at least one window old.
    pub fn ready(&mut self, now: Instant) -> Vec<K> {
        let mut ready = Vec::new();
        self.pending.retain(|key, last| {
            if now.saturating_duration_since(*last) >= self.window {
                ready.push(key.clone());
                false
            } else {
                true
            }
        });
        ready
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

pub struct ShaderWatcher {
    watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<notify::Result<notify::Event>>,
    watched: HashMap<PathBuf, ShaderKind>,
    debouncer: Debouncer<PathBuf>,
    disconnected: bool,
    log: Vec<ReloadEvent>,
}

impl ShaderWatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let watcher = match notify::recommended_watcher(move |res| {
            // Receiver gone means the app is shutting down.
            let _ = tx.send(res);
        }) {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Failed to create file watcher: {e}. Shader hot reload disabled.");
                None
            }
        };

        Self {
            watcher,
            rx,
            watched: HashMap::new(),
            debouncer: Debouncer::new(DEBOUNCE),
            disconnected: false,
            log: Vec::new(),
        }
    }

    /// Watch every shader whose source file is present on disk.
    pub fn watch_sources(&mut self) {
        for kind in ShaderKind::ALL {
            match kind.source_path() {
                Some(path) => self.watch(&path, kind),
                None => log::debug!("{} not on disk; not watching", kind.file_name()),
            }
        }
        log::info!("Watching {} shader files", self.watched.len());
    }

    pub fn watch(&mut self, path: &Path, kind: ShaderKind) {
        let canonical = match path.canonicalize() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Cannot watch '{}': {e}", path.display());
                return;
            }
        };
        if let Some(watcher) = &mut self.watcher
            && let Err(e) = watcher.watch(&canonical, RecursiveMode::NonRecursive)
        {
            log::warn!("Failed to watch '{}': {e}", canonical.display());
            return;
        }
        self.watched.insert(canonical, kind);
    }

    /// Drain watcher events and return shaders that are ready to reload.
    pub fn poll(&mut self) -> Vec<(PathBuf, ShaderKind)> {
        let now = Instant::now();
        while !self.disconnected {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in &event.paths {
                            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
                            if self.watched.contains_key(&canonical) {
                                self.debouncer.touch(canonical, now);
                            }
                        }
                    }
                }
                Ok(Err(e)) => log::warn!("File watcher error: {e}"),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    log::warn!("File watcher disconnected. Shader hot reload disabled.");
                    self.disconnected = true;
                }
            }
        }

        self.debouncer
            .ready(now)
            .into_iter()
            .filter_map(|path| self.watched.get(&path).map(|kind| (path, *kind)))
            .collect()
    }

    /// Record a reload result and log it.
    pub fn record(&mut self, elapsed_secs: f32, path: &Path, kind: ShaderKind, result: Result<(), String>) {
        match &result {
            Ok(()) => log::info!("Hot-reloaded shader: {}", path.display()),
            Err(e) => log::warn!("Shader reload failed for '{}', keeping previous pipeline: {e}", path.display()),
        }
        self.log.push(ReloadEvent {
            timestamp_secs: elapsed_secs,
            path: path.display().to_string(),
            kind: format!("{kind:?}"),
            success: result.is_ok(),
            error: result.err(),
        });
    }

    /// Reload events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<ReloadEvent> {
        std::mem::take(&mut self.log)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    pub fn is_active(&self) -> bool {
        self.watcher.is_some() && !self.disconnected
    }
}

impl Default for ShaderWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_of_events_gives_one_ready_key() {
        let start = Instant::now();
        let mut d = Debouncer::new(DEBOUNCE);
        d.touch("a.wgsl", start);
        d.touch("a.wgsl", start + Duration::from_millis(30));
        d.touch("a.wgsl", start + Duration::from_millis(60));

        assert!(d.ready(start + Duration::from_millis(120)).is_empty(), "timer restarts on each event");
        assert_eq!(d.ready(start + Duration::from_millis(160)), vec!["a.wgsl"]);
        assert!(d.ready(start + Duration::from_secs(5)).is_empty(), "ready keys are removed");
    }

    #[test]
    fn keys_debounce_independently() {
        let start = Instant::now();
        let mut d = Debouncer::new(DEBOUNCE);
        d.touch(1, start);
        d.touch(2, start + Duration::from_millis(80));

        assert_eq!(d.ready(start + Duration::from_millis(100)), vec![1]);
        assert_eq!(d.pending(), 1);
        assert_eq!(d.ready(start + Duration::from_millis(180)), vec![2]);
    }

    #[test]
    fn record_keeps_failures_with_their_error() {
        let mut w = ShaderWatcher::new();
        w.record(1.5, Path::new("lighting.wgsl"), ShaderKind::Lighting, Err("bad token".into()));
        w.record(2.0, Path::new("combine.wgsl"), ShaderKind::Combine, Ok(()));

        let events = w.drain_events();
        assert_eq!(events.len(), 2);
        assert!(!events[0].success);
        assert_eq!(events[0].error.as_deref(), Some("bad token"));
        assert_eq!(events[0].kind, "Lighting");
        assert!(events[1].success);
        assert!(w.drain_events().is_empty(), "drain empties the log");
    }

    #[test]
    fn shader_sources_can_be_watched() {
        let mut w = ShaderWatcher::new();
        w.watch_sources();
        if w.is_active() {
            assert_eq!(w.watched_count(), ShaderKind::ALL.len());
        }
        assert!(w.poll().is_empty(), "nothing changed yet");
    }
}
