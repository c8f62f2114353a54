//! Persisted view state and the debounced viewport writer.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StateError;
use crate::layout::{LayoutMode, Position, Positions};
use crate::order::OrderMode;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f32,
    pub pan: Position,
}

/// Everything the viewer remembers between loads. Every field is optional on
/// disk so older or partial blobs still load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    pub positions: Positions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_mode: Option<OrderMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_mode: Option<LayoutMode>,
}

pub trait StateStore {
    fn load(&self) -> Result<Option<PersistedState>, StateError>;
    fn save(&mut self, state: &PersistedState) -> Result<(), StateError>;
    fn clear(&mut self) -> Result<(), StateError>;
}

/// Keeps the state blob as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedState>, StateError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), nodes = state.positions.len(), "state saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StateError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Coalesces bursts of pan/zoom events into one write.
///
/// Holds at most one scheduled viewport. Each `schedule` replaces it and moves
/// the deadline to `now + quiet`; `poll` hands it out once the deadline passes.
#[derive(Debug, Clone)]
pub struct ViewportDebouncer {
    quiet: Duration,
    pending: Option<(Instant, Viewport)>,
}

impl ViewportDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn schedule(&mut self, now: Instant, viewport: Viewport) {
        self.pending = Some((now + self.quiet, viewport));
    }

    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        match self.pending {
            Some((deadline, viewport)) if now >= deadline => {
                self.pending = None;
                debug!(zoom = viewport.zoom, "viewport write flushed");
                Some(viewport)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(deadline, _)| deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn viewport(zoom: f32) -> Viewport {
        Viewport {
            zoom,
            pan: Position::new(10.0, -5.0),
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("state.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("state.json"));
        let mut state = PersistedState {
            viewport: Some(viewport(1.5)),
            order_mode: Some(OrderMode::TagsDesc),
            layout_mode: Some(LayoutMode::TreeFile),
            ..PersistedState::default()
        };
        state.positions.insert("login".into(), Position::new(420.0, 142.0));
        store.save(&state).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"orderMode\": \"tags_desc\""));
        assert!(raw.contains("\"layoutMode\": \"tree_file\""));
        assert_eq!(store.load().unwrap(), Some(state));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn partial_blob_fills_defaults() {
        let state: PersistedState =
            serde_json::from_str(r#"{ "positions": { "a": { "x": 1, "y": 2 } } }"#).unwrap();
        assert_eq!(state.positions["a"], Position::new(1.0, 2.0));
        assert!(state.viewport.is_none());
        assert!(state.layout_mode.is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::new(path).load().unwrap_err();
        assert!(matches!(err, StateError::Json(_)));
    }

    #[test]
    fn debouncer_keeps_last_write_after_quiet_period() {
        let start = Instant::now();
        let quiet = Duration::from_millis(120);
        let mut debouncer = ViewportDebouncer::new(quiet);

        debouncer.schedule(start, viewport(1.0));
        debouncer.schedule(start + Duration::from_millis(80), viewport(2.0));
        assert_eq!(debouncer.poll(start + Duration::from_millis(150)), None);
        assert_eq!(
            debouncer.deadline(),
            Some(start + Duration::from_millis(200))
        );
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(200)),
            Some(viewport(2.0))
        );
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
    }

    #[test]
    fn cancelled_write_never_fires() {
        let start = Instant::now();
        let mut debouncer = ViewportDebouncer::new(Duration::from_millis(120));
        debouncer.schedule(start, viewport(1.0));
        debouncer.cancel();
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
