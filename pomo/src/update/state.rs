//! Persisted update bookkeeping: what the user skipped and when we may
//! bother them again. Stored as its own JSON file next to the app state.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateState {
    /// Release tag the user chose not to be prompted about again.
    pub skipped_version: Option<String>,
    /// "Remind me later" horizon; automatic checks are suppressed until then.
    pub next_check_not_before: Option<DateTime<Utc>>,
    /// When the last check attempt finished.
    pub last_check: Option<DateTime<Utc>>,
}

impl UpdateState {
    /// Load from disk; a missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write update state to {:?}", path))?;
        Ok(())
    }

    pub fn defer_checks_for_hours(&mut self, hours: i64) {
        self.next_check_not_before = Some(Utc::now() + Duration::hours(hours));
    }

    pub fn mark_checked(&mut self) {
        self.last_check = Some(Utc::now());
    }

    /// True when `next_check_not_before` is unset or already behind us.
    pub fn check_window_open(&self, now: DateTime<Utc>) -> bool {
        match self.next_check_not_before {
            Some(not_before) => not_before <= now,
            None => true,
        }
    }

    /// True when the last check attempt is at least `hours` old, or none was
    /// ever recorded.
    pub fn check_is_stale(&self, hours: u32, now: DateTime<Utc>) -> bool {
        match self.last_check {
            Some(at) => now - at >= Duration::hours(i64::from(hours)),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("pomo-test-update-state");
        let _ = fs::create_dir_all(&dir);
        dir.join(name)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let state = UpdateState::load(Path::new("/nonexistent/pomo-update.json"));
        assert!(state.skipped_version.is_none());
        assert!(state.next_check_not_before.is_none());
        assert!(state.last_check.is_none());
    }

    #[test]
    fn round_trips_through_disk() {
        let path = temp_state_path("round-trip.json");
        let mut state = UpdateState::default();
        state.skipped_version = Some("1.3.0".to_string());
        state.defer_checks_for_hours(24);
        state.save(&path).unwrap();

        let restored = UpdateState::load(&path);
        assert_eq!(restored.skipped_version.as_deref(), Some("1.3.0"));
        assert!(restored.next_check_not_before.is_some());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn garbage_file_loads_defaults() {
        let path = temp_state_path("garbage.json");
        fs::write(&path, "not json at all").unwrap();
        let state = UpdateState::load(&path);
        assert!(state.skipped_version.is_none());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn check_window_respects_deferral() {
        let mut state = UpdateState::default();
        let now = Utc::now();
        assert!(state.check_window_open(now));

        state.defer_checks_for_hours(24);
        assert!(!state.check_window_open(now));
        assert!(state.check_window_open(now + Duration::hours(25)));
    }

    #[test]
    fn staleness_counts_from_last_check() {
        let mut state = UpdateState::default();
        let now = Utc::now();
        assert!(state.check_is_stale(24, now));

        state.mark_checked();
        assert!(!state.check_is_stale(24, now));
        assert!(state.check_is_stale(24, now + Duration::hours(25)));
    }
}
