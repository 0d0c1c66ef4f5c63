//! Update check and download state machine.
//!
//! Fields are only ever mutated on the main thread. The network legs run on
//! a worker thread that reports back through [`UpdateEvent`]; the main loop
//! drains the channel and applies the results here.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use chrono::Utc;
use tracing::{info, warn};

use super::feed::{self, compare_versions, Release};
use super::installer;
use super::state::UpdateState;
use super::UpdateError;

/// Messages from the update worker thread back to the main loop.
#[derive(Debug)]
pub enum UpdateEvent {
    CheckFinished(Result<Release, UpdateError>),
    DownloadProgress { received: u64, total: Option<u64> },
    DownloadFinished(Result<PathBuf, UpdateError>),
}

pub struct UpdateChecker {
    repo: String,
    current_version: String,
    state_path: PathBuf,
    pub state: UpdateState,

    pub is_checking: bool,
    pub is_downloading: bool,
    pub download_progress: f64,
    pub latest_release: Option<Release>,
    pub update_available: bool,
    pub error_message: Option<String>,
    /// Raised when an update first becomes available; cleared on dismissal.
    pub alert_pending: bool,
    /// Where the finished installer ended up, for the acknowledgment line.
    pub last_download: Option<PathBuf>,
}

impl UpdateChecker {
    pub fn new(repo: &str, current_version: &str, state_path: PathBuf) -> Self {
        let state = UpdateState::load(&state_path);
        Self {
            repo: repo.to_string(),
            current_version: current_version.to_string(),
            state_path,
            state,
            is_checking: false,
            is_downloading: false,
            download_progress: 0.0,
            latest_release: None,
            update_available: false,
            error_message: None,
            alert_pending: false,
            last_download: None,
        }
    }

    /// Kick off a release-feed check on a worker thread. A second call while
    /// one is in flight is a silent no-op, so rapid invocations issue exactly
    /// one network request.
    pub fn check_for_updates(&mut self, events: &Sender<UpdateEvent>) {
        if !self.begin_check() {
            return;
        }
        let repo = self.repo.clone();
        let version = self.current_version.clone();
        let tx = events.clone();
        thread::spawn(move || {
            let result = feed::fetch_latest(&repo, &version);
            let _ = tx.send(UpdateEvent::CheckFinished(result));
        });
    }

    /// Flip the in-flight flag; false means a check is already running.
    pub(crate) fn begin_check(&mut self) -> bool {
        if self.is_checking {
            return false;
        }
        self.is_checking = true;
        self.error_message = None;
        true
    }

    pub fn apply_check_result(&mut self, result: Result<Release, UpdateError>) {
        self.is_checking = false;
        self.state.mark_checked();
        self.persist_state();
        match result {
            Ok(release) => {
                info!("latest release: {}", release.tag);
                let was_available = self.update_available;
                self.update_available = self.release_is_newer(&release);
                self.latest_release = Some(release);
                if self.update_available && !was_available {
                    self.alert_pending = true;
                }
            }
            Err(e) => {
                warn!("update check failed: {e}");
                self.error_message = Some(format!("Failed to check for updates: {e}"));
            }
        }
    }

    /// Newer than what we run, and not a tag the user already skipped.
    fn release_is_newer(&self, release: &Release) -> bool {
        if self.state.skipped_version.as_deref() == Some(release.tag.as_str()) {
            return false;
        }
        compare_versions(&self.current_version, &release.tag) == Ordering::Less
    }

    /// Start downloading the platform installer of the latest release onto a
    /// worker thread. In-flight downloads are not cancelable; a second call
    /// while one runs is a silent no-op.
    pub fn download_and_install(&mut self, events: &Sender<UpdateEvent>) {
        if self.is_downloading {
            return;
        }
        let asset = match self
            .latest_release
            .as_ref()
            .and_then(installer::select_installer_asset)
        {
            Some(asset) => asset.clone(),
            None => {
                self.error_message = Some(UpdateError::NoInstallerAsset.to_string());
                return;
            }
        };

        self.is_downloading = true;
        self.download_progress = 0.0;
        self.error_message = None;
        let tx = events.clone();
        thread::spawn(move || {
            let result = installer::download_dir().and_then(|dir| {
                let dest = dir.join(&asset.name);
                installer::download_asset(&asset.download_url, &dest, |received, total| {
                    let _ = tx.send(UpdateEvent::DownloadProgress { received, total });
                })?;
                installer::reveal(&dest);
                Ok(dest)
            });
            let _ = tx.send(UpdateEvent::DownloadFinished(result));
        });
    }

    pub fn apply_download_progress(&mut self, received: u64, total: Option<u64>) {
        if let Some(total) = total.filter(|t| *t > 0) {
            self.download_progress = (received as f64 / total as f64).min(1.0);
        }
    }

    pub fn apply_download_result(&mut self, result: Result<PathBuf, UpdateError>) {
        self.is_downloading = false;
        match result {
            Ok(path) => {
                self.download_progress = 1.0;
                info!("update downloaded to {}", path.display());
                self.last_download = Some(path);
            }
            Err(e) => {
                warn!("update download failed: {e}");
                self.error_message = Some(format!("Download failed: {e}"));
            }
        }
    }

    /// Never prompt for this release again.
    pub fn skip_this_version(&mut self) {
        let Some(release) = self.latest_release.as_ref() else {
            return;
        };
        self.state.skipped_version = Some(release.tag.clone());
        self.update_available = false;
        self.alert_pending = false;
        self.persist_state();
    }

    /// Dismiss the alert and hold off automatic checks for a day.
    pub fn remind_me_later(&mut self) {
        self.alert_pending = false;
        self.state.defer_checks_for_hours(24);
        self.persist_state();
    }

    pub fn dismiss_alert(&mut self) {
        self.alert_pending = false;
    }

    /// Whether the startup check should run, honoring "remind me later".
    pub fn launch_check_due(&self, check_on_launch: bool) -> bool {
        check_on_launch && self.state.check_window_open(Utc::now())
    }

    /// Whether a periodic re-check is due.
    pub fn interval_check_due(&self, auto_check: bool, interval_hours: u32) -> bool {
        if !auto_check || interval_hours == 0 || self.is_checking {
            return false;
        }
        let now = Utc::now();
        self.state.check_window_open(now) && self.state.check_is_stale(interval_hours, now)
    }

    fn persist_state(&self) {
        if let Err(e) = self.state.save(&self.state_path) {
            warn!("could not persist update state: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::mpsc;

    fn test_checker(name: &str, current_version: &str) -> UpdateChecker {
        let dir = std::env::temp_dir().join("pomo-test-checker");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join(format!("{name}.json"));
        let _ = std::fs::remove_file(&path);
        UpdateChecker::new("pabloagn/pomo", current_version, path)
    }

    fn release(tag: &str, asset_names: &[&str]) -> Release {
        Release {
            tag: tag.to_string(),
            title: format!("pomo {tag}"),
            notes: "notes".to_string(),
            published_at: Utc::now(),
            assets: asset_names
                .iter()
                .map(|name| feed::ReleaseAsset {
                    name: (*name).to_string(),
                    download_url: format!("https://example.com/{name}"),
                    size_bytes: 10,
                })
                .collect(),
        }
    }

    #[test]
    fn only_one_check_runs_at_a_time() {
        let mut checker = test_checker("single-flight", "1.0.0");
        assert!(checker.begin_check());
        assert!(checker.is_checking);
        // Second call while the first is pending must not start anything.
        assert!(!checker.begin_check());

        checker.apply_check_result(Ok(release("1.1.0", &[])));
        assert!(!checker.is_checking);
        assert!(checker.begin_check());
    }

    #[test]
    fn newer_release_flags_availability_and_alert() {
        let mut checker = test_checker("newer", "1.2.0");
        checker.apply_check_result(Ok(release("1.3.0", &[])));
        assert!(checker.update_available);
        assert!(checker.alert_pending);
        assert!(checker.error_message.is_none());
    }

    #[test]
    fn same_or_older_release_is_not_available() {
        let mut checker = test_checker("older", "1.2.0");
        checker.apply_check_result(Ok(release("1.2.0", &[])));
        assert!(!checker.update_available);
        assert!(!checker.alert_pending);

        checker.apply_check_result(Ok(release("1.1.9", &[])));
        assert!(!checker.update_available);
    }

    #[test]
    fn skipped_version_is_never_available() {
        let mut checker = test_checker("skipped", "1.2.0");
        checker.state.skipped_version = Some("1.3.0".to_string());
        checker.apply_check_result(Ok(release("1.3.0", &[])));
        assert!(!checker.update_available);
        assert!(!checker.alert_pending);
    }

    #[test]
    fn skip_flow_silences_the_same_tag_on_recheck() {
        let mut checker = test_checker("skip-flow", "1.2.0");
        checker.apply_check_result(Ok(release("1.3.0", &[])));
        assert!(checker.update_available);

        checker.skip_this_version();
        assert!(!checker.update_available);
        assert!(!checker.alert_pending);
        assert_eq!(checker.state.skipped_version.as_deref(), Some("1.3.0"));

        // The same tag coming back must not re-trigger the alert.
        checker.apply_check_result(Ok(release("1.3.0", &[])));
        assert!(!checker.update_available);
        assert!(!checker.alert_pending);
    }

    #[test]
    fn failed_check_keeps_previous_release() {
        let mut checker = test_checker("failure", "1.0.0");
        checker.apply_check_result(Ok(release("1.1.0", &[])));
        checker.begin_check();
        checker.apply_check_result(Err(UpdateError::Network("timed out".to_string())));
        assert!(!checker.is_checking);
        assert_eq!(
            checker.latest_release.as_ref().map(|r| r.tag.as_str()),
            Some("1.1.0")
        );
        let message = checker.error_message.as_deref().unwrap();
        assert!(message.contains("timed out"));
    }

    #[test]
    fn download_without_installer_asset_sets_error() {
        let (tx, rx) = mpsc::channel();
        let mut checker = test_checker("no-asset", "1.0.0");
        checker.apply_check_result(Ok(release("2.0.0", &["checksums.txt"])));

        checker.download_and_install(&tx);
        assert!(!checker.is_downloading);
        assert!(!checker.error_message.as_deref().unwrap_or("").is_empty());
        // No worker was spawned, so nothing ever arrives on the channel.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn download_without_any_release_sets_error() {
        let (tx, _rx) = mpsc::channel();
        let mut checker = test_checker("no-release", "1.0.0");
        checker.download_and_install(&tx);
        assert!(!checker.is_downloading);
        assert!(checker.error_message.is_some());
    }

    #[test]
    fn download_progress_tracks_byte_ratio() {
        let mut checker = test_checker("progress", "1.0.0");
        checker.apply_download_progress(25, Some(100));
        assert!((checker.download_progress - 0.25).abs() < f64::EPSILON);

        // Unknown or zero totals leave the last known fraction alone.
        checker.apply_download_progress(50, None);
        assert!((checker.download_progress - 0.25).abs() < f64::EPSILON);
        checker.apply_download_progress(50, Some(0));
        assert!((checker.download_progress - 0.25).abs() < f64::EPSILON);

        checker.apply_download_progress(400, Some(100));
        assert!((checker.download_progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn finished_download_clears_flag_and_keeps_path() {
        let mut checker = test_checker("finished", "1.0.0");
        checker.is_downloading = true;
        checker.apply_download_result(Ok(PathBuf::from("/tmp/pomo-2.0.0.dmg")));
        assert!(!checker.is_downloading);
        assert_eq!(
            checker.last_download.as_deref(),
            Some(std::path::Path::new("/tmp/pomo-2.0.0.dmg"))
        );

        checker.is_downloading = true;
        checker.apply_download_result(Err(UpdateError::Filesystem("disk full".to_string())));
        assert!(!checker.is_downloading);
        assert!(checker.error_message.as_deref().unwrap().contains("disk full"));
    }

    #[test]
    fn remind_me_later_defers_for_a_day() {
        let mut checker = test_checker("remind", "1.2.0");
        checker.apply_check_result(Ok(release("1.3.0", &[])));
        assert!(checker.alert_pending);

        checker.remind_me_later();
        assert!(!checker.alert_pending);
        // Skipped version untouched, availability untouched.
        assert!(checker.state.skipped_version.is_none());
        assert!(checker.update_available);

        let not_before = checker.state.next_check_not_before.unwrap();
        let now = Utc::now();
        assert!(not_before > now + Duration::hours(23));
        assert!(not_before < now + Duration::hours(25));
    }

    #[test]
    fn launch_check_honors_deferral_and_toggle() {
        let mut checker = test_checker("launch", "1.0.0");
        assert!(checker.launch_check_due(true));
        assert!(!checker.launch_check_due(false));

        checker.state.defer_checks_for_hours(24);
        assert!(!checker.launch_check_due(true));
    }

    #[test]
    fn interval_check_respects_settings_and_staleness() {
        let mut checker = test_checker("interval", "1.0.0");
        // Nothing recorded yet: due as soon as auto-check allows it.
        assert!(checker.interval_check_due(true, 24));
        assert!(!checker.interval_check_due(false, 24));
        assert!(!checker.interval_check_due(true, 0));

        checker.apply_check_result(Ok(release("1.0.0", &[])));
        assert!(!checker.interval_check_due(true, 24));

        checker.state.last_check = Some(Utc::now() - Duration::hours(30));
        assert!(checker.interval_check_due(true, 24));

        checker.is_checking = true;
        assert!(!checker.interval_check_due(true, 24));
    }
}
