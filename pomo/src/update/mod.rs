//! Self-update workflow: release feed polling, version comparison,
//! installer download, and persisted dismissal state.
//!
//! All state mutation happens on the main thread; network work runs on a
//! worker thread and reports back through an [`UpdateEvent`] channel.

pub mod checker;
pub mod feed;
pub mod installer;
pub mod state;

pub use checker::{UpdateChecker, UpdateEvent};
pub use feed::{compare_versions, Release, ReleaseAsset};
pub use state::UpdateState;

use thiserror::Error;

/// Failure taxonomy for the update workflow. Every variant is recovered
/// locally and shown to the user as a plain message; none aborts the app.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from update server: {0}")]
    MalformedResponse(String),

    #[error("No installer found in the latest release")]
    NoInstallerAsset,

    #[error("Filesystem error: {0}")]
    Filesystem(String),
}
