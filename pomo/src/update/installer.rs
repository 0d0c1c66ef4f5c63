//! Installer asset selection, streaming download, and hand-off to the OS.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::UserDirs;
use tracing::info;

use super::feed::{Release, ReleaseAsset};
use super::UpdateError;

/// Installer artifact extension for the current platform.
pub fn installer_extension() -> &'static str {
    if cfg!(target_os = "macos") {
        ".dmg"
    } else if cfg!(target_os = "windows") {
        ".msi"
    } else {
        ".AppImage"
    }
}

/// First asset whose name carries the platform installer extension.
pub fn select_installer_asset(release: &Release) -> Option<&ReleaseAsset> {
    release
        .assets
        .iter()
        .find(|asset| asset.name.ends_with(installer_extension()))
}

/// Folder downloaded installers land in.
pub fn download_dir() -> Result<PathBuf, UpdateError> {
    let dirs = UserDirs::new()
        .ok_or_else(|| UpdateError::Filesystem("Could not determine home directory".to_string()))?;
    match dirs.download_dir() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Ok(dirs.home_dir().join("Downloads")),
    }
}

/// Stream `url` to `dest`, reporting progress as bytes arrive.
///
/// Any pre-existing file at `dest` is removed first. The body is written to
/// a `.part` sibling and renamed into place once complete, so an aborted
/// download never leaves a truncated file under the final name.
pub fn download_asset(
    url: &str,
    dest: &Path,
    mut progress: impl FnMut(u64, Option<u64>),
) -> Result<(), UpdateError> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(15))
        .timeout_read(Duration::from_secs(300))
        .build();

    let resp = agent
        .get(url)
        .set("User-Agent", concat!("pomo/", env!("CARGO_PKG_VERSION")))
        .call()
        .map_err(|e| UpdateError::Network(e.to_string()))?;

    let total = resp
        .header("content-length")
        .and_then(|len| len.parse::<u64>().ok());

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| UpdateError::Filesystem(e.to_string()))?;
    }
    if dest.exists() {
        fs::remove_file(dest).map_err(|e| {
            UpdateError::Filesystem(format!("Could not remove {}: {e}", dest.display()))
        })?;
    }

    let part = dest.with_extension("part");
    let mut file = fs::File::create(&part).map_err(|e| {
        UpdateError::Filesystem(format!("Could not create {}: {e}", part.display()))
    })?;

    let mut reader = resp.into_reader();
    let mut buf = [0u8; 64 * 1024];
    let mut received: u64 = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| UpdateError::Network(format!("Download read error: {e}")))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| UpdateError::Filesystem(e.to_string()))?;
        received += n as u64;
        progress(received, total);
    }
    drop(file);

    fs::rename(&part, dest).map_err(|e| {
        UpdateError::Filesystem(format!(
            "Could not move {} into place: {e}",
            part.display()
        ))
    })?;
    info!("installer saved to {}", dest.display());
    Ok(())
}

/// Best-effort reveal of the downloaded artifact via the OS file handler.
pub fn reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(target_os = "windows")]
    let opener = "explorer";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let opener = "xdg-open";

    let _ = std::process::Command::new(opener)
        .arg(path)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn release_with_assets(names: &[&str]) -> Release {
        Release {
            tag: "1.3.0".to_string(),
            title: "pomo 1.3.0".to_string(),
            notes: String::new(),
            published_at: Utc::now(),
            assets: names
                .iter()
                .map(|name| ReleaseAsset {
                    name: (*name).to_string(),
                    download_url: format!("https://example.com/{name}"),
                    size_bytes: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn extension_is_a_dotted_suffix() {
        let ext = installer_extension();
        assert!(ext.starts_with('.'));
        assert!(ext.len() > 1);
    }

    #[test]
    fn selects_the_first_matching_asset() {
        let first = format!("pomo-a{}", installer_extension());
        let second = format!("pomo-b{}", installer_extension());
        let release = release_with_assets(&["checksums.txt", &first, &second]);
        let asset = select_installer_asset(&release).unwrap();
        assert_eq!(asset.name, first);
    }

    #[test]
    fn no_matching_asset_yields_none() {
        let release = release_with_assets(&["checksums.txt", "pomo.tar.zst"]);
        assert!(select_installer_asset(&release).is_none());
        let empty = release_with_assets(&[]);
        assert!(select_installer_asset(&empty).is_none());
    }
}
