//! Release feed client and version ordering.
//!
//! Talks to the GitHub "latest release" endpoint for the fixed repository
//! the app updates itself from.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::UpdateError;

/// Repository the release feed is read from.
pub const GITHUB_REPO: &str = "pabloagn/pomo";

/// A published release. Immutable once fetched; replaced wholesale on each
/// successful check.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Release {
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(rename = "body")]
    pub notes: String,
    pub published_at: DateTime<Utc>,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

/// Fetch the latest release for `repo`. Blocking; callers run this on a
/// worker thread.
pub fn fetch_latest(repo: &str, current_version: &str) -> Result<Release, UpdateError> {
    let url = format!("https://api.github.com/repos/{repo}/releases/latest");
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(10))
        .timeout_read(Duration::from_secs(20))
        .build();

    let resp = agent
        .get(&url)
        .set("Accept", "application/vnd.github.v3+json")
        .set("User-Agent", &format!("pomo/{current_version}"))
        .call()
        .map_err(|e| UpdateError::Network(e.to_string()))?;

    let body = resp
        .into_string()
        .map_err(|e| UpdateError::Network(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| UpdateError::MalformedResponse(e.to_string()))
}

/// Compare two dotted version strings component-wise, left to right.
/// Non-numeric or missing components count as zero, so `"1.2"` and
/// `"1.2.0"` are equal.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let components = |v: &str| -> Vec<u64> {
        v.split('.').map(|c| c.parse::<u64>().unwrap_or(0)).collect()
    };
    let av = components(a);
    let bv = components(b);
    for i in 0..av.len().max(bv.len()) {
        let x = av.get(i).copied().unwrap_or(0);
        let y = bv.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            decided => return decided,
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_major_compares_less() {
        for a in 0..5u32 {
            for b in (a + 1)..6 {
                let lhs = format!("{a}.0.0");
                let rhs = format!("{b}.0.0");
                assert_eq!(compare_versions(&lhs, &rhs), Ordering::Less);
            }
        }
    }

    #[test]
    fn equal_versions_compare_equal() {
        for v in ["1.0.0", "0.4.12", "10.2", "2"] {
            assert_eq!(compare_versions(v, v), Ordering::Equal);
        }
    }

    #[test]
    fn missing_trailing_components_are_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2.0.0", "1.2"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
    }

    #[test]
    fn components_compare_numerically() {
        assert_eq!(compare_versions("1.9.0", "1.10.0"), Ordering::Less);
        assert_eq!(compare_versions("0.2.11", "0.2.2"), Ordering::Greater);
    }

    #[test]
    fn non_numeric_components_count_as_zero() {
        assert_eq!(compare_versions("v1.2.0", "0.9.0"), Ordering::Less);
        assert_eq!(compare_versions("1.x.3", "1.0.3"), Ordering::Equal);
    }

    #[test]
    fn release_deserializes_from_feed_payload() {
        let json = r#"{
            "tag_name": "1.3.0",
            "name": "pomo 1.3.0",
            "body": "### Changes\n- faster startup",
            "published_at": "2025-06-01T12:30:00Z",
            "assets": [
                {
                    "name": "pomo-1.3.0.dmg",
                    "browser_download_url": "https://example.com/pomo-1.3.0.dmg",
                    "size": 1048576
                }
            ]
        }"#;
        let release: Release = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag, "1.3.0");
        assert_eq!(release.title, "pomo 1.3.0");
        assert!(release.notes.contains("faster startup"));
        assert_eq!(release.assets.len(), 1);
        assert_eq!(release.assets[0].size_bytes, 1_048_576);
        assert_eq!(
            release.assets[0].download_url,
            "https://example.com/pomo-1.3.0.dmg"
        );
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let err = serde_json::from_str::<Release>("{\"tag_name\": 7}").unwrap_err();
        let wrapped = UpdateError::MalformedResponse(err.to_string());
        assert!(wrapped.to_string().contains("Invalid response"));
    }
}
