//! Release metadata returned by the release listing endpoint.
//!
//! Only the fields the pipeline needs are modelled:
//!
//! ```json
//! {
//!   "name": "v0.1.0",
//!   "assets": [{ "browser_download_url": "https://.../cardinal-editor.zip" }]
//! }
//! ```
//!
//! The release name doubles as the cache key and the marker filename, so it
//! is validated during deserialization to be a single plain path component.

use serde::Deserialize;
use std::fmt;

/// A release name that is safe to use as a single path component.
///
/// # Examples
///
/// ```
/// use editor_installer::release::ReleaseName;
///
/// let name = ReleaseName::try_from("v0.1.0").expect("valid release name");
/// assert_eq!(name.as_str(), "v0.1.0");
/// assert!(ReleaseName::try_from("../v0.1.0").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ReleaseName(String);

impl ReleaseName {
    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A release name that cannot be used as a directory or file name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid release name \"{value}\": {reason}")]
pub struct InvalidReleaseName {
    /// The rejected name.
    pub value: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl TryFrom<String> for ReleaseName {
    type Error = InvalidReleaseName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let reason = if value.trim().is_empty() {
            Some("name must not be empty")
        } else if value == "." || value == ".." {
            Some("name must not be a relative directory reference")
        } else if value.contains(['/', '\\']) {
            Some("name must not contain path separators")
        } else if value.contains('\0') {
            Some("name must not contain NUL")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidReleaseName { value, reason }),
            None => Ok(Self(value)),
        }
    }
}

impl TryFrom<&str> for ReleaseName {
    type Error = InvalidReleaseName;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl AsRef<str> for ReleaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    /// Direct download URL for the asset.
    pub browser_download_url: String,
}

/// Metadata describing one Editor release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseMetadata {
    /// Display name of the release; used as the cache key.
    pub name: ReleaseName,
    /// Attached assets, in the order the listing reports them.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseMetadata {
    /// Parse release metadata from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON, missing fields, or
    /// an unusable release name.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The download URL of the first asset; the only one the pipeline uses.
    #[must_use]
    pub fn archive_url(&self) -> Option<&str> {
        self.assets
            .first()
            .map(|asset| asset.browser_download_url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_release_listing() {
        let body = br#"{
            "name": "v0.3.1",
            "tag_name": "v0.3.1",
            "assets": [
                {"browser_download_url": "https://example.test/a.zip", "size": 10},
                {"browser_download_url": "https://example.test/b.zip"}
            ]
        }"#;
        let metadata = ReleaseMetadata::parse(body).expect("metadata");
        assert_eq!(metadata.name.as_str(), "v0.3.1");
        assert_eq!(metadata.archive_url(), Some("https://example.test/a.zip"));
    }

    #[test]
    fn release_without_assets_has_no_archive() {
        let metadata = ReleaseMetadata::parse(br#"{"name":"v0.1.0","assets":[]}"#).expect("metadata");
        assert_eq!(metadata.archive_url(), None);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    #[case::dot(".")]
    #[case::dot_dot("..")]
    #[case::slash("v0.1.0/../../etc")]
    #[case::backslash("v0.1.0\\x")]
    fn rejects_unsafe_names(#[case] name: &str) {
        assert!(ReleaseName::try_from(name).is_err(), "{name:?} should be rejected");
    }

    #[test]
    fn unsafe_name_fails_metadata_parsing() {
        let result = ReleaseMetadata::parse(br#"{"name":"../escape","assets":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_name_fails_metadata_parsing() {
        assert!(ReleaseMetadata::parse(br#"{"assets":[]}"#).is_err());
    }
}
