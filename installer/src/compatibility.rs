//! Module-version to editor-release compatibility table.
//!
//! The authoritative table is hosted remotely as a flat JSON object:
//!
//! ```json
//! { "v1.2.2-beta": "v0.1.0", "v1.2.4-beta": "v0.3.1" }
//! ```
//!
//! A built-in copy ships with the installer for when the remote table cannot
//! be fetched or parsed. The two are never merged. Every release tag must be
//! a valid [`ReleaseName`]; a table with an unusable tag fails to parse as a
//! whole.

use crate::manifest::ModuleVersion;
use crate::release::ReleaseName;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Mapping from Module version to Editor release tag.
///
/// # Examples
///
/// ```
/// use editor_installer::compatibility::CompatibilityMap;
/// use editor_installer::manifest::ModuleVersion;
///
/// let map = CompatibilityMap::parse(br#"{"v1.2.2-beta":"v0.1.0"}"#).expect("valid map");
/// assert_eq!(map.release_for(&ModuleVersion::from("v1.2.2-beta")), Some("v0.1.0"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityMap(BTreeMap<String, ReleaseName>);

impl CompatibilityMap {
    /// The table shipped with the installer.
    #[must_use]
    pub fn builtin() -> Self {
        [
            ("v1.2.2-beta", "v0.1.0"),
            ("v1.2.3-beta", "v0.1.0"),
            ("v1.2.4-beta", "v0.3.1"),
            ("v1.2.5-beta", "v0.3.1"),
        ]
        .into_iter()
        .filter_map(|(module, release)| {
            ReleaseName::try_from(release)
                .ok()
                .map(|release| (module, release))
        })
        .collect()
    }

    /// Parse a JSON object of string pairs.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `bytes` is not a JSON object whose
    /// values are all valid release names.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Look up the release tag for `version`.
    #[must_use]
    pub fn release_for(&self, version: &ModuleVersion) -> Option<&str> {
        self.0.get(version.as_str()).map(ReleaseName::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ReleaseName)> for CompatibilityMap {
    fn from_iter<I: IntoIterator<Item = (K, ReleaseName)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
