//! Resolution of the Module's declared version to an Editor release.
//!
//! The resolver reads the Module manifest first, so a missing manifest or
//! dependency fails before any network traffic. It then fetches the remote
//! compatibility table, substituting the configured fallback table on any
//! fetch or parse failure, and picks either a tag-qualified release endpoint
//! or the unqualified `latest` endpoint.

use camino::Utf8Path;
use log::{debug, warn};
use std::borrow::Cow;
use std::fmt;

use crate::compatibility::CompatibilityMap;
use crate::fetch::ContentFetcher;
use crate::manifest::{ManifestError, ModuleVersion, module_version};

/// The release the pipeline should provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseTarget {
    /// Whatever the release listing reports as latest.
    Latest,
    /// A specific release tag from the compatibility table.
    Tag(String),
}

impl ReleaseTarget {
    /// Build the release endpoint URL beneath `releases_url`.
    ///
    /// # Examples
    ///
    /// ```
    /// use editor_installer::resolver::ReleaseTarget;
    ///
    /// let base = "https://api.github.com/repos/Argus-Labs/cardinal-editor/releases";
    /// assert_eq!(ReleaseTarget::Latest.endpoint(base), format!("{base}/latest"));
    /// assert_eq!(
    ///     ReleaseTarget::Tag("v0.1.0".to_owned()).endpoint(base),
    ///     format!("{base}/tags/v0.1.0"),
    /// );
    /// ```
    #[must_use]
    pub fn endpoint(&self, releases_url: &str) -> String {
        let base = releases_url.trim_end_matches('/');
        match self {
            Self::Latest => format!("{base}/latest"),
            Self::Tag(tag) => format!("{base}/tags/{tag}"),
        }
    }

    /// The pinned tag, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Latest => None,
            Self::Tag(tag) => Some(tag),
        }
    }
}

impl fmt::Display for ReleaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Which compatibility table produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSource {
    /// The remotely hosted table.
    Remote,
    /// The configured fallback table.
    Fallback,
}

/// The outcome of resolving the Module version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The version declared in the manifest.
    pub module_version: ModuleVersion,
    /// The release to provision.
    pub target: ReleaseTarget,
    /// Which table the target came from.
    pub map_source: MapSource,
}

/// Maps the Module's declared version to an Editor release.
pub struct CompatibilityResolver<'a> {
    fetcher: &'a dyn ContentFetcher,
    map_url: &'a str,
    fallback: &'a CompatibilityMap,
}

impl<'a> CompatibilityResolver<'a> {
    /// Create a resolver that fetches the table from `map_url` and falls back
    /// to `fallback`.
    #[must_use]
    pub fn new(
        fetcher: &'a dyn ContentFetcher,
        map_url: &'a str,
        fallback: &'a CompatibilityMap,
    ) -> Self {
        Self {
            fetcher,
            map_url,
            fallback,
        }
    }

    /// Resolve the release for `dependency` as declared in `manifest_path`.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] if the manifest cannot be read or does not
    /// declare `dependency`. Compatibility-table failures are never errors.
    pub fn resolve(
        &self,
        manifest_path: &Utf8Path,
        dependency: &str,
    ) -> Result<Resolution, ManifestError> {
        let module_version = module_version(manifest_path, dependency)?;
        debug!("{dependency} is declared at {module_version}");

        let (map, map_source) = self.load_map();
        let target = map
            .release_for(&module_version)
            .map_or(ReleaseTarget::Latest, |tag| ReleaseTarget::Tag(tag.to_owned()));

        if target == ReleaseTarget::Latest {
            debug!("no editor release mapped for {module_version}; using latest");
        }

        Ok(Resolution {
            module_version,
            target,
            map_source,
        })
    }

    /// Fetch the remote table, or fall back to the configured one.
    #[must_use]
    pub fn load_map(&self) -> (Cow<'a, CompatibilityMap>, MapSource) {
        let fetched = self
            .fetcher
            .fetch_json(self.map_url)
            .map_err(|e| e.to_string())
            .and_then(|body| CompatibilityMap::parse(&body).map_err(|e| e.to_string()));

        match fetched {
            Ok(map) => (Cow::Owned(map), MapSource::Remote),
            Err(reason) => {
                warn!("Failed to get version map, using default version map ({reason})");
                (Cow::Borrowed(self.fallback), MapSource::Fallback)
            }
        }
    }
}
