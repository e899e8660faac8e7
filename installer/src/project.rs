//! Installation of a cached Editor release into the project directory.
//!
//! A project install is a full copy of one cache entry. Script assets have
//! their project identifier placeholder replaced with a freshly generated
//! identifier, and a zero-byte marker file named after the release tag
//! records which release produced the contents. A matching marker makes the
//! install a no-op; any other state is discarded and rebuilt from scratch.

use camino::Utf8Path;
use log::{debug, info};
use regex::bytes::{NoExpand, Regex};
use serde::Deserialize;
use std::fmt;
use std::fs::{self, DirBuilder, File};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Prefix of every generated project identifier.
///
/// Identifiers are embedded in JavaScript, where a leading digit would make
/// them invalid.
pub const PROJECT_ID_PREFIX: &str = "ce";

/// Placeholder token the Editor build ships in its script assets.
pub const DEFAULT_PLACEHOLDER: &str = "__CARDINAL_PROJECT_ID__";

/// Subdirectory holding the Editor's script assets.
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Extension of script assets that carry the placeholder.
pub const DEFAULT_SCRIPT_EXTENSION: &str = "js";

/// The token replaced with the project identifier in script assets.
///
/// An empty token would match between every byte, so it is rejected.
///
/// # Examples
///
/// ```
/// use editor_installer::project::Placeholder;
///
/// assert_eq!(Placeholder::default().as_str(), "__CARDINAL_PROJECT_ID__");
/// assert!(Placeholder::try_from("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Placeholder(String);

impl Placeholder {
    /// Return the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Placeholder {
    fn default() -> Self {
        Self(DEFAULT_PLACEHOLDER.to_owned())
    }
}

/// An empty placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("placeholder must not be empty")]
pub struct EmptyPlaceholder;

impl TryFrom<String> for Placeholder {
    type Error = EmptyPlaceholder;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(EmptyPlaceholder)
        } else {
            Ok(Self(value))
        }
    }
}

impl TryFrom<&str> for Placeholder {
    type Error = EmptyPlaceholder;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unique identifier for one project install.
///
/// # Examples
///
/// ```
/// use editor_installer::project::ProjectId;
///
/// let id = ProjectId::generate();
/// assert!(id.as_str().starts_with("ce"));
/// assert_ne!(id, ProjectId::generate());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    /// Generate a fresh identifier from a random UUID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!(
            "{PROJECT_ID_PREFIX}{}",
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of an install request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The project already carries the requested release; nothing was written.
    AlreadyCurrent,
    /// The project directory was (re)built from the cache.
    Installed {
        /// Identifier substituted into the script assets.
        project_id: ProjectId,
        /// Number of script files that contained the placeholder.
        files_rewritten: usize,
        /// Total placeholder occurrences replaced.
        replacements: usize,
    },
}

/// Errors raised while installing into the project directory.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// A filesystem operation failed.
    #[error("failed to {action} {}", path.display())]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// The path being operated on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Walking the cached release failed.
    #[error("failed to read cached release")]
    Walk(#[from] walkdir::Error),

    /// The placeholder could not be turned into a matcher.
    #[error("invalid placeholder")]
    Placeholder(#[from] regex::Error),

    /// The release has no script assets directory.
    #[error("assets directory not found at {}", path.display())]
    MissingAssets {
        /// The expected assets directory.
        path: PathBuf,
    },
}

impl ProjectError {
    fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Report whether `project_dir` carries the marker for `release_tag`.
#[must_use]
pub fn has_marker(project_dir: &Utf8Path, release_tag: &str) -> bool {
    project_dir.join(release_tag).is_file()
}

/// Copies cached releases into a project directory.
#[derive(Debug, Clone)]
pub struct ProjectInstaller {
    placeholder: Placeholder,
    assets_dir: String,
    script_extension: String,
}

impl Default for ProjectInstaller {
    fn default() -> Self {
        Self {
            placeholder: Placeholder::default(),
            assets_dir: DEFAULT_ASSETS_DIR.to_owned(),
            script_extension: DEFAULT_SCRIPT_EXTENSION.to_owned(),
        }
    }
}

impl ProjectInstaller {
    /// Create an installer substituting `placeholder` in script assets.
    #[must_use]
    pub fn new(placeholder: Placeholder) -> Self {
        Self {
            placeholder,
            ..Self::default()
        }
    }

    /// Override the assets subdirectory.
    #[must_use]
    pub fn with_assets_dir(mut self, assets_dir: impl Into<String>) -> Self {
        self.assets_dir = assets_dir.into();
        self
    }

    /// Override the script file extension (without the dot).
    #[must_use]
    pub fn with_script_extension(mut self, extension: impl Into<String>) -> Self {
        self.script_extension = extension.into();
        self
    }

    /// Install the release at `cache_dir` into `project_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectError`] if removing the stale install, copying,
    /// rewriting script assets, or writing the marker fails. The project
    /// directory carries no marker after a failure.
    pub fn install(
        &self,
        cache_dir: &Utf8Path,
        release_tag: &str,
        project_dir: &Utf8Path,
    ) -> Result<InstallOutcome, ProjectError> {
        if has_marker(project_dir, release_tag) {
            debug!("{project_dir} already holds editor release {release_tag}");
            return Ok(InstallOutcome::AlreadyCurrent);
        }

        remove_existing(project_dir.as_std_path())?;
        copy_tree(cache_dir.as_std_path(), project_dir.as_std_path())?;

        let project_id = ProjectId::generate();
        let (files_rewritten, replacements) =
            self.replace_placeholder(project_dir.as_std_path(), &project_id)?;

        let marker = project_dir.join(release_tag);
        File::create(&marker)
            .map_err(|source| ProjectError::io("create marker", marker.as_std_path(), source))?;

        info!("Installed editor release {release_tag} into {project_dir}");
        Ok(InstallOutcome::Installed {
            project_id,
            files_rewritten,
            replacements,
        })
    }

    /// Replace the placeholder in every script directly under the assets
    /// directory. Returns the number of files rewritten and occurrences
    /// replaced. Scripts are handled as bytes and only files containing the
    /// placeholder are written.
    fn replace_placeholder(
        &self,
        project_dir: &Path,
        project_id: &ProjectId,
    ) -> Result<(usize, usize), ProjectError> {
        let assets = project_dir.join(&self.assets_dir);
        if !assets.is_dir() {
            return Err(ProjectError::MissingAssets { path: assets });
        }

        let pattern = Regex::new(&regex::escape(self.placeholder.as_str()))?;
        let entries =
            fs::read_dir(&assets).map_err(|source| ProjectError::io("read", &assets, source))?;
        let mut files = 0;
        let mut occurrences = 0;
        for entry in entries {
            let path = entry
                .map_err(|source| ProjectError::io("read", &assets, source))?
                .path();
            if !path.is_file() || !self.is_script(&path) {
                continue;
            }

            let contents =
                fs::read(&path).map_err(|source| ProjectError::io("read", &path, source))?;
            let count = pattern.find_iter(&contents).count();
            if count == 0 {
                continue;
            }

            let replacement = NoExpand(project_id.as_str().as_bytes());
            let rewritten = pattern.replace_all(&contents, replacement);
            fs::write(&path, rewritten).map_err(|source| ProjectError::io("write", &path, source))?;
            files += 1;
            occurrences += count;
        }

        debug!("replaced {occurrences} project id placeholder(s) in {files} file(s)");
        Ok((files, occurrences))
    }

    fn is_script(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.script_extension.as_str())
    }
}

fn remove_existing(project_dir: &Path) -> Result<(), ProjectError> {
    let Ok(metadata) = fs::symlink_metadata(project_dir) else {
        return Ok(());
    };

    debug!("removing stale editor install at {}", project_dir.display());
    let result = if metadata.is_dir() {
        fs::remove_dir_all(project_dir)
    } else {
        fs::remove_file(project_dir)
    };
    result.map_err(|source| ProjectError::io("remove", project_dir, source))
}

fn copy_tree(source: &Path, destination: &Path) -> Result<(), ProjectError> {
    create_dir(destination)?;
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ProjectError::io("copy", entry.path(), std::io::Error::other(e)))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            create_dir(&target)?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|source| ProjectError::io("copy", entry.path(), source))?;
        }
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), ProjectError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder
        .create(path)
        .map_err(|source| ProjectError::io("create directory", path, source))
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
