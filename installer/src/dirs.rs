//! Directory resolution abstraction for platform-specific paths.
//!
//! The release cache lives beneath the per-user configuration directory so
//! that every project on the machine shares one extracted copy of each
//! Editor release.

use camino::Utf8PathBuf;
use directories_next::ProjectDirs;
use std::path::PathBuf;

/// Application name used for per-user directories.
const APPLICATION: &str = "editor-installer";

/// Abstraction over platform base directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Per-user configuration directory for the installer, if known.
    fn config_dir(&self) -> Option<PathBuf>;
}

/// Base directories resolved from the host platform.
///
/// # Examples
///
/// ```no_run
/// use editor_installer::dirs::{BaseDirs, SystemBaseDirs};
///
/// let dirs = SystemBaseDirs::new();
/// println!("{:?}", dirs.config_dir());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SystemBaseDirs {
    project: Option<ProjectDirs>,
}

impl SystemBaseDirs {
    /// Resolve the platform directories.
    ///
    /// Lookups report `None` when no home directory can be determined.
    #[must_use]
    pub fn new() -> Self {
        Self {
            project: ProjectDirs::from("", "", APPLICATION),
        }
    }
}

impl BaseDirs for SystemBaseDirs {
    fn config_dir(&self) -> Option<PathBuf> {
        self.project
            .as_ref()
            .map(|project| project.config_dir().to_path_buf())
    }
}

/// Errors raised while resolving the cache root.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheRootError {
    /// The platform did not report a configuration directory.
    #[error("could not determine the per-user configuration directory")]
    Unavailable,

    /// The configuration directory is not valid UTF-8.
    #[error("configuration directory is not valid UTF-8: {path}")]
    NonUtf8 {
        /// Lossy rendering of the offending path.
        path: String,
    },
}

/// Resolve the per-user cache root.
///
/// # Errors
///
/// Returns [`CacheRootError`] when the directory is unknown or cannot be
/// represented as UTF-8.
pub fn cache_root(dirs: &dyn BaseDirs) -> Result<Utf8PathBuf, CacheRootError> {
    let dir = dirs.config_dir().ok_or(CacheRootError::Unavailable)?;
    Utf8PathBuf::from_path_buf(dir).map_err(|path| CacheRootError::NonUtf8 {
        path: path.display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_root_uses_config_dir() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/test/.config/editor-installer")));

        let root = cache_root(&dirs).expect("cache root");

        assert_eq!(root, Utf8PathBuf::from("/home/test/.config/editor-installer"));
    }

    #[test]
    fn missing_config_dir_is_an_error() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_config_dir().return_once(|| None);

        assert_eq!(cache_root(&dirs), Err(CacheRootError::Unavailable));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_non_utf8_config_dir() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let mut dirs = MockBaseDirs::new();
        dirs.expect_config_dir().return_once(|| {
            Some(PathBuf::from(OsString::from_vec(vec![
                b'/', b't', b'm', b'p', b'/', 0xff,
            ])))
        });

        let err = cache_root(&dirs).expect_err("expected UTF-8 conversion error");
        assert!(matches!(err, CacheRootError::NonUtf8 { .. }), "unexpected error: {err}");
    }
}
