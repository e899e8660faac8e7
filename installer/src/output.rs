//! Output formatting for the installer CLI.
//!
//! This module renders the human-readable summary of a provisioning run and
//! the error chain printed when a run fails.

use camino::Utf8Path;
use std::fmt::Write as _;
use std::io::Write;

use crate::pipeline::SetupOutcome;
use crate::project::InstallOutcome;

/// Format the summary printed after a successful setup.
#[must_use]
pub fn success_message(outcome: &SetupOutcome, project_dir: &Utf8Path) -> String {
    match &outcome.install {
        InstallOutcome::AlreadyCurrent => format!(
            "Cardinal Editor {} is already installed in {project_dir}",
            outcome.release
        ),
        InstallOutcome::Installed { project_id, .. } => {
            let source = if outcome.downloaded {
                "downloaded"
            } else {
                "from cache"
            };
            format!(
                "Installed Cardinal Editor {} ({source}) to {project_dir} with project id {project_id}",
                outcome.release
            )
        }
    }
}

/// Render `err` followed by each of its sources on an indented line.
///
/// # Examples
///
/// ```
/// use editor_installer::output::error_chain;
///
/// let err = std::io::Error::other("disk full");
/// assert_eq!(error_chain(&err), "disk full");
/// ```
#[must_use]
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(text, "\n  caused by: {cause}");
        source = cause.source();
    }
    text
}

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ModuleVersion;
    use crate::project::ProjectId;
    use crate::resolver::{MapSource, ReleaseTarget, Resolution};
    use rstest::{fixture, rstest};

    #[fixture]
    fn resolution() -> Resolution {
        Resolution {
            module_version: ModuleVersion::from("v1.2.2-beta"),
            target: ReleaseTarget::Tag("v0.1.0".to_owned()),
            map_source: MapSource::Remote,
        }
    }

    #[rstest]
    fn already_current_message_names_release(resolution: Resolution) {
        let outcome = SetupOutcome {
            resolution,
            release: "v0.1.0".to_owned(),
            downloaded: false,
            install: InstallOutcome::AlreadyCurrent,
        };

        let message = success_message(&outcome, Utf8Path::new(".editor"));

        assert_eq!(message, "Cardinal Editor v0.1.0 is already installed in .editor");
    }

    #[rstest]
    #[case::downloaded(true, "downloaded")]
    #[case::cached(false, "from cache")]
    fn installed_message_reports_source(
        resolution: Resolution,
        #[case] downloaded: bool,
        #[case] source: &str,
    ) {
        let project_id = ProjectId::generate();
        let outcome = SetupOutcome {
            resolution,
            release: "v0.1.0".to_owned(),
            downloaded,
            install: InstallOutcome::Installed {
                project_id: project_id.clone(),
                files_rewritten: 1,
                replacements: 2,
            },
        };

        let message = success_message(&outcome, Utf8Path::new(".editor"));

        assert!(message.contains(source));
        assert!(message.contains(project_id.as_str()));
    }

    #[test]
    fn error_chain_lists_every_cause() {
        #[derive(Debug, thiserror::Error)]
        #[error("outer")]
        struct Outer(#[source] std::io::Error);

        let err = Outer(std::io::Error::other("inner"));

        assert_eq!(error_chain(&err), "outer\n  caused by: inner");
    }

    #[test]
    fn write_stderr_line_appends_newline() {
        let mut buffer = Vec::new();
        write_stderr_line(&mut buffer, "hello");
        assert_eq!(buffer, b"hello\n");
    }
}
