//! Host tool checks for the `doctor` subcommand.
//!
//! Each [`Dependency`] is probed by running a cheap version or status
//! command. [`check_all`] runs every probe and reports all failures at once
//! so a user can fix their environment in one pass.

use std::fmt;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    fn run(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output>;
}

/// Executes commands on the host system.
///
/// # Examples
///
/// ```no_run
/// use editor_installer::deps::{CommandExecutor, SystemCommandExecutor};
///
/// let executor = SystemCommandExecutor;
/// let output = executor.run("git", &["--version"])?;
/// assert!(output.status.success());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        Command::new(cmd).args(args).output()
    }
}

/// A host tool required by the development workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Human-readable name.
    pub name: &'static str,
    /// Program used to probe the tool.
    pub program: String,
    /// Arguments passed to the probe.
    pub args: Vec<&'static str>,
    /// Installation guidance shown when the probe fails.
    pub help: &'static str,
}

/// One failed dependency probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCheck {
    /// Name of the dependency.
    pub name: &'static str,
    /// Why the probe failed.
    pub reason: String,
    /// Installation guidance.
    pub help: &'static str,
}

impl fmt::Display for FailedCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dependency check \"{}\" failed with: {}\n{}",
            self.name, self.reason, self.help
        )
    }
}

/// Errors from dependency checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyError {
    /// One or more probes failed.
    #[error("{}", render_failures(.0))]
    Missing(Vec<FailedCheck>),
}

fn render_failures(failures: &[FailedCheck]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl Dependency {
    fn new(
        name: &'static str,
        program: &str,
        args: &[&'static str],
        help: &'static str,
    ) -> Self {
        Self {
            name,
            program: program.to_owned(),
            args: args.to_vec(),
            help,
        }
    }

    /// Run the probe.
    ///
    /// # Errors
    ///
    /// Returns a [`FailedCheck`] when the probe cannot be spawned or exits
    /// unsuccessfully.
    pub fn check(&self, executor: &dyn CommandExecutor) -> Result<(), FailedCheck> {
        let reason = match executor.run(&self.program, &self.args) {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => match String::from_utf8_lossy(&output.stderr).trim() {
                "" => output.status.to_string(),
                stderr => stderr.to_owned(),
            },
            Err(err) => err.to_string(),
        };
        Err(FailedCheck {
            name: self.name,
            reason,
            help: self.help,
        })
    }
}

/// Select the container engine: `docker`, or `podman` when `docker -v`
/// fails.
#[must_use]
pub fn container_command(executor: &dyn CommandExecutor) -> &'static str {
    if executor
        .run("docker", &["-v"])
        .is_ok_and(|o| o.status.success())
    {
        "docker"
    } else {
        "podman"
    }
}

/// Git probe.
#[must_use]
pub fn git() -> Dependency {
    Dependency::new(
        "Git",
        "git",
        &["--version"],
        "Git is required to clone the starter-game-template.\n\
         Learn how to install Git: https://github.com/git-guides/install-git",
    )
}

/// Go toolchain probe.
#[must_use]
pub fn go() -> Dependency {
    Dependency::new(
        "Go",
        "go",
        &["version"],
        "Go is required to build and run World Engine game shards.\n\
         Learn how to install Go: https://go.dev/doc/install",
    )
}

/// Container engine probe.
#[must_use]
pub fn docker(container: &str) -> Dependency {
    Dependency::new(
        "Docker",
        container,
        &["--version"],
        "Docker is required to build and run World Engine game shards.\n\
         Learn how to install Docker: https://docs.docker.com/engine/install/",
    )
}

/// Compose plugin probe.
#[must_use]
pub fn docker_compose(container: &str) -> Dependency {
    Dependency::new(
        "Docker Compose",
        container,
        &["compose", "version"],
        "Docker Compose is required to build and run World Engine game shards.\n\
         Learn how to install Docker: https://docs.docker.com/engine/install/",
    )
}

/// Container daemon liveness probe.
#[must_use]
pub fn docker_daemon(container: &str) -> Dependency {
    Dependency::new(
        "Docker daemon is running",
        container,
        &["info"],
        "Docker daemon needs to be running.\n\
         If you use Docker Desktop, make sure that you have started it",
    )
}

/// Every probe run by `doctor`, using the detected container engine.
#[must_use]
pub fn standard_dependencies(executor: &dyn CommandExecutor) -> Vec<Dependency> {
    let container = container_command(executor);
    vec![
        git(),
        go(),
        docker(container),
        docker_compose(container),
        docker_daemon(container),
    ]
}

/// Run every probe and aggregate the failures.
///
/// # Errors
///
/// Returns [`DependencyError::Missing`] listing every failed probe, in
/// order, if any fail.
pub fn check_all(
    executor: &dyn CommandExecutor,
    dependencies: &[Dependency],
) -> Result<(), DependencyError> {
    let failures: Vec<FailedCheck> = dependencies
        .iter()
        .filter_map(|dep| dep.check(executor).err())
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(DependencyError::Missing(failures))
    }
}
