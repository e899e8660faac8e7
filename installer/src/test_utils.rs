//! Shared test utilities for the installer crate.

#![expect(clippy::expect_used, reason = "test helpers fail loudly on broken fixtures")]

use crate::deps::CommandExecutor;
use crate::fetch::{ContentFetcher, FetchError};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read, Write};
use std::process::{ExitStatus, Output};

/// An entry to place in an in-memory zip archive.
#[derive(Debug, Clone, Copy)]
pub enum ArchiveEntry<'a> {
    /// A directory entry; the name should end in `/`.
    Dir(&'a str),
    /// A file entry with its contents.
    File(&'a str, &'a [u8]),
}

/// Builds a zip archive in memory from the given entries, in order.
///
/// # Panics
///
/// Panics if the zip writer rejects an entry.
#[must_use]
pub fn zip_bytes(entries: &[ArchiveEntry<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for entry in entries {
        match entry {
            ArchiveEntry::Dir(name) => writer
                .add_directory(*name, options)
                .expect("add directory entry"),
            ArchiveEntry::File(name, contents) => {
                writer.start_file(*name, options).expect("start file entry");
                writer.write_all(contents).expect("write file entry");
            }
        }
    }
    writer.finish().expect("finish zip archive").into_inner()
}

/// Renders a release metadata document with a single asset.
#[must_use]
pub fn release_json(name: &str, asset_url: &str) -> String {
    format!(r#"{{"name":"{name}","assets":[{{"browser_download_url":"{asset_url}"}}]}}"#)
}

/// A stub [`ContentFetcher`] serving canned responses keyed by URL.
///
/// URLs without a registered response fail with a [`FetchError`], which is
/// how tests simulate an unreachable host. Every request is recorded so
/// tests can assert on network activity.
#[derive(Debug, Default)]
pub struct StubFetcher {
    json: HashMap<String, Vec<u8>>,
    binary: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl StubFetcher {
    /// Creates a stub with no registered responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a JSON body for `url`.
    #[must_use]
    pub fn with_json(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.json.insert(url.to_owned(), body.into());
        self
    }

    /// Registers a binary body for `url`.
    #[must_use]
    pub fn with_binary(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.binary.insert(url.to_owned(), body.into());
        self
    }

    /// Returns every URL requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Returns how many times `url` was requested.
    #[must_use]
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| *r == url).count()
    }

    fn record(&self, url: &str) {
        self.requests.borrow_mut().push(url.to_owned());
    }
}

impl ContentFetcher for StubFetcher {
    fn fetch_json(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.record(url);
        self.json
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new(url, "connection refused"))
    }

    fn fetch_binary(&self, url: &str) -> Result<Box<dyn Read>, FetchError> {
        self.record(url);
        self.binary
            .get(url)
            .cloned()
            .map(|body| Box::new(Cursor::new(body)) as Box<dyn Read>)
            .ok_or_else(|| FetchError::new(url, "HTTP status 404"))
    }
}

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.cast_unsigned())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// An expected command invocation and the result to hand back.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The program, e.g. `docker`.
    pub cmd: &'static str,
    /// The arguments the program must receive.
    pub args: Vec<&'static str>,
    /// The result returned for this invocation.
    pub result: std::io::Result<Output>,
}

/// A [`CommandExecutor`] that replays expected invocations in order.
///
/// Each call is checked against the next [`ExpectedCall`]; a mismatch or an
/// unexpected call panics.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a stub expecting `expected`, in order.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that every expected invocation was consumed.
    ///
    /// # Panics
    ///
    /// Panics if expected invocations remain.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> std::io::Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .expect("unexpected command invocation");

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args.as_slice(), args);

        call.result
    }
}
