//! Shared fixtures for the CLI specs: a scratch project directory and a
//! thin wrapper around `assert_cmd::Command` for the `packer` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().expect("create temp project dir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `relative_path` (creating parent directories as needed) with
    /// `contents` inside this project.
    pub fn file(&self, relative_path: &str, contents: impl AsRef<str>) -> PathBuf {
        let full = self.dir.path().join(relative_path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&full, contents.as_ref().as_bytes()).expect("write fixture file");
        full
    }

    /// A `packer` invocation rooted at this project's directory.
    pub fn packer(&self) -> PackerCmd {
        let mut cmd = Command::cargo_bin("packer").expect("locate packer binary");
        cmd.current_dir(self.dir.path());
        PackerCmd { cmd }
    }
}

/// A `packer` invocation not tied to any particular project directory —
/// used for flag/help specs that don't touch the filesystem.
pub fn cli() -> PackerCmd {
    PackerCmd { cmd: Command::cargo_bin("packer").expect("locate packer binary") }
}

pub struct PackerCmd {
    cmd: Command,
}

impl PackerCmd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Run and assert a zero exit code.
    pub fn passes(self) -> Output {
        let assert = self.cmd.assert().success();
        Output::from(assert.get_output())
    }

    /// Run and assert a non-zero exit code.
    pub fn fails(self) -> Output {
        let assert = self.cmd.assert().failure();
        Output::from(assert.get_output())
    }

    /// Run and assert an exact exit code (0 success, 1 build failed, 2 invalid invocation).
    pub fn fails_with_code(self, code: i32) -> Output {
        let assert = self.cmd.assert().code(code);
        Output::from(assert.get_output())
    }
}

/// Captured stdout/stderr from a finished invocation, with chainable
/// substring assertions.
pub struct Output {
    stdout: String,
    stderr: String,
}

impl From<&std::process::Output> for Output {
    fn from(output: &std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl Output {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout did not contain {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr did not contain {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
