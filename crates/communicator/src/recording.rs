// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory communicator double for other crates' tests. Not a real
//! transport: `start` replays a scripted exit code, uploads/downloads
//! record into an in-memory log instead of touching any filesystem.
//!
//! Gated behind the `test-support` feature; never compiled into a release
//! binary.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::command::{CommandHandle, RemoteCommand};
use crate::communicator::{Communicator, Excludes, FileInfo};
use crate::error::CommunicatorError;

/// One call observed by a [`RecordingCommunicator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Start(String),
    Upload { remote_path: String, bytes: Vec<u8> },
    UploadDir { remote_path: String, local_path: String },
    Download { remote_path: String },
    DownloadDir { remote_path: String, local_path: String },
    TestDir(String),
}

/// Scripted responses and a call log, shared across clones.
#[derive(Default)]
struct Inner {
    calls: Vec<RecordedCall>,
    exit_code: i32,
    test_dir_result: bool,
}

#[derive(Clone)]
pub struct RecordingCommunicator {
    inner: Arc<Mutex<Inner>>,
}

impl Default for RecordingCommunicator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingCommunicator {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(Inner::default())) }
    }

    /// Exit code `start`'s handle will report from `wait`. Defaults to 0.
    pub fn with_exit_code(self, code: i32) -> Self {
        self.inner.lock().exit_code = code;
        self
    }

    pub fn with_test_dir_result(self, result: bool) -> Self {
        self.inner.lock().test_dir_result = result;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.inner.lock().calls.clone()
    }
}

struct RecordedHandle {
    exit_code: i32,
}

#[async_trait]
impl CommandHandle for RecordedHandle {
    async fn wait(&mut self) -> Result<i32, CommunicatorError> {
        Ok(self.exit_code)
    }

    async fn cancel(&mut self) -> Result<(), CommunicatorError> {
        Ok(())
    }

    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Send + Unpin>> {
        None
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        None
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Send + Unpin>> {
        None
    }
}

#[async_trait]
impl Communicator for RecordingCommunicator {
    async fn start(
        &self,
        cmd: RemoteCommand,
        _cancel: &CancellationToken,
    ) -> Result<Box<dyn CommandHandle>, CommunicatorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RecordedCall::Start(cmd.command));
        Ok(Box::new(RecordedHandle { exit_code: inner.exit_code }))
    }

    async fn upload(
        &self,
        remote_path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        _file_info: Option<FileInfo>,
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        self.inner
            .lock()
            .calls
            .push(RecordedCall::Upload { remote_path: remote_path.to_string(), bytes });
        Ok(())
    }

    async fn upload_dir(
        &self,
        remote_path: &str,
        local_path: &str,
        _excludes: &Excludes,
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        self.inner.lock().calls.push(RecordedCall::UploadDir {
            remote_path: remote_path.to_string(),
            local_path: local_path.to_string(),
        });
        Ok(())
    }

    async fn download(
        &self,
        remote_path: &str,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        writer.write_all(&[]).await?;
        self.inner.lock().calls.push(RecordedCall::Download { remote_path: remote_path.to_string() });
        Ok(())
    }

    async fn download_dir(
        &self,
        remote_path: &str,
        local_path: &str,
        _excludes: &Excludes,
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        self.inner.lock().calls.push(RecordedCall::DownloadDir {
            remote_path: remote_path.to_string(),
            local_path: local_path.to_string(),
        });
        Ok(())
    }

    async fn test_dir(
        &self,
        remote_path: &str,
        _cancel: &CancellationToken,
    ) -> Result<bool, CommunicatorError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RecordedCall::TestDir(remote_path.to_string()));
        Ok(inner.test_dir_result)
    }
}

#[cfg(test)]
#[path = "recording_tests.rs"]
mod tests;
