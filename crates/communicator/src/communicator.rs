// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Communicator Contract (C3): transport-agnostic upload/download/exec
//! surface used by the Provisioner Driver, regardless of whether the
//! underlying transport is SSH, WinRM, or a platform-native exec call.
//! Concrete transports are out of scope here — this module only defines
//! the contract and the `none` transport that rejects every operation.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::command::{CommandHandle, RemoteCommand};
use crate::error::CommunicatorError;

/// Optional file metadata accompanying an upload (permissions, mtime, ...).
/// `None` means "use the transport's defaults".
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    pub mode: Option<u32>,
}

/// Glob-style paths to skip during a directory upload/download.
pub type Excludes = Vec<String>;

/// The Communicator Session: created by a Builder, borrowed by the
/// Provisioner Driver through the `provision` hook payload, and destroyed
/// by the Builder at run end.
///
/// Every operation takes a [`CancellationToken`] and must interrupt
/// in-flight I/O promptly when it fires.
#[async_trait]
pub trait Communicator: Send + Sync {
    /// Begin a remote process; returns a handle for waiting on and
    /// interacting with it.
    async fn start(
        &self,
        cmd: RemoteCommand,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn CommandHandle>, CommunicatorError>;

    /// Upload a byte stream to `remote_path`.
    async fn upload(
        &self,
        remote_path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        file_info: Option<FileInfo>,
        cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError>;

    /// Upload a local directory tree to `remote_path`, skipping `excludes`.
    async fn upload_dir(
        &self,
        remote_path: &str,
        local_path: &str,
        excludes: &Excludes,
        cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError>;

    /// Download `remote_path` into `writer`.
    async fn download(
        &self,
        remote_path: &str,
        writer: &mut (dyn AsyncWrite + Send + Unpin),
        cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError>;

    /// Download a remote directory tree to `local_path`, skipping `excludes`.
    async fn download_dir(
        &self,
        remote_path: &str,
        local_path: &str,
        excludes: &Excludes,
        cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError>;

    /// Whether `remote_path` exists and is a directory.
    async fn test_dir(&self, remote_path: &str, cancel: &CancellationToken) -> Result<bool, CommunicatorError>;
}
