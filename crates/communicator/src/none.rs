// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `none` communicator: rejects every operation with
//! [`CommunicatorError::Unsupported`]. Used by builders whose template sets
//! `"communicator": "none"` — typically containers or images that need no
//! provisioning step at all.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::command::{CommandHandle, RemoteCommand};
use crate::communicator::{Communicator, Excludes, FileInfo};
use crate::error::CommunicatorError;

#[derive(Debug, Default, Clone, Copy)]
pub struct NoneCommunicator;

#[async_trait]
impl Communicator for NoneCommunicator {
    async fn start(
        &self,
        _cmd: RemoteCommand,
        _cancel: &CancellationToken,
    ) -> Result<Box<dyn CommandHandle>, CommunicatorError> {
        Err(CommunicatorError::Unsupported)
    }

    async fn upload(
        &self,
        _remote_path: &str,
        _reader: &mut (dyn AsyncRead + Send + Unpin),
        _file_info: Option<FileInfo>,
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        Err(CommunicatorError::Unsupported)
    }

    async fn upload_dir(
        &self,
        _remote_path: &str,
        _local_path: &str,
        _excludes: &Excludes,
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        Err(CommunicatorError::Unsupported)
    }

    async fn download(
        &self,
        _remote_path: &str,
        _writer: &mut (dyn AsyncWrite + Send + Unpin),
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        Err(CommunicatorError::Unsupported)
    }

    async fn download_dir(
        &self,
        _remote_path: &str,
        _local_path: &str,
        _excludes: &Excludes,
        _cancel: &CancellationToken,
    ) -> Result<(), CommunicatorError> {
        Err(CommunicatorError::Unsupported)
    }

    async fn test_dir(
        &self,
        _remote_path: &str,
        _cancel: &CancellationToken,
    ) -> Result<bool, CommunicatorError> {
        Err(CommunicatorError::Unsupported)
    }
}

#[cfg(test)]
#[path = "none_tests.rs"]
mod tests;
