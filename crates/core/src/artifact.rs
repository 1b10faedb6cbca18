// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Artifact Model (C5): the value object a Builder produces and a
//! Post-Processor consumes and re-produces.
//!
//! An Artifact either survives to the caller or has its [`Artifact::destroy`]
//! invoked exactly once — never both, never neither. The coordinator and
//! post-processor chain are responsible for upholding that invariant; this
//! module only provides the guarded primitive they build it on top of.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Raised when `destroy` is invoked a second time on the same Artifact.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("artifact {0} destroyed more than once")]
pub struct AlreadyDestroyed(pub String);

/// Builder-supplied hook for releasing whatever external resource an
/// Artifact represents (an image, a snapshot, a registered AMI, ...).
#[async_trait]
pub trait ArtifactDestroyer: Send + Sync {
    async fn destroy(&self) -> Result<(), ArtifactError>;
}

/// Error surfaced by an [`ArtifactDestroyer`].
#[derive(Debug, Error)]
#[error("failed to destroy artifact: {0}")]
pub struct ArtifactError(pub String);

/// A no-op destroyer, for artifacts with nothing external to release.
pub struct NoopDestroyer;

#[async_trait]
impl ArtifactDestroyer for NoopDestroyer {
    async fn destroy(&self) -> Result<(), ArtifactError> {
        Ok(())
    }
}

/// The output of a Build or a Post-Processor.
///
/// `builder_id` is a stable, compile-time constant per builder type (e.g.
/// `"packer.null"`) — post-processors key on it to apply type-specific
/// handling, so it must never vary across builder versions.
pub struct Artifact {
    builder_id: String,
    files: Vec<String>,
    id: String,
    summary: String,
    state: HashMap<String, Value>,
    destroyer: Arc<dyn ArtifactDestroyer>,
    destroyed: Arc<AtomicBool>,
}

impl Artifact {
    pub fn new(
        builder_id: impl Into<String>,
        id: impl Into<String>,
        files: Vec<String>,
        summary: impl Into<String>,
        destroyer: Box<dyn ArtifactDestroyer>,
    ) -> Self {
        Self {
            builder_id: builder_id.into(),
            files,
            id: id.into(),
            summary: summary.into(),
            state: HashMap::new(),
            destroyer: Arc::from(destroyer),
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Produce a second handle onto the same underlying resource: same
    /// identity and metadata, sharing the destroy guard and destroyer with
    /// the original.
    ///
    /// Used when a Build's artifact fans out into several post-processor
    /// sequences (§3, §4.8) running in parallel over "the same input
    /// artifact" — each fork can independently decide to keep or destroy
    /// its view, and whichever fork calls `destroy` first actually runs the
    /// underlying destroyer; every other fork's `destroy` call observes
    /// [`AlreadyDestroyed`] instead of destroying twice.
    pub fn fork(&self) -> Self {
        Self {
            builder_id: self.builder_id.clone(),
            files: self.files.clone(),
            id: self.id.clone(),
            summary: self.summary.clone(),
            state: self.state.clone(),
            destroyer: self.destroyer.clone(),
            destroyed: self.destroyed.clone(),
        }
    }

    pub fn builder_id(&self) -> &str {
        &self.builder_id
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn state(&self) -> &HashMap<String, Value> {
        &self.state
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// Release the external resource this Artifact represents.
    ///
    /// Idempotency is enforced here: a second call returns
    /// [`AlreadyDestroyed`] without invoking the underlying destroyer
    /// again, so callers racing to clean up on two different error paths
    /// can both call this safely.
    pub async fn destroy(&self) -> Result<(), DestroyError> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Err(DestroyError::AlreadyDestroyed(AlreadyDestroyed(self.id.clone())));
        }
        self.destroyer.destroy().await.map_err(DestroyError::Underlying)
    }

    /// Whether `destroy` has already been called (successfully or not).
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

/// Error returned by [`Artifact::destroy`].
#[derive(Debug, Error)]
pub enum DestroyError {
    #[error(transparent)]
    AlreadyDestroyed(#[from] AlreadyDestroyed),
    #[error(transparent)]
    Underlying(#[from] ArtifactError),
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
