// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Post-Processor Chain (C8): runs nested sequences of post-processors
//! over one input Artifact, applying keep/replace-input semantics and the
//! `-except` skip-rest compatibility rule.

use async_trait::async_trait;
use packer_core::template::PostProcessorConfig;
use packer_core::{Artifact, PostProcessorError};

/// A component that transforms an Artifact into another Artifact.
#[async_trait]
pub trait PostProcessor: Send + Sync {
    fn post_processor_type(&self) -> &'static str;

    /// Returns the replacement Artifact, whether the input should be kept
    /// (`keep_input`), and whether that keep decision should be forced
    /// (`force_override`) regardless of what earlier post-processors in the
    /// sequence already decided.
    async fn process(
        &self,
        input: &Artifact,
    ) -> Result<(Artifact, KeepInput, ForceOverride), PostProcessorError>;
}

pub type KeepInput = bool;
pub type ForceOverride = bool;

/// One configured post-processor, paired with its template entry (for
/// `name`/`only`/`except`/`keep_input_artifact`).
pub struct ConfiguredPostProcessor {
    pub config: PostProcessorConfig,
    pub post_processor: Box<dyn PostProcessor>,
}

/// Result of running one post-processor [`Sequence`].
pub struct SequenceOutcome {
    /// The final artifact produced by the sequence, or the original input
    /// if every post-processor was filtered out or skipped.
    pub artifact: Option<Artifact>,
    /// Whether the *original* input artifact passed to the sequence
    /// survives (was preserved rather than destroyed).
    ///
    /// "Any true wins" (§9 open question, resolved here): if *any* entry
    /// that actually ran sets `keep_input_artifact` (or a `process` call
    /// returns `keep` true), the original is preserved, even if a later
    /// entry would otherwise have destroyed it.
    pub input_preserved: bool,
    /// The first error encountered, if the sequence halted early.
    pub error: Option<PostProcessorError>,
}

/// A non-empty ordered list of post-processors run sequentially over one
/// input artifact.
pub struct Sequence {
    entries: Vec<ConfiguredPostProcessor>,
}

impl Sequence {
    pub fn new(entries: Vec<ConfiguredPostProcessor>) -> Self {
        Self { entries }
    }

    /// Run this sequence over `input` for build `build_name`.
    ///
    /// Entries whose `name` is empty are ignored silently (§4.8
    /// compatibility rule, applied upstream via [`PostProcessorConfig::name`]
    /// already being `None` for that case — this driver only needs to skip
    /// entries not admitted by `only`/`except`). An `only`/`except` filter
    /// that excludes the build skips that entry *and* every subsequent
    /// entry in the sequence (documented `-except` behavior).
    ///
    /// The *original* input's destroy-or-keep decision is resolved here, at
    /// the end of the sequence (any entry voting true wins): if it survives,
    /// it is handed back as part of the outcome; if not, this call destroys
    /// it before returning. Intermediate artifacts produced mid-chain are
    /// destroyed as soon as superseded unless the entry that superseded them
    /// voted to keep its own input.
    ///
    /// `input` may be a fork of an artifact shared with other sequences
    /// running in parallel over the same Build's output (§4.8) — `destroy`
    /// is safe to call from more than one fork, since only the first call
    /// reaches the underlying destroyer.
    pub async fn run(&self, input: Artifact, build_name: &str) -> SequenceOutcome {
        let mut keep_original = false;
        let original = input;
        let mut current: Option<Artifact> = None;
        let mut ran_any = false;

        for (idx, entry) in self.entries.iter().enumerate() {
            if !entry.config.applies_to(build_name) {
                tracing::debug!(
                    post_processor = entry.post_processor.post_processor_type(),
                    build = %build_name,
                    "post-processor: filtered out, skipping rest of sequence"
                );
                break;
            }

            tracing::info!(
                post_processor = entry.post_processor.post_processor_type(),
                build = %build_name,
                "post-processor: run"
            );

            let input_ref = current.as_ref().unwrap_or(&original);
            match entry.post_processor.process(input_ref).await {
                Ok((next, keep, force)) => {
                    ran_any = true;
                    let keep_this_input = if force { keep } else { keep || entry.config.keep_input_artifact };
                    // "Any true wins": once any entry votes to keep, the
                    // original survives even if a later entry would not have
                    // voted to keep it (§9 open question resolution).
                    if keep_this_input {
                        keep_original = true;
                    }
                    if idx != 0 && !keep_this_input {
                        if let Some(superseded) = current.take() {
                            let _ = superseded.destroy().await;
                        }
                    }
                    current = Some(next);
                }
                Err(err) => {
                    tracing::warn!(
                        post_processor = entry.post_processor.post_processor_type(),
                        error = %err,
                        "post-processor: failed, aborting rest of sequence"
                    );
                    if !keep_original {
                        let _ = original.destroy().await;
                    }
                    return SequenceOutcome { artifact: None, input_preserved: keep_original, error: Some(err) };
                }
            }
        }

        if !ran_any {
            keep_original = true;
        }

        if !keep_original {
            let _ = original.destroy().await;
            SequenceOutcome {
                artifact: current,
                input_preserved: false,
                error: None,
            }
        } else {
            SequenceOutcome {
                artifact: Some(current.unwrap_or(original)),
                input_preserved: true,
                error: None,
            }
        }
    }
}

#[cfg(test)]
#[path = "post_processor_tests.rs"]
mod tests;
