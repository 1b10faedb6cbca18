// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `packer.null`: a fixture builder, not a platform builder. Concrete
//! builders for real hypervisors and cloud providers are out of scope; this
//! one exists purely so the `build` command has something to drive the
//! engine against end to end. It creates nothing, provisions over the
//! `none` communicator, and produces an artifact with no files.

use std::sync::Arc;

use async_trait::async_trait;
use packer_communicator::{Communicator, NoneCommunicator};
use packer_core::{Artifact, ConfigError, HookBus, HookEvent, NoopDestroyer, StateBag, Step, StepDirective, StepRunner, Warning, KEY_COMMUNICATOR};
use packer_engine::{Builder, BuilderRunError, PrepareOutcome};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

pub struct NullBuilder;

struct CreateStep;

#[async_trait]
impl Step for CreateStep {
    fn name(&self) -> &str {
        "create"
    }

    async fn execute(&self, _bag: &StateBag, _cancel: &CancellationToken) -> StepDirective {
        tracing::info!("null: \"creating\" a machine (no-op)");
        StepDirective::Continue
    }
}

struct ShutdownStep;

#[async_trait]
impl Step for ShutdownStep {
    fn name(&self) -> &str {
        "shutdown"
    }

    async fn execute(&self, _bag: &StateBag, _cancel: &CancellationToken) -> StepDirective {
        tracing::info!("null: \"shutting down\" (no-op)");
        StepDirective::Continue
    }
}

#[async_trait]
impl Builder for NullBuilder {
    fn builder_id(&self) -> &'static str {
        "packer.null"
    }

    async fn prepare(&mut self, _raw: &[Value]) -> PrepareOutcome {
        let warnings: Vec<Warning> = Vec::new();
        let errors: Vec<ConfigError> = Vec::new();
        (warnings, errors)
    }

    async fn run(
        &self,
        bag: &StateBag,
        cancel: CancellationToken,
        hooks: &HookBus,
    ) -> Result<Option<Artifact>, BuilderRunError> {
        let pre = StepRunner::new(vec![Box::new(CreateStep)]);
        pre.run(bag, cancel.child_token()).await;
        if bag.is_cancelled() {
            return Err(BuilderRunError::new("cancelled before create completed"));
        }
        if bag.is_halted() {
            return Err(BuilderRunError::new(
                bag.error().unwrap_or_else(|| "create step halted".to_string()),
            ));
        }

        let communicator: Arc<dyn Communicator> = Arc::new(NoneCommunicator);
        bag.put(KEY_COMMUNICATOR, communicator);

        hooks
            .fire(&HookEvent::new("provision"), bag)
            .await
            .map_err(|e| BuilderRunError::new(e.to_string()))?;

        if cancel.is_cancelled() {
            return Err(BuilderRunError::new("cancelled during provision"));
        }

        let post = StepRunner::new(vec![Box::new(ShutdownStep)]);
        post.run(bag, cancel.child_token()).await;
        if bag.is_halted() {
            return Err(BuilderRunError::new(
                bag.error().unwrap_or_else(|| "shutdown step halted".to_string()),
            ));
        }

        Ok(Some(Artifact::new("packer.null", "null", vec![], "null build completed", Box::new(NoopDestroyer))))
    }
}

#[cfg(test)]
#[path = "null_builder_tests.rs"]
mod tests;
