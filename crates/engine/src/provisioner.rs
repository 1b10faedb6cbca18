// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Provisioner Driver (C7): subscribes to the `provision` hook event,
//! iterates the configured provisioner list in declared order, and applies
//! each through the Communicator found in the state bag.

use async_trait::async_trait;
use packer_core::template::ProvisionerConfig;
use packer_core::{HookError, HookEvent, HookSubscriber, StateBag, KEY_BUILD_NAME, KEY_COMMUNICATOR};
use packer_communicator::Communicator;
use std::sync::Arc;

/// A single configured provisioner's behavior against a live Communicator.
///
/// Distinct from [`ProvisionerConfig`] (the declared, filterable template
/// entry): this is the runtime object the driver actually invokes once a
/// provisioner's filters have let it through.
#[async_trait]
pub trait Provisioner: Send + Sync {
    fn provisioner_type(&self) -> &'static str;

    async fn provision(&self, comm: &dyn Communicator, bag: &StateBag) -> Result<(), ProvisionError>;
}

#[derive(Debug, thiserror::Error)]
#[error("provisioner {provisioner} failed: {message}")]
pub struct ProvisionError {
    pub provisioner: String,
    pub message: String,
}

impl ProvisionError {
    pub fn new(provisioner: impl Into<String>, message: impl Into<String>) -> Self {
        Self { provisioner: provisioner.into(), message: message.into() }
    }
}

/// One provisioner entry paired with its runtime implementation.
pub struct ConfiguredProvisioner {
    pub config: ProvisionerConfig,
    pub provisioner: Box<dyn Provisioner>,
}

/// Subscribes to the `provision` event (§4.4, §4.7). On invocation: reads
/// the Communicator and current build name out of the state bag, then runs
/// each provisioner whose `only`/`except` filters admit this build, in
/// declared order. The first failure aborts the remaining list.
pub struct ProvisionerDriver {
    provisioners: Vec<ConfiguredProvisioner>,
}

impl ProvisionerDriver {
    pub fn new(provisioners: Vec<ConfiguredProvisioner>) -> Self {
        Self { provisioners }
    }
}

#[async_trait]
impl HookSubscriber for ProvisionerDriver {
    fn name(&self) -> &str {
        "provisioner-driver"
    }

    async fn handle(&self, event: &HookEvent, bag: &StateBag) -> Result<(), HookError> {
        let comm: Arc<dyn Communicator> = bag
            .get(KEY_COMMUNICATOR)
            .ok_or_else(|| HookError::new(self.name(), event, "provision event fired with no communicator in the state bag"))?;
        let build_name: String = bag
            .get(KEY_BUILD_NAME)
            .ok_or_else(|| HookError::new(self.name(), event, "provision event fired with no build name in the state bag"))?;

        for entry in &self.provisioners {
            if !entry.config.applies_to(&build_name) {
                tracing::debug!(
                    provisioner = entry.provisioner.provisioner_type(),
                    build = %build_name,
                    "provisioner: filtered out by only/except"
                );
                continue;
            }

            tracing::info!(provisioner = entry.provisioner.provisioner_type(), build = %build_name, "provisioner: run");
            entry
                .provisioner
                .provision(comm.as_ref(), bag)
                .await
                .map_err(|e| HookError::new(self.name(), event, e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "provisioner_tests.rs"]
mod tests;
