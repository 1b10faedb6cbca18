// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! packer-engine: the Builder Contract, Provisioner Driver, Post-Processor
//! Chain, and Build Coordinator built on top of `packer-core`'s shared
//! primitives and `packer-communicator`'s transport contract.

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod post_processor;
pub mod provisioner;

pub use builder::{Builder, BuilderRunError, PrepareOutcome};
pub use coordinator::{
    AskDecision, AskHandler, BuildCoordinator, BuildResult, BuildSpec, BuildStatus, CoordinatorConfig,
    OnErrorPolicy,
};
pub use error::CoordinatorError;
pub use post_processor::{ConfiguredPostProcessor, ForceOverride, KeepInput, PostProcessor, Sequence, SequenceOutcome};
pub use provisioner::{ConfiguredProvisioner, ProvisionError, Provisioner, ProvisionerDriver};
