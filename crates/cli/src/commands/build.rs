// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `packer build` - runs a Template's builds through the engine.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use packer_core::template::Template;
use packer_engine::{BuildCoordinator, BuildSpec, BuildStatus, CoordinatorConfig, OnErrorPolicy};
use packer_core::HookBus;
use tokio_util::sync::CancellationToken;

use crate::exit_error::ExitError;
use crate::null_builder::NullBuilder;

#[derive(Args)]
pub struct BuildArgs {
    /// Path to the template JSON file.
    pub template: PathBuf,

    /// Colorized UI.
    #[arg(long = "color", default_value_t = true)]
    pub color: bool,

    /// Disable parallelism; pause between steps.
    #[arg(long)]
    pub debug: bool,

    /// Allow rebuilding over prior artifacts (builder-defined cleanup).
    #[arg(long)]
    pub force: bool,

    /// Run only listed builds (comma-separated names).
    #[arg(long)]
    pub only: Option<String>,

    /// Skip listed builds (comma-separated names).
    #[arg(long)]
    pub except: Option<String>,

    /// Failure policy.
    #[arg(long = "on-error", default_value = "cleanup")]
    pub on_error: OnErrorArg,

    /// Max concurrent builds (0 = unlimited).
    #[arg(long = "parallel-builds", default_value_t = 0)]
    pub parallel_builds: usize,

    /// Prefix each UI line with an RFC3339 timestamp.
    #[arg(long = "timestamp-ui")]
    pub timestamp_ui: bool,

    /// Template variable, `key=val`. May be repeated.
    #[arg(long = "var")]
    pub var: Vec<String>,

    /// Path to a JSON file of template variables.
    #[arg(long = "var-file")]
    pub var_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OnErrorArg {
    Cleanup,
    Abort,
    Ask,
}

impl From<OnErrorArg> for OnErrorPolicy {
    fn from(value: OnErrorArg) -> Self {
        match value {
            OnErrorArg::Cleanup => OnErrorPolicy::Cleanup,
            OnErrorArg::Abort => OnErrorPolicy::Abort,
            OnErrorArg::Ask => OnErrorPolicy::Ask,
        }
    }
}

pub async fn run(args: BuildArgs) -> Result<(), ExitError> {
    crate::logging::init(args.timestamp_ui);

    let _vars = collect_vars(&args)?;

    let contents = std::fs::read_to_string(&args.template)
        .map_err(|e| ExitError::invocation(format!("reading template {}: {e}", args.template.display())))?;
    let template: Template = serde_json::from_str(&contents)
        .map_err(|e| ExitError::invocation(format!("parsing template {}: {e}", args.template.display())))?;

    if !template.provisioners.is_empty() {
        return Err(ExitError::invocation(format!(
            "unknown provisioner type: {} (no provisioners are registered in this build)",
            template.provisioners[0].provisioner_type
        )));
    }
    if !template.post_processors.is_empty() {
        return Err(ExitError::invocation(
            "unknown post-processor type: no post-processors are registered in this build".to_string(),
        ));
    }

    let builds = builds_from_template(&template)?;

    let only = split_csv(args.only.as_deref());
    let except = split_csv(args.except.as_deref());

    let coordinator = BuildCoordinator::new(CoordinatorConfig {
        only,
        except,
        parallel_builds: args.parallel_builds,
        on_error: args.on_error.into(),
        debug: args.debug,
        force: args.force,
        ask_handler: None,
    });

    let root_cancel = CancellationToken::new();
    let watcher = spawn_signal_watcher(root_cancel.clone());

    let results = coordinator
        .run(builds, root_cancel)
        .await
        .map_err(|e| ExitError::invocation(e.to_string()))?;

    watcher.abort();

    let mut any_failed = false;
    for result in &results {
        match &result.status {
            BuildStatus::Succeeded => {
                println!("==> {}: success", result.name);
                for artifact in &result.artifacts {
                    println!("    artifact: {} ({})", artifact.id(), artifact.summary());
                }
            }
            BuildStatus::Failed(message) => {
                any_failed = true;
                eprintln!("==> {}: failed: {message}", result.name);
            }
            BuildStatus::Cancelled => {
                any_failed = true;
                eprintln!("==> {}: cancelled", result.name);
            }
        }
        for warning in &result.warnings {
            eprintln!("    warning: {warning}");
        }
    }

    if any_failed {
        return Err(ExitError::build_failed("one or more builds did not succeed"));
    }
    Ok(())
}

/// Builders known to this demo binary. Concrete platform builders are out
/// of scope; `packer.null` is the only registered type.
fn builds_from_template(template: &Template) -> Result<Vec<BuildSpec>, ExitError> {
    template
        .builders
        .iter()
        .map(|cfg| {
            let builder = match cfg.builder_type.as_str() {
                "null" | "packer.null" => Box::new(NullBuilder),
                other => {
                    return Err(ExitError::invocation(format!("unknown builder type: {other}")));
                }
            };
            Ok(BuildSpec {
                name: cfg.resolved_name(),
                builder,
                raw_config: cfg.raw.clone(),
                hooks: HookBus::new(),
                post_processor_sequences: vec![],
            })
        })
        .collect()
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Parses `-var`/`-var-file` into a flat map. Interpolating these into the
/// template is a templating-engine concern and explicitly out of scope
/// here; this only validates the flags so a malformed `-var` fails fast
/// with exit code 2 rather than being silently ignored.
fn collect_vars(args: &BuildArgs) -> Result<std::collections::HashMap<String, String>, ExitError> {
    let mut vars = std::collections::HashMap::new();

    if let Some(path) = &args.var_file {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ExitError::invocation(format!("reading var file {}: {e}", path.display())))?;
        let parsed: std::collections::HashMap<String, String> = serde_json::from_str(&contents)
            .map_err(|e| ExitError::invocation(format!("parsing var file {}: {e}", path.display())))?;
        vars.extend(parsed);
    }

    for entry in &args.var {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| ExitError::invocation(format!("invalid -var {entry:?}, expected key=val")))?;
        vars.insert(key.to_string(), value.to_string());
    }

    Ok(vars)
}

/// First SIGINT cancels the root token (policy `cleanup` semantics: the
/// coordinator's own cancellation propagation decides how in-flight builds
/// unwind); a second SIGINT escalates to an immediate process exit, since
/// by that point the operator has already asked twice.
fn spawn_signal_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("received interrupt, cancelling in-flight builds (interrupt again to force-exit)");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("received second interrupt, exiting immediately");
        std::process::exit(130);
    })
}
