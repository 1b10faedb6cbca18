//! `packer build` CLI specs: template parsing, exit codes, `-only`/
//! `-except` filtering, and the built-in `packer.null` fixture builder
//! end to end.
//!
//! Concrete provisioners and post-processors are out of scope for this
//! workspace — the demo binary has none registered, so a template naming
//! one is expected to fail invocation, not silently no-op.

use crate::prelude::*;

fn one_null_builder_template() -> &'static str {
    r#"{
        "builders": [
            { "type": "null" }
        ]
    }"#
}

#[test]
fn help_shows_usage() {
    cli().args(&["--help"]).passes().stdout_has("Usage:");
}

#[test]
fn build_help_shows_usage() {
    cli().args(&["build", "--help"]).passes().stdout_has("Usage:");
}

/// One build, no provisioners, no post-processors — succeeds and
/// reports the artifact.
#[test]
fn single_null_builder_succeeds_and_reports_its_artifact() {
    let project = Project::empty();
    let template = project.file("template.json", one_null_builder_template());

    project
        .packer()
        .args(&["build", template.to_str().unwrap()])
        .passes()
        .stdout_has("null: success")
        .stdout_has("artifact: null");
}

#[test]
fn named_builder_is_reported_by_its_resolved_name() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{
            "builders": [
                { "type": "null", "name": "web" }
            ]
        }"#,
    );

    project
        .packer()
        .args(&["build", template.to_str().unwrap()])
        .passes()
        .stdout_has("web: success");
}

/// `-only=A,B` over `{A,B,C}` runs exactly `{A,B}`.
#[test]
fn only_filter_runs_exactly_the_listed_builds() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{
            "builders": [
                { "type": "null", "name": "a" },
                { "type": "null", "name": "b" },
                { "type": "null", "name": "c" }
            ]
        }"#,
    );

    let output = project
        .packer()
        .args(&["build", "--only", "a,b", template.to_str().unwrap()])
        .passes();

    assert!(output.stdout().contains("a: success"));
    assert!(output.stdout().contains("b: success"));
    assert!(!output.stdout().contains("c: success"), "c must not have run:\n{}", output.stdout());
}

#[test]
fn except_filter_skips_the_listed_build() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{
            "builders": [
                { "type": "null", "name": "a" },
                { "type": "null", "name": "b" }
            ]
        }"#,
    );

    let output = project
        .packer()
        .args(&["build", "--except", "b", template.to_str().unwrap()])
        .passes();

    assert!(output.stdout().contains("a: success"));
    assert!(!output.stdout().contains("b: success"));
}

/// `-only` naming nothing in the template fails fast, with the
/// invalid-invocation exit code rather than the build-failed one.
#[test]
fn only_naming_unknown_build_fails_with_invocation_exit_code() {
    let project = Project::empty();
    let template = project.file("template.json", one_null_builder_template());

    project
        .packer()
        .args(&["build", "--only", "does-not-exist", template.to_str().unwrap()])
        .fails_with_code(2)
        .stderr_has("no builds matched");
}

#[test]
fn unknown_builder_type_fails_with_invocation_exit_code() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{ "builders": [ { "type": "amazon-ebs" } ] }"#,
    );

    project
        .packer()
        .args(&["build", template.to_str().unwrap()])
        .fails_with_code(2)
        .stderr_has("unknown builder type");
}

#[test]
fn template_with_provisioners_fails_because_none_are_registered_in_the_demo_binary() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{
            "builders": [ { "type": "null" } ],
            "provisioners": [ { "type": "shell", "inline": ["echo hi"] } ]
        }"#,
    );

    project
        .packer()
        .args(&["build", template.to_str().unwrap()])
        .fails_with_code(2)
        .stderr_has("unknown provisioner type");
}

#[test]
fn template_with_post_processors_fails_because_none_are_registered_in_the_demo_binary() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{
            "builders": [ { "type": "null" } ],
            "post-processors": [ { "type": "compress" } ]
        }"#,
    );

    project
        .packer()
        .args(&["build", template.to_str().unwrap()])
        .fails_with_code(2)
        .stderr_has("unknown post-processor type");
}

#[test]
fn malformed_template_json_fails_with_invocation_exit_code() {
    let project = Project::empty();
    let template = project.file("template.json", "{ not valid json");

    project
        .packer()
        .args(&["build", template.to_str().unwrap()])
        .fails_with_code(2)
        .stderr_has("parsing template");
}

#[test]
fn missing_template_file_fails_with_invocation_exit_code() {
    let project = Project::empty();

    project
        .packer()
        .args(&["build", project.path().join("missing.json").to_str().unwrap()])
        .fails_with_code(2)
        .stderr_has("reading template");
}

#[test]
fn malformed_var_flag_fails_with_invocation_exit_code() {
    let project = Project::empty();
    let template = project.file("template.json", one_null_builder_template());

    project
        .packer()
        .args(&["build", "--var", "no-equals-sign", template.to_str().unwrap()])
        .fails_with_code(2)
        .stderr_has("expected key=val");
}

#[test]
fn missing_var_file_fails_with_invocation_exit_code() {
    let project = Project::empty();
    let template = project.file("template.json", one_null_builder_template());

    project
        .packer()
        .args(&[
            "build",
            "--var-file",
            project.path().join("missing-vars.json").to_str().unwrap(),
            template.to_str().unwrap(),
        ])
        .fails_with_code(2)
        .stderr_has("reading var file");
}

#[test]
fn multiple_builders_all_run_and_are_reported_in_template_order() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{
            "builders": [
                { "type": "null", "name": "first" },
                { "type": "null", "name": "second" }
            ]
        }"#,
    );

    let output = project
        .packer()
        .args(&["build", template.to_str().unwrap()])
        .passes();

    let first_pos = output.stdout().find("first: success").expect("first build reported");
    let second_pos = output.stdout().find("second: success").expect("second build reported");
    assert!(first_pos < second_pos, "results must preserve template order");
}

#[test]
fn debug_and_parallel_builds_flags_are_accepted() {
    let project = Project::empty();
    let template = project.file(
        "template.json",
        r#"{
            "builders": [
                { "type": "null", "name": "a" },
                { "type": "null", "name": "b" }
            ]
        }"#,
    );

    project
        .packer()
        .args(&["build", "--debug", "--parallel-builds", "1", template.to_str().unwrap()])
        .passes()
        .stdout_has("a: success")
        .stdout_has("b: success");
}
