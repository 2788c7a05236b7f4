//! Black-box tests for the `protowiz` binary.
//!
//! Every run uses `--offline` so no network access is needed, and a null
//! stdin so the namespace prompt never fires.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn protowiz(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_protowiz"))
        .args(args)
        .env("PROTOWIZ_LOG", "warn")
        .stdin(Stdio::null())
        .output()
        .expect("failed to spawn protowiz")
}

fn generate(out: &Path, extra: &[&str]) -> Output {
    let descriptor = fixture("people.json");
    let mut args = vec![
        "generate",
        descriptor.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--offline",
    ];
    args.extend_from_slice(extra);
    protowiz(&args)
}

fn read(p: &Path) -> String {
    fs::read_to_string(p).unwrap_or_else(|e| panic!("failed to read {}: {e}", p.display()))
}

#[test]
fn generate_writes_the_full_tree() {
    let dir = tempfile::tempdir().unwrap();
    let out = generate(dir.path(), &["--json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["status"], "OK");
    assert_eq!(report["namespace"], "people_demo");
    assert_eq!(report["stats"]["services"], 1);
    assert_eq!(report["stats"]["messages"], 5);

    let root = dir.path();
    let schema = read(&root.join("shared/grpc.proto"));
    assert!(schema.contains("package people_demo;"));
    assert!(schema.contains("service GrpcPeople {"));
    assert!(schema.contains("int64 dt_born = 3;"));
    assert!(schema.contains("optional string nickname = 4;"));

    for rel in [
        "shared/src/converters/person_converter.rs",
        "shared/src/converters/mod.rs",
        "server/src/grpc_services/grpc_people_service.rs",
        "server/src/grpc_services/mod.rs",
        "client/src/grpc_services/people_client.rs",
        "client/src/grpc_services/mod.rs",
        "README.txt",
        ".protowiz/manifest.json",
    ] {
        assert!(root.join(rel).is_file(), "missing {rel}");
    }

    let readme = read(&root.join("README.txt"));
    assert!(readme.contains("tonic::include_proto!(\"people_demo\");"));
}

#[test]
fn regeneration_is_byte_identical() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    assert!(generate(a.path(), &[]).status.success());
    assert!(generate(b.path(), &[]).status.success());

    let manifest = ".protowiz/manifest.json";
    assert_eq!(
        read(&a.path().join(manifest)),
        read(&b.path().join(manifest))
    );
}

#[test]
fn stale_converters_are_removed_and_unrelated_files_kept() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("shared/src/converters")).unwrap();
    fs::write(root.join("shared/src/converters/gone_converter.rs"), "old").unwrap();
    fs::write(root.join("shared/src/lib.rs"), "// mine\n").unwrap();

    assert!(generate(root, &[]).status.success());
    assert!(!root.join("shared/src/converters/gone_converter.rs").exists());
    assert_eq!(read(&root.join("shared/src/lib.rs")), "// mine\n");
}

#[test]
fn copied_sources_lose_their_markers() {
    let dir = tempfile::tempdir().unwrap();
    let models = tempfile::tempdir().unwrap();
    fs::write(
        models.path().join("person.rs"),
        "use protowiz_markers::grpc_model;\n\n#[grpc_model]\npub struct Person;\n",
    )
    .unwrap();

    let out = generate(
        dir.path(),
        &["--models-dir", models.path().to_str().unwrap()],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(
        read(&dir.path().join("shared/src/models/person.rs")),
        "\npub struct Person;\n"
    );
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("out");
    let out = generate(&out_dir, &["--dry-run", "--json"]);
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["dry_run"], true);
    assert!(report["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p == "shared/grpc.proto"));
    assert!(!out_dir.exists());
}

#[test]
fn two_parameter_method_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = fixture("two_params.json");
    let out = protowiz(&[
        "generate",
        descriptor.to_str().unwrap(),
        "--out",
        dir.path().to_str().unwrap(),
        "--offline",
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Service method check has more than one parameter"), "{stderr}");
    assert!(!dir.path().join("shared").exists());
}

#[test]
fn check_reports_services() {
    let descriptor = fixture("people.json");
    let out = protowiz(&["check", descriptor.to_str().unwrap(), "--json"]);
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["services"][0]["short_name"], "People");
    assert_eq!(report["messages"].as_array().unwrap().len(), 5);
}

#[test]
fn schema_prints_proto_text() {
    let descriptor = fixture("people.json");
    let out = protowiz(&["schema", descriptor.to_str().unwrap(), "--namespace", "acme.v1"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.starts_with("// Generated by protowiz. Do not edit."));
    assert!(text.contains("package acme.v1;"));
    assert!(text.contains("rpc GetById (GrpcIdRequest) returns (GrpcPersonResponse);"));
}
