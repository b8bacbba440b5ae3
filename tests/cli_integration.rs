//! CLI integration tests for Gantry.
//!
//! No test touches the network: the dependency is either pre-seeded at its
//! expected path or offline mode is on.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use git2::{Repository, Signature};
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the gantry binary command, isolated from the user's environment.
fn gantry(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gantry").unwrap();
    cmd.env("HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("GANTRY_ROOT")
        .env_remove("GANTRY_OFFLINE");
    cmd
}

/// A project directory with a manifest and license texts.
fn project(manifest: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Gantry.toml"), manifest).unwrap();

    let licenses = tmp.path().join("LICENSES");
    fs::create_dir_all(&licenses).unwrap();
    fs::write(licenses.join("MIT.txt"), "MIT License\n\nCopyright <holder>\n").unwrap();
    fs::write(licenses.join("BSL-1.0.txt"), "Boost Software License\n").unwrap();

    tmp
}

/// Place the dependency at its default expected path.
fn seed_dependency(root: &Path) {
    let eigen = root.join("src/external/eigen");
    fs::create_dir_all(&eigen).unwrap();
    fs::write(eigen.join("Core"), "// Eigen Core").unwrap();
}

fn commit(repo: &Repository, root: &Path, content: &str) {
    fs::write(root.join("README"), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("README")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Gantry Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "update", &tree, &parents)
        .unwrap();
}

// ============================================================================
// gantry version
// ============================================================================

#[test]
fn test_version_without_history_succeeds() {
    let tmp = project("");

    gantry(tmp.path())
        .arg("version")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("code    (unavailable)"))
        .stderr(predicate::str::contains("version code unavailable"));
}

#[test]
fn test_version_from_tags() {
    let tmp = project("[version]\nbackend = \"libgit2\"\n");
    let repo = Repository::init(tmp.path()).unwrap();
    commit(&repo, tmp.path(), "one\n");
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    let sig = Signature::now("Gantry Test", "test@example.com").unwrap();
    repo.tag("v1.4.0", head.as_object(), &sig, "v1.4.0", false)
        .unwrap();
    commit(&repo, tmp.path(), "two\n");
    commit(&repo, tmp.path(), "three\n");

    gantry(tmp.path())
        .args(["version", "--code"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout("14000002\n");

    gantry(tmp.path())
        .args(["version", "--string"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("v1.4.0-2-g"));
}

#[test]
fn test_version_json() {
    let tmp = project("");

    let output = gantry(tmp.path())
        .args(["--message-format", "json", "version"])
        .current_dir(tmp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let event: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(event["reason"], "version");
    assert!(event["code"].is_null());
}

// ============================================================================
// gantry licenses
// ============================================================================

#[test]
fn test_licenses_writes_resources() {
    let tmp = project("");

    gantry(tmp.path())
        .arg("licenses")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("2 license file(s)"));

    let out = tmp.path().join("build/gantry/generated/licenses/raw");
    let mit = fs::read_to_string(out.join("mit.txt")).unwrap();
    assert_eq!(mit, "MIT License\n<br /><br />\nCopyright &lt;holder&gt;\n");
    assert!(out.join("bsl_1_0.txt").is_file());
}

#[test]
fn test_licenses_custom_output_dir() {
    let tmp = project("[licenses]\ninclude = \"MIT*\"\noutput_dir = \"res/raw\"\n");

    gantry(tmp.path())
        .arg("licenses")
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join("res/raw/mit.txt").is_file());
    assert!(!tmp.path().join("res/raw/bsl_1_0.txt").exists());
}

#[test]
fn test_licenses_warns_when_nothing_matches() {
    let tmp = project("[licenses]\ninclude = \"*.md\"\n");

    gantry(tmp.path())
        .arg("licenses")
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: no license files were bundled"))
        .stderr(predicate::str::contains("help: add license texts"));
}

#[test]
fn test_color_flag() {
    let tmp = project("");

    gantry(tmp.path())
        .args(["--color", "never", "licenses"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("\x1b[").not());

    gantry(tmp.path())
        .args(["--color", "sometimes", "licenses"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid color choice"));
}

// ============================================================================
// gantry configure
// ============================================================================

#[test]
fn test_configure_out_of_process() {
    let tmp = project("");

    gantry(tmp.path())
        .args(["configure", "--variant", "out-of-process"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("openxr_monado monado-service"))
        .stdout(predicate::str::contains("-DXRT_FEATURE_SERVICE=ON"))
        .stdout(predicate::str::contains("-DANDROID_STL=c++_shared"))
        .stdout(predicate::str::contains(
            "org.freedesktop.monado.openxr_runtime.out_of_process",
        ));
}

#[test]
fn test_configure_in_process() {
    let tmp = project("");

    gantry(tmp.path())
        .args(["configure", "--variant", "inProcess"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("-DXRT_FEATURE_SERVICE=OFF"))
        .stdout(predicate::str::contains("monado-service").not());
}

#[test]
fn test_invalid_variant_fails() {
    let tmp = project("");

    gantry(tmp.path())
        .args(["configure", "--variant", "hybrid"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid variant 'hybrid'"));
}

#[test]
fn test_configure_rejects_shared_targets() {
    let tmp = project("[native]\nservice_target = \"openxr_monado\"\n");

    gantry(tmp.path())
        .arg("configure")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("same as the primary target"));
}

// ============================================================================
// gantry fetch / prepare
// ============================================================================

#[test]
fn test_fetch_skips_present_dependency() {
    let tmp = project("");
    seed_dependency(tmp.path());

    gantry(tmp.path())
        .args(["--offline", "fetch"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipped"));
}

#[test]
fn test_prepare_writes_build_info() {
    let tmp = project("");
    seed_dependency(tmp.path());

    gantry(tmp.path())
        .args(["--offline", "prepare", "--variant", "out-of-process"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Finished"));

    let info: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("build/gantry/build-info.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(info["variant"], "out-of-process");
    assert!(info["version_code"].is_null());
    assert_eq!(
        info["native_targets"],
        serde_json::json!(["openxr_monado", "monado-service"])
    );
    assert_eq!(info["licenses"].as_array().unwrap().len(), 2);
    assert!(info["dependency"]["path"]
        .as_str()
        .unwrap()
        .ends_with("src/external/eigen"));
}

#[test]
fn test_prepare_offline_without_dependency_fails() {
    let tmp = project("");

    gantry(tmp.path())
        .args(["--offline", "prepare"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: dependency provisioning failed"))
        .stderr(predicate::str::contains("offline mode is enabled"))
        .stderr(predicate::str::contains("help:"));

    assert!(!tmp.path().join("build/gantry/build-info.json").exists());
}

#[test]
fn test_prepare_from_subdirectory_uses_root() {
    let tmp = project("");
    seed_dependency(tmp.path());
    let nested = tmp.path().join("src/xrt");
    fs::create_dir_all(&nested).unwrap();

    gantry(tmp.path())
        .args(["--offline", "prepare"])
        .current_dir(&nested)
        .assert()
        .success();

    assert!(tmp.path().join("build/gantry/build-info.json").is_file());
    assert!(!nested.join("build").exists());
}

#[test]
fn test_explicit_root() {
    let tmp = project("");
    seed_dependency(tmp.path());
    let elsewhere = TempDir::new().unwrap();

    gantry(tmp.path())
        .args(["--offline", "--root"])
        .arg(tmp.path())
        .arg("fetch")
        .current_dir(elsewhere.path())
        .assert()
        .success();
}

// ============================================================================
// misc
// ============================================================================

#[test]
fn test_missing_root_fails_with_help() {
    let tmp = TempDir::new().unwrap();

    gantry(tmp.path())
        .arg("licenses")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Gantry.toml`"))
        .stderr(predicate::str::contains("--root"));
}

#[test]
fn test_build_requires_cmake_project() {
    let tmp = project("");
    seed_dependency(tmp.path());

    gantry(tmp.path())
        .args(["--offline", "build"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no CMakeLists.txt"));
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();

    gantry(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gantry"));
}
