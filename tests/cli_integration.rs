//! CLI integration tests for gen-ir.
//!
//! These tests run the binary against a small project, a build log written
//! on the fly and a shell script posing as clang.

use std::fs;
use std::path::{Path, PathBuf};
use assert_cmd::Command;

use predicates::prelude::*;
use tempfile::TempDir;

/// Get the gen-ir binary command.
fn gen_ir() -> Command {
    Command::cargo_bin("gen-ir").unwrap()
}

/// Two native targets, `App` depending on `Core`.
const PROJECT: &str = r#"// !$*UTF8*$!
{
	objects = {
		P1 = { isa = PBXProject; targets = ( T1, T2 ); mainGroup = G1; };
		G1 = { isa = PBXGroup; children = ( F1, F2 ); sourceTree = "<group>"; };
		F1 = { isa = PBXFileReference; path = App.app; sourceTree = BUILT_PRODUCTS_DIR; };
		F2 = { isa = PBXFileReference; path = Core.framework; sourceTree = BUILT_PRODUCTS_DIR; };
		T1 = { isa = PBXNativeTarget; name = App; dependencies = ( D1 ); productReference = F1; };
		T2 = { isa = PBXNativeTarget; name = Core; dependencies = ( ); productReference = F2; };
		D1 = { isa = PBXTargetDependency; target = T2; };
	};
	rootObject = P1;
}
"#;

const FAKE_CLANG: &str = r#"#!/bin/sh
out=""
prev=""
for arg in "$@"; do
    case "$arg" in
        *Broken*) echo "error: cannot compile $arg" >&2; exit 1 ;;
    esac
    if [ "$prev" = "-o" ]; then out="$arg"; fi
    prev="$arg"
done
echo "; IR" > "$out"
"#;

/// A directory holding `Sample.xcodeproj`.
fn project_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let bundle = tmp.path().join("Sample.xcodeproj");
    fs::create_dir(&bundle).unwrap();
    fs::write(bundle.join("project.pbxproj"), PROJECT).unwrap();
    tmp
}

#[cfg(unix)]
fn install_fake_clang(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let bin = dir.join("toolchain").join("bin");
    fs::create_dir_all(&bin).unwrap();
    let clang = bin.join("clang");
    fs::write(&clang, FAKE_CLANG).unwrap();
    fs::set_permissions(&clang, fs::Permissions::from_mode(0o755)).unwrap();
    clang
}

/// A log where both targets compile a file named `Utils.m`.
fn build_log(clang: &Path, app_source: &str) -> String {
    let clang = clang.display();
    format!(
        "=== BUILD TARGET Core OF PROJECT Sample WITH CONFIGURATION Release ===\n\
         \n\
         CompileC Utils.o Core/Utils.m normal arm64 objective-c com.apple.compilers.llvm.clang.1_0.compiler (in target 'Core' from project 'Sample')\n\
         \x20   {clang} -x objective-c -MMD -MF Utils.d -c Core/Utils.m -o Utils.o\n\
         \n\
         === BUILD TARGET App OF PROJECT Sample WITH CONFIGURATION Release ===\n\
         \n\
         CompileC Utils.o App/Utils.m normal arm64 objective-c com.apple.compilers.llvm.clang.1_0.compiler (in target 'App' from project 'Sample')\n\
         \x20   {clang} -x objective-c -c App/Utils.m -o Utils.o\n\
         \x20   {clang} -x objective-c -c {app_source} -o main.o\n\
         \n\
         ** ARCHIVE SUCCEEDED **\n"
    )
}

// ============================================================================
// Arguments
// ============================================================================

#[test]
fn test_help() {
    gen_ir()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("XCARCHIVE"))
        .stdout(predicate::str::contains("--project-path"));
}

#[test]
fn test_requires_xcarchive_extension() {
    let tmp = project_dir();
    fs::write(tmp.path().join("build.log"), "").unwrap();

    gen_ir()
        .args(["build.log", "Output"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(".xcarchive extension"));
}

#[test]
fn test_missing_project() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("build.log"), "").unwrap();

    gen_ir()
        .args(["build.log", "App.xcarchive"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--project-path"));
}

#[test]
fn test_invalid_config() {
    let tmp = project_dir();
    fs::write(tmp.path().join("build.log"), "").unwrap();
    fs::write(tmp.path().join("gen-ir.toml"), "[runner]\njobs = 0\n").unwrap();

    gen_ir()
        .args(["build.log", "App.xcarchive"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("runner.jobs"));
}

// ============================================================================
// Full runs
// ============================================================================

#[cfg(unix)]
#[test]
fn test_generates_ir_per_target_and_product() {
    let tmp = project_dir();
    let clang = install_fake_clang(tmp.path());
    fs::write(tmp.path().join("build.log"), build_log(&clang, "App/main.m")).unwrap();

    gen_ir()
        .args(["build.log", "Sample.xcarchive"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let ir = tmp.path().join("Sample.xcarchive").join("IR");
    assert!(ir.join("Targets/Core/Utils-Core.bc").is_file());
    assert!(ir.join("Targets/App/Utils-App.bc").is_file());
    assert!(ir.join("Targets/App/main.bc").is_file());

    assert!(ir.join("Products/App.app/Utils-App.bc").is_file());
    assert!(ir.join("Products/App.app/Utils-Core.bc").is_file());
    assert!(ir.join("Products/Core.framework/Utils-Core.bc").is_file());
    assert!(!ir.join("Products/Core.framework/main.bc").exists());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ir.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["attempted"], 3);
    assert_eq!(report["succeeded"], 3);
}

#[cfg(unix)]
#[test]
fn test_trailing_ir_component_is_accepted() {
    let tmp = project_dir();
    let clang = install_fake_clang(tmp.path());
    fs::write(tmp.path().join("build.log"), build_log(&clang, "App/main.m")).unwrap();

    gen_ir()
        .args(["build.log", "Sample.xcarchive/IR", "--project-path", "Sample.xcodeproj"])
        .current_dir(tmp.path())
        .assert()
        .success();

    assert!(tmp.path().join("Sample.xcarchive/IR/report.json").is_file());
}

#[cfg(unix)]
#[test]
fn test_reads_log_from_stdin() {
    let tmp = project_dir();
    let clang = install_fake_clang(tmp.path());
    let log = build_log(&clang, "App/main.m");

    gen_ir()
        .args(["-", "Sample.xcarchive"])
        .current_dir(tmp.path())
        .write_stdin(log.clone())
        .assert()
        .success()
        .stdout(predicate::str::contains("=== BUILD TARGET App"));

    gen_ir()
        .args(["-", "Sample.xcarchive", "--quieter"])
        .current_dir(tmp.path())
        .write_stdin(log)
        .assert()
        .success()
        .stdout(predicate::str::contains("BUILD TARGET").not());
}

#[cfg(unix)]
#[test]
fn test_failures_are_reported_and_thresholded() {
    let tmp = project_dir();
    let clang = install_fake_clang(tmp.path());
    fs::write(tmp.path().join("build.log"), build_log(&clang, "App/Broken.m")).unwrap();

    // Without a threshold a failed invocation doesn't fail the run.
    gen_ir()
        .args(["build.log", "Sample.xcarchive"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let report_path = tmp.path().join("Sample.xcarchive/IR/report.json");
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["failed"][0]["target"], "App");
    assert_eq!(report["failed"][0]["module"], "Broken");
    assert!(report["failed"][0]["diagnostic"]
        .as_str()
        .unwrap()
        .contains("cannot compile"));

    gen_ir()
        .args(["build.log", "Sample.xcarchive", "--failure-threshold", "0.1"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failure threshold"));
}
