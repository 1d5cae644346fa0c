//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn neuroscreen(home: &Path, cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("neuroscreen").unwrap();
    cmd.current_dir(cwd)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"));
    cmd
}

fn write_xdg_config(home: &Path, content: &str) {
    let dir = home.join("config").join("neuroscreen");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

#[test]
fn test_xdg_config_applies() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(home.path(), "[models]\ndir = '/from/xdg'\n");

    neuroscreen(home.path(), home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout("/from/xdg\n");
}

#[test]
fn test_project_config_overrides_xdg() {
    let home = tempfile::tempdir().unwrap();
    write_xdg_config(home.path(), "[models]\ndir = '/from/xdg'\n");

    let project = home.path().join("project");
    let nested = project.join("photos").join("2024");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        project.join(".neuroscreen.toml"),
        "[models]\ndir = '/from/project'\n",
    )
    .unwrap();

    // Found by searching up from a nested working directory.
    neuroscreen(home.path(), &nested)
        .args(["models", "path"])
        .assert()
        .success()
        .stdout("/from/project\n");
}

#[test]
fn test_cli_overrides_project_config() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".neuroscreen.toml"),
        "[models]\ndir = '/from/project'\n",
    )
    .unwrap();

    neuroscreen(home.path(), home.path())
        .args(["models", "path", "--models-dir", "/from/cli"])
        .assert()
        .success()
        .stdout("/from/cli\n");
}

#[test]
fn test_project_model_override_is_listed() {
    let home = tempfile::tempdir().unwrap();
    let cascade = home.path().join("my_cascade.xml");
    fs::write(&cascade, "<opencv_storage/>").unwrap();
    fs::write(
        home.path().join(".neuroscreen.toml"),
        format!("[models]\nface_cascade = '{}'\n", cascade.display()),
    )
    .unwrap();

    neuroscreen(home.path(), home.path())
        .args(["models", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(cascade.display().to_string())
                .and(predicate::str::contains("1/3 models installed")),
        );
}

#[test]
fn test_invalid_value_warns() {
    let home = tempfile::tempdir().unwrap();
    fs::write(
        home.path().join(".neuroscreen.toml"),
        "[face]\nscale_factor = 0.9\n",
    )
    .unwrap();

    neuroscreen(home.path(), home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: face.scale_factor must be greater than 1",
        ));
}

#[test]
fn test_unparseable_config_is_ignored() {
    let home = tempfile::tempdir().unwrap();
    fs::write(home.path().join(".neuroscreen.toml"), "[models\ndir = ").unwrap();

    neuroscreen(home.path(), home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("neuroscreen"));
}
