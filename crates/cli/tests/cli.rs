use assert_cmd::Command;

fn erudio(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("erudio").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("ERUDIO_ENV")
        .env_remove("ERUDIO_CONFIG_DIR")
        .env(
            "ERUDIO_DATABASE__URL",
            format!("sqlite://{}?mode=rwc", dir.path().join("cli.db").display()),
        );
    cmd
}

#[test]
fn openapi_lists_every_module() {
    let dir = tempfile::tempdir().unwrap();
    let output = erudio(&dir).arg("openapi").output().unwrap();

    assert!(output.status.success());
    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for path in [
        "/api/person/v1",
        "/api/person/v1/exportPage",
        "/api/book/v1/{id}",
        "/api/file/v1/downloadFile/{fileName}",
        "/api/math/sum/{a}/{b}",
    ] {
        assert!(document["paths"].get(path).is_some(), "missing {path}");
    }
    assert!(!dir.path().join("cli.db").exists());
}

#[test]
fn migrate_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();

    let first = erudio(&dir).arg("migrate").output().unwrap();
    assert!(first.status.success());
    assert!(String::from_utf8_lossy(&first.stdout).contains("applied 2 migration(s)"));

    let second = erudio(&dir).arg("migrate").output().unwrap();
    assert!(String::from_utf8_lossy(&second.stdout).contains("applied 0 migration(s)"));
}

#[test]
fn unknown_environment_fails() {
    let dir = tempfile::tempdir().unwrap();
    erudio(&dir)
        .args(["--env", "moon", "openapi"])
        .assert()
        .failure();
}
