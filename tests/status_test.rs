use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn status_reports_resolved_layout() {
    let tmp = tempdir().expect("tempdir");
    fs::write(
        tmp.path().join("upload-index.toml"),
        "[table]\ntitle = \"Shared\"\nintro = \"\"\nheader_labels = [\"Name\", \"When\", \"Where\"]\nlink_root = \"files/\"\nfront_matter = false\n",
    )
    .expect("write settings");

    assert_cmd::cargo::cargo_bin_cmd!("upload-index")
        .current_dir(tmp.path())
        .env_remove("UPLOAD_INDEX_CONFIG_PATH")
        .env("UPLOAD_INDEX_TIMEZONE", "Asia/Shanghai")
        .arg("--root")
        .arg(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("records=0"))
        .stdout(predicate::str::contains("timezone=Asia/Shanghai"))
        .stdout(predicate::str::contains("table.signature=Name | When | Where"))
        .stdout(predicate::str::contains("env.UPLOAD_INDEX_TIMEZONE=set"));
}

#[test]
fn status_flags_corrupt_store() {
    let tmp = tempdir().expect("tempdir");
    fs::write(tmp.path().join("upload_records.json"), "{\"oops\": true}").expect("write");

    assert_cmd::cargo::cargo_bin_cmd!("upload-index")
        .current_dir(tmp.path())
        .env("UPLOAD_INDEX_CONFIG_PATH", tmp.path().join("absent.toml"))
        .arg("--root")
        .arg(tmp.path())
        .arg("status")
        .assert()
        .failure()
        .stdout(predicate::str::contains("issue: record store"))
        .stderr(predicate::str::contains("status reported 1 issue(s)"));
}

#[test]
fn invalid_timezone_is_a_config_error() {
    let tmp = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("upload-index")
        .current_dir(tmp.path())
        .env("UPLOAD_INDEX_CONFIG_PATH", tmp.path().join("absent.toml"))
        .env("UPLOAD_INDEX_TIMEZONE", "Atlantis/Capital")
        .arg("--root")
        .arg(tmp.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stage=config"))
        .stderr(predicate::str::contains("invalid display timezone"));
}

#[test]
fn status_lists_only_variables_the_binary_reads() {
    let tmp = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("upload-index")
        .current_dir(tmp.path())
        .env("UPLOAD_INDEX_CONFIG_PATH", tmp.path().join("absent.toml"))
        .env("UPLOAD_INDEX_LOG", "warn")
        .env("UPLOAD_INDEX_LOCK_DOCUMENT", "1")
        .env("UPLOAD_INDEX_NOT_A_SETTING", "1")
        .arg("--root")
        .arg(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("env.UPLOAD_INDEX_LOG=set"))
        .stdout(predicate::str::contains("env.UPLOAD_INDEX_LOCK_DOCUMENT=set"))
        .stdout(predicate::str::contains("document.lock=true"))
        .stdout(predicate::str::contains("UPLOAD_INDEX_NOT_A_SETTING").not());
}

#[test]
fn partial_settings_file_enables_document_lock() {
    let tmp = tempdir().expect("tempdir");
    fs::write(tmp.path().join("upload-index.toml"), "[document]\nlock = true\n")
        .expect("write settings");

    assert_cmd::cargo::cargo_bin_cmd!("upload-index")
        .current_dir(tmp.path())
        .env_remove("UPLOAD_INDEX_CONFIG_PATH")
        .env_remove("UPLOAD_INDEX_LOCK_DOCUMENT")
        .env_remove("UPLOAD_INDEX_TOUCH_LASTMOD")
        .arg("--root")
        .arg(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("document.lock=true"))
        .stdout(predicate::str::contains("document.touch_lastmod=true"));
}
