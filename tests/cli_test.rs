//! CLIの終了コードと出力

use assert_cmd::Command;
use mockito::Server;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("gemini-ocr").unwrap();
    cmd.env_remove("GEMINI_API_KEY")
        .env_remove("GEMINI_API_BASE")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--api_key"))
        .stdout(predicate::str::contains("--photo_dir"))
        .stdout(predicate::str::contains("--output_path"))
        .stdout(predicate::str::contains("--prompt_file"))
        .stdout(predicate::str::contains("--api_base").not());
}

/// APIキーなしでは起動しない
#[test]
fn test_missing_api_key() {
    cmd().assert().failure();
}

/// 空のAPIキーはエラー
#[test]
fn test_blank_api_key() {
    cmd()
        .args(["--api_key", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("MissingApiKey"));
}

/// 存在しないフォルダは画像なしと同じ扱いで正常終了
#[test]
fn test_photo_dir_not_found() {
    let dir = tempdir().expect("Failed to create temp dir");
    cmd()
        .current_dir(dir.path())
        .args(["--api_key", "key", "--photo_dir", "no_such_dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains("画像が見つかりません: no_such_dir"));

    assert!(!dir.path().join("output.xlsx").exists());
}

/// --image で画像以外だけを指定した場合は指定したファイル名を表示
#[test]
fn test_no_images_among_given_files() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("notes.txt"), "text").unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["--api_key", "key", "--image", "notes.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("画像が見つかりません: notes.txt"))
        .stdout(predicate::str::contains("Photo").not());
}

/// 画像がなければ何も出力せずに正常終了
#[test]
fn test_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::create_dir(dir.path().join("Photo")).unwrap();
    std::fs::write(dir.path().join("Photo").join("memo.txt"), "text").unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["--api_key", "key"])
        .assert()
        .success()
        .stdout(predicate::str::contains("画像が見つかりません"));

    assert!(!dir.path().join("output.xlsx").exists());
}

/// モックAPIを相手に通しで実行し、設定も保存する
#[test]
fn test_run_against_mock_api() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
        .match_header("x-goog-api-key", "cli-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"candidates": [{"content": {"parts": [{"text": "{\"title\": \"請求書\"}"}]}}]})
                .to_string(),
        )
        .expect(2)
        .create();

    let dir = tempdir().expect("Failed to create temp dir");
    let home = dir.path().join("home");
    let photos = dir.path().join("scans");
    std::fs::create_dir(&photos).unwrap();
    std::fs::write(photos.join("1.jpg"), "one").unwrap();
    std::fs::write(photos.join("2.PNG"), "two").unwrap();
    std::fs::write(dir.path().join("prompt.txt"), "タイトルを抽出").unwrap();

    cmd()
        .current_dir(dir.path())
        .env("HOME", &home)
        .env("GEMINI_API_BASE", server.url())
        .args([
            "--api_key",
            "cli-key",
            "--model",
            "gemini-1.5-flash",
            "--photo_dir",
            "scans",
            "--output_path",
            "result/ocr.xlsx",
            "--save-settings",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2枚の画像を検出"))
        .stdout(predicate::str::contains("成功: 2, 失敗: 0"));

    mock.assert();
    assert!(dir.path().join("result").join("ocr.xlsx").exists());

    let ini = std::fs::read_to_string(home.join(".gemini_ocr").join("config.ini")).unwrap();
    assert!(ini.contains("api_key=cli-key"));
    assert!(ini.contains("model=gemini-1.5-flash"));
    assert!(ini.contains("last_photo_dir=scans"));
}
