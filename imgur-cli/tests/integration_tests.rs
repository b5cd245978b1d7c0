// ABOUTME: End-to-end tests running parsed imgur commands against a mock Imgur server
// ABOUTME: Covers file, convert, and asset uploads plus error propagation to the binary boundary

use clap::Parser;
use imgur_cli::cli::Cli;
use imgur_cli::cli_output::CliOutput;
use imgur_cli::commands;
use imgur_cli::config::Config;
use imgur_sdk::{DynamicImage, ErrorCode, UploadError};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tempfile::TempDir;

const UPLOAD_PATH: &str = "/3/image";

fn config_for(server: &ServerGuard) -> Config {
    Config {
        endpoint: Some(format!("{}{}", server.url(), UPLOAD_PATH)),
        ..Default::default()
    }
}

fn success_body(link: &str) -> String {
    json!({ "data": { "link": link }, "success": true, "status": 200 }).to_string()
}

async fn run(args: &[&str], config: Config) -> anyhow::Result<Option<imgur_cli::cli_output::UploadReport>> {
    let cli = Cli::try_parse_from(args).expect("arguments should parse");
    commands::execute(cli, config, &CliOutput::with_color(false)).await
}

#[tokio::test]
async fn test_upload_command_posts_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shot.png");
    std::fs::write(&path, b"png-ish bytes").unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", UPLOAD_PATH)
        .match_header("authorization", "Client-ID cli-id")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="title"\r\n\r\nRelease notes"#.to_string()),
            Matcher::Regex(r#"filename="notes.png""#.to_string()),
        ]))
        .with_status(200)
        .with_body(success_body("https://i.imgur.com/shot.png"))
        .create_async()
        .await;

    let path_arg = path.to_string_lossy().to_string();
    let report = run(
        &[
            "imgur",
            "--client-id",
            "cli-id",
            "upload",
            &path_arg,
            "--title",
            "Release notes",
            "--name",
            "notes.png",
            "--no-progress",
        ],
        config_for(&server),
    )
    .await
    .unwrap()
    .expect("upload should produce a report");

    mock.assert_async().await;
    assert_eq!(report.link, "https://i.imgur.com/shot.png");
    assert_eq!(report.title.as_deref(), Some("Release notes"));
}

#[tokio::test]
async fn test_default_title_comes_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("a.gif");
    std::fs::write(&path, b"gif-ish").unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", UPLOAD_PATH)
        .match_body(Matcher::Regex(r#"name="title"\r\n\r\nFrom config"#.to_string()))
        .with_status(200)
        .with_body(success_body("https://i.imgur.com/a.gif"))
        .create_async()
        .await;

    let config = Config {
        default_title: Some("From config".to_string()),
        client_id: Some("file-id".to_string()),
        ..config_for(&server)
    };
    let path_arg = path.to_string_lossy().to_string();
    let report = run(&["imgur", "--client-id", "x", "upload", &path_arg, "--json"], config)
        .await
        .unwrap()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(report.title.as_deref(), Some("From config"));
}

#[tokio::test]
async fn test_convert_upload_reencodes_as_jpeg() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("diagram.png");
    DynamicImage::new_rgb8(6, 6).save(&path).unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", UPLOAD_PATH)
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"filename="diagram.jpg""#.to_string()),
            Matcher::Regex("(?i)content-type: image/jpeg".to_string()),
        ]))
        .with_status(200)
        .with_body(success_body("https://i.imgur.com/diagram.jpg"))
        .create_async()
        .await;

    let path_arg = path.to_string_lossy().to_string();
    let report = run(
        &[
            "imgur",
            "--client-id",
            "cli-id",
            "convert-upload",
            &path_arg,
            "--format",
            "jpeg",
            "--no-progress",
        ],
        config_for(&server),
    )
    .await
    .unwrap()
    .unwrap();

    mock.assert_async().await;
    assert_eq!(report.link, "https://i.imgur.com/diagram.jpg");
}

#[tokio::test]
async fn test_asset_command_resolves_against_asset_dir() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir(temp_dir.path().join("icons")).unwrap();
    std::fs::write(temp_dir.path().join("icons").join("logo.png"), b"logo").unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", UPLOAD_PATH)
        .match_body(Matcher::Regex(r#"filename="logo.png""#.to_string()))
        .with_status(200)
        .with_body(success_body("https://i.imgur.com/logo.png"))
        .create_async()
        .await;

    let asset_dir = temp_dir.path().to_string_lossy().to_string();
    run(
        &[
            "imgur",
            "--client-id",
            "cli-id",
            "asset",
            "asset://icons/logo.png",
            "--asset-dir",
            &asset_dir,
        ],
        config_for(&server),
    )
    .await
    .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_surfaces_as_upload_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("x.png");
    std::fs::write(&path, b"x").unwrap();

    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", UPLOAD_PATH)
        .with_status(429)
        .with_body(json!({ "data": { "error": "slow down" }, "success": false, "status": 429 }).to_string())
        .create_async()
        .await;

    let path_arg = path.to_string_lossy().to_string();
    let err = run(
        &["imgur", "--client-id", "cli-id", "upload", &path_arg],
        config_for(&server),
    )
    .await
    .unwrap_err();

    let upload_err = err
        .downcast_ref::<UploadError>()
        .expect("should carry the SDK error");
    assert_eq!(upload_err.code(), ErrorCode::RateLimitExceeded);
    assert!(upload_err.help_text().is_some());
}

#[tokio::test]
async fn test_invalid_asset_reference_fails_before_network() {
    let server = Server::new_async().await;

    let err = run(
        &["imgur", "--client-id", "cli-id", "asset", "not a url"],
        config_for(&server),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("Invalid asset reference"));
}
