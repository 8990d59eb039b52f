use std::path::Path;

use anyhow::Result;
use cmd::commands::{handle_command, transfer_command};
use cmd::common::{GlobalOptions, RelayContext};
use relay::testing::gzip;
use relay::{RelayConfig, RelayError, S3Event};
use tempfile::TempDir;

const SOURCE: &str = "src-bucket";
const DESTINATION: &str = "dst-bucket";

fn local_context(root: &Path, continue_on_error: bool) -> RelayContext {
    let options = GlobalOptions {
        local_root: Some(root.to_path_buf()),
        continue_on_error,
    };
    RelayContext::new(RelayConfig::new(DESTINATION), &options)
}

async fn seed(root: &Path, key: &str, data: &[u8]) -> Result<()> {
    let path = root.join(SOURCE).join(key);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, gzip(data).await?)?;
    Ok(())
}

fn write_event(root: &Path, keys: &[&str]) -> Result<std::path::PathBuf> {
    let event = S3Event::for_objects(keys.iter().map(|key| (SOURCE, *key)));
    let path = root.join("event.json");
    std::fs::write(&path, serde_json::to_vec(&event)?)?;
    Ok(path)
}

#[tokio::test]
async fn test_handle_event_file() -> Result<()> {
    let tmp = TempDir::new()?;
    seed(tmp.path(), "logs/app.txt.gz", b"first line\nsecond line\n").await?;
    seed(tmp.path(), "logs/db.txt.gz", b"query ok\n").await?;
    let event_path = write_event(tmp.path(), &["logs/app.txt.gz", "logs/db.txt.gz"])?;

    let context = local_context(tmp.path(), false);
    let mut out = Vec::new();
    let reports = handle_command(&context, Some(&event_path), &mut out).await?;

    assert_eq!(reports.len(), 2);
    let restored = std::fs::read(tmp.path().join(DESTINATION).join("logs/app.txt"))?;
    assert_eq!(restored, b"first line\nsecond line\n");
    let restored = std::fs::read(tmp.path().join(DESTINATION).join("logs/db.txt"))?;
    assert_eq!(restored, b"query ok\n");

    let printed = String::from_utf8(out)?;
    let lines: Vec<&str> = printed.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("src-bucket/logs/app.txt.gz -> file://"));
    assert!(lines[0].ends_with("logs/app.txt (23 bytes)"));
    Ok(())
}

#[tokio::test]
async fn test_handle_encoded_key() -> Result<()> {
    let tmp = TempDir::new()?;
    seed(tmp.path(), "daily report.csv.gz", b"a,b\n1,2\n").await?;
    let event_path = write_event(tmp.path(), &["daily+report.csv.gz"])?;

    let context = local_context(tmp.path(), false);
    let _ = handle_command(&context, Some(&event_path), &mut Vec::new()).await?;

    let restored = std::fs::read(tmp.path().join(DESTINATION).join("daily report.csv"))?;
    assert_eq!(restored, b"a,b\n1,2\n");
    Ok(())
}

#[tokio::test]
async fn test_handle_fails_on_missing_object() -> Result<()> {
    let tmp = TempDir::new()?;
    seed(tmp.path(), "one.gz", b"1").await?;
    seed(tmp.path(), "three.gz", b"3").await?;
    let event_path = write_event(tmp.path(), &["one.gz", "two.gz", "three.gz"])?;

    let context = local_context(tmp.path(), false);
    let err = handle_command(&context, Some(&event_path), &mut Vec::new())
        .await
        .unwrap_err();

    let relay_err = err.downcast_ref::<RelayError>().expect("relay error");
    assert!(matches!(relay_err, RelayError::BatchAborted { index: 1, .. }));
    assert!(tmp.path().join(DESTINATION).join("one").exists());
    assert!(!tmp.path().join(DESTINATION).join("two").exists());
    assert!(!tmp.path().join(DESTINATION).join("three").exists());
    Ok(())
}

#[tokio::test]
async fn test_continue_on_error_still_fails_command() -> Result<()> {
    let tmp = TempDir::new()?;
    seed(tmp.path(), "one.gz", b"1").await?;
    seed(tmp.path(), "three.gz", b"3").await?;
    let event_path = write_event(tmp.path(), &["one.gz", "two.gz", "three.gz"])?;

    let context = local_context(tmp.path(), true);
    let mut out = Vec::new();
    let err = handle_command(&context, Some(&event_path), &mut out)
        .await
        .unwrap_err();

    let relay_err = err.downcast_ref::<RelayError>().expect("relay error");
    assert!(matches!(
        relay_err,
        RelayError::BatchFailed {
            failed: 1,
            total: 3,
            ..
        }
    ));
    assert_eq!(std::fs::read(tmp.path().join(DESTINATION).join("three"))?, b"3");
    assert_eq!(String::from_utf8(out)?.lines().count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_handle_rejects_malformed_event() -> Result<()> {
    let tmp = TempDir::new()?;
    let event_path = tmp.path().join("event.json");
    std::fs::write(&event_path, b"{\"Records\": [{\"s3\": 5}]}")?;

    let context = local_context(tmp.path(), false);
    let err = handle_command(&context, Some(&event_path), &mut Vec::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Failed to parse event file"));
    assert!(!tmp.path().join(DESTINATION).exists());
    Ok(())
}

#[tokio::test]
async fn test_transfer_single_object() -> Result<()> {
    let tmp = TempDir::new()?;
    seed(tmp.path(), "raw/events.jsonl.gz", b"{\"n\":1}\n").await?;

    let context = local_context(tmp.path(), false);
    let mut out = Vec::new();
    let report =
        transfer_command(&context, SOURCE, "raw/events.jsonl.gz", &mut out).await?;

    assert_eq!(report.destination_key, "raw/events.jsonl");
    assert_eq!(report.uploaded_bytes, 8);
    let restored = std::fs::read(tmp.path().join(DESTINATION).join("raw/events.jsonl"))?;
    assert_eq!(restored, b"{\"n\":1}\n");
    assert!(String::from_utf8(out)?.contains("(8 bytes)"));
    Ok(())
}
