// tests/log_manager.rs

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;

use chrono::{Local, TimeZone};
use tokio::io::AsyncWriteExt;

use launchcheck::logs::{LogManager, clean_logs};
use launchcheck::types::LogLayout;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn flat_layout_names_files_by_unit_and_timestamp() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let manager = LogManager::create(&tmp.path().join("logs"), LogLayout::Flat, Local::now())?;

    let sink = manager.allocate("spring/hello-world").await?;
    let path = sink.path().to_path_buf();
    assert!(path.is_absolute());
    assert_eq!(path.parent(), Some(manager.root()));

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.starts_with("spring_hello-world_"), "name: {name}");
    assert!(name.ends_with(".log"), "name: {name}");

    let (_, mut file) = sink.into_parts();
    file.write_all(b"captured\n").await?;
    file.flush().await?;
    assert_eq!(std::fs::read_to_string(&path)?, "captured\n");
    Ok(())
}

#[tokio::test]
async fn structured_layout_uses_a_run_directory() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let started = Local
        .with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
        .single()
        .ok_or("ambiguous timestamp")?;
    let manager = LogManager::create(tmp.path(), LogLayout::Structured, started)?;

    assert_eq!(
        manager.run_dir().file_name().and_then(|n| n.to_str()),
        Some("run-20260314_092653")
    );
    let sink = manager.allocate("agents/chain").await?;
    assert_eq!(sink.path(), manager.run_dir().join("agents_chain.log"));

    // A second run started in the same second gets its own directory.
    let again = LogManager::create(tmp.path(), LogLayout::Structured, started)?;
    assert_ne!(again.run_dir(), manager.run_dir());
    assert_eq!(
        again.run_dir().file_name().and_then(|n| n.to_str()),
        Some("run-20260314_092653-2")
    );
    Ok(())
}

#[tokio::test]
async fn repeated_allocation_never_reuses_a_path() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let manager = LogManager::create(tmp.path(), LogLayout::Structured, Local::now())?;

    let first = manager.allocate("unit").await?;
    let second = manager.allocate("unit").await?;
    assert_eq!(first.path(), manager.run_dir().join("unit.log"));
    assert_eq!(second.path(), manager.run_dir().join("unit-2.log"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_allocation_is_collision_free() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let manager = Arc::new(LogManager::create(tmp.path(), LogLayout::Flat, Local::now())?);

    let mut handles = Vec::new();
    for _ in 0..32 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager
                .allocate("same-unit")
                .await
                .map(|sink| sink.path().to_path_buf())
        }));
    }

    let mut paths = HashSet::new();
    for handle in handles {
        let path = handle.await??;
        assert!(paths.insert(path.clone()), "duplicate path {}", path.display());
    }
    assert_eq!(paths.len(), 32);
    Ok(())
}

#[test]
fn clean_logs_removes_logs_and_run_dirs_only() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let root = tmp.path();
    std::fs::write(root.join("a_20260101_000000.log"), "x")?;
    std::fs::create_dir_all(root.join("nested"))?;
    std::fs::write(root.join("nested/b.log"), "x")?;
    std::fs::write(root.join("nested/notes.txt"), "keep")?;
    std::fs::create_dir_all(root.join("run-20260101_000000"))?;
    std::fs::write(root.join("run-20260101_000000/c.log"), "x")?;
    std::fs::write(root.join("report.md"), "keep")?;

    let stats = clean_logs(root)?;
    assert_eq!(stats.files, 3);
    assert_eq!(stats.dirs, 1);
    assert_eq!(stats.failed, 0);

    assert!(!root.join("a_20260101_000000.log").exists());
    assert!(!root.join("nested/b.log").exists());
    assert!(!root.join("run-20260101_000000").exists());
    assert!(root.join("nested/notes.txt").exists());
    assert!(root.join("report.md").exists());
    Ok(())
}

#[test]
fn clean_logs_on_missing_root_is_a_no_op() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let stats = clean_logs(&tmp.path().join("never-created"))?;
    assert_eq!(stats.files + stats.dirs + stats.failed, 0);
    Ok(())
}
