use docbot_archive::{write_archive, ClassDoc, ClassName, LibraryInfo};
use docbot_indexer::{ArchiveEvent, ArchiveWatcher, DocLookup, LookupConfig, WatcherConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn write_docs(path: &Path, classes: &[&str]) {
    let docs: Vec<ClassDoc> = classes
        .iter()
        .map(|full| {
            ClassDoc::new(ClassName::from_full(*full)).with_description(format!("Docs for {full}."))
        })
        .collect();
    let info = LibraryInfo {
        name: "test".to_string(),
        ..LibraryInfo::default()
    };
    write_archive(path, Some(&info), &docs).expect("write archive");
}

async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

fn watcher_config() -> WatcherConfig {
    WatcherConfig {
        notify_poll_interval: Duration::from_millis(100),
        ..WatcherConfig::default()
    }
}

#[cfg_attr(
    not(target_os = "linux"),
    ignore = "watcher latency test is only reliable on Linux"
)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_picks_up_created_and_deleted_archives() {
    if std::env::var("SKIP_WATCH_FLOW").is_ok() {
        eprintln!("skipping watch_flow due to SKIP_WATCH_FLOW");
        return;
    }

    let temp = TempDir::new().expect("tempdir");
    write_docs(&temp.path().join("widgets.zip"), &["a.Widget"]);

    let lookup = Arc::new(DocLookup::open(LookupConfig::new(temp.path())).expect("open lookup"));
    assert_eq!(lookup.resolve("Widget"), vec!["a.Widget"]);

    let watcher = ArchiveWatcher::start(lookup.clone(), watcher_config()).expect("start watcher");

    write_docs(&temp.path().join("gadgets.zip"), &["b.Gadget"]);
    let added = wait_until(Duration::from_secs(5), || !lookup.resolve("Gadget").is_empty()).await;
    assert!(
        added,
        "gadgets.zip was not picked up (health={:?})",
        watcher.health_snapshot()
    );
    let gadget = lookup
        .class_info("b.Gadget")
        .expect("unambiguous")
        .expect("found");
    assert_eq!(gadget.description, "Docs for b.Gadget.");

    std::fs::remove_file(temp.path().join("widgets.zip")).expect("remove archive");
    let removed = wait_until(Duration::from_secs(5), || lookup.resolve("Widget").is_empty()).await;
    assert!(
        removed,
        "widgets.zip was not dropped (health={:?})",
        watcher.health_snapshot()
    );

    watcher.shutdown().await;
    assert!(!watcher.health_snapshot().running);
}

#[cfg_attr(
    not(target_os = "linux"),
    ignore = "watcher latency test is only reliable on Linux"
)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn replaced_archive_is_reloaded() {
    if std::env::var("SKIP_WATCH_FLOW").is_ok() {
        eprintln!("skipping watch_flow due to SKIP_WATCH_FLOW");
        return;
    }

    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("widgets.zip");
    write_docs(&path, &["a.Widget"]);

    let lookup = Arc::new(DocLookup::open(LookupConfig::new(temp.path())).expect("open lookup"));
    let watcher = ArchiveWatcher::start(lookup.clone(), watcher_config()).expect("start watcher");

    write_docs(&path, &["a.Gadget"]);
    let reloaded = wait_until(Duration::from_secs(5), || {
        lookup.resolve("Widget").is_empty() && !lookup.resolve("Gadget").is_empty()
    })
    .await;
    assert!(
        reloaded,
        "widgets.zip was not reloaded (health={:?})",
        watcher.health_snapshot()
    );

    watcher.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn injected_events_share_the_watcher_queue() {
    let temp = TempDir::new().expect("tempdir");
    let lookup = Arc::new(DocLookup::open(LookupConfig::new(temp.path())).expect("open lookup"));
    let watcher = ArchiveWatcher::start(lookup.clone(), watcher_config()).expect("start watcher");
    let mut updates = watcher.subscribe_updates();

    // unreadable archives are reported and the loop keeps going
    let broken = lookup.archive_dir().join("broken.zip");
    watcher
        .apply(ArchiveEvent::Created(broken.clone()))
        .await
        .expect("queue event");

    let good = lookup.archive_dir().join("good.zip");
    watcher
        .apply(ArchiveEvent::Created(good.clone()))
        .await
        .expect("queue event");

    let mut seen = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    while seen.len() < 2 && Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(200), updates.recv()).await {
            Ok(Ok(update)) if update.event.path() == broken || update.event.path() == good => {
                seen.push(update);
            }
            Ok(Ok(_)) | Err(_) => {}
            Ok(Err(err)) => panic!("update stream failed: {err}"),
        }
    }

    assert_eq!(seen.len(), 2, "missing updates: {seen:?}");
    assert!(!seen[0].success());
    assert_eq!(seen[0].event, ArchiveEvent::Created(broken));
    // good.zip does not exist either, so it fails the same way
    assert!(!seen[1].success());
    let counted = wait_until(Duration::from_secs(2), || {
        watcher.health_snapshot().consecutive_failures >= 2
    })
    .await;
    assert!(counted, "health={:?}", watcher.health_snapshot());
    assert!(watcher.health_snapshot().running);

    write_docs(&good, &["a.Widget"]);
    watcher
        .apply(ArchiveEvent::Modified(good.clone()))
        .await
        .expect("queue event");
    let reloaded = wait_until(Duration::from_secs(5), || {
        !lookup.resolve("Widget").is_empty()
    })
    .await;
    assert!(reloaded);

    watcher.shutdown().await;
    assert!(!watcher.health_snapshot().running);
    assert!(watcher.apply(ArchiveEvent::Removed(good)).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resync_repairs_an_index_that_drifted_from_the_directory() {
    let temp = TempDir::new().expect("tempdir");
    let elsewhere = TempDir::new().expect("tempdir");
    write_docs(&temp.path().join("widgets.zip"), &["a.Widget"]);
    write_docs(&elsewhere.path().join("stray.zip"), &["b.Stray"]);

    let lookup = Arc::new(DocLookup::open(LookupConfig::new(temp.path())).expect("open lookup"));
    let watcher = ArchiveWatcher::start(lookup.clone(), watcher_config()).expect("start watcher");

    // the directory is untouched, so no notification will repair these
    lookup
        .remove_archive(&lookup.archive_dir().join("widgets.zip"))
        .expect("remove widgets");
    lookup
        .add_archive(&elsewhere.path().join("stray.zip"))
        .expect("add stray");
    assert!(lookup.resolve("Widget").is_empty());
    assert_eq!(lookup.resolve("Stray"), vec!["b.Stray"]);

    watcher.resync().await.expect("queue resync");
    let resynced = wait_until(Duration::from_secs(5), || {
        watcher.health_snapshot().resyncs >= 1
    })
    .await;
    assert!(resynced, "health={:?}", watcher.health_snapshot());
    assert_eq!(lookup.resolve("Widget"), vec!["a.Widget"]);
    assert!(lookup.resolve("Stray").is_empty());

    watcher.shutdown().await;
}
