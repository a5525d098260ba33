use crate::config::WatcherConfig;
use crate::lookup::{ArchiveAction, ArchiveEvent, DocLookup};
use crate::scanner::is_archive_path;
use crate::{IndexerError, Result};
use log::{debug, error, info, warn};
use notify::event::{AccessKind, AccessMode, ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

const MAX_ALERTS: usize = 20;

/// Outcome of one processed directory change
#[derive(Debug, Clone)]
pub struct ArchiveUpdate {
    pub completed_at: SystemTime,
    pub duration_ms: u64,
    pub event: ArchiveEvent,
    /// `None` when the event failed
    pub action: Option<ArchiveAction>,
    pub error: Option<String>,
}

impl ArchiveUpdate {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertRecord {
    pub timestamp_unix_ms: u64,
    pub path: PathBuf,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatcherHealth {
    /// False once the loop has stopped; later directory changes are not applied
    pub running: bool,
    pub events_processed: u64,
    pub consecutive_failures: u32,
    pub last_success: Option<SystemTime>,
    pub last_error: Option<String>,
    pub resyncs: u32,
    pub alerts: VecDeque<AlertRecord>,
}

impl WatcherHealth {
    fn initial() -> Self {
        Self {
            running: true,
            events_processed: 0,
            consecutive_failures: 0,
            last_success: None,
            last_error: None,
            resyncs: 0,
            alerts: VecDeque::new(),
        }
    }
}

/// Background task keeping a [`DocLookup`] in sync with its archive directory.
///
/// Events are applied one at a time, in the order the notification backend delivers them.
/// The task stops on [`ArchiveWatcher::shutdown`], when the last handle is dropped, or when
/// the notification backend fails for good.
#[derive(Clone)]
pub struct ArchiveWatcher {
    inner: Arc<ArchiveWatcherInner>,
}

struct ArchiveWatcherInner {
    command_tx: mpsc::Sender<WatcherCommand>,
    update_tx: broadcast::Sender<ArchiveUpdate>,
    health_tx: watch::Sender<WatcherHealth>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
    _watcher: std::sync::Mutex<RecommendedWatcher>,
}

enum WatcherCommand {
    Apply(ArchiveEvent),
    Resync,
    Shutdown,
}

impl ArchiveWatcher {
    /// Start watching `lookup.archive_dir()`. Must be called inside a tokio runtime.
    pub fn start(lookup: Arc<DocLookup>, config: WatcherConfig) -> Result<Self> {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let (command_tx, command_rx) = mpsc::channel(16);
        let (health_tx, _) = watch::channel(WatcherHealth::initial());
        let (update_tx, _) = broadcast::channel(64);

        let watcher = create_fs_watcher(lookup.archive_dir(), event_tx, config)?;
        info!("Watching {} for archive changes", lookup.archive_dir().display());

        let task = spawn_watch_loop(
            lookup,
            event_rx,
            command_rx,
            update_tx.clone(),
            health_tx.clone(),
        );

        Ok(Self {
            inner: Arc::new(ArchiveWatcherInner {
                command_tx,
                update_tx,
                health_tx,
                task: std::sync::Mutex::new(Some(task)),
                _watcher: std::sync::Mutex::new(watcher),
            }),
        })
    }

    /// Queue an event for the watcher loop. Queued commands are served before backend
    /// notifications that have not been picked up yet.
    pub async fn apply(&self, event: ArchiveEvent) -> Result<()> {
        self.send(WatcherCommand::Apply(event)).await
    }

    /// Queue a full resynchronization with the directory.
    pub async fn resync(&self) -> Result<()> {
        self.send(WatcherCommand::Resync).await
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(&self) {
        let _ = self.inner.command_tx.send(WatcherCommand::Shutdown).await;
        let task = self
            .inner
            .task
            .lock()
            .ok()
            .and_then(|mut guard| guard.take());
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!("Archive watcher task failed: {err}");
            }
        }
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<ArchiveUpdate> {
        self.inner.update_tx.subscribe()
    }

    #[must_use]
    pub fn health_snapshot(&self) -> WatcherHealth {
        self.inner.health_tx.borrow().clone()
    }

    #[must_use]
    pub fn health_stream(&self) -> watch::Receiver<WatcherHealth> {
        self.inner.health_tx.subscribe()
    }

    async fn send(&self, command: WatcherCommand) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .await
            .map_err(|e| IndexerError::Watch(format!("watcher is not running: {e}")))
    }
}

impl Drop for ArchiveWatcher {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 {
            let _ = self.inner.command_tx.try_send(WatcherCommand::Shutdown);
        }
    }
}

fn create_fs_watcher(
    dir: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
    config: WatcherConfig,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(config.notify_poll_interval),
    )
    .map_err(|e| IndexerError::Watch(format!("watcher init failed: {e}")))?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| IndexerError::Watch(format!("failed to watch {}: {e}", dir.display())))?;
    Ok(watcher)
}

fn spawn_watch_loop(
    lookup: Arc<DocLookup>,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    mut command_rx: mpsc::Receiver<WatcherCommand>,
    update_tx: broadcast::Sender<ArchiveUpdate>,
    health_tx: watch::Sender<WatcherHealth>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let root = lookup.archive_dir().to_path_buf();
        let extension = lookup.config().extension.clone();
        let mut health = WatcherHealth::initial();

        loop {
            tokio::select! {
                biased;

                Some(cmd) = command_rx.recv() => {
                    match cmd {
                        WatcherCommand::Apply(event) => {
                            process_event(&lookup, event, &mut health, &update_tx).await;
                        }
                        WatcherCommand::Resync => run_resync(&lookup, &mut health).await,
                        WatcherCommand::Shutdown => {
                            info!("Archive watcher stopped");
                            break;
                        }
                    }
                    health_tx.send_replace(health.clone());
                }
                received = event_rx.recv() => {
                    let Some(event) = received else {
                        error!("File notifications closed; archive changes will no longer be picked up");
                        health.last_error = Some("notification channel closed".to_string());
                        break;
                    };
                    match event {
                        Ok(evt) => {
                            if is_root_removal(&root, &evt) {
                                error!(
                                    "Archive directory {} disappeared; archive changes will no longer be picked up",
                                    root.display()
                                );
                                health.last_error = Some("archive directory removed".to_string());
                                break;
                            }
                            if evt.need_rescan() {
                                warn!("File notifications overflowed; resynchronizing {}", root.display());
                                run_resync(&lookup, &mut health).await;
                            }
                            for archive_event in archive_events(&evt, &extension) {
                                process_event(&lookup, archive_event, &mut health, &update_tx).await;
                            }
                        }
                        Err(err) if is_fatal(&err) => {
                            error!("File watcher failed; archive changes will no longer be picked up: {err}");
                            health.last_error = Some(err.to_string());
                            break;
                        }
                        Err(err) => warn!("Watcher error: {err}"),
                    }
                    health_tx.send_replace(health.clone());
                }
            }
        }

        health.running = false;
        health_tx.send_replace(health);
    })
}

async fn process_event(
    lookup: &Arc<DocLookup>,
    event: ArchiveEvent,
    health: &mut WatcherHealth,
    update_tx: &broadcast::Sender<ArchiveUpdate>,
) {
    let started = Instant::now();
    let task_lookup = Arc::clone(lookup);
    let task_event = event.clone();
    let outcome = tokio::task::spawn_blocking(move || task_lookup.apply_event(&task_event))
        .await
        .map_err(|e| IndexerError::Other(format!("archive task failed: {e}")))
        .and_then(|result| result);
    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = started.elapsed().as_millis() as u64;

    health.events_processed += 1;
    let update = match outcome {
        Ok(action) => {
            debug!("{event:?} -> {action:?} in {duration_ms}ms");
            health.consecutive_failures = 0;
            health.last_success = Some(SystemTime::now());
            ArchiveUpdate {
                completed_at: SystemTime::now(),
                duration_ms,
                event,
                action: Some(action),
                error: None,
            }
        }
        Err(err) => {
            let detail = err.to_string();
            error!(
                "Could not load archive {}; it is not available for lookups: {detail}",
                event.path().display()
            );
            health.consecutive_failures += 1;
            health.last_error = Some(detail.clone());
            push_alert(&mut health.alerts, event.path(), &detail);
            ArchiveUpdate {
                completed_at: SystemTime::now(),
                duration_ms,
                event,
                action: None,
                error: Some(detail),
            }
        }
    };
    let _ = update_tx.send(update);
}

async fn run_resync(lookup: &Arc<DocLookup>, health: &mut WatcherHealth) {
    let task_lookup = Arc::clone(lookup);
    match tokio::task::spawn_blocking(move || task_lookup.resync()).await {
        Ok(stats) => {
            health.resyncs += 1;
            info!(
                "Resynchronized archives: {} loaded, {} failed",
                stats.archives,
                stats.errors.len()
            );
        }
        Err(err) => warn!("Resync task failed: {err}"),
    }
}

/// Translate a notification into archive events, dropping files that are not archives.
///
/// Backends that report a rename as one event with both paths also report its two halves
/// separately, so only the halves are used.
fn archive_events(evt: &Event, extension: &str) -> Vec<ArchiveEvent> {
    let relevant = evt
        .paths
        .iter()
        .filter(|path| is_archive_path(path, extension))
        .cloned();

    match evt.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            relevant.map(ArchiveEvent::Created).collect()
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            relevant.map(ArchiveEvent::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => relevant
            .map(|path| {
                if path.exists() {
                    ArchiveEvent::Modified(path)
                } else {
                    ArchiveEvent::Removed(path)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) | EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            relevant.map(ArchiveEvent::Modified).collect()
        }
        _ => Vec::new(),
    }
}

fn is_root_removal(root: &Path, evt: &Event) -> bool {
    matches!(evt.kind, EventKind::Remove(_))
        && evt.paths.iter().any(|path| path == root)
}

fn is_fatal(err: &notify::Error) -> bool {
    matches!(
        err.kind,
        notify::ErrorKind::WatchNotFound | notify::ErrorKind::PathNotFound
    )
}

fn push_alert(log: &mut VecDeque<AlertRecord>, path: &Path, detail: &str) {
    log.push_back(AlertRecord {
        timestamp_unix_ms: current_unix_ms(),
        path: path.to_path_buf(),
        detail: detail.to_string(),
    });
    if log.len() > MAX_ALERTS {
        log.pop_front();
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .ok()
        .and_then(|dur| u64::try_from(dur.as_millis()).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{archive_events, is_root_removal, push_alert};
    use crate::lookup::ArchiveEvent;
    use notify::event::{
        AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind,
        RenameMode,
    };
    use notify::{Event, EventKind};
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |evt, path| evt.add_path(PathBuf::from(path)))
    }

    #[test]
    fn create_delete_modify_map_to_add_remove_reload() {
        let created = event(EventKind::Create(CreateKind::File), &["/docs/a.zip"]);
        assert_eq!(
            archive_events(&created, "zip"),
            vec![ArchiveEvent::Created(PathBuf::from("/docs/a.zip"))]
        );

        let removed = event(EventKind::Remove(RemoveKind::File), &["/docs/a.zip"]);
        assert_eq!(
            archive_events(&removed, "zip"),
            vec![ArchiveEvent::Removed(PathBuf::from("/docs/a.zip"))]
        );

        let written = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/docs/a.zip"],
        );
        assert_eq!(
            archive_events(&written, "zip"),
            vec![ArchiveEvent::Modified(PathBuf::from("/docs/a.zip"))]
        );

        let closed = event(
            EventKind::Access(AccessKind::Close(AccessMode::Write)),
            &["/docs/a.zip"],
        );
        assert_eq!(
            archive_events(&closed, "zip"),
            vec![ArchiveEvent::Modified(PathBuf::from("/docs/a.zip"))]
        );
    }

    #[test]
    fn renames_use_their_halves() {
        let from = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/docs/old.zip"],
        );
        let to = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/docs/new.zip"],
        );
        let both = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/docs/old.zip", "/docs/new.zip"],
        );

        assert_eq!(
            archive_events(&from, "zip"),
            vec![ArchiveEvent::Removed(PathBuf::from("/docs/old.zip"))]
        );
        assert_eq!(
            archive_events(&to, "zip"),
            vec![ArchiveEvent::Created(PathBuf::from("/docs/new.zip"))]
        );
        assert!(archive_events(&both, "zip").is_empty());
    }

    #[test]
    fn non_archives_and_metadata_changes_are_dropped() {
        let text = event(EventKind::Create(CreateKind::File), &["/docs/readme.txt"]);
        assert!(archive_events(&text, "zip").is_empty());

        let staged = event(
            EventKind::Create(CreateKind::File),
            &["/docs/.a.zip.partial"],
        );
        assert!(archive_events(&staged, "zip").is_empty());

        let touched = event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)),
            &["/docs/a.zip"],
        );
        assert!(archive_events(&touched, "zip").is_empty());
    }

    #[test]
    fn root_removal_is_detected() {
        let root = Path::new("/docs");
        let gone = event(EventKind::Remove(RemoveKind::Folder), &["/docs"]);
        assert!(is_root_removal(root, &gone));

        let file_gone = event(EventKind::Remove(RemoveKind::File), &["/docs/a.zip"]);
        assert!(!is_root_removal(root, &file_gone));
    }

    #[test]
    fn alert_log_is_bounded() {
        let mut log = VecDeque::new();
        for idx in 0..25 {
            push_alert(&mut log, Path::new("/docs/a.zip"), &format!("failure {idx}"));
        }
        assert_eq!(log.len(), super::MAX_ALERTS);
        assert_eq!(
            log.front().map(|alert| alert.detail.as_str()),
            Some("failure 5")
        );
    }
}
