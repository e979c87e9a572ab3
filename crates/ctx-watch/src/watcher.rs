//! One watcher per opened root: routes file-system events to the correct
//! package's [`Indexer`], debounced at 200ms per path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ctx_index::Indexer;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
enum RoutedEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Finds the deepest package whose root is a prefix of `path`; `None` if no
/// local package owns it, in which case the event is dropped.
fn route_to_package<'a>(packages: &'a [Arc<Indexer>], path: &Path) -> Option<&'a Arc<Indexer>> {
    packages
        .iter()
        .filter(|p| path.starts_with(p.root()))
        .max_by_key(|p| p.root().components().count())
}

fn relative_path(indexer: &Indexer, path: &Path) -> Option<String> {
    path.strip_prefix(indexer.root())
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
}

/// Watches `root`'s subtree and dispatches debounced changes to the owning
/// indexer among `packages`. Held alive for the lifetime of the watch; drop
/// to stop watching.
pub struct RootWatcher {
    _inner: RecommendedWatcher,
    _dispatch_task: tokio::task::JoinHandle<()>,
}

impl RootWatcher {
    pub fn start(root: PathBuf, packages: Vec<Arc<Indexer>>) -> Result<Self, notify::Error> {
        let (raw_tx, mut raw_rx) = mpsc::channel::<RoutedEvent>(1024);

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let Ok(event) = res else { return };
            for routed in route_event(&event) {
                let _ = raw_tx.blocking_send(routed);
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        let dispatch_task = tokio::spawn(async move {
            // One debounce deadline per path: the last event for a path within
            // the window wins, matching the "last state wins" coalescing rule.
            let pending: Arc<Mutex<HashMap<PathBuf, (RoutedEvent, Instant)>>> =
                Arc::new(Mutex::new(HashMap::new()));

            loop {
                tokio::select! {
                    event = raw_rx.recv() => {
                        let Some(event) = event else { break };
                        let path = match &event {
                            RoutedEvent::Changed(p) | RoutedEvent::Removed(p) => p.clone(),
                        };
                        pending.lock().unwrap().insert(path, (event, Instant::now()));
                    }
                    _ = tokio::time::sleep(DEBOUNCE_WINDOW) => {
                        let ready: Vec<(PathBuf, RoutedEvent)> = {
                            let mut guard = pending.lock().unwrap();
                            let now = Instant::now();
                            let ready_paths: Vec<PathBuf> = guard
                                .iter()
                                .filter(|(_, (_, at))| now.duration_since(*at) >= DEBOUNCE_WINDOW)
                                .map(|(p, _)| p.clone())
                                .collect();
                            ready_paths
                                .into_iter()
                                .filter_map(|p| guard.remove(&p).map(|(e, _)| (p, e)))
                                .collect()
                        };
                        for (path, event) in ready {
                            dispatch(&packages, &path, event);
                        }
                    }
                }
            }
        });

        Ok(RootWatcher {
            _inner: watcher,
            _dispatch_task: dispatch_task,
        })
    }
}

/// Turns one raw `notify::Event` into zero or more routed events. A rename
/// delivers both paths in one event (`[old, new]`); this is treated as
/// `delete(old) + create(new)` per §4.I rather than two ambiguous `Changed`
/// events.
fn route_event(event: &Event) -> Vec<RoutedEvent> {
    if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind {
        if let [old, new] = event.paths.as_slice() {
            return vec![
                RoutedEvent::Removed(old.clone()),
                RoutedEvent::Changed(new.clone()),
            ];
        }
    }
    event
        .paths
        .iter()
        .filter_map(|path| match event.kind {
            EventKind::Remove(_) => Some(RoutedEvent::Removed(path.clone())),
            EventKind::Create(_) | EventKind::Modify(_) => Some(RoutedEvent::Changed(path.clone())),
            _ => None,
        })
        .collect()
}

fn dispatch(packages: &[Arc<Indexer>], path: &Path, event: RoutedEvent) {
    let Some(indexer) = route_to_package(packages, path) else {
        return;
    };
    let Some(relative) = relative_path(indexer, path) else {
        return;
    };
    match event {
        RoutedEvent::Changed(_) => indexer.update_file(&relative),
        RoutedEvent::Removed(_) => indexer.remove_file(&relative),
    }
}
