//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Watch the config file for changes (inotify/kqueue via `notify`)
//! - Surface modifications and removal as a simple event stream
//!
//! # Design Decisions
//! - Notifier errors are logged and watching continues
//! - Removal of the config file ends the stream; the proxy keeps serving
//!   with the last good config, reload capability is lost until restart

use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A change observed on the watched config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Modified,
    Removed,
}

/// Streams change events for a single config file.
///
/// The underlying notifier runs on its own thread; events are bridged onto
/// an unbounded channel so the consumer can `await` them.
pub struct ConfigWatcher {
    rx: mpsc::UnboundedReceiver<Result<Event, notify::Error>>,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            let _ = tx.send(res);
        })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;

        Ok(Self {
            rx,
            _watcher: watcher,
        })
    }

    /// The next relevant event, or `None` when the notifier channel closes.
    pub async fn changed(&mut self) -> Option<WatchEvent> {
        while let Some(res) = self.rx.recv().await {
            match res {
                Ok(event) => match event.kind {
                    EventKind::Modify(_) => return Some(WatchEvent::Modified),
                    EventKind::Remove(_) => return Some(WatchEvent::Removed),
                    _ => continue,
                },
                Err(err) => {
                    tracing::error!(error = %err, "config watch error");
                    continue;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn reports_modification_and_removal() {
        let path = std::env::temp_dir().join("steer-watcher-test.toml");
        std::fs::write(&path, "ports = [1]").unwrap();

        let mut watcher = ConfigWatcher::new(&path).unwrap();

        std::fs::write(&path, "ports = [2]").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), watcher.changed())
            .await
            .expect("no event for modification");
        assert_eq!(event, Some(WatchEvent::Modified));

        std::fs::remove_file(&path).unwrap();
        // the notifier may emit trailing Modify events before the removal
        let removed = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(event) = watcher.changed().await {
                if event == WatchEvent::Removed {
                    return true;
                }
            }
            false
        })
        .await
        .expect("no event for removal");
        assert!(removed);
    }
}
