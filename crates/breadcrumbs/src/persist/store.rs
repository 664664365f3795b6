use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::errors::BreadcrumbResult;
use crate::observers::BreadcrumbObserver;
use crate::persist::reader::load_previous_events;

/// Mirrors the most recent breadcrumbs into a plain text file, one event per
/// line, so the next process can restore them.
///
/// Register it as an observer on the log and call [`PersistentStore::flush`]
/// at a convenient point; observer callbacks never touch the disk.
pub struct PersistentStore {
    path: PathBuf,
    max_lines: usize,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    lines: VecDeque<String>,
    dirty: bool,
}

impl PersistentStore {
    /// Opens the store, seeding it with whatever the file already holds.
    pub fn open(path: impl Into<PathBuf>, max_lines: usize) -> BreadcrumbResult<Arc<Self>> {
        let path = path.into();
        let lines = load_previous_events(&path, max_lines)?;
        debug!(path = %path.display(), restored = lines.len(), "opened breadcrumb store");
        Ok(Arc::new(Self {
            path,
            max_lines,
            state: Mutex::new(StoreState {
                lines: lines.into(),
                dirty: false,
            }),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> Vec<String> {
        self.state.lock().lines.iter().cloned().collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Writes pending lines through a temp file and rename. No-op when clean.
    pub fn flush(&self) -> BreadcrumbResult<()> {
        let mut state = self.state.lock();
        if !state.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for line in &state.lines {
                writeln!(writer, "{line}")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        state.dirty = false;
        debug!(path = %self.path.display(), lines = state.lines.len(), "flushed breadcrumbs");
        Ok(())
    }
}

impl BreadcrumbObserver for PersistentStore {
    fn event_added(&self, event: &str) {
        let mut state = self.state.lock();
        state.lines.push_back(event.to_string());
        while state.lines.len() > self.max_lines {
            state.lines.pop_front();
        }
        state.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreadcrumbPolicyView;
    use crate::BreadcrumbLog;

    #[test]
    fn flush_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("breadcrumbs.log");

        let store = PersistentStore::open(&path, 2).unwrap();
        let mut log = BreadcrumbLog::new(BreadcrumbPolicyView::default());
        let id = log.add_observer(store.clone());
        log.add_event("one").unwrap();
        log.add_event("two").unwrap();
        log.add_event("three").unwrap();
        log.remove_observer(id);

        assert!(store.is_dirty());
        store.flush().unwrap();
        assert!(!store.is_dirty());

        let reopened = PersistentStore::open(&path, 10).unwrap();
        let lines = reopened.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" two"));
        assert!(lines[1].ends_with(" three"));
    }

    #[test]
    fn clean_store_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breadcrumbs.log");
        let store = PersistentStore::open(&path, 5).unwrap();
        store.flush().unwrap();
        assert!(!path.exists());
    }
}
