use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tokio::{io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    schedule::{DAYS_IN_PLAN, Day},
};

/// How far the reader has got through the plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// The last completed day, 0 when nothing has been read yet
    #[serde(rename = "lastReadDay")]
    pub last_completed_day: u16,
}

/// Where a single day stands relative to the current progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayViewState {
    pub day: Day,
    pub is_completed: bool,
    pub is_today: bool,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot mark day {requested} done, expected day {expected}")]
pub struct Rejected {
    pub requested: Day,
    /// The only day that can be marked done next, 366 once the plan is finished
    pub expected: u16,
}

impl ProgressRecord {
    pub fn new(last_completed_day: u16) -> Option<Self> {
        (last_completed_day <= DAYS_IN_PLAN).then_some(Self { last_completed_day })
    }

    /// The day to read next, `None` once every day is done.
    pub fn today(&self) -> Option<Day> {
        Day::new(self.last_completed_day + 1)
    }

    pub fn day_view(&self, day: Day) -> DayViewState {
        let n = day.get();
        DayViewState {
            day,
            is_completed: n <= self.last_completed_day,
            is_today: n == self.last_completed_day + 1,
            is_locked: n > self.last_completed_day + 1,
        }
    }

    pub fn day_views(&self) -> impl Iterator<Item = DayViewState> + '_ {
        Day::all().map(|day| self.day_view(day))
    }

    /// Completed share of the plan in percent, rounded to two decimals.
    pub fn percentage(&self) -> f64 {
        let ratio = f64::from(self.last_completed_day) / f64::from(DAYS_IN_PLAN) * 100.0;
        (ratio * 100.0).round() / 100.0
    }

    /// Mark `requested` done. Only the exact successor of the last completed
    /// day is accepted; anything else leaves the record as it is.
    pub fn advance(&self, requested: Day) -> Result<ProgressRecord, Rejected> {
        let expected = self.last_completed_day + 1;
        if requested.get() != expected {
            return Err(Rejected {
                requested,
                expected,
            });
        }
        Ok(ProgressRecord {
            last_completed_day: expected,
        })
    }
}

/// Result of a mark-done request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Accepted(ProgressRecord),
    Rejected(Rejected),
}

/// Persists the progress document and serializes every read-modify-write cycle.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ProgressStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record. A missing document is the first run and starts at day 0.
    pub async fn load(&self) -> Result<ProgressRecord, Error> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "no progress at {}, starting from day 0",
                    self.path.display()
                );
                return Ok(ProgressRecord::default());
            }
            Err(e) => {
                return Err(Error::progress(
                    anyhow::Error::new(e).context(format!("read {}", self.path.display())),
                ));
            }
        };
        parse_record(&content)
            .with_context(|| format!("parse {}", self.path.display()))
            .map_err(Error::progress)
    }

    /// Replace the document. The new content is synced to disk before it is
    /// renamed over the old one. Only called with `lock` held.
    async fn save(&self, record: &ProgressRecord) -> Result<(), Error> {
        self.write(record)
            .await
            .with_context(|| format!("write {}", self.path.display()))
            .map_err(Error::progress)
    }

    async fn write(&self, record: &ProgressRecord) -> anyhow::Result<()> {
        let content = serde_json::to_vec(record)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Err(e) = write_synced(&tmp, &content).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!("failed to remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("saved progress {:?}", record);
        Ok(())
    }

    /// Load, advance and save as one unit with respect to other callers.
    pub async fn mark_done(&self, day: Day) -> Result<Advance, Error> {
        let _guard = self.lock.lock().await;
        let current = self.load().await?;
        match current.advance(day) {
            Ok(next) => {
                self.save(&next).await?;
                info!("day {} marked done", day);
                Ok(Advance::Accepted(next))
            }
            Err(rejected) => {
                info!("ignored mark done: {}", rejected);
                Ok(Advance::Rejected(rejected))
            }
        }
    }
}

async fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(content).await?;
    file.sync_all().await
}

fn parse_record(content: &str) -> anyhow::Result<ProgressRecord> {
    let record: ProgressRecord = serde_json::from_str(content)?;
    if record.last_completed_day > DAYS_IN_PLAN {
        bail!(
            "lastReadDay {} is beyond the last day {}",
            record.last_completed_day,
            DAYS_IN_PLAN
        );
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn day(n: u16) -> Day {
        Day::new(n).unwrap()
    }

    #[test]
    fn day_view_matches_progress() {
        let record = ProgressRecord::new(10).unwrap();
        for view in record.day_views() {
            let n = view.day.get();
            assert_eq!(view.is_completed, n <= 10);
            assert_eq!(view.is_today, n == 11);
            assert_eq!(view.is_locked, n > 11);
        }
        assert_eq!(record.today(), Some(day(11)));
        assert_eq!(ProgressRecord::new(365).unwrap().today(), None);
        assert!(ProgressRecord::new(366).is_none());
    }

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(ProgressRecord::new(0).unwrap().percentage(), 0.0);
        assert_eq!(ProgressRecord::new(1).unwrap().percentage(), 0.27);
        assert_eq!(ProgressRecord::new(100).unwrap().percentage(), 27.4);
        assert_eq!(ProgressRecord::new(365).unwrap().percentage(), 100.0);
    }

    #[test]
    fn advance_only_accepts_successor() {
        let record = ProgressRecord::new(4).unwrap();
        assert_eq!(record.advance(day(5)).unwrap().last_completed_day, 5);
        let err = record.advance(day(4)).unwrap_err();
        assert_eq!(err.expected, 5);
        assert!(record.advance(day(6)).is_err());
        assert!(record.advance(day(1)).is_err());
        assert!(ProgressRecord::new(365).unwrap().advance(day(365)).is_err());
    }

    #[test]
    fn document_uses_last_read_day() {
        let record: ProgressRecord = serde_json::from_str(r#"{"lastReadDay": 7}"#).unwrap();
        assert_eq!(record.last_completed_day, 7);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"lastReadDay":7}"#
        );
        assert!(parse_record(r#"{"lastReadDay": 400}"#).is_err());
        assert!(parse_record(r#"{"lastReadDay": -1}"#).is_err());
    }

    #[tokio::test]
    async fn missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));
        assert_eq!(store.load().await.unwrap(), ProgressRecord::default());
    }

    #[tokio::test]
    async fn corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "lastReadDay = 3").unwrap();
        let store = ProgressStore::new(&path);
        assert!(matches!(
            store.load().await,
            Err(Error::StoreUnavailable { .. })
        ));
        assert!(matches!(
            store.mark_done(day(1)).await,
            Err(Error::StoreUnavailable { .. })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "lastReadDay = 3");
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let store = ProgressStore::new(&path);
        let record = ProgressRecord::new(123).unwrap();
        store.save(&record).await.unwrap();
        assert_eq!(store.load().await.unwrap(), record);
        assert!(!dir.path().join("progress.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_keeps_old_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, r#"{"lastReadDay": 3}"#).unwrap();
        // a directory in the temp file's place makes the write fail
        std::fs::create_dir(dir.path().join("progress.json.tmp")).unwrap();
        let store = ProgressStore::new(&path);
        assert!(matches!(
            store.mark_done(day(4)).await,
            Err(Error::StoreUnavailable { .. })
        ));
        assert_eq!(store.load().await.unwrap().last_completed_day, 3);
    }

    #[tokio::test]
    async fn mark_done_is_sequential_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("progress.json"));
        assert!(matches!(
            store.mark_done(day(1)).await.unwrap(),
            Advance::Accepted(r) if r.last_completed_day == 1
        ));
        assert!(matches!(
            store.mark_done(day(1)).await.unwrap(),
            Advance::Rejected(_)
        ));
        assert!(matches!(
            store.mark_done(day(3)).await.unwrap(),
            Advance::Rejected(_)
        ));
        assert_eq!(store.load().await.unwrap().last_completed_day, 1);
        assert!(matches!(
            store.mark_done(day(2)).await.unwrap(),
            Advance::Accepted(r) if r.last_completed_day == 2
        ));
        assert_eq!(store.load().await.unwrap().last_completed_day, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mark_done_advances_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ProgressStore::new(dir.path().join("progress.json")));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.mark_done(day(1)).await }));
        }
        let mut accepted = 0;
        for handle in handles {
            if let Advance::Accepted(_) = handle.await.unwrap().unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.load().await.unwrap().last_completed_day, 1);
    }
}
