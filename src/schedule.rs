use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// Number of days in one cycle of the plan.
pub const DAYS_IN_PLAN: u16 = 365;

/// A day of the plan, always within `1..=365`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Day(u16);

impl Day {
    pub const FIRST: Day = Day(1);
    pub const LAST: Day = Day(DAYS_IN_PLAN);

    pub fn new(n: u16) -> Option<Self> {
        (1..=DAYS_IN_PLAN).contains(&n).then_some(Day(n))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn prev(self) -> Option<Day> {
        Day::new(self.0 - 1)
    }

    pub fn next(self) -> Option<Day> {
        Day::new(self.0 + 1)
    }

    /// Every day of the plan in order.
    pub fn all() -> impl Iterator<Item = Day> {
        (1..=DAYS_IN_PLAN).map(Day)
    }
}

impl FromStr for Day {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // u16::from_str also takes a leading '+'
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidDay);
        }
        s.parse::<u16>()
            .ok()
            .and_then(Day::new)
            .ok_or(Error::InvalidDay)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Chapter identifier, either a plain number or free text such as "1-2".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Chapter {
    Number(u32),
    Text(String),
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chapter::Number(n) => n.fmt(f),
            Chapter::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub book: String,
    pub chapter: Chapter,
    /// Supplementary media, usually a video URL
    #[serde(rename = "video", default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

/// The full reading schedule, one entry for every day of the plan.
#[derive(Debug, Clone)]
pub struct Schedule {
    entries: BTreeMap<Day, ScheduleEntry>,
}

impl Schedule {
    /// Build a schedule from the raw document, keyed by stringified day number.
    pub fn from_document(raw: BTreeMap<String, ScheduleEntry>) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        for (key, entry) in raw {
            let day = key
                .trim()
                .parse::<Day>()
                .map_err(|_| anyhow!("invalid day key {key:?}"))?;
            if entries.insert(day, entry).is_some() {
                bail!("duplicate entry for day {day}");
            }
        }
        if let Some(missing) = Day::all().find(|day| !entries.contains_key(day)) {
            bail!("no entry for day {missing}");
        }
        Ok(Self { entries })
    }

    pub fn get(&self, day: Day) -> Option<&ScheduleEntry> {
        self.entries.get(&day)
    }
}

/// Read-only access to the schedule document.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    path: PathBuf,
}

impl ScheduleStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the whole schedule.
    pub async fn load(&self) -> Result<Schedule, Error> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))
            .map_err(Error::schedule)?;
        let raw: BTreeMap<String, ScheduleEntry> = serde_json::from_str(&content)
            .with_context(|| format!("parse {}", self.path.display()))
            .map_err(Error::schedule)?;
        let schedule = Schedule::from_document(raw)
            .with_context(|| format!("validate {}", self.path.display()))
            .map_err(Error::schedule)?;
        debug!("loaded schedule from {}", self.path.display());
        Ok(schedule)
    }

    /// Look up a single day.
    pub async fn get(&self, day: Day) -> Result<ScheduleEntry, Error> {
        let schedule = self.load().await?;
        schedule.get(day).cloned().ok_or(Error::InvalidDay)
    }
}
