//! Audit Journal
//!
//! Append-only record of every admission decision. Entries sharing a
//! correlation id belong to the same request: a `SignalReceived` is always
//! followed by exactly one outcome under the same id.
//!
//! Two sinks: [`InMemoryJournal`] keeps a bounded window, [`FileJournal`]
//! appends JSON lines to disk and survives restarts.

use crate::error::JournalError;
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tollgate_core::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalEvent {
    SignalReceived,
    SignalRejected,
    OrderAccepted,
    OrderCancelled,
    OrderReplaced,
    KillSwitchActivated,
    KillSwitchCleared,
}

impl fmt::Display for JournalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JournalEvent::SignalReceived => "SIGNAL_RECEIVED",
            JournalEvent::SignalRejected => "SIGNAL_REJECTED",
            JournalEvent::OrderAccepted => "ORDER_ACCEPTED",
            JournalEvent::OrderCancelled => "ORDER_CANCELLED",
            JournalEvent::OrderReplaced => "ORDER_REPLACED",
            JournalEvent::KillSwitchActivated => "KILL_SWITCH_ACTIVATED",
            JournalEvent::KillSwitchCleared => "KILL_SWITCH_CLEARED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Assigned by the journal on append, strictly increasing
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: JournalEvent,
    pub correlation_id: String,
    /// Orders this entry concerns (a replace names both)
    pub order_ids: Vec<OrderId>,
    pub strategy_id: Option<String>,
    pub symbol: Option<String>,
    pub detail: String,
}

impl JournalEntry {
    pub fn new(event: JournalEvent, correlation_id: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            timestamp: Utc::now(),
            event,
            correlation_id: correlation_id.into(),
            order_ids: Vec::new(),
            strategy_id: None,
            symbol: None,
            detail: String::new(),
        }
    }

    /// Builder: Attach an order id
    pub fn with_order(mut self, order_id: OrderId) -> Self {
        self.order_ids.push(order_id);
        self
    }

    /// Builder: Attach strategy and symbol
    pub fn with_route(mut self, strategy_id: &str, symbol: &str) -> Self {
        self.strategy_id = Some(strategy_id.to_string());
        self.symbol = Some(symbol.to_string());
        self
    }

    /// Builder: Set free-form detail
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn concerns(&self, order_id: &OrderId) -> bool {
        self.order_ids.contains(order_id)
    }
}

/// Audit sink
///
/// Implementations must not block for long: `record` is called while
/// admission locks are held.
pub trait Journal: Send + Sync {
    /// Append an entry, returning its sequence number
    fn record(&self, entry: JournalEntry) -> u64;

    /// Entries in `[from, to]`, optionally filtered by event
    fn history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event: Option<JournalEvent>,
    ) -> Vec<JournalEntry>;

    /// Every entry naming the order, oldest first
    fn order_history(&self, order_id: &OrderId) -> Vec<JournalEntry>;

    /// Everything still retained, oldest first
    fn entries(&self) -> Vec<JournalEntry>;
}

/// Bounded in-memory journal; the oldest entries are evicted first
pub struct InMemoryJournal {
    capacity: usize,
    next_sequence: AtomicU64,
    entries: Mutex<VecDeque<JournalEntry>>,
}

impl InMemoryJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_sequence: AtomicU64::new(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn select(&self, keep: impl Fn(&JournalEntry) -> bool) -> Vec<JournalEntry> {
        let entries = self.entries.lock();
        entries.iter().filter(|e| keep(e)).cloned().collect()
    }
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl Journal for InMemoryJournal {
    fn record(&self, mut entry: JournalEntry) -> u64 {
        let mut entries = self.entries.lock();
        // Sequence is taken under the lock so the deque stays ordered
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        entry.sequence = sequence;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        sequence
    }

    fn history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event: Option<JournalEvent>,
    ) -> Vec<JournalEntry> {
        self.select(|e| {
            e.timestamp >= from && e.timestamp <= to && event.is_none_or(|ev| ev == e.event)
        })
    }

    fn order_history(&self, order_id: &OrderId) -> Vec<JournalEntry> {
        self.select(|e| e.concerns(order_id))
    }

    fn entries(&self) -> Vec<JournalEntry> {
        self.select(|_| true)
    }
}

/// Append-only JSON-lines journal on disk
///
/// Each entry is written as one line and flushed before `record` returns.
/// Reopening an existing file continues its sequence. Queries read the file
/// back, skipping lines that do not parse.
pub struct FileJournal {
    path: PathBuf,
    writer: Mutex<FileWriter>,
}

struct FileWriter {
    out: BufWriter<File>,
    next_sequence: u64,
}

impl FileJournal {
    /// Create or open the journal file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| JournalError::io(&path, e))?;
        let last_sequence = read_entries(&path)?
            .iter()
            .map(|e| e.sequence)
            .max()
            .unwrap_or(0);

        info!(
            "[JOURNAL] Opened {} (last sequence {})",
            path.display(),
            last_sequence
        );
        Ok(Self {
            path,
            writer: Mutex::new(FileWriter {
                out: BufWriter::new(file),
                next_sequence: last_sequence + 1,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry on disk, oldest first
    pub fn replay(&self) -> Result<Vec<JournalEntry>, JournalError> {
        // Held so a concurrent append is never read half-written
        let _writer = self.writer.lock();
        read_entries(&self.path)
    }

    fn select(&self, keep: impl Fn(&JournalEntry) -> bool) -> Vec<JournalEntry> {
        match self.replay() {
            Ok(entries) => entries.into_iter().filter(|e| keep(e)).collect(),
            Err(e) => {
                error!("[JOURNAL] Read failed: {}", e);
                Vec::new()
            }
        }
    }
}

impl Journal for FileJournal {
    fn record(&self, mut entry: JournalEntry) -> u64 {
        let mut writer = self.writer.lock();
        let sequence = writer.next_sequence;
        writer.next_sequence += 1;
        entry.sequence = sequence;

        if let Err(e) = append_line(&mut writer.out, &entry) {
            error!(
                "[JOURNAL] Failed to append entry {} to {}: {}",
                sequence,
                self.path.display(),
                e
            );
        }
        sequence
    }

    fn history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        event: Option<JournalEvent>,
    ) -> Vec<JournalEntry> {
        self.select(|e| {
            e.timestamp >= from && e.timestamp <= to && event.is_none_or(|ev| ev == e.event)
        })
    }

    fn order_history(&self, order_id: &OrderId) -> Vec<JournalEntry> {
        self.select(|e| e.concerns(order_id))
    }

    fn entries(&self) -> Vec<JournalEntry> {
        self.select(|_| true)
    }
}

fn append_line(out: &mut BufWriter<File>, entry: &JournalEntry) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, entry)?;
    out.write_all(b"\n")?;
    out.flush()
}

fn read_entries(path: &Path) -> Result<Vec<JournalEntry>, JournalError> {
    let file = File::open(path).map_err(|e| JournalError::io(path, e))?;
    let mut entries = Vec::new();

    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| JournalError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(
                "[JOURNAL] Skipping corrupt line {} of {}: {}",
                line_num + 1,
                path.display(),
                e
            ),
        }
    }
    Ok(entries)
}

/// Render entries as JSON lines, one object per line
pub fn to_json_lines(entries: &[JournalEntry]) -> serde_json::Result<String> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&serde_json::to_string(entry)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_sequence_increases() {
        let journal = InMemoryJournal::new(10);
        let a = journal.record(JournalEntry::new(JournalEvent::SignalReceived, "c1"));
        let b = journal.record(JournalEntry::new(JournalEvent::OrderAccepted, "c1"));

        assert!(b > a);
        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, a);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let journal = InMemoryJournal::new(2);
        for i in 0..3 {
            journal.record(JournalEntry::new(JournalEvent::SignalReceived, format!("c{}", i)));
        }

        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].correlation_id, "c1");
        assert_eq!(entries[1].correlation_id, "c2");
    }

    #[test]
    fn test_history_filters() {
        let journal = InMemoryJournal::default();
        let order_id = OrderId::new();
        journal.record(JournalEntry::new(JournalEvent::SignalReceived, "c1"));
        journal.record(JournalEntry::new(JournalEvent::OrderAccepted, "c1").with_order(order_id));
        journal.record(JournalEntry::new(JournalEvent::OrderCancelled, "c2").with_order(order_id));

        let now = Utc::now();
        let from = now - Duration::minutes(1);
        let to = now + Duration::minutes(1);

        assert_eq!(journal.history(from, to, None).len(), 3);
        assert_eq!(
            journal
                .history(from, to, Some(JournalEvent::OrderCancelled))
                .len(),
            1
        );
        assert!(journal.history(to, to, None).is_empty());
        assert_eq!(journal.order_history(&order_id).len(), 2);
    }

    fn temp_journal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("tollgate_journal_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("{}_{}.jsonl", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_journal_survives_reopen() {
        let path = temp_journal_path("reopen");
        let order_id = OrderId::new();

        {
            let journal = FileJournal::open(&path).unwrap();
            journal.record(JournalEntry::new(JournalEvent::SignalReceived, "c1"));
            journal.record(
                JournalEntry::new(JournalEvent::OrderAccepted, "c1")
                    .with_order(order_id)
                    .with_route("sma", "AAPL"),
            );
        }

        let journal = FileJournal::open(&path).unwrap();
        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].event, JournalEvent::OrderAccepted);
        assert_eq!(entries[1].symbol.as_deref(), Some("AAPL"));
        assert_eq!(journal.order_history(&order_id).len(), 1);

        // Sequence carries on from the file
        let next = journal.record(JournalEntry::new(JournalEvent::OrderCancelled, "c2"));
        assert_eq!(next, entries[1].sequence + 1);
        assert_eq!(journal.replay().unwrap().len(), 3);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_journal_skips_corrupt_lines() {
        let path = temp_journal_path("corrupt");
        {
            let journal = FileJournal::open(&path).unwrap();
            journal.record(JournalEntry::new(JournalEvent::SignalReceived, "c1"));
        }
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{not json}}").unwrap();
        }

        let journal = FileJournal::open(&path).unwrap();
        journal.record(JournalEntry::new(JournalEvent::SignalRejected, "c1"));

        let entries = journal.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[1].sequence, 2);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_journal_bad_path() {
        let err = FileJournal::open("/nonexistent/dir/journal.jsonl").err();
        assert!(matches!(err, Some(JournalError::Io { .. })));
    }

    #[test]
    fn test_json_lines() {
        let journal = InMemoryJournal::default();
        journal.record(
            JournalEntry::new(JournalEvent::SignalRejected, "c1")
                .with_route("sma", "AAPL")
                .with_detail("kill switch active"),
        );

        let text = to_json_lines(&journal.entries()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"SIGNAL_REJECTED\""));

        let parsed: JournalEntry = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed.symbol.as_deref(), Some("AAPL"));
    }
}
