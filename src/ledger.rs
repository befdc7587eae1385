//! # ledger
//!
//! [`TradeLedger`] — append-only audit file of executed trades, one
//! [`TradeLedgerEntry`] per line.
//!
//! Appends are serialised by an internal mutex and each one is a single
//! `write_all` of a complete line followed by `sync_data`, so a reader tailing
//! the file never sees half an entry and earlier lines are never rewritten.
//! Reads take no lock.

use std::path::{Path, PathBuf};

use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::models::TradeLedgerEntry;

pub struct TradeLedger {
    path:       PathBuf,
    write_lock: Mutex<()>,
}

impl TradeLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:       path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Durably append one entry; returns once the line is on disk.
    pub async fn append(&self, entry: &TradeLedgerEntry) -> EngineResult<()> {
        let mut line = entry.to_line();
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;

        debug!(path = %self.path.display(), line = line.trim_end(), "Ledger entry appended");
        Ok(())
    }

    /// The last `n` entries in chronological order.
    ///
    /// Empty (not an error) when the ledger has never been written or holds
    /// fewer than `n` entries.
    pub async fn tail(&self, n: usize) -> EngineResult<Vec<TradeLedgerEntry>> {
        let mut entries = self.read_entries().await?;

        if n == 0 || entries.len() < n {
            return Ok(Vec::new());
        }

        Ok(entries.split_off(entries.len() - n))
    }

    /// Well-formed entries currently on disk.
    pub async fn entry_count(&self) -> EngineResult<usize> {
        Ok(self.read_entries().await?.len())
    }

    async fn read_entries(&self) -> EngineResult<Vec<TradeLedgerEntry>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let parsed = TradeLedgerEntry::parse_line(line);
                if parsed.is_none() {
                    warn!(line, "Skipping malformed ledger line");
                }
                parsed
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) fn temp_ledger_path() -> PathBuf {
    std::env::temp_dir().join(format!("autotrader-ledger-{}.log", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Side, TradeReason};
    use rust_decimal::Decimal;

    fn entry(i: i64) -> TradeLedgerEntry {
        let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
        TradeLedgerEntry::new(side, "TSLA", Decimal::new(25_000 + i, 2), TradeReason::ManualTrade)
    }

    #[tokio::test]
    async fn tail_of_missing_ledger_is_empty() {
        let ledger = TradeLedger::new(temp_ledger_path());
        assert!(ledger.tail(10).await.unwrap().is_empty());
        assert_eq!(ledger.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn tail_returns_last_n_in_append_order() {
        let ledger = TradeLedger::new(temp_ledger_path());
        for i in 0..12 {
            ledger.append(&entry(i)).await.unwrap();
        }

        let tail = ledger.tail(10).await.unwrap();
        assert_eq!(tail.len(), 10);
        let prices: Vec<_> = tail.iter().map(|e| e.price).collect();
        let expected: Vec<_> = (2..12).map(|i| Decimal::new(25_000 + i, 2)).collect();
        assert_eq!(prices, expected);

        let _ = std::fs::remove_file(ledger.path());
    }

    #[tokio::test]
    async fn tail_with_fewer_entries_than_requested_is_empty() {
        let ledger = TradeLedger::new(temp_ledger_path());
        for i in 0..3 {
            ledger.append(&entry(i)).await.unwrap();
        }

        assert!(ledger.tail(10).await.unwrap().is_empty());
        assert_eq!(ledger.tail(3).await.unwrap().len(), 3);
        assert_eq!(ledger.entry_count().await.unwrap(), 3);

        let _ = std::fs::remove_file(ledger.path());
    }

    #[tokio::test]
    async fn append_never_rewrites_earlier_lines() {
        let ledger = TradeLedger::new(temp_ledger_path());
        ledger.append(&entry(0)).await.unwrap();
        let first = std::fs::read_to_string(ledger.path()).unwrap();

        ledger.append(&entry(1)).await.unwrap();
        let both = std::fs::read_to_string(ledger.path()).unwrap();

        assert!(both.starts_with(&first));
        assert_eq!(both.lines().count(), 2);
        assert!(both.ends_with('\n'));

        let _ = std::fs::remove_file(ledger.path());
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let path = temp_ledger_path();
        let good = entry(4).to_line();
        std::fs::write(&path, format!("garbage\n{good}\n\n")).unwrap();

        let ledger = TradeLedger::new(&path);
        let tail = ledger.tail(1).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].to_line(), good);

        let _ = std::fs::remove_file(path);
    }
}
