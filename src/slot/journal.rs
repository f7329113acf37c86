//! Durable claim journal
//!
//! A namespace backed by an append-only log. Every successful claim or
//! release is written (and optionally fsynced) before the in-memory set
//! changes, so a failed write leaves the namespace exactly as it was.
//!
//! # Format
//!
//! ```text
//! ns_<namespace_id>.log:
//! [len u32 LE][JSON record][checksum u32 LE]   ← claim "alice"
//! [len u32 LE][JSON record][checksum u32 LE]   ← claim "bob"
//! [len u32 LE][JSON record][checksum u32 LE]   ← release "alice"
//! ```
//!
//! The checksum is the first four bytes of BLAKE2b-256 over the JSON bytes.
//! Recovery replays records in order and truncates the file at the first
//! torn or corrupt frame.

use super::address::{blake2b256, derive_address, DerivedAddress, NamespaceId};
use super::allocator::{self, Capability, SlotOccupancy};
use super::key::SlotKey;
use super::namespace::Namespace;
use crate::config::JournalSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

const LOG_PREFIX: &str = "ns_";
const LOG_EXTENSION: &str = "log";

/// Journaled operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalOp {
    Claim,
    Release,
}

/// One framed entry in the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalRecord {
    /// Monotonically increasing within one log generation
    pub sequence: u64,
    /// Milliseconds since epoch
    pub timestamp: i64,
    pub op: JournalOp,
    pub key: SlotKey,
}

fn checksum(data: &[u8]) -> u32 {
    let digest = blake2b256(data);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

impl JournalRecord {
    pub fn new(sequence: u64, op: JournalOp, key: SlotKey) -> Self {
        Self {
            sequence,
            timestamp: chrono::Utc::now().timestamp_millis(),
            op,
            key,
        }
    }

    /// Serialize to a framed byte string
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)
            .map_err(|e| Error::SerializationError(format!("Failed to serialize record: {}", e)))?;

        let mut result = Vec::with_capacity(json.len() + 8);
        result.extend_from_slice(&(json.len() as u32).to_le_bytes());
        result.extend_from_slice(&json);
        result.extend_from_slice(&checksum(&json).to_le_bytes());
        Ok(result)
    }

    /// Deserialize one framed record
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(Error::SerializationError("Record too short".to_string()));
        }

        let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if bytes.len() < len + 8 {
            return Err(Error::SerializationError(format!(
                "Incomplete record: expected {} bytes, got {}",
                len + 8,
                bytes.len()
            )));
        }

        let json = &bytes[4..4 + len];
        let stored = u32::from_le_bytes([
            bytes[4 + len],
            bytes[5 + len],
            bytes[6 + len],
            bytes[7 + len],
        ]);
        if stored != checksum(json) {
            return Err(Error::SerializationError("Checksum mismatch".to_string()));
        }

        serde_json::from_slice(json)
            .map_err(|e| Error::SerializationError(format!("Failed to deserialize record: {}", e)))
    }
}

/// A namespace whose claims survive restarts
pub struct ClaimJournal {
    log_path: PathBuf,
    namespace: Namespace,
    next_sequence: u64,
    /// End of the last frame known to be complete
    valid_len: u64,
    /// Records appended since the last compaction (or since open)
    records_written: usize,
    settings: JournalSettings,
}

impl ClaimJournal {
    /// Create or open the journal of `namespace_id` inside `dir`
    pub fn open<P: AsRef<Path>>(
        dir: P,
        namespace_id: NamespaceId,
        settings: &JournalSettings,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Storage(format!("Failed to create journal dir: {}", e)))?;

        let mut journal = Self {
            log_path: Self::log_path(dir, &namespace_id),
            namespace: Namespace::with_id(namespace_id),
            next_sequence: 0,
            valid_len: 0,
            records_written: 0,
            settings: settings.clone(),
        };

        journal.recover()?;
        Ok(journal)
    }

    /// Namespaces that have a journal in `dir`, sorted
    pub fn list<P: AsRef<Path>>(dir: P) -> Result<Vec<NamespaceId>> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Storage(format!("Failed to read journal dir: {}", e)))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::Storage(format!("Failed to read dir entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LOG_EXTENSION) {
                continue;
            }
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix(LOG_PREFIX))
                .and_then(|raw| NamespaceId::from_str(raw).ok());
            if let Some(id) = id {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn log_path(dir: &Path, namespace_id: &NamespaceId) -> PathBuf {
        dir.join(format!("{}{}.{}", LOG_PREFIX, namespace_id, LOG_EXTENSION))
    }

    /// Rebuild the claimed set from the log
    fn recover(&mut self) -> Result<()> {
        if !self.log_path.exists() {
            info!(namespace = %self.namespace.id(), "No journal found, starting fresh");
            return Ok(());
        }

        info!(path = ?self.log_path, "Recovering claims from journal");

        let file = File::open(&self.log_path)
            .map_err(|e| Error::Storage(format!("Failed to open journal: {}", e)))?;
        let file_len = file
            .metadata()
            .map_err(|e| Error::Storage(format!("Failed to stat journal: {}", e)))?
            .len();
        let mut reader = BufReader::new(file);

        let mut valid_len = 0u64;
        let mut max_sequence = None;
        let mut records = 0usize;

        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    warn!("Error reading record length: {}", e);
                    break;
                }
            }

            let len = u32::from_le_bytes(len_bytes) as usize;
            let mut frame = vec![0u8; len + 8];
            frame[0..4].copy_from_slice(&len_bytes);
            if let Err(e) = reader.read_exact(&mut frame[4..]) {
                warn!("Torn record at offset {}: {}", valid_len, e);
                break;
            }

            match JournalRecord::from_bytes(&frame) {
                Ok(record) => {
                    match record.op {
                        JournalOp::Claim => {
                            self.namespace.insert(record.key);
                        }
                        JournalOp::Release => {
                            self.namespace.remove(&record.key);
                        }
                    }
                    max_sequence = Some(max_sequence.map_or(record.sequence, |m: u64| {
                        m.max(record.sequence)
                    }));
                    valid_len += frame.len() as u64;
                    records += 1;
                }
                Err(e) => {
                    warn!("Corrupt record at offset {}: {}", valid_len, e);
                    break;
                }
            }
        }

        if valid_len < file_len {
            warn!(
                valid = valid_len,
                total = file_len,
                "Truncating journal after last valid record"
            );
            let file = OpenOptions::new()
                .write(true)
                .open(&self.log_path)
                .map_err(|e| Error::Storage(format!("Failed to open journal: {}", e)))?;
            Self::truncate(&file, valid_len)?;
        }

        self.next_sequence = max_sequence.map_or(0, |m| m + 1);
        self.valid_len = valid_len;

        info!(
            namespace = %self.namespace.id(),
            records,
            claimed = self.namespace.len(),
            next_sequence = self.next_sequence,
            "Journal recovery complete"
        );

        Ok(())
    }

    /// Append one record to the log.
    ///
    /// Bytes past the last complete frame are cut off first, and a failed
    /// write or sync is rolled back, so the log always ends on a frame
    /// boundary.
    fn append(&mut self, op: JournalOp, key: &SlotKey) -> Result<()> {
        let record = JournalRecord::new(self.next_sequence, op, key.clone());
        let bytes = record.to_bytes()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| Error::Storage(format!("Failed to open journal: {}", e)))?;

        let file_len = file
            .metadata()
            .map_err(|e| Error::Storage(format!("Failed to stat journal: {}", e)))?
            .len();
        if file_len > self.valid_len {
            warn!(
                valid = self.valid_len,
                total = file_len,
                "Discarding bytes after last complete record"
            );
            Self::truncate(&file, self.valid_len)?;
        } else if file_len < self.valid_len {
            warn!(
                expected = self.valid_len,
                total = file_len,
                "Journal shorter than expected"
            );
            self.valid_len = file_len;
        }

        let written = file
            .write_all(&bytes)
            .map_err(|e| Error::Storage(format!("Failed to write record: {}", e)))
            .and_then(|_| {
                if self.settings.sync_writes {
                    file.sync_all()
                        .map_err(|e| Error::Storage(format!("Failed to sync journal: {}", e)))
                } else {
                    Ok(())
                }
            });

        if let Err(e) = written {
            if let Err(rollback) = Self::truncate(&file, self.valid_len) {
                warn!("Failed to roll back journal write: {}", rollback);
            }
            return Err(e);
        }

        self.valid_len += bytes.len() as u64;
        self.next_sequence += 1;
        self.records_written += 1;
        debug!(sequence = record.sequence, op = ?op, key = %key, "Wrote journal record");
        Ok(())
    }

    fn truncate(file: &File, len: u64) -> Result<()> {
        file.set_len(len)
            .map_err(|e| Error::Storage(format!("Failed to truncate journal: {}", e)))?;
        file.sync_all()
            .map_err(|e| Error::Storage(format!("Failed to sync journal: {}", e)))
    }

    /// Compact once the configured record count is exceeded.
    ///
    /// The triggering operation already succeeded, so a failure here is
    /// logged and left for the next attempt.
    fn maybe_compact(&mut self) {
        let threshold = self.settings.compact_after;
        if threshold > 0 && self.records_written > threshold {
            if let Err(e) = self.compact() {
                warn!("Automatic journal compaction failed: {}", e);
            }
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn namespace_id(&self) -> NamespaceId {
        self.namespace.id()
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Records appended since open or the last compaction
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn derive_address(&self, key: impl Into<SlotKey>) -> DerivedAddress {
        derive_address(&self.namespace.id(), &key.into())
    }

    pub fn exists(&self, key: impl Into<SlotKey>) -> bool {
        allocator::exists(&self.namespace, key)
    }

    /// Journaled [`allocator::claim`]
    pub fn claim(&mut self, key: impl Into<SlotKey>) -> Result<Capability> {
        let key = key.into();
        if !self.namespace.contains(&key) {
            self.append(JournalOp::Claim, &key)?;
        }
        let capability = allocator::claim(&mut self.namespace, key)?;
        self.maybe_compact();
        Ok(capability)
    }

    /// Journaled [`allocator::release`]
    pub fn release(&mut self, key: impl Into<SlotKey>) -> Result<()> {
        let key = key.into();
        if self.namespace.contains(&key) {
            self.append(JournalOp::Release, &key)?;
        }
        allocator::release(&mut self.namespace, key)?;
        self.maybe_compact();
        Ok(())
    }

    /// Journaled [`allocator::release_verified`]
    pub fn release_verified<O>(&mut self, key: impl Into<SlotKey>, occupancy: &O) -> Result<()>
    where
        O: SlotOccupancy + ?Sized,
    {
        let key = key.into();
        if self.namespace.contains(&key) {
            let address = derive_address(&self.namespace.id(), &key);
            if !occupancy.is_occupied(&address) {
                self.append(JournalOp::Release, &key)?;
            }
        }
        allocator::release_verified(&mut self.namespace, key, occupancy)?;
        self.maybe_compact();
        Ok(())
    }

    /// Rewrite the log as one claim record per claimed key
    pub fn compact(&mut self) -> Result<()> {
        info!(
            namespace = %self.namespace.id(),
            claimed = self.namespace.len(),
            "Compacting journal"
        );

        let temp_path = self.log_path.with_extension("log.tmp");
        let (sequence, len) = match self.write_compacted(&temp_path) {
            Ok(written) => written,
            Err(e) => {
                std::fs::remove_file(&temp_path).ok();
                return Err(e);
            }
        };

        if let Err(e) = std::fs::rename(&temp_path, &self.log_path) {
            std::fs::remove_file(&temp_path).ok();
            return Err(Error::Storage(format!("Failed to rename journal: {}", e)));
        }
        self.sync_dir()?;

        self.next_sequence = sequence;
        self.valid_len = len;
        self.records_written = 0;

        info!("Journal compaction complete");
        Ok(())
    }

    /// Write the compacted log to `path`, returning (records, bytes)
    fn write_compacted(&self, path: &Path) -> Result<(u64, u64)> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::Storage(format!("Failed to create temp journal: {}", e)))?;

        let mut sequence = 0u64;
        let mut len = 0u64;
        for key in self.namespace.keys() {
            let bytes = JournalRecord::new(sequence, JournalOp::Claim, key.clone()).to_bytes()?;
            file.write_all(&bytes)
                .map_err(|e| Error::Storage(format!("Failed to write compacted journal: {}", e)))?;
            sequence += 1;
            len += bytes.len() as u64;
        }

        file.sync_all()
            .map_err(|e| Error::Storage(format!("Failed to sync compacted journal: {}", e)))?;
        Ok((sequence, len))
    }

    /// Persist the rename of the log file
    #[cfg(unix)]
    fn sync_dir(&self) -> Result<()> {
        let dir = match self.log_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        File::open(dir)
            .and_then(|d| d.sync_all())
            .map_err(|e| Error::Storage(format!("Failed to sync journal dir: {}", e)))
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadStore;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("keyslot_{}_{}", name, std::process::id()))
    }

    fn settings() -> JournalSettings {
        JournalSettings {
            sync_writes: true,
            compact_after: 0,
        }
    }

    #[test]
    fn test_record_framing() -> Result<()> {
        let record = JournalRecord::new(7, JournalOp::Claim, SlotKey::from("alice"));
        let bytes = record.to_bytes()?;
        let decoded = JournalRecord::from_bytes(&bytes)?;

        assert_eq!(decoded.sequence, 7);
        assert_eq!(decoded.op, JournalOp::Claim);
        assert_eq!(decoded.key, SlotKey::from("alice"));

        let mut corrupted = bytes.clone();
        corrupted[6] ^= 0xff;
        assert!(JournalRecord::from_bytes(&corrupted).is_err());
        assert!(JournalRecord::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        Ok(())
    }

    #[test]
    fn test_journal_recovery() -> Result<()> {
        let dir = temp_dir("journal_recovery");
        let id = NamespaceId::new();

        let alice_address = {
            let mut journal = ClaimJournal::open(&dir, id, &settings())?;
            let address = journal.claim("alice")?.redeem();
            let _ = journal.claim("bob")?;
            let _ = journal.claim(7u64)?;
            journal.release("bob")?;
            assert_eq!(journal.records_written(), 4);
            address
        };

        {
            let mut journal = ClaimJournal::open(&dir, id, &settings())?;
            assert_eq!(journal.namespace().len(), 2);
            assert!(journal.exists("alice"));
            assert!(!journal.exists("bob"));
            assert!(journal.exists(7u8));
            assert_eq!(journal.derive_address("alice"), alice_address);
            assert!(matches!(journal.claim("alice"), Err(Error::AlreadyClaimed { .. })));
            assert_eq!(journal.records_written(), 0);
        }

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_failed_operations_write_nothing() -> Result<()> {
        let dir = temp_dir("journal_failed_ops");
        let id = NamespaceId::new();
        let mut journal = ClaimJournal::open(&dir, id, &settings())?;

        let _ = journal.claim("alice")?;
        let size = std::fs::metadata(journal.path())
            .map_err(|e| Error::Storage(e.to_string()))?
            .len();

        assert!(journal.claim("alice").is_err());
        assert!(journal.release("nobody").is_err());
        let after = std::fs::metadata(journal.path())
            .map_err(|e| Error::Storage(e.to_string()))?
            .len();
        assert_eq!(size, after);
        assert_eq!(journal.records_written(), 1);

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_torn_tail_is_truncated() -> Result<()> {
        let dir = temp_dir("journal_torn");
        let id = NamespaceId::new();

        let path = {
            let mut journal = ClaimJournal::open(&dir, id, &settings())?;
            let _ = journal.claim("alice")?;
            journal.path().to_path_buf()
        };

        // Half a frame, as left by a crash mid-write
        {
            let mut file = OpenOptions::new()
                .append(true)
                .open(&path)
                .map_err(|e| Error::Storage(e.to_string()))?;
            file.write_all(&[200, 0, 0, 0, b'{'])
                .map_err(|e| Error::Storage(e.to_string()))?;
        }

        {
            let mut journal = ClaimJournal::open(&dir, id, &settings())?;
            assert!(journal.exists("alice"));
            let _ = journal.claim("bob")?;
        }

        let journal = ClaimJournal::open(&dir, id, &settings())?;
        assert!(journal.exists("alice"));
        assert!(journal.exists("bob"));

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_garbage_while_open_does_not_hide_later_claims() -> Result<()> {
        let dir = temp_dir("journal_garbage_open");
        let id = NamespaceId::new();

        {
            let mut journal = ClaimJournal::open(&dir, id, &settings())?;
            let _ = journal.claim("alice")?;
            let size = std::fs::metadata(journal.path())
                .map_err(|e| Error::Storage(e.to_string()))?
                .len();

            // A frame cut short behind the journal's back
            let mut file = OpenOptions::new()
                .append(true)
                .open(journal.path())
                .map_err(|e| Error::Storage(e.to_string()))?;
            file.write_all(&[50, 0, 0, 0, b'{', b'"'])
                .map_err(|e| Error::Storage(e.to_string()))?;
            drop(file);

            let bob = journal.claim("bob")?.redeem();
            assert_eq!(bob, journal.derive_address("bob"));

            let record_len = JournalRecord::new(1, JournalOp::Claim, SlotKey::from("bob"))
                .to_bytes()?
                .len() as u64;
            let after = std::fs::metadata(journal.path())
                .map_err(|e| Error::Storage(e.to_string()))?
                .len();
            assert_eq!(after, size + record_len);
        }

        let mut journal = ClaimJournal::open(&dir, id, &settings())?;
        assert!(journal.exists("alice"));
        assert!(journal.exists("bob"));
        assert!(matches!(journal.claim("bob"), Err(Error::AlreadyClaimed { .. })));

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_release_verified_journaled() -> Result<()> {
        let dir = temp_dir("journal_release_verified");
        let id = NamespaceId::new();
        let mut store = PayloadStore::new();

        {
            let mut journal = ClaimJournal::open(&dir, id, &settings())?;
            let address = store.place(journal.claim("alice")?, "payload")?;
            let size = std::fs::metadata(journal.path())
                .map_err(|e| Error::Storage(e.to_string()))?
                .len();

            assert!(matches!(
                journal.release_verified("alice", &store),
                Err(Error::SlotOccupied(occupied)) if occupied == address
            ));
            let after = std::fs::metadata(journal.path())
                .map_err(|e| Error::Storage(e.to_string()))?
                .len();
            assert_eq!(size, after);
            assert_eq!(journal.records_written(), 1);
            assert!(journal.exists("alice"));

            assert_eq!(store.destroy(&address), Some("payload"));
            journal.release_verified("alice", &store)?;
            assert!(!journal.exists("alice"));
        }

        let journal = ClaimJournal::open(&dir, id, &settings())?;
        assert!(!journal.exists("alice"));

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_compaction() -> Result<()> {
        let dir = temp_dir("journal_compact");
        let id = NamespaceId::new();
        let mut journal = ClaimJournal::open(&dir, id, &settings())?;

        for _ in 0..10 {
            let _ = journal.claim("alice")?;
            journal.release("alice")?;
        }
        let _ = journal.claim("bob")?;

        let size_before = std::fs::metadata(journal.path())
            .map_err(|e| Error::Storage(e.to_string()))?
            .len();
        journal.compact()?;
        let size_after = std::fs::metadata(journal.path())
            .map_err(|e| Error::Storage(e.to_string()))?
            .len();

        assert!(size_after < size_before);
        assert_eq!(journal.records_written(), 0);

        let _ = journal.claim("carol")?;
        drop(journal);

        let journal = ClaimJournal::open(&dir, id, &settings())?;
        assert!(!journal.exists("alice"));
        assert!(journal.exists("bob"));
        assert!(journal.exists("carol"));
        assert!(!journal.path().with_extension("log.tmp").exists());

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_compaction_removes_temp_file() -> Result<()> {
        let dir = temp_dir("journal_compact_fail");
        let id = NamespaceId::new();
        let mut journal = ClaimJournal::open(&dir, id, &settings())?;
        let _ = journal.claim("alice")?;

        // A non-empty directory in place of the log makes the rename fail
        let path = journal.path().to_path_buf();
        std::fs::remove_file(&path).map_err(|e| Error::Storage(e.to_string()))?;
        std::fs::create_dir_all(path.join("blocker"))
            .map_err(|e| Error::Storage(e.to_string()))?;

        assert!(matches!(journal.compact(), Err(Error::Storage(_))));
        assert!(!path.with_extension("log.tmp").exists());
        assert!(journal.exists("alice"));

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_automatic_compaction() -> Result<()> {
        let dir = temp_dir("journal_auto_compact");
        let id = NamespaceId::new();
        let auto = JournalSettings {
            sync_writes: false,
            compact_after: 4,
        };
        let mut journal = ClaimJournal::open(&dir, id, &auto)?;

        for i in 0..5u64 {
            let _ = journal.claim(i)?;
        }
        // The fifth record crossed the threshold
        assert_eq!(journal.records_written(), 0);
        drop(journal);

        let journal = ClaimJournal::open(&dir, id, &auto)?;
        assert_eq!(journal.namespace().len(), 5);

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_list_namespaces() -> Result<()> {
        let dir = temp_dir("journal_list");
        let a = NamespaceId::new();
        let b = NamespaceId::new();

        let mut first = ClaimJournal::open(&dir, a, &settings())?;
        let _ = first.claim("x")?;
        let mut second = ClaimJournal::open(&dir, b, &settings())?;
        let _ = second.claim("y")?;

        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ClaimJournal::list(&dir)?, expected);
        assert!(ClaimJournal::list(dir.join("missing"))?.is_empty());

        std::fs::remove_dir_all(dir).ok();
        Ok(())
    }
}
