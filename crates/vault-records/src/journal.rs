use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use vault_types::{BusinessId, DepositId, DepositRecord, DepositStatus, ObjectType};

use crate::error::{RecordError, RecordResult};
use crate::index::RecordIndex;
use crate::traits::DepositRecordStore;

/// Flush/sync strategy for the journal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JournalSync {
    /// `fsync` after every write.
    EveryWrite,
    /// Flush to the OS page cache only.
    #[default]
    OsDefault,
}

/// One journal entry.
///
/// On-disk framing:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized JournalEntry)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum JournalEntry {
    Added(DepositRecord),
    Updated(DepositRecord),
}

impl JournalEntry {
    fn into_record(self) -> DepositRecord {
        match self {
            Self::Added(r) | Self::Updated(r) => r,
        }
    }
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Sink the journal appends frames to.
trait JournalFile: Write {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
}

impl JournalFile for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Append side of the journal. `offset` is the end of the last complete
/// frame; a failed append is cut back to it.
struct JournalWriter<F = File> {
    file: F,
    offset: u64,
    sync: JournalSync,
    failed: bool,
}

impl<F: JournalFile> JournalWriter<F> {
    /// Append one framed entry, returning its offset.
    fn append(&mut self, entry: &JournalEntry) -> RecordResult<u64> {
        if self.failed {
            return Err(RecordError::WriterFailed(self.offset));
        }

        let payload =
            bincode::serialize(entry).map_err(|e| RecordError::Serialization(e.to_string()))?;
        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);

        if let Err(e) = self.write_frame(&frame) {
            if let Err(cut) = self.file.truncate(self.offset) {
                error!(offset = self.offset, error = %cut, "journal rollback failed; refusing further appends");
                self.failed = true;
            } else {
                warn!(offset = self.offset, error = %e, "journal append failed; rolled back");
            }
            return Err(e.into());
        }

        let entry_offset = self.offset;
        self.offset += frame.len() as u64;
        debug!(offset = entry_offset, len = payload.len(), "journal append");
        Ok(entry_offset)
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()?;
        if self.sync == JournalSync::EveryWrite {
            self.file.sync()?;
        }
        Ok(())
    }
}

/// Deposit-record store backed by an append-only journal file.
///
/// Every `add`/`update` appends a framed entry; nothing is ever rewritten,
/// so the file is the audit trail. On open the journal is replayed front to
/// back with the last entry per deposit id winning. Entries failing the CRC
/// check are skipped and a torn tail stops replay.
pub struct JournalRecordStore {
    path: PathBuf,
    /// Serializes writers; held across validate, append, and apply.
    writer: Mutex<JournalWriter>,
    index: RwLock<RecordIndex>,
}

impl JournalRecordStore {
    /// Open (or create) the journal at `path` and replay it.
    pub fn open(path: &Path, sync: JournalSync) -> RecordResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let mut index = RecordIndex::default();
        let (replayed, offset) = replay(path, &mut index)?;
        let file_len = file.metadata()?.len();
        if offset < file_len {
            warn!(offset, file_len, "truncating torn journal tail");
            file.set_len(offset)?;
        }
        info!(path = %path.display(), entries = replayed, records = index.len(), "journal opened");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(JournalWriter {
                file,
                offset,
                sync,
                failed: false,
            }),
            index: RwLock::new(index),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of distinct records.
    pub fn len(&self) -> usize {
        self.index.read().expect("journal index lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replay every valid entry into `index`. Returns the number applied and
/// the end offset of the last complete frame.
fn replay(path: &Path, index: &mut RecordIndex) -> RecordResult<(usize, u64)> {
    let mut file = BufReader::new(File::open(path)?);
    let file_len = file.get_ref().metadata()?.len();
    let mut offset: u64 = 0;
    let mut applied = 0;

    while offset + HEADER_SIZE as u64 <= file_len {
        let mut header = [0u8; HEADER_SIZE];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || offset + HEADER_SIZE as u64 + length as u64 > file_len {
            warn!(offset, length, file_len, "torn journal entry; stopping replay");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match file.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, "truncated journal entry; stopping replay");
                break;
            }
            Err(e) => return Err(e.into()),
        }
        offset += HEADER_SIZE as u64 + length as u64;

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping journal entry"
            );
            continue;
        }

        match bincode::deserialize::<JournalEntry>(&payload) {
            Ok(entry) => {
                index.apply(entry.into_record());
                applied += 1;
            }
            Err(e) => warn!(offset, error = %e, "undecodable journal entry; skipping"),
        }
    }

    Ok((applied, offset))
}

impl DepositRecordStore for JournalRecordStore {
    fn add(&self, record: &DepositRecord) -> RecordResult<()> {
        let mut writer = self.writer.lock().expect("journal writer lock poisoned");
        self.index
            .read()
            .expect("journal index lock poisoned")
            .check_add(record)?;
        writer.append(&JournalEntry::Added(record.clone()))?;
        self.index
            .write()
            .expect("journal index lock poisoned")
            .apply(record.clone());
        Ok(())
    }

    fn update(&self, record: &DepositRecord) -> RecordResult<()> {
        let mut writer = self.writer.lock().expect("journal writer lock poisoned");
        let changed = self
            .index
            .read()
            .expect("journal index lock poisoned")
            .check_update(record)?;
        if !changed {
            return Ok(());
        }
        writer.append(&JournalEntry::Updated(record.clone()))?;
        self.index
            .write()
            .expect("journal index lock poisoned")
            .apply(record.clone());
        Ok(())
    }

    fn lookup(&self, deposit_id: &DepositId) -> RecordResult<Option<DepositRecord>> {
        Ok(self
            .index
            .read()
            .expect("journal index lock poisoned")
            .get(deposit_id))
    }

    fn list(
        &self,
        object_type: Option<ObjectType>,
        status: Option<DepositStatus>,
    ) -> RecordResult<Vec<DepositRecord>> {
        Ok(self
            .index
            .read()
            .expect("journal index lock poisoned")
            .list(object_type, status))
    }

    fn list_for_object(
        &self,
        business_id: &BusinessId,
        status: Option<DepositStatus>,
    ) -> RecordResult<Vec<DepositRecord>> {
        Ok(self
            .index
            .read()
            .expect("journal index lock poisoned")
            .list_for_object(business_id, status))
    }

    fn lookup_children(&self, parent: &DepositId) -> RecordResult<Vec<DepositRecord>> {
        Ok(self
            .index
            .read()
            .expect("journal index lock poisoned")
            .children(parent))
    }
}
