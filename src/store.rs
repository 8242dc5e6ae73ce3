use bincode::{deserialize_from, serialize_into};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{GpaError, Result};
use crate::grades::GpaResult;
use crate::session::SemesterRecord;

/// Snapshot file name inside the data directory
pub const RECORDS_FILE: &str = "records.bin.gz";

/// A finished calculation as persisted
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SavedRecord {
    pub record_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub semesters: Vec<SemesterRecord>,
    pub results: GpaResult,
}

impl SavedRecord {
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Persistence for finished calculations.
///
/// Records are immutable once saved.
pub trait RecordStore: Send + Sync {
    fn save(&self, semesters: &[SemesterRecord], results: &GpaResult) -> Result<Uuid>;

    /// Every record, most recent first.
    fn list(&self) -> Result<Vec<SavedRecord>>;

    fn load_by_id(&self, record_id: &Uuid) -> Result<Option<SavedRecord>>;
}

/// Record store backed by a gzip-compressed bincode snapshot.
///
/// The whole record list is rewritten on every save through a temporary file,
/// so a crash mid-write leaves the previous snapshot intact.
pub struct FileRecordStore {
    path: Option<PathBuf>,
    records: Mutex<Vec<SavedRecord>>,
}

impl FileRecordStore {
    /// Opens (or creates) the store under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        if !data_dir.exists() {
            fs::create_dir_all(data_dir)?;
        }
        let path = data_dir.join(RECORDS_FILE);
        let records = if path.exists() {
            read_snapshot(&path)?
        } else {
            Vec::new()
        };
        log::info!("loaded {} saved record(s) from {}", records.len(), path.display());

        Ok(FileRecordStore {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        FileRecordStore {
            path: None,
            records: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<SavedRecord>>> {
        self.records
            .lock()
            .map_err(|_| GpaError::Store("record store lock poisoned".to_string()))
    }
}

impl RecordStore for FileRecordStore {
    fn save(&self, semesters: &[SemesterRecord], results: &GpaResult) -> Result<Uuid> {
        let record = SavedRecord {
            record_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            semesters: semesters.to_vec(),
            results: results.clone(),
        };
        let record_id = record.record_id;

        let mut records = self.lock()?;
        records.push(record);
        if let Some(path) = &self.path {
            if let Err(e) = write_snapshot(path, &records) {
                records.pop();
                return Err(e);
            }
        }

        log::info!("saved calculation {}", record_id);
        Ok(record_id)
    }

    fn list(&self) -> Result<Vec<SavedRecord>> {
        let records = self.lock()?;
        let mut listed: Vec<SavedRecord> = records.iter().rev().cloned().collect();
        listed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(listed)
    }

    fn load_by_id(&self, record_id: &Uuid) -> Result<Option<SavedRecord>> {
        let records = self.lock()?;
        Ok(records.iter().find(|r| &r.record_id == record_id).cloned())
    }
}

fn write_snapshot(path: &Path, records: &[SavedRecord]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let file = File::create(&tmp)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, records)?;
    writer.flush()?;
    let encoder = writer
        .into_inner()
        .map_err(|e| GpaError::Store(e.to_string()))?;
    encoder.finish()?.sync_all()?;

    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Vec<SavedRecord>> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);

    let records: Vec<SavedRecord> = deserialize_from(&mut reader)?;
    Ok(records)
}
