//! File-backed store: append-only log with CRC32 integrity checks.
//!
//! Every upsert is framed as `[u32 length BE][u32 CRC32 BE][bincode
//! (key, value)]` and durably flushed with `fsync`. On open the log is
//! replayed into an in-memory map; replay is last-write-wins, which is
//! what makes upsert idempotent by key. A truncated tail (crash mid-
//! append) stops replay with a warning instead of failing the open.

use crate::store::Store;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const LOG_FILE_NAME: &str = "store.log";

/// Diagnostic statistics from a log replay.
#[derive(Debug, Default)]
pub struct ReplayStats {
    /// Frames successfully applied.
    pub applied: usize,
    /// Frames skipped due to deserialization errors (CRC was valid).
    pub skipped: usize,
    /// Whether replay stopped at a CRC mismatch or truncated frame.
    pub stopped_early: bool,
}

/// Durable key→bytes store backed by an append-only log file.
pub struct LogStore {
    entries: RwLock<HashMap<i32, Vec<u8>>>,
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl LogStore {
    /// Open (or create) the store log under `data_dir` and replay it.
    pub fn open(data_dir: &str) -> io::Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = Path::new(data_dir).join(LOG_FILE_NAME);

        let (entries, stats) = replay(&path)?;
        if stats.skipped > 0 || stats.stopped_early {
            tracing::warn!(
                applied = stats.applied,
                skipped = stats.skipped,
                stopped_early = stats.stopped_early,
                "store log replay encountered problems"
            );
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            entries: RwLock::new(entries),
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Path of the backing log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for LogStore {
    fn upsert(&self, key: i32, value: &[u8]) -> io::Result<()> {
        let framed = frame(key, value)?;
        {
            let mut w = self.writer.lock();
            w.write_all(&framed)?;
            w.flush()?;
            w.get_mut().sync_all()?;
        }
        self.entries.write().insert(key, value.to_vec());
        Ok(())
    }

    fn read(&self, key: i32) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(&key).cloned())
    }

    fn keys(&self) -> io::Result<Vec<i32>> {
        Ok(self.entries.read().keys().copied().collect())
    }
}

/// Serialize one upsert into its on-disk frame:
/// `[u32 len BE][u32 crc32 BE][bincode payload]`.
fn frame(key: i32, value: &[u8]) -> io::Result<Vec<u8>> {
    let payload =
        bincode::serialize(&(key, value)).map_err(|e| io::Error::other(e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let mut framed = Vec::with_capacity(8 + payload.len());
    framed.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    framed.extend_from_slice(&crc.to_be_bytes());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// Read all frames sequentially, verifying CRC32 checksums.
fn replay(path: &Path) -> io::Result<(HashMap<i32, Vec<u8>>, ReplayStats)> {
    let mut entries = HashMap::new();
    let mut stats = ReplayStats::default();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok((entries, stats)),
        Err(e) => return Err(e),
    };

    let mut reader = BufReader::new(file);
    let mut header = [0u8; 8];
    loop {
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let stored_crc = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let mut payload = vec![0u8; len];
        match reader.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::warn!("store log truncated mid-frame, stopping replay");
                stats.stopped_early = true;
                break;
            }
            Err(e) => return Err(e),
        }

        if crc32fast::hash(&payload) != stored_crc {
            tracing::warn!("store log frame CRC mismatch, stopping replay");
            stats.stopped_early = true;
            break;
        }

        match bincode::deserialize::<(i32, Vec<u8>)>(&payload) {
            Ok((key, value)) => {
                entries.insert(key, value);
                stats.applied += 1;
            }
            Err(e) => {
                tracing::warn!("store log frame deserialization failed, skipping: {e}");
                stats.skipped += 1;
            }
        }
    }

    Ok((entries, stats))
}
