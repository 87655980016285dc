//! Query replay file codec.
//!
//! A query file is a concatenation of frames, each
//! `[u32 length BE][u32 CRC32 BE][bincode QueryRecord]`; the same framing
//! as the store log. `preparequeries` writes one, `testqueries` replays it
//! so the harness never touches the embedder.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// One replayable query: the original text and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query: String,
    pub embedding: Vec<f32>,
}

/// Write records as a framed query file.
pub fn write_query_file(path: &Path, records: &[QueryRecord]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        let payload =
            bincode::serialize(record).map_err(|e| io::Error::other(e.to_string()))?;
        let crc = crc32fast::hash(&payload);
        writer.write_all(&(payload.len() as u32).to_be_bytes())?;
        writer.write_all(&crc.to_be_bytes())?;
        writer.write_all(&payload)?;
    }
    writer.flush()
}

/// Read every record of a framed query file, verifying checksums.
///
/// Unlike the store log, a bad frame here is an error: a harness replaying
/// half its queries would silently skew the latency report.
pub fn read_query_file(path: &Path) -> io::Result<Vec<QueryRecord>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
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
        reader.read_exact(&mut payload)?;

        if crc32fast::hash(&payload) != stored_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("query file frame {} failed CRC check", records.len()),
            ));
        }
        let record = bincode::deserialize(&payload)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}
