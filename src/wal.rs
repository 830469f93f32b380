use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Encode a single record to [len][bincode][crc32] format.
fn encode_record<T: Serialize>(writer: &mut impl Write, record: &T) -> io::Result<()> {
    let payload =
        bincode::serialize(record).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = payload.len() as u32;
    let crc = crc32fast::hash(&payload);
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    writer.write_all(&crc.to_le_bytes())?;
    Ok(())
}

/// Append-only log of records of one entity kind.
///
/// Format per entry: `[u32: len][bincode: T][u32: crc32]`
/// - `len` is the byte length of the bincode payload (not including the CRC).
/// - Truncated last entry (crash) is safely discarded via length-prefix + CRC check.
///
/// After a failed write the file is cut back to `committed`, the end of the
/// last batch that was fsynced. If that cut fails too, the next flush retries it.
pub struct Wal<T> {
    file: File,
    pending: Vec<u8>,
    committed: u64,
    torn: bool,
    path: PathBuf,
    _record: PhantomData<fn(T)>,
}

/// Records read back from a log, and the byte length of its valid prefix.
pub struct Replay<T> {
    pub records: Vec<T>,
    pub valid_len: u64,
}

impl<T: Serialize + DeserializeOwned> Wal<T> {
    /// Open (or create) the WAL file at `path`, appending after its current end.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let committed = file.metadata()?.len();
        Ok(Self {
            file,
            pending: Vec::new(),
            committed,
            torn: false,
            path: path.to_path_buf(),
            _record: PhantomData,
        })
    }

    /// Replay `path`, cut off any torn or corrupt tail, and open it for appends.
    pub fn recover(path: &Path) -> io::Result<(Vec<T>, Self)> {
        let Replay { records, valid_len } = Self::replay(path)?;
        let mut wal = Self::open(path)?;
        if wal.committed > valid_len {
            warn!(
                "discarding {} trailing bytes of {}",
                wal.committed - valid_len,
                path.display()
            );
            wal.committed = valid_len;
            wal.truncate_to_committed()?;
        }
        Ok((records, wal))
    }

    /// Append a single record and fsync. Used by tests only.
    /// The store writer uses `append_buffered` + `flush_sync` for group commit.
    #[cfg(test)]
    pub fn append(&mut self, record: &T) -> io::Result<()> {
        self.append_buffered(record)?;
        self.flush_sync()
    }

    /// Encode a record into the pending batch. Nothing reaches the file
    /// until `flush_sync()`.
    pub fn append_buffered(&mut self, record: &T) -> io::Result<()> {
        encode_record(&mut self.pending, record)
    }

    /// Drop every record buffered since the last `flush_sync()`.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Write the pending batch and fsync. On failure the file is cut back to
    /// the end of the last committed batch and the batch is dropped.
    pub fn flush_sync(&mut self) -> io::Result<()> {
        let batch = std::mem::take(&mut self.pending);
        if self.torn {
            self.truncate_to_committed()?;
        }
        let written = self
            .file
            .write_all(&batch)
            .and_then(|()| self.file.sync_all());
        match written {
            Ok(()) => {
                self.committed += batch.len() as u64;
                Ok(())
            }
            Err(e) => {
                if let Err(cut) = self.truncate_to_committed() {
                    warn!("could not cut {} back after failed write: {cut}", self.path.display());
                }
                Err(e)
            }
        }
    }

    fn truncate_to_committed(&mut self) -> io::Result<()> {
        self.torn = true;
        self.file.set_len(self.committed)?;
        self.file.sync_all()?;
        self.torn = false;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay the WAL from disk, returning all valid records.
    /// Reading stops at the first truncated or corrupt entry.
    pub fn replay(path: &Path) -> io::Result<Replay<T>> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Replay {
                    records: Vec::new(),
                    valid_len: 0,
                });
            }
            Err(e) => return Err(e),
        };
        let mut reader = BufReader::new(file);
        let mut records = Vec::new();
        let mut valid_len = 0u64;

        loop {
            let mut len_buf = [0u8; 4];
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
            let len = u32::from_le_bytes(len_buf) as usize;

            let mut payload = vec![0u8; len];
            match reader.read_exact(&mut payload) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break, // truncated
                Err(e) => return Err(e),
            }

            let mut crc_buf = [0u8; 4];
            match reader.read_exact(&mut crc_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break, // truncated
                Err(e) => return Err(e),
            }
            let stored_crc = u32::from_le_bytes(crc_buf);
            if stored_crc != crc32fast::hash(&payload) {
                // Corrupt entry, stop replaying
                break;
            }

            match bincode::deserialize::<T>(&payload) {
                Ok(record) => records.push(record),
                Err(_) => break,
            }
            valid_len += (len + 8) as u64;
        }

        Ok(Replay { records, valid_len })
    }
}
