//! Ordered, atomically applied list of mutation operations
//!
//! Encoding (all integers little-endian):
//! - Operation count (u32)
//! - Per operation: tag (u8) followed by its fields
//!   - column family ids as u32
//!   - byte strings as u32 length + bytes
//!   - booleans as u8 (0 or 1)

use std::io::{self, Read, Write};

use super::operation::{BatchOp, OpKind};

/// Receives the operations of a batch in their original order.
///
/// Returning an error stops iteration; the error is handed back to
/// the caller of [`WriteBatch::iterate`] unchanged.
pub trait BatchHandler {
    /// Error type produced by the handler
    type Error;

    /// Handle a single operation
    fn handle(&mut self, op: &BatchOp) -> Result<(), Self::Error>;
}

/// A write batch as logged in the WAL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Create an empty batch with room for `capacity` operations
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    /// Append an operation as-is
    pub fn push(&mut self, op: BatchOp) {
        self.ops.push(op);
    }

    pub fn put(&mut self, cf: u32, key: &[u8], value: &[u8]) {
        self.push(BatchOp::Put {
            cf,
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    pub fn delete(&mut self, cf: u32, key: &[u8]) {
        self.push(BatchOp::Delete {
            cf,
            key: key.to_vec(),
        });
    }

    pub fn single_delete(&mut self, cf: u32, key: &[u8]) {
        self.push(BatchOp::SingleDelete {
            cf,
            key: key.to_vec(),
        });
    }

    pub fn delete_range(&mut self, cf: u32, begin_key: &[u8], end_key: &[u8]) {
        self.push(BatchOp::DeleteRange {
            cf,
            begin_key: begin_key.to_vec(),
            end_key: end_key.to_vec(),
        });
    }

    pub fn merge(&mut self, cf: u32, key: &[u8], value: &[u8]) {
        self.push(BatchOp::Merge {
            cf,
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    pub fn put_blob_index(&mut self, cf: u32, key: &[u8], value: &[u8]) {
        self.push(BatchOp::PutBlobIndex {
            cf,
            key: key.to_vec(),
            value: value.to_vec(),
        });
    }

    pub fn mark_begin_prepare(&mut self, unprepared: bool) {
        self.push(BatchOp::BeginPrepare { unprepared });
    }

    pub fn mark_end_prepare(&mut self, xid: &[u8]) {
        self.push(BatchOp::EndPrepare { xid: xid.to_vec() });
    }

    pub fn mark_commit(&mut self, xid: &[u8]) {
        self.push(BatchOp::Commit { xid: xid.to_vec() });
    }

    pub fn mark_commit_with_timestamp(&mut self, xid: &[u8], commit_ts: &[u8]) {
        self.push(BatchOp::CommitWithTimestamp {
            xid: xid.to_vec(),
            commit_ts: commit_ts.to_vec(),
        });
    }

    pub fn mark_rollback(&mut self, xid: &[u8]) {
        self.push(BatchOp::Rollback { xid: xid.to_vec() });
    }

    pub fn mark_noop(&mut self, empty_batch: bool) {
        self.push(BatchOp::Noop { empty_batch });
    }

    /// Operations in batch order
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Number of operations, markers included
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Column families referenced by the batch, sorted and deduplicated
    pub fn column_family_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.ops.iter().filter_map(BatchOp::column_family).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Feed every operation to `handler` in order.
    ///
    /// Stops at the first error.
    pub fn iterate<H: BatchHandler>(&self, handler: &mut H) -> Result<(), H::Error> {
        for op in &self.ops {
            handler.handle(op)?;
        }
        Ok(())
    }

    /// Serialize the batch to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writes into a Vec cannot fail
        let _ = self.write_to(&mut buf);
        buf
    }

    /// Write the batch encoding to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
            writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
            writer.write_all(bytes)
        }

        writer.write_all(&(self.ops.len() as u32).to_le_bytes())?;

        for op in &self.ops {
            writer.write_all(&[op.kind().as_u8()])?;
            match op {
                BatchOp::Put { cf, key, value }
                | BatchOp::Merge { cf, key, value }
                | BatchOp::PutBlobIndex { cf, key, value } => {
                    writer.write_all(&cf.to_le_bytes())?;
                    write_bytes(writer, key)?;
                    write_bytes(writer, value)?;
                }
                BatchOp::Delete { cf, key } | BatchOp::SingleDelete { cf, key } => {
                    writer.write_all(&cf.to_le_bytes())?;
                    write_bytes(writer, key)?;
                }
                BatchOp::DeleteRange {
                    cf,
                    begin_key,
                    end_key,
                } => {
                    writer.write_all(&cf.to_le_bytes())?;
                    write_bytes(writer, begin_key)?;
                    write_bytes(writer, end_key)?;
                }
                BatchOp::BeginPrepare { unprepared } => {
                    writer.write_all(&[u8::from(*unprepared)])?;
                }
                BatchOp::EndPrepare { xid }
                | BatchOp::Commit { xid }
                | BatchOp::Rollback { xid } => {
                    write_bytes(writer, xid)?;
                }
                BatchOp::CommitWithTimestamp { xid, commit_ts } => {
                    write_bytes(writer, xid)?;
                    write_bytes(writer, commit_ts)?;
                }
                BatchOp::Noop { empty_batch } => {
                    writer.write_all(&[u8::from(*empty_batch)])?;
                }
            }
        }

        Ok(())
    }

    /// Deserialize a batch from bytes.
    ///
    /// The whole slice must be consumed; trailing bytes are an error.
    pub fn deserialize(data: &[u8]) -> io::Result<Self> {
        let mut cursor = io::Cursor::new(data);
        let batch = Self::read_from(&mut cursor)?;

        if cursor.position() as usize != data.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Trailing bytes after write batch: {} of {} consumed",
                    cursor.position(),
                    data.len()
                ),
            ));
        }

        Ok(batch)
    }

    /// Read a batch encoding from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf))
        }

        fn read_bool<R: Read>(reader: &mut R) -> io::Result<bool> {
            let mut buf = [0u8; 1];
            reader.read_exact(&mut buf)?;
            match buf[0] {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid boolean byte: {}", other),
                )),
            }
        }

        fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
            let len = read_u32(reader)? as usize;
            let mut buf = Vec::new();
            reader.take(len as u64).read_to_end(&mut buf)?;
            if buf.len() != len {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("Byte string truncated: expected {}, got {}", len, buf.len()),
                ));
            }
            Ok(buf)
        }

        let count = read_u32(reader)?;
        let mut batch = WriteBatch::new();

        for _ in 0..count {
            let mut tag = [0u8; 1];
            reader.read_exact(&mut tag)?;
            let kind = OpKind::from_u8(tag[0]).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid operation tag: {}", tag[0]),
                )
            })?;

            let op = match kind {
                OpKind::Put => BatchOp::Put {
                    cf: read_u32(reader)?,
                    key: read_bytes(reader)?,
                    value: read_bytes(reader)?,
                },
                OpKind::Merge => BatchOp::Merge {
                    cf: read_u32(reader)?,
                    key: read_bytes(reader)?,
                    value: read_bytes(reader)?,
                },
                OpKind::PutBlobIndex => BatchOp::PutBlobIndex {
                    cf: read_u32(reader)?,
                    key: read_bytes(reader)?,
                    value: read_bytes(reader)?,
                },
                OpKind::Delete => BatchOp::Delete {
                    cf: read_u32(reader)?,
                    key: read_bytes(reader)?,
                },
                OpKind::SingleDelete => BatchOp::SingleDelete {
                    cf: read_u32(reader)?,
                    key: read_bytes(reader)?,
                },
                OpKind::DeleteRange => BatchOp::DeleteRange {
                    cf: read_u32(reader)?,
                    begin_key: read_bytes(reader)?,
                    end_key: read_bytes(reader)?,
                },
                OpKind::BeginPrepare => BatchOp::BeginPrepare {
                    unprepared: read_bool(reader)?,
                },
                OpKind::EndPrepare => BatchOp::EndPrepare {
                    xid: read_bytes(reader)?,
                },
                OpKind::Commit => BatchOp::Commit {
                    xid: read_bytes(reader)?,
                },
                OpKind::CommitWithTimestamp => BatchOp::CommitWithTimestamp {
                    xid: read_bytes(reader)?,
                    commit_ts: read_bytes(reader)?,
                },
                OpKind::Rollback => BatchOp::Rollback {
                    xid: read_bytes(reader)?,
                },
                OpKind::Noop => BatchOp::Noop {
                    empty_batch: read_bool(reader)?,
                },
            };
            batch.push(op);
        }

        Ok(batch)
    }
}
