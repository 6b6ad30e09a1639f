//! Mutation operations carried by a write batch
//!
//! The operation set is closed: every consumer matches on `BatchOp`
//! exhaustively, so adding a kind forces every handler to decide what
//! to do with it.

use std::fmt;

/// Operation tag as stored in the batch encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpKind {
    Put = 1,
    Delete = 2,
    SingleDelete = 3,
    DeleteRange = 4,
    Merge = 5,
    PutBlobIndex = 6,
    BeginPrepare = 7,
    EndPrepare = 8,
    Commit = 9,
    CommitWithTimestamp = 10,
    Rollback = 11,
    Noop = 12,
}

impl OpKind {
    /// Convert from u8, returns None for unknown tags
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(OpKind::Put),
            2 => Some(OpKind::Delete),
            3 => Some(OpKind::SingleDelete),
            4 => Some(OpKind::DeleteRange),
            5 => Some(OpKind::Merge),
            6 => Some(OpKind::PutBlobIndex),
            7 => Some(OpKind::BeginPrepare),
            8 => Some(OpKind::EndPrepare),
            9 => Some(OpKind::Commit),
            10 => Some(OpKind::CommitWithTimestamp),
            11 => Some(OpKind::Rollback),
            12 => Some(OpKind::Noop),
            _ => None,
        }
    }

    /// Convert to u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the string representation
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Put => "PUT",
            OpKind::Delete => "DELETE",
            OpKind::SingleDelete => "SINGLE_DELETE",
            OpKind::DeleteRange => "DELETE_RANGE",
            OpKind::Merge => "MERGE",
            OpKind::PutBlobIndex => "PUT_BLOB_INDEX",
            OpKind::BeginPrepare => "BEGIN_PREPARE",
            OpKind::EndPrepare => "END_PREPARE",
            OpKind::Commit => "COMMIT",
            OpKind::CommitWithTimestamp => "COMMIT_WITH_TIMESTAMP",
            OpKind::Rollback => "ROLLBACK",
            OpKind::Noop => "NOOP",
        }
    }

    /// Returns true for transaction lifecycle markers, which carry no key
    pub fn is_marker(self) -> bool {
        matches!(
            self,
            OpKind::BeginPrepare
                | OpKind::EndPrepare
                | OpKind::Commit
                | OpKind::CommitWithTimestamp
                | OpKind::Rollback
                | OpKind::Noop
        )
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a write batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or overwrite a key
    Put {
        cf: u32,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Tombstone for a key
    Delete { cf: u32, key: Vec<u8> },
    /// Tombstone that may only cancel a single prior put
    SingleDelete { cf: u32, key: Vec<u8> },
    /// Tombstone covering `[begin_key, end_key)`
    DeleteRange {
        cf: u32,
        begin_key: Vec<u8>,
        end_key: Vec<u8>,
    },
    /// Merge operand for a key
    Merge {
        cf: u32,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Put whose value is a reference into a blob file
    PutBlobIndex {
        cf: u32,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    /// Start of a prepared transaction section
    BeginPrepare { unprepared: bool },
    /// End of a prepared transaction section
    EndPrepare { xid: Vec<u8> },
    /// Commit of a prepared transaction
    Commit { xid: Vec<u8> },
    /// Commit of a prepared transaction at a commit timestamp
    CommitWithTimestamp { xid: Vec<u8>, commit_ts: Vec<u8> },
    /// Rollback of a prepared transaction
    Rollback { xid: Vec<u8> },
    /// Placeholder left behind by a prepared section
    Noop { empty_batch: bool },
}

impl BatchOp {
    /// Returns the operation tag
    pub fn kind(&self) -> OpKind {
        match self {
            BatchOp::Put { .. } => OpKind::Put,
            BatchOp::Delete { .. } => OpKind::Delete,
            BatchOp::SingleDelete { .. } => OpKind::SingleDelete,
            BatchOp::DeleteRange { .. } => OpKind::DeleteRange,
            BatchOp::Merge { .. } => OpKind::Merge,
            BatchOp::PutBlobIndex { .. } => OpKind::PutBlobIndex,
            BatchOp::BeginPrepare { .. } => OpKind::BeginPrepare,
            BatchOp::EndPrepare { .. } => OpKind::EndPrepare,
            BatchOp::Commit { .. } => OpKind::Commit,
            BatchOp::CommitWithTimestamp { .. } => OpKind::CommitWithTimestamp,
            BatchOp::Rollback { .. } => OpKind::Rollback,
            BatchOp::Noop { .. } => OpKind::Noop,
        }
    }

    /// Returns the column family this operation writes to, if any
    pub fn column_family(&self) -> Option<u32> {
        match self {
            BatchOp::Put { cf, .. }
            | BatchOp::Delete { cf, .. }
            | BatchOp::SingleDelete { cf, .. }
            | BatchOp::DeleteRange { cf, .. }
            | BatchOp::Merge { cf, .. }
            | BatchOp::PutBlobIndex { cf, .. } => Some(*cf),
            BatchOp::BeginPrepare { .. }
            | BatchOp::EndPrepare { .. }
            | BatchOp::Commit { .. }
            | BatchOp::CommitWithTimestamp { .. }
            | BatchOp::Rollback { .. }
            | BatchOp::Noop { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_kind_tags_are_stable() {
        assert_eq!(OpKind::Put.as_u8(), 1);
        assert_eq!(OpKind::PutBlobIndex.as_u8(), 6);
        assert_eq!(OpKind::Noop.as_u8(), 12);
        for tag in 1..=12u8 {
            assert_eq!(OpKind::from_u8(tag).map(OpKind::as_u8), Some(tag));
        }
    }

    #[test]
    fn test_unknown_op_kind() {
        assert!(OpKind::from_u8(0).is_none());
        assert!(OpKind::from_u8(13).is_none());
        assert!(OpKind::from_u8(255).is_none());
    }

    #[test]
    fn test_markers_have_no_column_family() {
        let marker = BatchOp::Commit { xid: b"x1".to_vec() };
        assert!(marker.kind().is_marker());
        assert_eq!(marker.column_family(), None);

        let put = BatchOp::Put {
            cf: 3,
            key: b"k".to_vec(),
            value: b"v".to_vec(),
        };
        assert!(!put.kind().is_marker());
        assert_eq!(put.column_family(), Some(3));
    }

    #[test]
    fn test_blob_index_is_distinct_from_put() {
        let blob = BatchOp::PutBlobIndex {
            cf: 0,
            key: b"k".to_vec(),
            value: b"ref".to_vec(),
        };
        assert_eq!(blob.kind(), OpKind::PutBlobIndex);
        assert_ne!(blob.kind(), OpKind::Put);
    }
}
