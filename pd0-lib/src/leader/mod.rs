//! Fixed-layout leader sub-records.
//!
//! Both leaders are located the same way: the first matching id in an ensemble's
//! data-type table gives the offset of the record, which is read whole and decoded
//! into one column of a field-by-ensemble array.
use std::io::{Read, Seek};

use tracing::warn;

use crate::error::ErrorCode;
use crate::header::FileIndex;
use crate::io::Reader;

pub mod codes;
pub mod fixed;
pub mod variable;

pub use fixed::{FixedField, FixedLeader};
pub use variable::{VariableField, VariableLeader};

/// Read the leader record of `len` bytes identified by `ids` from every indexed
/// ensemble.
///
/// If an ensemble lists more than one of `ids`, the first listed record is read.
///
/// Stops at the first ensemble where the record is missing, unreadable, or does not
/// begin with one of `ids`; the records read so far are returned with the code.
pub(crate) fn read_records<R>(
    reader: &mut Reader<R>,
    index: &FileIndex,
    ids: &[u16],
    len: usize,
    name: &str,
) -> (Vec<Vec<u8>>, ErrorCode)
where
    R: Read + Seek,
{
    let mut records = Vec::with_capacity(index.len());
    for i in 0..index.len() {
        let Some(start) = index
            .position(i, ids)
            .and_then(|pos| index.offset(i, pos))
        else {
            warn!("{name}: leader id not found in ensemble {}; ensembles reset to {i}", i + 1);
            return (records, ErrorCode::IdNotFound);
        };
        let zult = reader.seek(start).and_then(|_| reader.read_exact(len));
        let rec = match zult {
            Ok(rec) => rec,
            Err(code) => {
                warn!(
                    "{name}: unable to read ensemble {}; ensembles reset to {i}: {code}",
                    i + 1
                );
                return (records, code);
            }
        };
        let id = u16::from_le_bytes([rec[0], rec[1]]);
        if !ids.contains(&id) {
            warn!(id, "{name}: unexpected record id in ensemble {}; ensembles reset to {i}", i + 1);
            return (records, ErrorCode::IdNotFound);
        }
        records.push(rec);
    }
    (records, ErrorCode::Success)
}

#[inline]
pub(crate) fn u16_le(dat: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([dat[at], dat[at + 1]])
}

#[inline]
pub(crate) fn i16_le(dat: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([dat[at], dat[at + 1]])
}

#[inline]
pub(crate) fn i32_le(dat: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([dat[at], dat[at + 1], dat[at + 2], dat[at + 3]])
}

#[inline]
pub(crate) fn u32_le(dat: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([dat[at], dat[at + 1], dat[at + 2], dat[at + 3]])
}
