//! Ensemble framing and the per-file [FileIndex].
//!
//! The scanner walks a file ensemble by ensemble, validating the framing bytes and
//! recording where every sub-record lives. All extractors work from the resulting
//! index, so a file only needs to be scanned once.
use std::io::{Read, Seek};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::checksum::{verify_ensemble_checksum, CHECKSUM_LEN};
use crate::error::{Decoded, ErrorCode, Result};
use crate::io::Reader;
use crate::kind::DataKind;

/// One ensemble's framing information as found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ensemble {
    pub header_id: u8,
    pub source_id: u8,
    /// Bytes from the start of the ensemble up to, but excluding, the checksum.
    pub byte_count: u16,
    pub num_data_types: u8,
    pub data_ids: Vec<u16>,
    /// Offset of each sub-record from the start of the ensemble.
    pub address_offsets: Vec<u16>,
    pub absolute_file_offset: u64,
}

impl Ensemble {
    /// Header length in bytes, excluding the offset table.
    pub const HEADER_LEN: usize = 6;
    /// Required value of both the header and source id.
    pub const ID: u8 = 0x7F;

    /// Total length on disk, including the trailing checksum.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.byte_count) + CHECKSUM_LEN as u64
    }

    #[must_use]
    pub fn data_kinds(&self) -> Vec<DataKind> {
        self.data_ids.iter().copied().map(DataKind::from_id).collect()
    }
}

/// Location of every ensemble and sub-record in a file.
///
/// All vectors are indexed by ensemble number and have the same length. The index
/// only holds ensembles that scanned cleanly; [FileIndex::scan_error] records why
/// scanning stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileIndex {
    pub datatype_count: Vec<u8>,
    pub byte_count: Vec<u16>,
    /// Absolute offset of the ensemble following each ensemble.
    pub byteskip: Vec<u64>,
    pub address_offset: Vec<Vec<u16>>,
    pub data_id: Vec<Vec<u16>>,
    scan_error: ErrorCode,
}

impl FileIndex {
    pub(crate) fn failed(error: ErrorCode) -> Self {
        FileIndex {
            scan_error: error,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.byteskip.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.byteskip.is_empty()
    }

    /// Code that terminated the scan that produced this index.
    #[must_use]
    pub fn scan_error(&self) -> ErrorCode {
        self.scan_error
    }

    /// `own` if it is an error, otherwise the code the scan ended with.
    #[must_use]
    pub fn resolve_error(&self, own: ErrorCode) -> ErrorCode {
        if own.is_success() {
            self.scan_error
        } else {
            own
        }
    }

    /// True if the scan failed in a way that leaves nothing to extract.
    #[must_use]
    pub fn is_unusable(&self) -> bool {
        self.scan_error.is_file_access() || self.scan_error == ErrorCode::WrongRdiFileType
    }

    /// Absolute file offset of ensemble `i`, `None` past the end of the index.
    #[must_use]
    pub fn start(&self, i: usize) -> Option<u64> {
        match i {
            0 if !self.is_empty() => Some(0),
            0 => None,
            _ if i < self.len() => self.byteskip.get(i - 1).copied(),
            _ => None,
        }
    }

    /// Absolute file offset of the sub-record at position `pos` of ensemble `i`.
    #[must_use]
    pub fn offset(&self, i: usize, pos: usize) -> Option<u64> {
        let offset = self.address_offset.get(i)?.get(pos)?;
        Some(self.start(i)? + u64::from(*offset))
    }

    #[must_use]
    pub fn ensemble(&self, i: usize) -> Option<Ensemble> {
        Some(Ensemble {
            header_id: Ensemble::ID,
            source_id: Ensemble::ID,
            byte_count: *self.byte_count.get(i)?,
            num_data_types: *self.datatype_count.get(i)?,
            data_ids: self.data_id.get(i)?.clone(),
            address_offsets: self.address_offset.get(i)?.clone(),
            absolute_file_offset: self.start(i)?,
        })
    }

    /// Kinds of the sub-records in ensemble `i`, in offset-table order.
    #[must_use]
    pub fn data_kinds(&self, i: usize) -> Vec<DataKind> {
        self.data_id
            .get(i)
            .map(|ids| ids.iter().copied().map(DataKind::from_id).collect())
            .unwrap_or_default()
    }

    /// Position in the data-type table of ensemble `i` of the first id in `ids`.
    #[must_use]
    pub fn position(&self, i: usize, ids: &[u16]) -> Option<usize> {
        self.data_id.get(i)?.iter().position(|id| ids.contains(id))
    }

    /// Keep only the first `n` ensembles.
    pub fn truncate(&mut self, n: usize) {
        self.datatype_count.truncate(n);
        self.byte_count.truncate(n);
        self.byteskip.truncate(n);
        self.address_offset.truncate(n);
        self.data_id.truncate(n);
    }

    fn push(&mut self, ens: Ensemble) {
        self.datatype_count.push(ens.num_data_types);
        self.byte_count.push(ens.byte_count);
        self.byteskip.push(ens.absolute_file_offset + ens.size());
        self.address_offset.push(ens.address_offsets);
        self.data_id.push(ens.data_ids);
    }
}

/// Scan all ensembles readable from `reader`.
///
/// Never fails outright: the returned index holds every ensemble parsed before the
/// first framing, consistency, or read error, and the error is reported alongside.
/// If `verify_checksums` is set each ensemble's checksum must also match.
pub fn scan<R>(reader: &mut Reader<R>, verify_checksums: bool) -> Decoded<FileIndex>
where
    R: Read + Seek,
{
    let mut index = FileIndex::default();
    let error = scan_into(reader, verify_checksums, &mut index);
    index.scan_error = error;
    let ensembles = index.len();
    debug!(ensembles, %error, "scanned ensembles");
    Decoded::new(index, ensembles, error)
}

fn scan_into<R>(reader: &mut Reader<R>, verify_checksums: bool, index: &mut FileIndex) -> ErrorCode
where
    R: Read + Seek,
{
    let mut base: u64 = 0;
    loop {
        let i = index.len();
        if let Err(code) = reader.seek(base) {
            return code;
        }
        let buf = match reader.read_upto(Ensemble::HEADER_LEN) {
            Ok(buf) => buf,
            Err(code) => return code,
        };
        if buf.is_empty() {
            if i == 0 {
                warn!("fileheader: file contains no data");
                return ErrorCode::FileCorrupted;
            }
            return ErrorCode::Success;
        }
        if buf.len() < Ensemble::HEADER_LEN {
            warn!(
                got = buf.len(),
                "fileheader: partial header at ensemble {}; ensembles reset to {i}",
                i + 1
            );
            return ErrorCode::FileCorrupted;
        }

        let (header_id, source_id) = (buf[0], buf[1]);
        let byte_count = u16::from_le_bytes([buf[2], buf[3]]);
        let num_data_types = buf[5];

        if header_id != Ensemble::ID || source_id != Ensemble::ID {
            if i == 0 {
                warn!(header_id, source_id, "fileheader: not an RDI PD0 file");
                return ErrorCode::WrongRdiFileType;
            }
            warn!(
                header_id,
                source_id,
                "fileheader: bad ensemble id at ensemble {}; ensembles reset to {i}",
                i + 1
            );
            return ErrorCode::IdNotFound;
        }
        let table = match reader.read_exact(2 * usize::from(num_data_types)) {
            Ok(table) => table,
            Err(code) => {
                warn!(
                    "fileheader: offset table truncated at ensemble {}; ensembles reset to {i}",
                    i + 1
                );
                return code;
            }
        };
        if let Some(expected) = index.datatype_count.first() {
            if num_data_types != *expected {
                warn!(
                    expected,
                    found = num_data_types,
                    "fileheader: data type count changed at ensemble {}; ensembles reset to {i}",
                    i + 1
                );
                return ErrorCode::DatatypeMismatch;
            }
        }
        let address_offsets: Vec<u16> = table
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();

        let mut data_ids = Vec::with_capacity(address_offsets.len());
        for offset in &address_offsets {
            let id = reader
                .seek(base + u64::from(*offset))
                .and_then(|_| reader.read_array::<2>());
            match id {
                Ok(buf) => data_ids.push(u16::from_le_bytes(buf)),
                Err(code) => {
                    warn!(
                        offset,
                        "fileheader: data id unreadable at ensemble {}; ensembles reset to {i}",
                        i + 1
                    );
                    return code;
                }
            }
        }

        if verify_checksums {
            let (ok, code) = verify_ensemble_checksum(reader, base, usize::from(byte_count));
            if !ok {
                warn!(
                    "fileheader: checksum failed at ensemble {}; ensembles reset to {i}",
                    i + 1
                );
                return code;
            }
        }

        let ens = Ensemble {
            header_id,
            source_id,
            byte_count,
            num_data_types,
            data_ids,
            address_offsets,
            absolute_file_offset: base,
        };
        base += ens.size();
        index.push(ens);
    }
}

/// Size and uniformity checks of a scanned file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCheck {
    pub system_file_size: u64,
    /// Sum of all indexed ensemble lengths including checksums.
    pub calculated_file_size: u64,
    pub file_size_mb: f64,
    pub file_size_match: bool,
    pub byte_uniformity: bool,
    pub datatype_uniformity: bool,
}

/// Compare the size on disk of `path` with what `index` accounts for.
///
/// # Errors
/// File-access [ErrorCode]s if the file metadata cannot be read.
pub fn check_file<P: AsRef<Path>>(path: P, index: &FileIndex) -> Result<FileCheck> {
    let system_file_size = std::fs::metadata(path.as_ref())
        .map_err(ErrorCode::from)?
        .len();
    let calculated_file_size: u64 = index
        .byte_count
        .iter()
        .map(|b| u64::from(*b) + CHECKSUM_LEN as u64)
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let file_size_mb = calculated_file_size as f64 / 1_048_576.0;

    Ok(FileCheck {
        system_file_size,
        calculated_file_size,
        file_size_mb,
        file_size_match: system_file_size == calculated_file_size,
        byte_uniformity: all_equal(&index.byte_count),
        datatype_uniformity: all_equal(&index.datatype_count),
    })
}

fn all_equal<T: PartialEq>(vals: &[T]) -> bool {
    vals.windows(2).all(|w| w[0] == w[1])
}
