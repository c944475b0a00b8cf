//! Ensemble checksums.
//!
//! Each ensemble is followed by a little-endian u16 holding the sum of all ensemble
//! bytes (header through the last data byte) modulo 65536.
use std::io::{Read, Seek};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{Decoded, ErrorCode};
use crate::header::FileIndex;
use crate::io::Reader;

/// Number of checksum bytes trailing each ensemble.
pub const CHECKSUM_LEN: usize = 2;

/// Sum of `dat` masked to 16 bits.
#[must_use]
pub fn calculate_checksum(dat: &[u8]) -> u32 {
    dat.iter().fold(0u32, |acc, b| (acc + u32::from(*b)) & 0xFFFF)
}

/// Verify the checksum of the ensemble of `ensemble_size` bytes starting at `start_pos`.
///
/// Returns `(true, Success)` on match, `(false, ChecksumError)` on mismatch and
/// `(false, FileCorrupted)` if the ensemble or its checksum cannot be fully read.
/// Seek or read failures other than EOF produce `(false, IoError)`.
pub fn verify_ensemble_checksum<R>(
    reader: &mut Reader<R>,
    start_pos: u64,
    ensemble_size: usize,
) -> (bool, ErrorCode)
where
    R: Read + Seek,
{
    if let Err(code) = reader.seek(start_pos) {
        return (false, code);
    }
    let dat = match reader.read_exact(ensemble_size) {
        Ok(dat) => dat,
        Err(code) => return (false, code),
    };
    let stored = match reader.read_array::<CHECKSUM_LEN>() {
        Ok(buf) => u32::from(u16::from_le_bytes(buf)),
        Err(code) => return (false, code),
    };
    let computed = calculate_checksum(&dat);
    if computed != stored {
        debug!(
            start_pos,
            ensemble_size, computed, stored, "ensemble checksum mismatch"
        );
        return (false, ErrorCode::ChecksumError);
    }
    (true, ErrorCode::Success)
}

/// Check the checksum of every ensemble in `index`, one code per ensemble.
///
/// Unlike a verifying scan this does not stop at a mismatch. It stops at the first
/// ensemble that cannot be read in full.
pub(crate) fn verify_all<R>(reader: &mut Reader<R>, index: &FileIndex) -> Decoded<Vec<ErrorCode>>
where
    R: Read + Seek,
{
    let mut raw = Vec::with_capacity(index.len());
    let mut error = ErrorCode::Success;
    for i in 0..index.len() {
        let Some(ens) = index.ensemble(i) else {
            error = ErrorCode::FileCorrupted;
            break;
        };
        let len = usize::from(ens.byte_count) + CHECKSUM_LEN;
        match reader
            .seek(ens.absolute_file_offset)
            .and_then(|_| reader.read_exact(len))
        {
            Ok(dat) => raw.push(dat),
            Err(code) => {
                warn!(
                    "checksum: unable to read ensemble {}; ensembles reset to {i}: {code}",
                    i + 1
                );
                error = code;
                break;
            }
        }
    }

    let codes: Vec<ErrorCode> = raw
        .par_iter()
        .map(|dat| {
            let (body, tail) = dat.split_at(dat.len() - CHECKSUM_LEN);
            let stored = u32::from(u16::from_le_bytes([tail[0], tail[1]]));
            if calculate_checksum(body) == stored {
                ErrorCode::Success
            } else {
                ErrorCode::ChecksumError
            }
        })
        .collect();
    let n = codes.len();
    Decoded::new(codes, n, index.resolve_error(error))
}
