use std::path::Path;

use anyhow::{bail, Result};
use pd0::{Decoder, ErrorCode};
use tracing::{info, warn};

pub fn checksum(fpath: &Path, decoder: &Decoder) -> Result<()> {
    let zult = decoder.checksums(fpath, None);
    if zult.data.is_empty() && !zult.is_success() {
        bail!("no ensembles checked: {}", zult.error);
    }
    if !zult.is_success() {
        warn!(ensembles = zult.ensembles, "checking stopped early: {}", zult.error);
    }

    let bad: Vec<usize> = zult
        .data
        .iter()
        .enumerate()
        .filter(|(_, code)| **code != ErrorCode::Success)
        .map(|(i, _)| i + 1)
        .collect();
    for num in &bad {
        warn!(ensemble = num, "{}", ErrorCode::ChecksumError);
    }

    if bad.is_empty() {
        info!("{} ensembles verified", zult.ensembles);
        Ok(())
    } else {
        bail!("{} of {} ensembles failed: {bad:?}", bad.len(), zult.ensembles);
    }
}
