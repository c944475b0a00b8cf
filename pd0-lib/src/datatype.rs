//! Beam by cell data types: velocity, correlation, echo intensity, percent good
//! and status.
use std::fmt;
use std::io::{Read, Seek};
use std::str::FromStr;

use ndarray::{s, Array3};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Decoded, ErrorCode};
use crate::header::FileIndex;
use crate::io::Reader;
use crate::kind::DataKind;
use crate::leader::FixedLeader;

/// A beam by cell data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Variable {
    Velocity,
    Correlation,
    Echo,
    PercentGood,
    Status,
}

impl Variable {
    pub const ALL: [Variable; 5] = [
        Variable::Velocity,
        Variable::Correlation,
        Variable::Echo,
        Variable::PercentGood,
        Variable::Status,
    ];

    /// Name accepted by [Variable::from_str].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Variable::Velocity => "velocity",
            Variable::Correlation => "correlation",
            Variable::Echo => "echo",
            Variable::PercentGood => "percent good",
            Variable::Status => "status",
        }
    }

    #[must_use]
    pub fn kind(self) -> DataKind {
        match self {
            Variable::Velocity => DataKind::Velocity,
            Variable::Correlation => DataKind::Correlation,
            Variable::Echo => DataKind::Echo,
            Variable::PercentGood => DataKind::PercentGood,
            Variable::Status => DataKind::Status,
        }
    }

    #[must_use]
    pub fn ids(self) -> &'static [u16] {
        self.kind().ids()
    }

    #[must_use]
    pub fn from_kind(kind: DataKind) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.kind() == kind)
    }
}

impl FromStr for Variable {
    type Err = ErrorCode;

    /// Exact, case-sensitive match on [Variable::name].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or(ErrorCode::ValueError)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Element type of a beam by cell array.
pub trait Sample: Copy + Send + Sync + 'static {
    /// Bytes per sample on disk.
    const WIDTH: usize;
    /// Value of array elements with no data.
    const FILL: Self;

    fn from_le(dat: &[u8]) -> Self;
}

impl Sample for i16 {
    const WIDTH: usize = 2;
    const FILL: Self = i16::MIN;

    fn from_le(dat: &[u8]) -> Self {
        i16::from_le_bytes([dat[0], dat[1]])
    }
}

impl Sample for u8 {
    const WIDTH: usize = 1;
    const FILL: Self = 0;

    fn from_le(dat: &[u8]) -> Self {
        dat[0]
    }
}

/// Decoded samples indexed `[beam, cell, ensemble]`.
#[derive(Debug, Clone, PartialEq)]
pub enum BeamCellArray {
    /// Velocity; missing samples are `-32768`.
    I16(Array3<i16>),
    U8(Array3<u8>),
}

impl BeamCellArray {
    #[must_use]
    pub fn empty(variable: Variable, max_beam: usize, max_cell: usize) -> Self {
        let shape = (max_beam, max_cell, 0);
        match variable {
            Variable::Velocity => BeamCellArray::I16(Array3::from_elem(shape, i16::FILL)),
            _ => BeamCellArray::U8(Array3::from_elem(shape, u8::FILL)),
        }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match self {
            BeamCellArray::I16(a) => a.shape(),
            BeamCellArray::U8(a) => a.shape(),
        }
    }

    #[must_use]
    pub fn ensembles(&self) -> usize {
        self.shape()[2]
    }

    #[must_use]
    pub fn as_i16(&self) -> Option<&Array3<i16>> {
        match self {
            BeamCellArray::I16(a) => Some(a),
            BeamCellArray::U8(_) => None,
        }
    }

    #[must_use]
    pub fn as_u8(&self) -> Option<&Array3<u8>> {
        match self {
            BeamCellArray::U8(a) => Some(a),
            BeamCellArray::I16(_) => None,
        }
    }

    /// Keep only the first `n` ensembles.
    pub fn truncate(&mut self, n: usize) {
        let n = n.min(self.ensembles());
        match self {
            BeamCellArray::I16(a) => *a = a.slice(s![.., .., ..n]).to_owned(),
            BeamCellArray::U8(a) => *a = a.slice(s![.., .., ..n]).to_owned(),
        }
    }
}

/// Beam and cell count of each ensemble.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub beams: Vec<usize>,
    pub cells: Vec<usize>,
}

impl Geometry {
    #[must_use]
    pub fn new(beams: Vec<usize>, cells: Vec<usize>) -> Self {
        Geometry { beams, cells }
    }

    #[must_use]
    pub fn from_fixed_leader(leader: &FixedLeader) -> Self {
        Geometry {
            beams: leader.beams(),
            cells: leader.cells(),
        }
    }

    /// Number of ensembles with both counts known.
    #[must_use]
    pub fn len(&self) -> usize {
        self.beams.len().min(self.cells.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn max_beam(&self) -> usize {
        self.beams.iter().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn max_cell(&self) -> usize {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Keep only the first `n` ensembles.
    pub fn truncate(&mut self, n: usize) {
        self.beams.truncate(n);
        self.cells.truncate(n);
    }
}

/// Output of the beam by cell extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamCellData {
    pub variable: Variable,
    pub values: BeamCellArray,
    /// Geometry of the decoded ensembles.
    pub geometry: Geometry,
}

impl BeamCellData {
    #[must_use]
    pub fn empty(variable: Variable) -> Self {
        BeamCellData {
            variable,
            values: BeamCellArray::empty(variable, 0, 0),
            geometry: Geometry::default(),
        }
    }

    #[must_use]
    pub fn ensembles(&self) -> usize {
        self.values.ensembles()
    }

    pub fn truncate(&mut self, n: usize) {
        self.values.truncate(n);
        self.geometry.truncate(n);
    }
}

/// Decode `variable` for every ensemble in `index` with the per-ensemble counts in
/// `geometry`. `geometry_error` is the code reported while obtaining the geometry.
pub(crate) fn extract<R>(
    reader: &mut Reader<R>,
    index: &FileIndex,
    variable: Variable,
    geometry: &Geometry,
    geometry_error: ErrorCode,
) -> Decoded<BeamCellData>
where
    R: Read + Seek,
{
    let mut geometry = geometry.clone();
    geometry.truncate(index.len());
    let n = geometry.len();

    let (values, error) = match variable {
        Variable::Velocity => {
            let (arr, error) = extract_samples::<i16, R>(reader, index, variable, &geometry, n);
            (BeamCellArray::I16(arr), error)
        }
        _ => {
            let (arr, error) = extract_samples::<u8, R>(reader, index, variable, &geometry, n);
            (BeamCellArray::U8(arr), error)
        }
    };

    let ensembles = values.ensembles();
    geometry.truncate(ensembles);
    let error = if error.is_success() { geometry_error } else { error };
    debug!(%variable, ensembles, %error, "decoded data type");
    Decoded::new(
        BeamCellData {
            variable,
            values,
            geometry,
        },
        ensembles,
        error,
    )
}

fn extract_samples<T, R>(
    reader: &mut Reader<R>,
    index: &FileIndex,
    variable: Variable,
    geometry: &Geometry,
    n: usize,
) -> (Array3<T>, ErrorCode)
where
    T: Sample,
    R: Read + Seek,
{
    let (max_beam, max_cell) = (geometry.max_beam(), geometry.max_cell());
    let elements = max_beam
        .checked_mul(max_cell)
        .and_then(|v| v.checked_mul(n.max(1)))
        .and_then(|v| v.checked_mul(T::WIDTH))
        .filter(|v| isize::try_from(*v).is_ok());
    if elements.is_none() {
        warn!(max_beam, max_cell, "datatype: geometry too large for {variable}");
        return (Array3::from_elem((0, 0, 0), T::FILL), ErrorCode::ValueError);
    }
    let empty = || Array3::from_elem((max_beam, max_cell, 0), T::FILL);
    if n == 0 {
        return (empty(), ErrorCode::Success);
    }

    // The id's position in the data type table is taken from the first ensemble.
    let Some(pos) = index.position(0, variable.ids()) else {
        warn!("datatype: {variable} id not found in the data type table");
        return (empty(), ErrorCode::IdNotFound);
    };

    let mut raw: Vec<Vec<u8>> = Vec::with_capacity(n);
    let mut error = ErrorCode::Success;
    for i in 0..n {
        let Some(start) = index.offset(i, pos) else {
            warn!(
                "datatype: {variable} id not found in ensemble {}; ensembles reset to {i}",
                i + 1
            );
            error = ErrorCode::IdNotFound;
            break;
        };
        // samples follow the two byte id
        let start = start + 2;
        let Some(len) = geometry.beams[i]
            .checked_mul(geometry.cells[i])
            .and_then(|v| v.checked_mul(T::WIDTH))
        else {
            error = ErrorCode::ValueError;
            break;
        };
        match reader.seek(start).and_then(|_| reader.read_exact(len)) {
            Ok(dat) => raw.push(dat),
            Err(code) => {
                warn!(
                    "datatype: unable to extract {variable} for ensemble {}; ensembles reset to {i}",
                    i + 1
                );
                error = code;
                break;
            }
        }
    }

    let samples: Vec<Vec<T>> = raw
        .par_iter()
        .map(|dat| dat.chunks_exact(T::WIDTH).map(T::from_le).collect())
        .collect();

    let mut arr = Array3::from_elem((max_beam, max_cell, samples.len()), T::FILL);
    for (e, vals) in samples.iter().enumerate() {
        let cells = geometry.cells[e];
        for b in 0..geometry.beams[e] {
            for c in 0..cells {
                arr[[b, c, e]] = vals[b * cells + c];
            }
        }
    }
    (arr, error)
}
