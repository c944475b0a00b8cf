use std::path::Path;

use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::checksum;
use crate::datatype::{self, BeamCellData, Geometry, Variable};
use crate::error::{Decoded, ErrorCode, Result};
use crate::file::Pd0File;
use crate::header::{self, FileIndex};
use crate::io::FileReader;
use crate::leader::{fixed, variable, FixedLeader, VariableLeader};

/// Options shared by all decode operations.
///
/// Each operation opens its own handle on the file, and the handle is closed before
/// the operation returns. Operations that accept a [FileIndex] use it instead of
/// scanning the file again; results are the same either way.
///
/// ```no_run
/// use pd0::Decoder;
///
/// let decoder = Decoder::builder().verify_checksums(true).num_threads(4).build();
/// let index = decoder.fileheader("ADCP.000");
/// let fixed = decoder.fixedleader("ADCP.000", Some(&index.data));
/// println!("{} ensembles, {}", fixed.ensembles, fixed.error);
/// ```
#[derive(Debug, Clone, Copy, Default, TypedBuilder)]
pub struct Decoder {
    /// Verify each ensemble's checksum while scanning. A mismatch stops the scan
    /// with [ErrorCode::ChecksumError].
    #[builder(default)]
    verify_checksums: bool,
    /// Number of threads used to decode ensembles. If not provided the global rayon
    /// pool is used.
    #[builder(default, setter(strip_option))]
    num_threads: Option<usize>,
}

impl Decoder {
    /// Scan the ensemble framing of the file at `path`.
    pub fn fileheader<P: AsRef<Path>>(&self, path: P) -> Decoded<FileIndex> {
        let path = path.as_ref();
        match FileReader::open(path) {
            Ok(mut reader) => header::scan(&mut reader, self.verify_checksums),
            Err(code) => Decoded::new(FileIndex::failed(code), 0, code),
        }
    }

    /// Decode the Fixed Leader of every ensemble. `index` is scanned from the file if
    /// not provided.
    pub fn fixedleader<P: AsRef<Path>>(
        &self,
        path: P,
        index: Option<&FileIndex>,
    ) -> Decoded<FixedLeader> {
        self.with_index(path.as_ref(), index, FixedLeader::empty, fixed::extract)
    }

    /// Decode the Variable Leader of every ensemble. `index` is scanned from the file
    /// if not provided.
    pub fn variableleader<P: AsRef<Path>>(
        &self,
        path: P,
        index: Option<&FileIndex>,
    ) -> Decoded<VariableLeader> {
        self.with_index(path.as_ref(), index, VariableLeader::empty, variable::extract)
    }

    /// Decode the beam by cell data type called `name`.
    ///
    /// Beam and cell counts come from `geometry` if provided, otherwise from the
    /// file's Fixed Leaders.
    ///
    /// # Errors
    /// [ErrorCode::ValueError] if `name` is not a [Variable] name. This is checked
    /// before the file is touched; decode failures are reported in the returned
    /// [Decoded].
    pub fn datatype<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        index: Option<&FileIndex>,
        geometry: Option<&Geometry>,
    ) -> Result<Decoded<BeamCellData>> {
        let variable = name.parse::<Variable>().map_err(|code| {
            warn!(name, "datatype: invalid variable name");
            code
        })?;
        Ok(self.variable(path, variable, index, geometry))
    }

    /// Decode the beam by cell data type `variable`. See [Decoder::datatype].
    pub fn variable<P: AsRef<Path>>(
        &self,
        path: P,
        variable: Variable,
        index: Option<&FileIndex>,
        geometry: Option<&Geometry>,
    ) -> Decoded<BeamCellData> {
        self.with_index(
            path.as_ref(),
            index,
            || BeamCellData::empty(variable),
            |reader, index| match geometry {
                Some(geometry) => {
                    datatype::extract(reader, index, variable, geometry, index.scan_error())
                }
                None => {
                    let fixed = fixed::extract(reader, index);
                    let geometry = Geometry::from_fixed_leader(&fixed.data);
                    datatype::extract(reader, index, variable, &geometry, fixed.error)
                }
            },
        )
    }

    /// Check the checksum of every ensemble, one code per ensemble.
    ///
    /// A mismatch does not stop the check. If `index` is not provided the file is
    /// scanned without checksum verification so that every framed ensemble is checked.
    pub fn checksums<P: AsRef<Path>>(
        &self,
        path: P,
        index: Option<&FileIndex>,
    ) -> Decoded<Vec<ErrorCode>> {
        let decoder = Decoder {
            verify_checksums: false,
            ..*self
        };
        decoder.with_index(path.as_ref(), index, Vec::new, checksum::verify_all)
    }

    /// Decode everything in the file, sharing a single scan.
    pub fn read<P: AsRef<Path>>(&self, path: P) -> Pd0File {
        let path = path.as_ref();
        let index = self.fileheader(path);
        let fixed = self.fixedleader(path, Some(&index.data));
        let variable = self.variableleader(path, Some(&index.data));

        let geometry = Geometry::from_fixed_leader(&fixed.data);
        let kinds = index.data.data_kinds(0);
        let data = Variable::ALL
            .into_iter()
            .filter(|v| kinds.contains(&v.kind()))
            .map(|v| self.variable(path, v, Some(&index.data), Some(&geometry)))
            .collect();

        Pd0File::new(path, index, fixed, variable, data)
    }

    // Open `path`, obtain an index, and run `extract` with them unless the index is
    // unusable, in which case an empty result carries the scan's code.
    fn with_index<T, E, F>(
        &self,
        path: &Path,
        index: Option<&FileIndex>,
        empty: E,
        extract: F,
    ) -> Decoded<T>
    where
        T: Send,
        E: FnOnce() -> T,
        F: FnOnce(&mut FileReader, &FileIndex) -> Decoded<T> + Send,
    {
        let mut reader = match FileReader::open(path) {
            Ok(reader) => reader,
            Err(code) => return Decoded::new(empty(), 0, code),
        };
        let scanned;
        let index = match index {
            Some(index) => index,
            None => {
                scanned = header::scan(&mut reader, self.verify_checksums).data;
                &scanned
            }
        };
        if index.is_unusable() {
            debug!(error = %index.scan_error(), "nothing to extract");
            return Decoded::new(empty(), 0, index.scan_error());
        }
        self.install(|| extract(&mut reader, index))
    }

    fn install<T, F>(&self, f: F) -> T
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        let Some(num) = self.num_threads else {
            return f();
        };
        match rayon::ThreadPoolBuilder::new().num_threads(num).build() {
            Ok(pool) => pool.install(f),
            Err(err) => {
                warn!(%err, num, "failed to build decode thread pool; using global pool");
                f()
            }
        }
    }
}

/// [Decoder::fileheader] with default options.
pub fn fileheader<P: AsRef<Path>>(path: P) -> Decoded<FileIndex> {
    Decoder::default().fileheader(path)
}

/// [Decoder::fixedleader] with default options.
pub fn fixedleader<P: AsRef<Path>>(path: P, index: Option<&FileIndex>) -> Decoded<FixedLeader> {
    Decoder::default().fixedleader(path, index)
}

/// [Decoder::variableleader] with default options.
pub fn variableleader<P: AsRef<Path>>(
    path: P,
    index: Option<&FileIndex>,
) -> Decoded<VariableLeader> {
    Decoder::default().variableleader(path, index)
}

/// [Decoder::datatype] with default options.
///
/// # Errors
/// [ErrorCode::ValueError] if `name` is not a [Variable] name.
pub fn datatype<P: AsRef<Path>>(
    path: P,
    name: &str,
    index: Option<&FileIndex>,
    geometry: Option<&Geometry>,
) -> Result<Decoded<BeamCellData>> {
    Decoder::default().datatype(path, name, index, geometry)
}

/// [Decoder::checksums] with default options.
pub fn checksums<P: AsRef<Path>>(path: P, index: Option<&FileIndex>) -> Decoded<Vec<ErrorCode>> {
    Decoder::default().checksums(path, index)
}

/// [Decoder::read] with default options.
pub fn read<P: AsRef<Path>>(path: P) -> Pd0File {
    Decoder::default().read(path)
}
