//! Decoder for RDI Workhorse ADCP PD0 binary ensemble files.
//!
//! A PD0 file is a sequence of ensembles, each holding a header, an offset table and
//! a set of typed sub-records, followed by a checksum. Decoding is done in two steps:
//! [fileheader] scans the framing of every ensemble into a [FileIndex], and the
//! extractors ([fixedleader], [variableleader], [datatype]) use that index to decode
//! sub-records into arrays with one column per ensemble.
//!
//! Decoding never fails outright on bad file content. Every operation returns a
//! [Decoded] holding whatever ensembles decoded cleanly along with the [ErrorCode]
//! that stopped decoding, so callers must check `error` even when data is present.
//!
//! ```no_run
//! let index = pd0::fileheader("ADCP.000");
//! let fixed = pd0::fixedleader("ADCP.000", Some(&index.data));
//! let velocity = pd0::datatype("ADCP.000", "velocity", Some(&index.data), None).unwrap();
//! if !velocity.is_success() {
//!     eprintln!("decoded {} ensembles: {}", velocity.ensembles, velocity.error);
//! }
//! # let _ = fixed;
//! ```
mod error;

pub mod checksum;
pub mod datatype;
pub mod decoder;
pub mod file;
pub mod header;
pub mod io;
pub mod kind;
pub mod leader;

pub use checksum::{calculate_checksum, verify_ensemble_checksum};
pub use datatype::{BeamCellArray, BeamCellData, Geometry, Variable};
pub use decoder::{checksums, datatype, fileheader, fixedleader, read, variableleader, Decoder};
pub use error::{Decoded, ErrorCode, Result};
pub use file::Pd0File;
pub use header::{check_file, Ensemble, FileCheck, FileIndex};
pub use io::{FileReader, Reader};
pub use kind::DataKind;
pub use leader::{FixedField, FixedLeader, VariableField, VariableLeader};
