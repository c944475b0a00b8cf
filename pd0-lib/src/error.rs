use std::io;

use serde::Serialize;

/// Status of a decode operation.
///
/// Every decoder operation reports exactly one of these alongside whatever data it
/// managed to decode. [ErrorCode::Success] is the only non-error value; all other
/// codes may still be accompanied by a non-empty, partially valid result.
#[derive(thiserror::Error, Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ErrorCode {
    #[default]
    #[error("Success")]
    Success = 0,
    #[error("Error: File not found.")]
    FileNotFound = 1,
    #[error("Error: Permission denied.")]
    PermissionDenied = 2,
    #[error("IO Error: Unable to open file.")]
    IoError = 3,
    #[error("Error: Out of memory.")]
    OutOfMemory = 4,
    /// Header or source id of the very first ensemble is not `0x7F`.
    #[error("Error: Wrong RDI File Type.")]
    WrongRdiFileType = 5,
    /// An expected sub-record id is absent.
    #[error("Error: Data type ID not found.")]
    IdNotFound = 6,
    /// The number of data types changed between ensembles.
    #[error("Warning: Data type mismatch.")]
    DatatypeMismatch = 7,
    /// Short read or unpack failure mid-file.
    #[error("Warning: File Corrupted.")]
    FileCorrupted = 8,
    /// Invalid caller argument.
    #[error("Value Error for incorrect argument.")]
    ValueError = 9,
    #[error("Error: Checksum mismatch.")]
    ChecksumError = 10,
    #[error("Unknown error.")]
    UnknownError = 99,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 12] = [
        ErrorCode::Success,
        ErrorCode::FileNotFound,
        ErrorCode::PermissionDenied,
        ErrorCode::IoError,
        ErrorCode::OutOfMemory,
        ErrorCode::WrongRdiFileType,
        ErrorCode::IdNotFound,
        ErrorCode::DatatypeMismatch,
        ErrorCode::FileCorrupted,
        ErrorCode::ValueError,
        ErrorCode::ChecksumError,
        ErrorCode::UnknownError,
    ];

    /// Message reported by [Self::message_for] for codes outside the taxonomy.
    pub const INVALID_CODE_MESSAGE: &'static str = "Error: Invalid error code.";

    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn message(self) -> String {
        self.to_string()
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Reverse lookup of a message. Unknown messages map to [ErrorCode::UnknownError].
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.to_string() == message)
            .unwrap_or(ErrorCode::UnknownError)
    }

    /// Message for a raw numeric code, or [Self::INVALID_CODE_MESSAGE].
    #[must_use]
    pub fn message_for(code: u8) -> String {
        Self::from_code(code).map_or_else(|| Self::INVALID_CODE_MESSAGE.to_string(), Self::message)
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == ErrorCode::Success
    }

    /// True for failures to access the file at all. These short-circuit before any
    /// parsing and always come with empty results.
    #[must_use]
    pub fn is_file_access(self) -> bool {
        matches!(
            self,
            ErrorCode::FileNotFound
                | ErrorCode::PermissionDenied
                | ErrorCode::IoError
                | ErrorCode::OutOfMemory
        )
    }
}

impl From<io::ErrorKind> for ErrorCode {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            io::ErrorKind::OutOfMemory => ErrorCode::OutOfMemory,
            io::ErrorKind::UnexpectedEof => ErrorCode::FileCorrupted,
            _ => ErrorCode::IoError,
        }
    }
}

impl From<&io::Error> for ErrorCode {
    fn from(err: &io::Error) -> Self {
        err.kind().into()
    }
}

impl From<io::Error> for ErrorCode {
    fn from(err: io::Error) -> Self {
        (&err).into()
    }
}

pub type Result<T> = std::result::Result<T, ErrorCode>;

/// Output of a decoder operation: whatever was decoded, how many ensembles that covers,
/// and the code that terminated decoding.
///
/// A non-success `error` does not imply `data` is empty. Format and consistency errors
/// stop decoding but keep every ensemble decoded before the failure point.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub data: T,
    pub ensembles: usize,
    pub error: ErrorCode,
}

impl<T> Decoded<T> {
    #[must_use]
    pub fn new(data: T, ensembles: usize, error: ErrorCode) -> Self {
        Self {
            data,
            ensembles,
            error,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_success()
    }

    pub fn map<U, F>(self, f: F) -> Decoded<U>
    where
        F: FnOnce(T) -> U,
    {
        Decoded {
            data: f(self.data),
            ensembles: self.ensembles,
            error: self.error,
        }
    }
}
