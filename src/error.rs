use std::{fmt, io};

use crate::objects::{Object, ObjectType};

#[derive(Debug)]
pub enum ParseError {
    MismatchedByte {
        expected: u8,
        found: Option<u8>,
    },
    UnexpectedEof,
    IoError(io::Error),
    MismatchedObjectType {
        expected: ObjectType,
        found: Object,
    },
    InvalidDictionaryValueForKey {
        key: &'static str,
        found: Object,
    },
    MissingRequiredKey {
        key: &'static str,
    },
    ArrayOfInvalidLength {
        expected: usize,
    },
    UnrecognizedVariant {
        found: String,
        ty: &'static str,
    },
    MismatchedTypeKey {
        expected: &'static str,
        found: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MismatchedByte { expected, found } => {
                write!(f, "expected byte {:?}, found {:?}", expected, found)
            }
            Self::UnexpectedEof => write!(f, "unexpected eof"),
            Self::IoError(err) => write!(f, "io error: {}", err),
            Self::MismatchedObjectType { expected, found } => {
                write!(f, "expected object of type {:?}, found {:?}", expected, found)
            }
            Self::InvalidDictionaryValueForKey { key, found } => {
                write!(f, "invalid dictionary value for key {:?}: {:?}", key, found)
            }
            Self::MissingRequiredKey { key } => write!(f, "missing required key {:?}", key),
            Self::ArrayOfInvalidLength { expected } => {
                write!(f, "expected array of length {}", expected)
            }
            Self::UnrecognizedVariant { found, ty } => {
                write!(f, "unrecognized variant {:?} for {}", found, ty)
            }
            Self::MismatchedTypeKey { expected, found } => {
                write!(f, "expected /Type {:?}, found {:?}", expected, found)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

/// Errors fatal to the current draw. Content rendered before the failure
/// remains on the canvas
#[derive(Debug)]
pub enum RenderError {
    /// A `Q` with no matching `q`, or a content stream ending with unbalanced
    /// `q` operators
    MismatchedSaveRestore,
    /// An operator found fewer operands on the stack than it consumes. The
    /// interpreter recovers from this by consuming what is available; the
    /// error is surfaced only when recovery is impossible
    StackUnderflow,
    /// The JPEG entropy stream is corrupt (bad Huffman code, wrong restart
    /// marker, invalid marker sequence)
    CorruptEntropyStream(String),
    /// The embedded zlib stream of a predictor-coded image fails the header
    /// legality check
    InvalidZlibHeader,
    /// A decoder slot for a filter this crate does not implement
    UnsupportedFilter(&'static str),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MismatchedSaveRestore => write!(f, "mismatched save/restore in content stream"),
            Self::StackUnderflow => write!(f, "operand stack underflow"),
            Self::CorruptEntropyStream(why) => write!(f, "corrupt entropy stream: {}", why),
            Self::InvalidZlibHeader => write!(f, "invalid zlib header"),
            Self::UnsupportedFilter(name) => write!(f, "unsupported filter: {}", name),
        }
    }
}

impl std::error::Error for RenderError {}

pub type PdfResult<T> = anyhow::Result<T>;
