// Dump Error Handling

use std::fmt;

use crate::value::StringDescriptor;

/// Errors that abort a whole run. Anything that only spoils a single record
/// is a `DecodeError` instead and ends up as a `Warning` on the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpError {
    // The zero page pointers could not be read
    TruncatedImage {
        address: usize,
        base: usize,
        end: usize,
    },

    // Acquisition errors
    Io(String),
    Monitor(String),

    // Configuration errors
    Config(String),
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DumpError::TruncatedImage { address, base, end } => {
                write!(
                    f,
                    "Memory image ${:04X}-${:04X} does not cover required address ${:04X}",
                    base,
                    end.saturating_sub(1),
                    address
                )
            }
            DumpError::Io(msg) => write!(f, "IO error: {}", msg),
            DumpError::Monitor(msg) => write!(f, "Monitor error: {}", msg),
            DumpError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DumpError {}

impl From<std::io::Error> for DumpError {
    fn from(e: std::io::Error) -> Self {
        DumpError::Io(e.to_string())
    }
}

/// What went wrong while decoding a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    OutOfRange { address: usize },
    UnrecognizedName { bytes: [u8; 2] },
    FunctionArray,
    RecordLength { length: u16 },
    TruncatedRecord { available: usize, needed: usize },
    IncompleteArray { declared: usize, decoded: usize },
    /// The element count does not fit in memory at all
    ElementCountOverflow { dimensions: Vec<u16> },
    TruncatedHeap { length: u8 },
}

/// A per-record decode failure. `offset` is the address of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub offset: usize,
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    pub fn new(offset: usize, kind: DecodeErrorKind) -> Self {
        DecodeError { offset, kind }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "record at ${:04X}: ", self.offset)?;
        match &self.kind {
            DecodeErrorKind::OutOfRange { address } => {
                write!(f, "address ${:04X} is outside the memory image", address)
            }
            DecodeErrorKind::UnrecognizedName { bytes } => {
                write!(
                    f,
                    "unrecognized variable name bytes ${:02X} ${:02X}",
                    bytes[0], bytes[1]
                )
            }
            DecodeErrorKind::FunctionArray => {
                write!(f, "function marker is not valid for an array")
            }
            DecodeErrorKind::RecordLength { length } => {
                write!(f, "record length {} is too short to skip", length)
            }
            DecodeErrorKind::TruncatedRecord { available, needed } => {
                write!(
                    f,
                    "truncated record, {} of {} bytes available",
                    available, needed
                )
            }
            DecodeErrorKind::IncompleteArray { declared, decoded } => {
                write!(
                    f,
                    "only {} of {} declared elements could be decoded",
                    decoded, declared
                )
            }
            DecodeErrorKind::ElementCountOverflow { dimensions } => {
                write!(f, "dimensions {:?} overflow the element count", dimensions)
            }
            DecodeErrorKind::TruncatedHeap { length } => {
                write!(
                    f,
                    "string of {} bytes runs past the bottom of the heap",
                    length
                )
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// A string descriptor whose pointer does not lead anywhere readable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedStringReference {
    pub owner: String,
    pub descriptor: StringDescriptor,
}

impl fmt::Display for UnresolvedStringReference {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} points to ${:04X} ({} bytes) which is not a string heap block",
            self.owner, self.descriptor.pointer, self.descriptor.length
        )
    }
}

/// Recovered problems collected while decoding a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    Variable(DecodeError),
    Array(DecodeError),
    Heap(DecodeError),
    UnresolvedString(UnresolvedStringReference),
    InconsistentPointers {
        region: &'static str,
        start: u16,
        end: u16,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::Variable(e) => write!(f, "variable table: {}", e),
            Warning::Array(e) => write!(f, "array table: {}", e),
            Warning::Heap(e) => write!(f, "string heap: {}", e),
            Warning::UnresolvedString(r) => write!(f, "unresolved string: {}", r),
            Warning::InconsistentPointers { region, start, end } => {
                write!(
                    f,
                    "{} ends at ${:04X} before it starts at ${:04X}, treated as empty",
                    region, end, start
                )
            }
        }
    }
}
