//! Array table decoding.
//!
//! Each record is laid out as
//!
//! - two name bytes (same packing as simple variables)
//! - total record length including this header, little endian
//! - number of dimensions
//! - one big endian element count per dimension, last dimension first
//! - the elements, first index varying fastest
//!
//! The stored element counts are one more than the values given in the DIM
//! statement.

use log::{debug, trace, warn};

use crate::error::{DecodeError, DecodeErrorKind};
use crate::image::MemoryImage;
use crate::name::{VariableKind, VariableName};
use crate::value::ScalarValue;

/// Name, record length and dimension count
pub const ARRAY_HEADER_LEN: usize = 5;

/// A decoded array
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayEntry {
    pub address: u16,
    pub name: VariableName,
    pub record_len: u16,
    /// Element count per dimension, in DIM order
    pub dimensions: Vec<u16>,
    /// Elements in storage order
    pub elements: Vec<ScalarValue>,
}

impl ArrayEntry {
    /// Number of elements the dimensions call for
    pub fn declared_len(&self) -> usize {
        declared_len(&self.dimensions).unwrap_or(usize::MAX)
    }

    /// Subscripts of the element stored at `flat`
    pub fn subscripts(&self, flat: usize) -> Vec<usize> {
        let mut rest = flat;
        self.dimensions
            .iter()
            .map(|&count| {
                let count = count.max(1) as usize;
                let index = rest % count;
                rest /= count;
                index
            })
            .collect()
    }
}

/// Result of walking the array table
#[derive(Debug, Clone, Default)]
pub struct ArrayTable {
    pub entries: Vec<ArrayEntry>,
    /// Skipped records and arrays decoded only in part
    pub problems: Vec<DecodeError>,
}

fn declared_len(dimensions: &[u16]) -> Option<usize> {
    if dimensions.is_empty() {
        return Some(0);
    }
    dimensions
        .iter()
        .try_fold(1usize, |acc, &count| acc.checked_mul(count as usize))
}

/// Decode the record at `address`, which must end by `record_end`. An array
/// with fewer decodable elements than declared is returned together with an
/// `IncompleteArray` error.
pub fn decode_array(
    image: &MemoryImage,
    address: usize,
    record_end: usize,
) -> Result<(ArrayEntry, Option<DecodeError>), DecodeError> {
    let err = |kind| DecodeError::new(address, kind);

    let header = image.slice(address, ARRAY_HEADER_LEN).map_err(err)?;
    let name = VariableName::decode([header[0], header[1]]).map_err(err)?;
    if name.kind() == VariableKind::Function {
        return Err(err(DecodeErrorKind::FunctionArray));
    }
    let record_len = u16::from_le_bytes([header[2], header[3]]);
    let dimension_count = header[4] as usize;

    let extents_start = address + ARRAY_HEADER_LEN;
    let elements_start = extents_start + 2 * dimension_count;
    if elements_start > record_end {
        return Err(err(DecodeErrorKind::TruncatedRecord {
            available: record_end.saturating_sub(address),
            needed: elements_start - address,
        }));
    }
    let mut dimensions = (0..dimension_count)
        .map(|i| image.word_be(extents_start + 2 * i))
        .collect::<Result<Vec<u16>, _>>()
        .map_err(err)?;
    dimensions.reverse();

    let declared = match declared_len(&dimensions) {
        Some(declared) => declared,
        None => return Err(err(DecodeErrorKind::ElementCountOverflow { dimensions })),
    };

    let size = name.kind().value_size();
    let room = (record_end - elements_start) / size;
    let mut elements = Vec::with_capacity(declared.min(room));
    for i in 0..declared.min(room) {
        let at = elements_start + i * size;
        match image.slice(at, size) {
            Ok(bytes) => elements.push(ScalarValue::decode(name.kind(), bytes).map_err(err)?),
            Err(_) => break,
        }
    }

    let incomplete = if elements.len() < declared {
        Some(err(DecodeErrorKind::IncompleteArray {
            declared,
            decoded: elements.len(),
        }))
    } else {
        None
    };

    let entry = ArrayEntry {
        address: address as u16,
        name,
        record_len,
        dimensions,
        elements,
    };
    Ok((entry, incomplete))
}

/// Walk the array records between `start` and `end`. The next record is
/// always found through the declared record length, so a damaged record
/// does not shift the ones after it.
pub fn decode_array_table(image: &MemoryImage, start: u16, end: u16) -> ArrayTable {
    let mut table = ArrayTable::default();
    let (start, end) = (start as usize, end as usize);
    if end < start {
        debug!("Array table ${:04x}-${:04x} is inverted", start, end);
        return table;
    }

    let mut address = start;
    while address < end {
        let record_len = match image.word_le(address + 2) {
            Ok(len) => len,
            Err(kind) => {
                let e = DecodeError::new(address, kind);
                warn!("Stopping array walk: {}", e);
                table.problems.push(e);
                break;
            }
        };
        if (record_len as usize) < ARRAY_HEADER_LEN {
            let e = DecodeError::new(address, DecodeErrorKind::RecordLength { length: record_len });
            warn!("Stopping array walk: {}", e);
            table.problems.push(e);
            break;
        }

        let record_end = (address + record_len as usize).min(end);
        match decode_array(image, address, record_end) {
            Ok((entry, incomplete)) => {
                trace!(
                    "${:04x}: {}({:?}) {} elements",
                    address,
                    entry.name,
                    entry.dimensions,
                    entry.elements.len()
                );
                if let Some(e) = incomplete {
                    warn!("Incomplete array: {}", e);
                    table.problems.push(e);
                }
                table.entries.push(entry);
            }
            Err(e) => {
                warn!("Skipping array: {}", e);
                table.problems.push(e);
            }
        }
        address += record_len as usize;
    }

    debug!(
        "Decoded {} arrays, {} problems",
        table.entries.len(),
        table.problems.len()
    );
    table
}
