use log::{debug, trace, warn};

use crate::error::{DecodeError, DecodeErrorKind};
use crate::image::MemoryImage;
use crate::name::VariableName;
use crate::value::ScalarValue;

/// Every simple variable occupies two name bytes and five value bytes,
/// whatever its type
pub const VARIABLE_SLOT_LEN: usize = 7;

/// A decoded simple variable
#[derive(Debug, Clone, PartialEq)]
pub struct VariableEntry {
    pub address: u16,
    pub name: VariableName,
    pub value: ScalarValue,
}

/// Result of walking the variable table
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    pub entries: Vec<VariableEntry>,
    pub skipped: Vec<DecodeError>,
}

/// Decode the slot at `address`
pub fn decode_variable(image: &MemoryImage, address: usize) -> Result<VariableEntry, DecodeError> {
    let slot = image
        .slice(address, VARIABLE_SLOT_LEN)
        .map_err(|kind| DecodeError::new(address, kind))?;
    let name = VariableName::decode([slot[0], slot[1]])
        .map_err(|kind| DecodeError::new(address, kind))?;
    let value =
        ScalarValue::decode(name.kind(), &slot[2..]).map_err(|kind| DecodeError::new(address, kind))?;
    Ok(VariableEntry {
        address: address as u16,
        name,
        value,
    })
}

/// Walk the simple variables between `start` and `end` in table order.
/// Malformed slots are skipped so the rest of the table still decodes.
pub fn decode_variable_table(image: &MemoryImage, start: u16, end: u16) -> VariableTable {
    let mut table = VariableTable::default();
    let (start, end) = (start as usize, end as usize);
    if end < start {
        debug!("Variable table ${:04x}-${:04x} is inverted", start, end);
        return table;
    }

    let mut address = start;
    while address < end {
        if address + VARIABLE_SLOT_LEN > end {
            let e = DecodeError::new(
                address,
                DecodeErrorKind::TruncatedRecord {
                    available: end - address,
                    needed: VARIABLE_SLOT_LEN,
                },
            );
            warn!("Skipping variable: {}", e);
            table.skipped.push(e);
            break;
        }
        match decode_variable(image, address) {
            Ok(entry) => {
                trace!("${:04x}: {} = {:?}", address, entry.name, entry.value);
                table.entries.push(entry);
            }
            Err(e) => {
                warn!("Skipping variable: {}", e);
                table.skipped.push(e);
            }
        }
        address += VARIABLE_SLOT_LEN;
    }

    debug!(
        "Decoded {} variables, skipped {}",
        table.entries.len(),
        table.skipped.len()
    );
    table
}
