use std::fmt::Display;
use std::fmt::Error;
use std::fmt::Formatter;

use log::debug;

use crate::error::DumpError;
use crate::image::MemoryImage;

/// Start of the BASIC program text
pub const TXTTAB: usize = 0x2b;
/// Start of the simple variable table
pub const VARTAB: usize = 0x2d;
/// Start of the array table
pub const ARYTAB: usize = 0x2f;
/// End of the array table, lowest address the string heap may grow to
pub const STREND: usize = 0x31;
/// Lowest string currently allocated on the heap
pub const FRETOP: usize = 0x33;
/// Top of the string heap
pub const MEMSIZ: usize = 0x37;

/// The BASIC runtime's zero page pointers delimiting variable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicPointers {
    pub program_start: u16,
    pub variables_start: u16,
    pub arrays_start: u16,
    pub arrays_end: u16,
    pub heap_bottom: u16,
    pub heap_top: u16,
}

impl BasicPointers {
    /// Read the pointers from the zero page. Nothing is validated beyond the
    /// image covering them; decoders treat inconsistent regions as empty.
    pub fn resolve(image: &MemoryImage) -> Result<BasicPointers, DumpError> {
        let read = |address: usize| {
            image
                .word_le(address)
                .map_err(|_| DumpError::TruncatedImage {
                    address,
                    base: image.base(),
                    end: image.end(),
                })
        };

        let pointers = BasicPointers {
            program_start: read(TXTTAB)?,
            variables_start: read(VARTAB)?,
            arrays_start: read(ARYTAB)?,
            arrays_end: read(STREND)?,
            heap_bottom: read(FRETOP)?,
            heap_top: read(MEMSIZ)?,
        };
        debug!("Resolved BASIC pointers: {:?}", pointers);
        Ok(pointers)
    }

    /// Where the heap walk stops. FRETOP when it is plausible, the end of
    /// the array table otherwise.
    pub fn heap_floor(&self) -> u16 {
        if self.heap_bottom >= self.arrays_end && self.heap_bottom <= self.heap_top {
            self.heap_bottom
        } else {
            self.arrays_end
        }
    }
}

impl Display for BasicPointers {
    /// formats the regions between the pointers
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let size = |start: u16, end: u16| end.saturating_sub(start);
        writeln!(f, "base    end     size")?;
        writeln!(
            f,
            "${:04x}\t${:04x}\t${:04x}     BASIC program",
            self.program_start,
            self.variables_start,
            size(self.program_start, self.variables_start)
        )?;
        writeln!(
            f,
            "${:04x}\t${:04x}\t${:04x}     Variables",
            self.variables_start,
            self.arrays_start,
            size(self.variables_start, self.arrays_start)
        )?;
        writeln!(
            f,
            "${:04x}\t${:04x}\t${:04x}     Arrays",
            self.arrays_start,
            self.arrays_end,
            size(self.arrays_start, self.arrays_end)
        )?;
        writeln!(
            f,
            "${:04x}\t${:04x}\t${:04x}     Free memory",
            self.arrays_end,
            self.heap_bottom,
            size(self.arrays_end, self.heap_bottom)
        )?;
        writeln!(
            f,
            "${:04x}\t${:04x}\t${:04x}     String heap",
            self.heap_bottom,
            self.heap_top,
            size(self.heap_bottom, self.heap_top)
        )
    }
}
