use log::{debug, warn};
use serde::Deserialize;

use crate::error::{DecodeErrorKind, DumpError};

/// Lowest address a usable dump has to reach (BASIC ROM starts here)
pub const BASIC_RAM_END: usize = 0xA000;

/// Size of a full 64K PRG dump including its load address
const PRG_FULL_LEN: usize = 0x10000 + 2;

/// How the bytes of a dump file map onto C64 addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpFormat {
    /// PRG when the file is exactly 64K plus a load address, raw otherwise
    Auto,
    /// First byte is address $0000
    Raw,
    /// First two bytes are the little endian load address
    Prg,
}

impl Default for DumpFormat {
    fn default() -> Self {
        DumpFormat::Auto
    }
}

/// A snapshot of C64 memory with owned bytes
#[derive(Debug, Clone)]
pub struct MemoryImage {
    /// The raw memory
    bytes: Vec<u8>,
    /// Address of the first byte
    base: usize,
}

impl MemoryImage {
    /// Create an image whose first byte lives at `base`
    pub fn new(bytes: Vec<u8>, base: u16) -> Self {
        MemoryImage {
            bytes,
            base: base as usize,
        }
    }

    /// Image addressed from $0000
    pub fn from_raw(bytes: Vec<u8>) -> Self {
        let image = MemoryImage::new(bytes, 0);
        if image.end() < BASIC_RAM_END {
            warn!(
                "Dump ends at ${:04X}, BASIC memory reaches ${:04X}",
                image.end(),
                BASIC_RAM_END
            );
        }
        image
    }

    /// Image prefixed with a 2-byte little endian load address
    pub fn from_prg(mut bytes: Vec<u8>) -> Result<Self, DumpError> {
        if bytes.len() < 2 {
            return Err(DumpError::TruncatedImage {
                address: 0,
                base: 0,
                end: 0,
            });
        }
        let load_address = u16::from_le_bytes([bytes[0], bytes[1]]);
        bytes.drain(..2);
        debug!("PRG dump loads at ${:04X}", load_address);
        Ok(MemoryImage::new(bytes, load_address))
    }

    /// Interpret dump file bytes according to `format`
    pub fn from_dump(bytes: Vec<u8>, format: DumpFormat) -> Result<Self, DumpError> {
        match format {
            DumpFormat::Raw => Ok(MemoryImage::from_raw(bytes)),
            DumpFormat::Prg => MemoryImage::from_prg(bytes),
            DumpFormat::Auto if bytes.len() == PRG_FULL_LEN => MemoryImage::from_prg(bytes),
            DumpFormat::Auto => Ok(MemoryImage::from_raw(bytes)),
        }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// One past the highest covered address
    pub fn end(&self) -> usize {
        self.base + self.bytes.len()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True if every address in `address..address + len` is in the image
    pub fn covers(&self, address: usize, len: usize) -> bool {
        address >= self.base && address + len <= self.end()
    }

    pub fn slice(&self, address: usize, len: usize) -> Result<&[u8], DecodeErrorKind> {
        if !self.covers(address, len) {
            let address = if address < self.base {
                address
            } else {
                self.end().max(address)
            };
            return Err(DecodeErrorKind::OutOfRange { address });
        }
        let offset = address - self.base;
        Ok(&self.bytes[offset..offset + len])
    }

    pub fn byte(&self, address: usize) -> Result<u8, DecodeErrorKind> {
        Ok(self.slice(address, 1)?[0])
    }

    /// 6502 native word order
    pub fn word_le(&self, address: usize) -> Result<u16, DecodeErrorKind> {
        let b = self.slice(address, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Array extents and integers are stored high byte first
    pub fn word_be(&self, address: usize) -> Result<u16, DecodeErrorKind> {
        let b = self.slice(address, 2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_addresses_start_at_zero() {
        let mut bytes = vec![0u8; 0x100];
        bytes[0x2b] = 0x01;
        bytes[0x2c] = 0x08;
        let image = MemoryImage::from_raw(bytes);
        assert_eq!(image.base(), 0);
        assert_eq!(image.word_le(0x2b), Ok(0x0801));
        assert_eq!(image.word_be(0x2b), Ok(0x0108));
    }

    #[test]
    fn test_prg_offsets_by_load_address() {
        let mut bytes = vec![0x00, 0x10];
        bytes.extend_from_slice(&[0xaa, 0xbb, 0xcc]);
        let image = MemoryImage::from_prg(bytes).unwrap();
        assert_eq!(image.base(), 0x1000);
        assert_eq!(image.byte(0x1001), Ok(0xbb));
        assert_eq!(
            image.byte(0x0fff),
            Err(DecodeErrorKind::OutOfRange { address: 0x0fff })
        );
        assert_eq!(
            image.byte(0x1003),
            Err(DecodeErrorKind::OutOfRange { address: 0x1003 })
        );
    }

    #[test]
    fn test_auto_format_detects_full_prg() {
        let mut bytes = vec![0u8; PRG_FULL_LEN];
        bytes[2] = 0x42;
        let image = MemoryImage::from_dump(bytes, DumpFormat::Auto).unwrap();
        assert_eq!(image.base(), 0);
        assert_eq!(image.len(), 0x10000);
        assert_eq!(image.byte(0), Ok(0x42));

        let image = MemoryImage::from_dump(vec![0u8; 0x10000], DumpFormat::Auto).unwrap();
        assert_eq!(image.len(), 0x10000);
    }

    #[test]
    fn test_prg_too_short() {
        assert!(MemoryImage::from_prg(vec![0x01]).is_err());
    }
}
