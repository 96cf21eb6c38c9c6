//! Where memory images come from.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use log::debug;

use crate::error::DumpError;
use crate::image::{DumpFormat, MemoryImage};

/// Anything that can produce a memory snapshot
pub trait MemorySource {
    /// Human readable origin, used in the report header
    fn describe(&self) -> String;

    fn acquire(&mut self) -> Result<MemoryImage, DumpError>;
}

/// A dump file on disk
pub struct DumpFile {
    pub path: PathBuf,
    pub format: DumpFormat,
}

impl DumpFile {
    pub fn new(path: impl Into<PathBuf>, format: DumpFormat) -> Self {
        DumpFile {
            path: path.into(),
            format,
        }
    }
}

impl MemorySource for DumpFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn acquire(&mut self) -> Result<MemoryImage, DumpError> {
        let mut file = File::open(&self.path)
            .map_err(|e| DumpError::Io(format!("Cannot open '{}': {}", self.path.display(), e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| DumpError::Io(format!("Cannot read '{}': {}", self.path.display(), e)))?;
        debug!("Read {} bytes from {:?}", bytes.len(), self.path);
        MemoryImage::from_dump(bytes, self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_dump_file_reads_prg() {
        let path = std::env::temp_dir().join(format!("cbmvars-source-{}.prg", std::process::id()));
        fs::write(&path, [0x00u8, 0x08, 0x01, 0x02]).unwrap();
        let mut source = DumpFile::new(&path, DumpFormat::Prg);
        let image = source.acquire().unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(image.base(), 0x0800);
        assert_eq!(image.byte(0x0801), Ok(0x02));
    }

    #[test]
    fn test_missing_file() {
        let mut source = DumpFile::new("/nonexistent/c64.dump", DumpFormat::Raw);
        match source.acquire() {
            Err(DumpError::Io(msg)) => assert!(msg.contains("/nonexistent/c64.dump")),
            other => panic!("expected io error, got {:?}", other.map(|i| i.len())),
        }
    }
}
