//! Snapshots from a running VICE emulator through its text monitor
//! (`x64sc -remotemonitor`). The monitor saves memory to a file on the
//! emulator's host, so this only works when that host is this machine.

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info, trace, warn};

use crate::error::DumpError;
use crate::image::MemoryImage;
use crate::source::MemorySource;

/// A remote monitor at `host:port`
pub struct MonitorConnection {
    pub address: String,
    pub timeout: Duration,
    /// Where the emulator is asked to save the snapshot
    pub snapshot_path: PathBuf,
}

impl MonitorConnection {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        let snapshot_path =
            std::env::temp_dir().join(format!("c64.{}.dump", std::process::id()));
        MonitorConnection {
            address: address.into(),
            timeout,
            snapshot_path,
        }
    }

    fn send(&self, stream: &mut TcpStream, command: &str) -> Result<String, DumpError> {
        trace!("monitor <- {}", command);
        stream
            .write_all(format!("{}\n", command).as_bytes())
            .map_err(|e| DumpError::Monitor(format!("Failed to send '{}': {}", command, e)))?;
        self.drain(stream)
    }

    /// Read until the monitor has been quiet for `timeout`
    fn drain(&self, stream: &mut TcpStream) -> Result<String, DumpError> {
        let mut received = Vec::new();
        let mut buf = [0u8; 2048];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                    break
                }
                Err(e) => return Err(DumpError::Monitor(format!("Read failed: {}", e))),
            }
        }
        let text = String::from_utf8_lossy(&received).into_owned();
        trace!("monitor -> {:?}", text);
        Ok(text)
    }
}

impl MemorySource for MonitorConnection {
    fn describe(&self) -> String {
        format!("monitor at {}", self.address)
    }

    fn acquire(&mut self) -> Result<MemoryImage, DumpError> {
        info!("Connecting to monitor at {}", self.address);
        let mut stream = TcpStream::connect(&self.address)
            .map_err(|e| DumpError::Monitor(format!("Cannot connect to {}: {}", self.address, e)))?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(|e| DumpError::Monitor(e.to_string()))?;

        self.send(&mut stream, "r")?;
        let path = self.snapshot_path.display().to_string();
        self.send(&mut stream, &format!("bsave \"{}\" 0 0000 FFFF", path))?;
        // a second register dump gives the emulator time to finish the file
        self.send(&mut stream, "r")?;
        drop(stream);

        let bytes = fs::read(&self.snapshot_path).map_err(|e| {
            DumpError::Monitor(format!("Snapshot {} was not written: {}", path, e))
        })?;
        if let Err(e) = fs::remove_file(&self.snapshot_path) {
            warn!("Could not remove snapshot {}: {}", path, e);
        }
        if bytes.is_empty() {
            return Err(DumpError::Monitor(format!("Snapshot {} is empty", path)));
        }
        debug!("Received {} bytes from monitor", bytes.len());
        Ok(MemoryImage::from_raw(bytes))
    }
}
