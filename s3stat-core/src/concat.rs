//! The combined log: every fetched object appended, byte for byte, into one
//! temporary file that the analyzer reads.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Append one object's content to an open output stream, unchanged.
pub fn append<W: Write + ?Sized>(out: &mut W, data: &[u8]) -> io::Result<()> {
    out.write_all(data)
}

/// Temporary, append-only file holding the concatenated logs of one run.
///
/// The file is removed when the value is dropped, whichever way the run ends.
pub struct CombinedLog {
    file: NamedTempFile,
    objects: usize,
    bytes: u64,
}

impl CombinedLog {
    pub fn new() -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("s3stat-")
            .suffix(".log")
            .tempfile()?;
        Ok(Self {
            file,
            objects: 0,
            bytes: 0,
        })
    }

    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        append(self.file.as_file_mut(), data)?;
        self.objects += 1;
        self.bytes += data.len() as u64;
        Ok(())
    }

    /// Flush everything written so far; call before handing the path to the analyzer.
    pub fn finish(&mut self) -> io::Result<()> {
        self.file.as_file_mut().flush()?;
        self.file.as_file().sync_data()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn objects(&self) -> usize {
        self.objects
    }

    pub fn len(&self) -> u64 {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }
}
