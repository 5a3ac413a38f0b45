//! Reading image bytes from disk.
//!
//! Files of 1MB or more are memory-mapped, which avoids copying the data
//! from kernel to user space; smaller files are read normally.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read the bytes of the file at `path`.
///
/// A missing file is reported as [`HashError::NotFound`]; every other
/// failure (permissions, directories) as [`HashError::Io`].
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, HashError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;

    if !metadata.is_file() {
        return Err(HashError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    if metadata.len() >= MMAP_THRESHOLD {
        read_mmap(path)
    } else {
        read_standard(path)
    }
}

fn read_mmap(path: &Path) -> Result<FileBytes, HashError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;

    // SAFETY: the map is only read, and the file handle lives as long as
    // the map does.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| io_error(path, e))?;

    Ok(FileBytes::Mmap(mmap))
}

fn read_standard(path: &Path) -> Result<FileBytes, HashError> {
    let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
    Ok(FileBytes::Vec(bytes))
}

fn io_error(path: &Path, source: std::io::Error) -> HashError {
    if source.kind() == ErrorKind::NotFound {
        HashError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        HashError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
