use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use byteorder::{LittleEndian, ReadBytesExt};

/// The magic number that identifies GGUF files
pub const GGUF_MAGIC: u32 = 0x46554747; // "GGUF" in ASCII

/// Errors raised while reading a GGUF header
#[derive(Debug)]
pub enum GgufError {
    /// Wraps std::io::Error for file operations
    Io(io::Error),
    /// The file is not a GGUF file or uses an unsupported layout
    InvalidFormat(String),
}

impl fmt::Display for GgufError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GgufError::Io(e) => write!(f, "I/O error: {}", e),
            GgufError::InvalidFormat(msg) => write!(f, "Invalid GGUF format: {}", msg),
        }
    }
}

impl Error for GgufError {}

impl From<io::Error> for GgufError {
    fn from(err: io::Error) -> Self {
        GgufError::Io(err)
    }
}

/// Fixed-size preamble at the start of every GGUF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GgufHeader {
    /// Format version (1, 2 or 3)
    pub version: u32,
    /// Number of tensors stored in the file
    pub tensor_count: u64,
    /// Number of metadata key/value pairs
    pub metadata_count: u64,
}

impl GgufHeader {
    /// Reads the header of the file at `path`.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, GgufError> {
        let file = File::open(path)?;
        Self::read(&mut BufReader::new(file))
    }

    /// Reads a header from the start of `reader`.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, GgufError> {
        let magic = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        if magic != GGUF_MAGIC {
            return Err(GgufError::InvalidFormat(format!(
                "bad magic 0x{:08x}, expected 0x{:08x}",
                magic, GGUF_MAGIC
            )));
        }

        let version = reader.read_u32::<LittleEndian>().map_err(truncated)?;
        // Version 1 used 32-bit counts, later versions 64-bit
        let (tensor_count, metadata_count) = match version {
            1 => (
                reader.read_u32::<LittleEndian>().map_err(truncated)? as u64,
                reader.read_u32::<LittleEndian>().map_err(truncated)? as u64,
            ),
            2 | 3 => (
                reader.read_u64::<LittleEndian>().map_err(truncated)?,
                reader.read_u64::<LittleEndian>().map_err(truncated)?,
            ),
            other => {
                return Err(GgufError::InvalidFormat(format!(
                    "unsupported version {}",
                    other
                )))
            }
        };

        Ok(Self {
            version,
            tensor_count,
            metadata_count,
        })
    }
}

fn truncated(err: io::Error) -> GgufError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        GgufError::InvalidFormat("file too short for a GGUF header".to_string())
    } else {
        GgufError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn header_bytes(version: u32, tensors: u64, kvs: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(GGUF_MAGIC).unwrap();
        buf.write_u32::<LittleEndian>(version).unwrap();
        if version == 1 {
            buf.write_u32::<LittleEndian>(tensors as u32).unwrap();
            buf.write_u32::<LittleEndian>(kvs as u32).unwrap();
        } else {
            buf.write_u64::<LittleEndian>(tensors).unwrap();
            buf.write_u64::<LittleEndian>(kvs).unwrap();
        }
        buf
    }

    #[test]
    fn test_reads_v3_header() {
        let header = GgufHeader::read(&mut Cursor::new(header_bytes(3, 201, 23))).unwrap();
        assert_eq!(header, GgufHeader { version: 3, tensor_count: 201, metadata_count: 23 });
    }

    #[test]
    fn test_reads_v1_header() {
        let header = GgufHeader::read(&mut Cursor::new(header_bytes(1, 7, 2))).unwrap();
        assert_eq!(header.tensor_count, 7);
        assert_eq!(header.metadata_count, 2);
    }

    #[test]
    fn test_rejects_html_error_page() {
        let err = GgufHeader::read(&mut Cursor::new(b"<!DOCTYPE html><html>".to_vec())).unwrap_err();
        assert!(matches!(err, GgufError::InvalidFormat(_)));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let err = GgufHeader::read(&mut Cursor::new(b"GGUF".to_vec())).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = GgufHeader::read(&mut Cursor::new(header_bytes(9, 0, 0))).unwrap_err();
        assert!(err.to_string().contains("unsupported version 9"));
    }
}
