use std::fs::File;
use std::io::Read;
use std::path::Path;
use crate::core::error::Result;

pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Gzip,
}

impl CompressionType {
    /// `.gz` suffix wins; otherwise sniff the first two bytes.
    pub fn detect(path: &Path) -> Result<Self> {
        if Self::from_extension(path) == CompressionType::Gzip {
            return Ok(CompressionType::Gzip);
        }

        let mut file = File::open(path)?;
        let mut magic = [0u8; 2];
        let mut filled = 0;
        while filled < magic.len() {
            let n = file.read(&mut magic[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        Ok(Self::from_magic(&magic[..filled]))
    }

    pub fn from_extension(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gz") => CompressionType::Gzip,
            _ => CompressionType::None,
        }
    }

    pub fn from_magic(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            CompressionType::Gzip
        } else {
            CompressionType::None
        }
    }
}
