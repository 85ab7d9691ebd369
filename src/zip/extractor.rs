use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;

use crate::error::{Result, StegError};
use crate::io::ReadAt;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, FLAG_ENCRYPTED, ZipFileEntry};

/// ZIP file extractor
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all files in the archive
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files()
    }

    /// Decompress an entry into memory, checking its size and CRC-32.
    pub fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let name = entry.file_name.as_str();
        if entry.flags & FLAG_ENCRYPTED != 0 {
            return Err(StegError::entry(name, "encrypted entries are not supported"));
        }

        let data_offset = self.parser.get_data_offset(entry)?;
        // Sizes come from the central directory; check them before allocating.
        if data_offset
            .checked_add(entry.compressed_size)
            .is_none_or(|end| end > self.parser.reader().size())
        {
            return Err(StegError::entry(
                name,
                "compressed data runs past end of archive",
            ));
        }
        let compressed_len = usize::try_from(entry.compressed_size)
            .map_err(|_| StegError::entry(name, "compressed size does not fit in memory"))?;
        let mut compressed = vec![0u8; compressed_len];
        self.parser
            .reader()
            .read_at(data_offset, &mut compressed)
            .map_err(|_| StegError::entry(name, "compressed data runs past end of archive"))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => compressed,
            CompressionMethod::Deflate => {
                // One byte past the declared size is enough to detect a lie.
                let mut out = Vec::new();
                DeflateDecoder::new(compressed.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .map_err(|e| StegError::entry(name, format!("corrupt deflate stream: {e}")))?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(StegError::UnsupportedCompression {
                    name: name.to_string(),
                    method,
                });
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            return Err(StegError::entry(
                name,
                format!(
                    "size mismatch: expected {} bytes, got {}",
                    entry.uncompressed_size,
                    data.len()
                ),
            ));
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(StegError::entry(
                name,
                format!("CRC-32 mismatch: expected {:08x}, got {:08x}", entry.crc32, crc.sum()),
            ));
        }

        Ok(data)
    }
}
