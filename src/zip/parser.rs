//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//! 4. For extraction, read each file's Local File Header and data
//!
//! All offsets are relative to the start of the reader, which for a
//! carrier file is the first byte after the marker.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{Result, StegError};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
///
/// ## Example
///
/// ```ignore
/// let parser = ZipParser::new(SliceReader::new(&payload));
/// let entries = parser.list_files()?;
/// for entry in entries {
///     let offset = parser.get_data_offset(&entry)?;
///     // Read file data from offset...
/// }
/// ```
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: R,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: R) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record together with its offset. The simple case of an
    /// archive without a comment is tried first, then the tail of the
    /// archive is searched backwards for a signature whose comment length
    /// reaches exactly to the end.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        let eocd_size = EndOfCentralDirectory::SIZE as u64;
        if self.size < eocd_size {
            return Err(StegError::InvalidArchive(
                "not a valid ZIP file: too short for an End of Central Directory".into(),
            ));
        }

        let offset = self.size - eocd_size;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_at(offset, &mut buf)?;

        // Check for signature and zero-length comment
        if buf[0..4] == EndOfCentralDirectory::SIGNATURE && buf[20..22] == [0, 0] {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        let search_size = (MAX_COMMENT_SIZE + eocd_size).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_at(search_start, &mut buf)?;

        // Search backwards for EOCD signature (PK\x05\x06)
        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(StegError::InvalidArchive(
            "not a valid ZIP file: End of Central Directory not found".into(),
        ))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD has fields set to 0xFFFF or 0xFFFFFFFF.
    /// The ZIP64 locator sits immediately before the regular EOCD.
    pub fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| StegError::InvalidArchive("missing ZIP64 locator".into()))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader.read_at(locator_offset, &mut locator_buf)?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader.read_at(locator.eocd64_offset, &mut eocd64_buf)?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List all entries recorded in the Central Directory.
    ///
    /// Any structural problem (missing EOCD, directory out of bounds,
    /// malformed header) is reported before anything is extracted.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd()?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset)?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset
            .checked_add(cd_size)
            .is_none_or(|end| end > eocd_offset)
        {
            return Err(StegError::InvalidArchive(format!(
                "central directory ({cd_size} bytes at {cd_offset}) lies outside the archive"
            )));
        }
        if total_entries > cd_size / CDFH_MIN_SIZE as u64 {
            return Err(StegError::InvalidArchive(format!(
                "central directory of {cd_size} bytes cannot hold {total_entries} entries"
            )));
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_at(cd_offset, &mut cd_data)?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());

        for _ in 0..total_entries {
            let entry = self.parse_cdfh(&mut cursor)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    fn parse_cdfh(&self, cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig).map_err(truncated)?;
        if sig != CDFH_SIGNATURE {
            return Err(StegError::InvalidArchive(
                "invalid Central Directory File Header".into(),
            ));
        }

        let version_made_by = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _version_needed = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let flags = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let compression_method = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let last_mod_time = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let last_mod_date = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let crc32 = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let mut compressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let file_comment_length = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let external_attrs = cursor.read_u32::<LittleEndian>().map_err(truncated)?;
        let mut lfh_offset = cursor.read_u32::<LittleEndian>().map_err(truncated)? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes).map_err(truncated)?;
        // Names without the UTF-8 flag are usually CP437; keep them readable.
        let file_name = if flags & FLAG_UTF8 != 0 {
            String::from_utf8(file_name_bytes).map_err(|e| {
                StegError::entry(
                    &String::from_utf8_lossy(e.as_bytes()),
                    "file name is flagged UTF-8 but is not valid UTF-8",
                )
            })?
        } else {
            String::from_utf8_lossy(&file_name_bytes).into_owned()
        };

        // Directory entries end with '/'
        let is_directory = file_name.ends_with('/');

        let extra_field_end = cursor.position() + extra_field_length as u64;
        if extra_field_end > cursor.get_ref().len() as u64 {
            return Err(StegError::InvalidArchive(format!(
                "extra field of {file_name} runs past the central directory"
            )));
        }

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let field_size = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let field_end = (cursor.position() + field_size as u64).min(extra_field_end);

            if header_id == ZIP64_EXTRA_ID {
                // Fields are present only if corresponding header field is 0xFFFFFFFF
                if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    uncompressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
                }
                if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    compressed_size = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
                }
                if lfh_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                    lfh_offset = cursor.read_u64::<LittleEndian>().map_err(truncated)?;
                }
            }
            cursor.set_position(field_end);
        }

        cursor.set_position(extra_field_end + file_comment_length as u64);

        let unix_mode = if version_made_by >> 8 == 3 && external_attrs >> 16 != 0 {
            Some(external_attrs >> 16)
        } else {
            None
        };

        Ok(ZipFileEntry {
            file_name,
            flags,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
            unix_mode,
        })
    }

    /// Get the offset where an entry's compressed data begins.
    ///
    /// The Local File Header has variable-length fields (file name, extra
    /// field) that may differ from the Central Directory copy, so it is
    /// read to find the start of the data.
    pub fn get_data_offset(&self, entry: &ZipFileEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader
            .read_at(entry.lfh_offset, &mut lfh_buf)
            .map_err(|_| StegError::entry(&entry.file_name, "local header out of range"))?;

        if lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(StegError::entry(&entry.file_name, "invalid Local File Header"));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // Offset to filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>().map_err(truncated)? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>().map_err(truncated)? as u64;

        Ok(entry.lfh_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Get a reference to the underlying reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }
}
