//! In-memory ZIP archive builder.
//!
//! Entries are compressed up front, so every Local File Header already
//! carries its CRC-32 and sizes and no data descriptors are written.
//! Offsets are relative to the first byte of the returned buffer.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use std::io::Write;

use crate::error::{Result, StegError};

use super::structures::*;

/// Per-entry settings for [`ZipWriter::add_file`].
#[derive(Debug, Clone, Copy)]
pub struct EntryOptions {
    pub method: CompressionMethod,
    /// Deflate level, 0..=9. Ignored for STORED entries.
    pub level: u32,
    /// Modification time as seconds since the Unix epoch.
    pub modified: i64,
    /// Unix permission bits recorded in the external attributes.
    pub unix_mode: Option<u32>,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Deflate,
            level: 6,
            modified: 0,
            unix_mode: None,
        }
    }
}

/// Central directory record kept until [`ZipWriter::finish`].
struct CentralRecord {
    file_name: String,
    flags: u16,
    method: u16,
    mod_time: u16,
    mod_date: u16,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    external_attrs: u32,
    lfh_offset: u32,
}

/// Builds a complete ZIP archive in a byte buffer.
pub struct ZipWriter {
    buf: Vec<u8>,
    central: Vec<CentralRecord>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            central: Vec::new(),
        }
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.central.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central.is_empty()
    }

    /// Compress `data` and append it as a file entry named `name`.
    pub fn add_file(&mut self, name: &str, data: &[u8], options: &EntryOptions) -> Result<()> {
        if self.central.len() >= u16::MAX as usize {
            return Err(StegError::ArchiveTooLarge(format!(
                "more than {} entries",
                u16::MAX - 1
            )));
        }
        if name.len() > u16::MAX as usize {
            return Err(StegError::entry(name, "file name too long"));
        }

        let mut crc = Crc::new();
        crc.update(data);

        let compressed = match options.method {
            CompressionMethod::Stored => data.to_vec(),
            CompressionMethod::Deflate => {
                let mut encoder =
                    DeflateEncoder::new(Vec::new(), Compression::new(options.level.min(9)));
                encoder
                    .write_all(data)
                    .map_err(|e| StegError::entry(name, format!("deflate failed: {e}")))?;
                encoder
                    .finish()
                    .map_err(|e| StegError::entry(name, format!("deflate failed: {e}")))?
            }
            CompressionMethod::Unknown(method) => {
                return Err(StegError::UnsupportedCompression {
                    name: name.to_string(),
                    method,
                });
            }
        };

        let uncompressed_size = fits_u32(data.len() as u64, name)?;
        let compressed_size = fits_u32(compressed.len() as u64, name)?;
        let lfh_offset = fits_u32(self.buf.len() as u64, name)?;

        let (mod_time, mod_date) = dos_datetime(options.modified);
        let flags = if name.is_ascii() { 0 } else { FLAG_UTF8 };
        let external_attrs = options.unix_mode.map_or(0, |mode| (mode & 0xFFFF) << 16);

        let record = CentralRecord {
            file_name: name.to_string(),
            flags,
            method: options.method.as_u16(),
            mod_time,
            mod_date,
            crc32: crc.sum(),
            compressed_size,
            uncompressed_size,
            external_attrs,
            lfh_offset,
        };

        write_local_header(&mut self.buf, &record)
            .map_err(|e| StegError::entry(name, e.to_string()))?;
        self.buf.extend_from_slice(&compressed);
        fits_u32(self.buf.len() as u64, name)?;

        self.central.push(record);
        Ok(())
    }

    /// Append the central directory and EOCD, returning the archive bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = fits_u32(self.buf.len() as u64, "central directory")?;

        for record in &self.central {
            write_central_header(&mut self.buf, record)
                .map_err(|e| StegError::entry(&record.file_name, e.to_string()))?;
        }

        let cd_size = fits_u32(self.buf.len() as u64 - cd_offset as u64, "central directory")?;
        EndOfCentralDirectory::new(self.central.len() as u16, cd_size, cd_offset)
            .write_to(&mut self.buf)
            .map_err(|e| StegError::InvalidArchive(e.to_string()))?;

        Ok(self.buf)
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn fits_u32(value: u64, what: &str) -> Result<u32> {
    // 0xFFFFFFFF itself is reserved as the ZIP64 escape value.
    if value >= u32::MAX as u64 {
        return Err(StegError::ArchiveTooLarge(format!(
            "{what} exceeds 4 GiB; ZIP64 output is not supported"
        )));
    }
    Ok(value as u32)
}

fn write_local_header(out: &mut Vec<u8>, r: &CentralRecord) -> std::io::Result<()> {
    out.write_all(&LFH_SIGNATURE)?;
    out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
    out.write_u16::<LittleEndian>(r.flags)?;
    out.write_u16::<LittleEndian>(r.method)?;
    out.write_u16::<LittleEndian>(r.mod_time)?;
    out.write_u16::<LittleEndian>(r.mod_date)?;
    out.write_u32::<LittleEndian>(r.crc32)?;
    out.write_u32::<LittleEndian>(r.compressed_size)?;
    out.write_u32::<LittleEndian>(r.uncompressed_size)?;
    out.write_u16::<LittleEndian>(r.file_name.len() as u16)?;
    out.write_u16::<LittleEndian>(0)?; // extra field length
    out.write_all(r.file_name.as_bytes())
}

fn write_central_header(out: &mut Vec<u8>, r: &CentralRecord) -> std::io::Result<()> {
    out.write_all(&CDFH_SIGNATURE)?;
    out.write_u16::<LittleEndian>(VERSION_MADE_BY_UNIX)?;
    out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
    out.write_u16::<LittleEndian>(r.flags)?;
    out.write_u16::<LittleEndian>(r.method)?;
    out.write_u16::<LittleEndian>(r.mod_time)?;
    out.write_u16::<LittleEndian>(r.mod_date)?;
    out.write_u32::<LittleEndian>(r.crc32)?;
    out.write_u32::<LittleEndian>(r.compressed_size)?;
    out.write_u32::<LittleEndian>(r.uncompressed_size)?;
    out.write_u16::<LittleEndian>(r.file_name.len() as u16)?;
    out.write_u16::<LittleEndian>(0)?; // extra field length
    out.write_u16::<LittleEndian>(0)?; // file comment length
    out.write_u16::<LittleEndian>(0)?; // disk number start
    out.write_u16::<LittleEndian>(0)?; // internal attributes
    out.write_u32::<LittleEndian>(r.external_attrs)?;
    out.write_u32::<LittleEndian>(r.lfh_offset)?;
    out.write_all(r.file_name.as_bytes())
}
