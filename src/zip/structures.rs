use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

use crate::error::{Result, StegError};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: [u8; 4] = *b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk EOCD with no comment.
    pub fn new(total_entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || data[0..4] != Self::SIGNATURE {
            return Err(StegError::InvalidArchive(
                "invalid End of Central Directory".into(),
            ));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_with_cd: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_entries: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            total_entries: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            cd_size: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            cd_offset: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            comment_len: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(&Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.disk_number)?;
        out.write_u16::<LittleEndian>(self.disk_with_cd)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(self.comment_len)
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: [u8; 4] = *b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || data[0..4] != Self::SIGNATURE {
            return Err(StegError::InvalidArchive("invalid ZIP64 locator".into()));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            eocd64_offset: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            total_disks: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: [u8; 4] = *b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || data[0..4] != Self::SIGNATURE {
            return Err(StegError::InvalidArchive(
                "invalid ZIP64 End of Central Directory".into(),
            ));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            version_made_by: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            version_needed: cursor.read_u16::<LittleEndian>().map_err(truncated)?,
            disk_number: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            disk_with_cd: cursor.read_u32::<LittleEndian>().map_err(truncated)?,
            disk_entries: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            total_entries: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            cd_size: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
            cd_offset: cursor.read_u64::<LittleEndian>().map_err(truncated)?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: [u8; 4] = *b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: [u8; 4] = *b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Version needed to extract: 2.0 (deflate).
pub const VERSION_NEEDED: u16 = 20;
/// Version made by: host system Unix (3) in the high byte, APPNOTE 2.0 low.
pub const VERSION_MADE_BY_UNIX: u16 = (3 << 8) | 20;

/// General purpose flag: file name is UTF-8.
pub const FLAG_UTF8: u16 = 1 << 11;
/// General purpose flag: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 1;

/// Extra field header id for ZIP64 extended information.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
    /// Unix permission bits, when the entry was made on a Unix host.
    pub unix_mode: Option<u32>,
}

impl ZipFileEntry {
    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

/// MS-DOS packed (time, date) pair for a Unix timestamp in UTC.
///
/// DOS dates cover 1980-01-01 through 2107-12-31 with two second
/// resolution; timestamps outside that window are clamped to its edges.
pub fn dos_datetime(unix_secs: i64) -> (u16, u16) {
    const MIN: i64 = 315_532_800; // 1980-01-01T00:00:00Z
    const MAX: i64 = 4_354_819_198; // 2107-12-31T23:59:58Z
    let secs = unix_secs.clamp(MIN, MAX);

    let days = secs.div_euclid(86_400);
    let rem = secs.rem_euclid(86_400);
    let (year, month, day) = civil_from_days(days);

    let hour = (rem / 3600) as u16;
    let minute = ((rem % 3600) / 60) as u16;
    let second = (rem % 60) as u16;

    let time = (hour << 11) | (minute << 5) | (second / 2);
    let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;
    (time, date)
}

/// Days since 1970-01-01 to proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Map a short read inside a fixed-size record to a container error.
pub(crate) fn truncated(e: std::io::Error) -> StegError {
    StegError::InvalidArchive(format!("truncated record: {e}"))
}
