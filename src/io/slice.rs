use super::ReadAt;
use crate::error::{Result, StegError};

/// Random access reader over a byte range already held in memory.
///
/// The unpacker reads the whole carrier file up front, so the archive
/// payload is simply the tail of that buffer.
pub struct SliceReader<'a> {
    data: &'a [u8],
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Borrow `len` bytes at `offset` without copying.
    pub fn slice(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let start = usize::try_from(offset).map_err(|_| out_of_range(offset, len))?;
        let len_usize = usize::try_from(len).map_err(|_| out_of_range(offset, len))?;
        let end = start
            .checked_add(len_usize)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| out_of_range(offset, len))?;
        Ok(&self.data[start..end])
    }
}

impl ReadAt for SliceReader<'_> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let src = self.slice(offset, buf.len() as u64)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

fn out_of_range(offset: u64, len: u64) -> StegError {
    StegError::InvalidArchive(format!(
        "read of {len} bytes at offset {offset} runs past end of archive"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_inside_bounds() {
        let data = b"0123456789";
        let reader = SliceReader::new(data);
        let mut buf = [0u8; 4];
        reader.read_at(3, &mut buf).unwrap();
        assert_eq!(&buf, b"3456");
        assert_eq!(reader.size(), 10);
        assert_eq!(reader.slice(8, 2).unwrap(), b"89");
    }

    #[test]
    fn rejects_reads_past_end() {
        let reader = SliceReader::new(b"abc");
        let mut buf = [0u8; 2];
        let err = reader.read_at(2, &mut buf).unwrap_err();
        assert!(err.is_container_error());
        assert!(reader.slice(u64::MAX, 1).is_err());
    }

    #[test]
    fn empty_read_at_end_is_fine() {
        let reader = SliceReader::new(b"abc");
        assert!(reader.slice(3, 0).unwrap().is_empty());
    }
}
