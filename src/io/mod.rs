mod slice;

pub use slice::SliceReader;

use crate::error::Result;

/// Trait for random access reading from a data source
pub trait ReadAt {
    /// Read exactly `buf.len()` bytes starting at `offset`.
    ///
    /// Fails with a container error when the range runs past the end of the
    /// source, since every caller is following an offset taken from archive
    /// metadata.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}
