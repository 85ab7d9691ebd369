//! The embed/recover protocol.
//!
//! A carrier file is laid out as
//!
//! ```text
//! [host bytes, unmodified][MAGIC_MARKER][ZIP archive starting with PK\x03\x04]
//! ```
//!
//! Readers of the host format stop at the end of their own data and never
//! see the appended bytes. The unpacker finds the first marker, checks that
//! a ZIP local file header follows, and hands the rest of the file to the
//! ZIP reader. ZIP offsets are relative to the byte after the marker, so
//! the payload length never needs to be stored.

mod pack;
mod unpack;

pub use pack::{PackOptions, build_archive, pack};
pub use unpack::{list_hidden, unpack};

use crate::error::{Result, StegError};
use crate::zip::LFH_SIGNATURE;

/// Separates the host bytes from the hidden archive.
pub const MAGIC_MARKER: [u8; 6] = [0x0C, 0x00, 0x0F, 0x0F, 0x0E, 0x0E];

/// First bytes of a valid payload: the ZIP local file header signature.
pub const ARCHIVE_SIGNATURE: [u8; 4] = LFH_SIGNATURE;

/// Offset of the first occurrence of [`MAGIC_MARKER`] in `data`.
pub fn find_marker(data: &[u8]) -> Option<usize> {
    data.windows(MAGIC_MARKER.len())
        .position(|window| window == MAGIC_MARKER)
}

/// Return the archive payload hidden in `data`.
///
/// Only the first marker is considered. If it is missing, or what follows
/// it is not a ZIP local file header, the file is treated as having no
/// hidden content.
pub fn locate_payload(data: &[u8]) -> Result<&[u8]> {
    let idx = find_marker(data).ok_or(StegError::NoHiddenContent)?;
    let payload = &data[idx + MAGIC_MARKER.len()..];
    if !payload.starts_with(&ARCHIVE_SIGNATURE) {
        tracing::debug!(offset = idx, "marker found but not followed by a ZIP header");
        return Err(StegError::NoHiddenContent);
    }
    tracing::debug!(
        offset = idx,
        payload_len = payload.len(),
        "found hidden payload"
    );
    Ok(payload)
}

/// Concatenate `host`, the marker and `archive` into one buffer.
pub fn compose(host: &[u8], archive: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(host.len() + MAGIC_MARKER.len() + archive.len());
    for part in [host, &MAGIC_MARKER[..], archive] {
        out.extend_from_slice(part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_bytes_are_fixed() {
        assert_eq!(MAGIC_MARKER, [0x0C, 0x00, 0x0F, 0x0F, 0x0E, 0x0E]);
        assert_eq!(ARCHIVE_SIGNATURE, [0x50, 0x4B, 0x03, 0x04]);
    }

    #[test]
    fn finds_first_marker() {
        let mut data = b"abc".to_vec();
        data.extend_from_slice(&MAGIC_MARKER);
        data.extend_from_slice(b"xyz");
        data.extend_from_slice(&MAGIC_MARKER);
        assert_eq!(find_marker(&data), Some(3));
        assert_eq!(find_marker(b"no marker here"), None);
        assert_eq!(find_marker(&MAGIC_MARKER[..5]), None);
        assert_eq!(find_marker(&[]), None);
    }

    #[test]
    fn compose_lays_out_host_marker_archive() {
        let out = compose(b"HOST", b"PK\x03\x04rest");
        assert_eq!(&out[..4], b"HOST");
        assert_eq!(&out[4..10], &MAGIC_MARKER);
        assert_eq!(&out[10..], b"PK\x03\x04rest");
        assert_eq!(locate_payload(&out).unwrap(), b"PK\x03\x04rest");
    }

    #[test]
    fn marker_without_signature_is_no_content() {
        let out = compose(b"HOST", b"PK\x05\x06");
        assert!(matches!(locate_payload(&out), Err(StegError::NoHiddenContent)));
        assert!(matches!(
            locate_payload(b"plain host"),
            Err(StegError::NoHiddenContent)
        ));
    }

    #[test]
    fn coincidental_marker_wins_over_later_payload() {
        // The first marker is used even when a real payload follows later.
        let mut host = b"head".to_vec();
        host.extend_from_slice(&MAGIC_MARKER);
        host.extend_from_slice(b"tail");
        let out = compose(&host, b"PK\x03\x04");
        assert!(matches!(locate_payload(&out), Err(StegError::NoHiddenContent)));
    }
}
