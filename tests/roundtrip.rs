//! End-to-end tests for hiding files in a host and recovering them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use steg::carrier::compose;
use steg::zip::{
    CDFH_SIGNATURE, CompressionMethod, EndOfCentralDirectory, EntryOptions, LFH_SIGNATURE,
    ZIP64_EXTRA_ID, ZipWriter,
};
use steg::{MAGIC_MARKER, PackOptions, StegError, list_hidden, pack, unpack};

/// Temporary directory removed on drop.
struct Scratch(PathBuf);

impl Scratch {
    fn new(tag: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("steg-{tag}-{}-{n}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.0.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Pseudo-random bytes so deflate has something to chew on.
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

fn fake_jpeg() -> Vec<u8> {
    let mut host = vec![0xFF, 0xD8, 0xFF, 0xE0];
    host.extend(noise(2048, 7));
    host.extend([0xFF, 0xD9]);
    host
}

fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn round_trip_restores_names_and_contents() {
    let s = Scratch::new("roundtrip");
    let host = s.file("host.jpg", &fake_jpeg());
    let secret = s.file("secret.txt", b"meet at dawn\n");
    let out = s.path("carrier.jpg");
    let dir = s.path("recovered");
    fs::create_dir(&dir).unwrap();

    pack(&host, &[&secret], &out, &PackOptions::default()).unwrap();
    let written = unpack(&out, &dir).unwrap();

    assert_eq!(written, vec![dir.join("secret.txt")]);
    assert_eq!(fs::read(dir.join("secret.txt")).unwrap(), b"meet at dawn\n");
}

#[test]
fn carrier_is_host_then_marker_then_zip() {
    let s = Scratch::new("layout");
    let host_bytes = fake_jpeg();
    let host = s.file("host.jpg", &host_bytes);
    let input = s.file("a.bin", &noise(100, 1));
    let out = s.path("out.jpg");

    pack(&host, &[&input], &out, &PackOptions::default()).unwrap();
    let carrier = fs::read(&out).unwrap();

    let n = host_bytes.len();
    assert_eq!(&carrier[..n], host_bytes.as_slice());
    assert_eq!(&carrier[n..n + 6], &[0x0C, 0x00, 0x0F, 0x0F, 0x0E, 0x0E]);
    assert_eq!(&carrier[n + 6..n + 10], &[0x50, 0x4B, 0x03, 0x04]);
    // the payload ends with a comment-less End of Central Directory
    assert_eq!(&carrier[carrier.len() - 22..carrier.len() - 18], b"PK\x05\x06");
}

#[test]
fn three_files_including_empty_one() {
    let s = Scratch::new("multi");
    let host = s.file("host.png", b"\x89PNG\r\n\x1a\nnot really a png");
    let big = noise(200_000, 3);
    let inputs = [
        s.file("big.bin", &big),
        s.file("small.txt", b"tiny"),
        s.file("empty.dat", b""),
    ];
    let out = s.path("out.png");
    let dir = s.path("x");
    fs::create_dir(&dir).unwrap();

    pack(&host, &inputs, &out, &PackOptions::default()).unwrap();
    let mut written = unpack(&out, &dir).unwrap();
    written.sort();
    assert_eq!(written.len(), 3);

    assert_eq!(fs::read(dir.join("big.bin")).unwrap(), big);
    assert_eq!(fs::read(dir.join("small.txt")).unwrap(), b"tiny");
    let empty = dir.join("empty.dat");
    assert!(empty.is_file());
    assert_eq!(fs::metadata(&empty).unwrap().len(), 0);

    let names: Vec<_> = list_hidden(&out)
        .unwrap()
        .into_iter()
        .map(|e| e.file_name)
        .collect();
    assert_eq!(names, ["big.bin", "small.txt", "empty.dat"]);
}

#[test]
fn stored_round_trip() {
    let s = Scratch::new("stored");
    let host = s.file("host", b"HOST");
    let data = noise(5000, 11);
    let input = s.file("raw.bin", &data);
    let out = s.path("out");
    let dir = s.path("d");
    fs::create_dir(&dir).unwrap();

    let options = PackOptions {
        method: CompressionMethod::Stored,
        ..PackOptions::default()
    };
    pack(&host, &[&input], &out, &options).unwrap();

    let entries = list_hidden(&out).unwrap();
    assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
    assert_eq!(entries[0].compressed_size, 5000);

    unpack(&out, &dir).unwrap();
    assert_eq!(fs::read(dir.join("raw.bin")).unwrap(), data);
}

#[test]
fn unmodified_host_has_no_hidden_content() {
    let s = Scratch::new("nomarker");
    let host = s.file("host.jpg", &fake_jpeg());
    let dir = s.path("d");
    fs::create_dir(&dir).unwrap();

    let err = unpack(&host, &dir).unwrap_err();
    assert!(matches!(err, StegError::NoHiddenContent));
    assert!(dir_is_empty(&dir));
}

#[test]
fn marker_in_host_without_signature_is_no_content() {
    let s = Scratch::new("coincidence");
    let mut bytes = b"some header".to_vec();
    bytes.extend_from_slice(&MAGIC_MARKER);
    bytes.extend_from_slice(b"ordinary image data continues here");
    let host = s.file("host.bin", &bytes);
    let dir = s.path("d");
    fs::create_dir(&dir).unwrap();

    assert!(matches!(unpack(&host, &dir), Err(StegError::NoHiddenContent)));
    assert!(dir_is_empty(&dir));

    // Once packed, the coincidental marker still shadows the real payload.
    let input = s.file("a.txt", b"a");
    let out = s.path("out.bin");
    pack(&host, &[&input], &out, &PackOptions::default()).unwrap();
    assert!(matches!(unpack(&out, &dir), Err(StegError::NoHiddenContent)));
}

#[test]
fn truncated_payload_is_a_container_error() {
    let s = Scratch::new("truncated");
    let host_bytes = fake_jpeg();
    let host = s.file("host.jpg", &host_bytes);
    let inputs = [
        s.file("one.bin", &noise(4000, 5)),
        s.file("two.txt", b"second file"),
    ];
    let out = s.path("out.jpg");
    pack(&host, &inputs, &out, &PackOptions::default()).unwrap();
    let carrier = fs::read(&out).unwrap();

    let payload_start = host_bytes.len() + MAGIC_MARKER.len();
    let cuts = [
        payload_start + 4,
        payload_start + 100,
        (payload_start + carrier.len()) / 2,
        carrier.len() - 30,
        carrier.len() - 1,
    ];
    for cut in cuts {
        let broken = s.file("broken.jpg", &carrier[..cut]);
        let dir = s.path(&format!("d{cut}"));
        fs::create_dir(&dir).unwrap();

        let err = unpack(&broken, &dir).unwrap_err();
        assert!(err.is_container_error(), "cut at {cut}: {err}");
        assert!(dir_is_empty(&dir), "cut at {cut} left output behind");
    }
}

#[test]
fn packing_twice_is_byte_identical() {
    let s = Scratch::new("determinism");
    let host = s.file("host.jpg", &fake_jpeg());
    let inputs = [s.file("a.bin", &noise(10_000, 9)), s.file("b.txt", b"bee")];
    let first = s.path("first.jpg");
    let second = s.path("second.jpg");

    pack(&host, &inputs, &first, &PackOptions::default()).unwrap();
    pack(&host, &inputs, &second, &PackOptions::default()).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn pack_overwrites_existing_output() {
    let s = Scratch::new("overwrite");
    let host = s.file("host", b"H");
    let input = s.file("in.txt", b"payload");
    let out = s.file("out", &vec![0xAA; 10_000]);

    pack(&host, &[&input], &out, &PackOptions::default()).unwrap();
    let carrier = fs::read(&out).unwrap();
    assert_eq!(carrier[0], b'H');
    assert_eq!(&carrier[1..7], &MAGIC_MARKER);
}

#[test]
fn unpack_overwrites_existing_files() {
    let s = Scratch::new("overwrite-out");
    let host = s.file("host", b"H");
    let input = s.file("same.txt", b"new contents");
    let out = s.path("out");
    let dir = s.path("d");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("same.txt"), b"old contents that are longer").unwrap();

    pack(&host, &[&input], &out, &PackOptions::default()).unwrap();
    unpack(&out, &dir).unwrap();
    assert_eq!(fs::read(dir.join("same.txt")).unwrap(), b"new contents");
}

#[test]
fn missing_input_aborts_without_output() {
    let s = Scratch::new("missing");
    let host = s.file("host", b"H");
    let present = s.file("here.txt", b"x");
    let absent = s.path("gone.txt");
    let out = s.path("out");

    let err = pack(&host, &[&present, &absent], &out, &PackOptions::default()).unwrap_err();
    match err {
        StegError::Io { path, .. } => assert_eq!(path, absent),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());
}

#[test]
fn missing_host_names_the_host() {
    let s = Scratch::new("nohost");
    let input = s.file("a.txt", b"a");
    let host = s.path("nohost.jpg");
    let err = pack(&host, &[&input], &s.path("out"), &PackOptions::default()).unwrap_err();
    assert!(matches!(err, StegError::Io { ref path, .. } if *path == host));
    assert!(err.to_string().contains("nohost.jpg"));
}

#[test]
fn duplicate_base_names_are_rejected() {
    let s = Scratch::new("dupes");
    fs::create_dir(s.path("one")).unwrap();
    fs::create_dir(s.path("two")).unwrap();
    let a = s.file("one/same.txt", b"1");
    let b = s.file("two/same.txt", b"2");
    let host = s.file("host", b"H");

    let err = pack(&host, &[&a, &b], &s.path("out"), &PackOptions::default()).unwrap_err();
    assert!(matches!(err, StegError::DuplicateEntry(ref name) if name == "same.txt"));
}

#[cfg(unix)]
#[test]
fn permission_bits_survive() {
    use std::os::unix::fs::PermissionsExt;

    let s = Scratch::new("mode");
    let host = s.file("host", b"H");
    let script = s.file("run.sh", b"#!/bin/sh\necho hi\n");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o750)).unwrap();
    let out = s.path("out");
    let dir = s.path("d");
    fs::create_dir(&dir).unwrap();

    pack(&host, &[&script], &out, &PackOptions::default()).unwrap();
    assert_eq!(list_hidden(&out).unwrap()[0].unix_mode.map(|m| m & 0o777), Some(0o750));

    unpack(&out, &dir).unwrap();
    let mode = fs::metadata(dir.join("run.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o750);
}

#[test]
fn unsafe_entry_name_writes_nothing() {
    let s = Scratch::new("traversal");
    let mut writer = ZipWriter::new();
    let options = EntryOptions::default();
    writer.add_file("fine.txt", b"harmless", &options).unwrap();
    writer.add_file("../evil", b"escaped", &options).unwrap();
    let carrier = s.file("carrier.jpg", &compose(&fake_jpeg(), &writer.finish().unwrap()));

    let dir = s.path("d");
    fs::create_dir(&dir).unwrap();
    let err = unpack(&carrier, &dir).unwrap_err();
    assert!(matches!(err, StegError::UnsafeEntryName(ref name) if name == "../evil"));
    assert!(dir_is_empty(&dir));
    assert!(!s.path("evil").exists());
}

/// One STORED entry whose central directory defers both sizes to a ZIP64
/// extra field declaring `declared_size` bytes of compressed data.
fn zip64_sized_archive(declared_size: u64) -> Vec<u8> {
    let name = b"huge.bin";
    let data = b"tiny";
    let mut zip = Vec::new();

    zip.write_all(&LFH_SIGNATURE).unwrap();
    zip.write_u16::<LittleEndian>(45).unwrap(); // version needed
    zip.write_u16::<LittleEndian>(0).unwrap(); // flags
    zip.write_u16::<LittleEndian>(0).unwrap(); // stored
    zip.write_u32::<LittleEndian>(0).unwrap(); // time, date
    zip.write_u32::<LittleEndian>(0).unwrap(); // crc
    zip.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    zip.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    zip.write_u16::<LittleEndian>(name.len() as u16).unwrap();
    zip.write_u16::<LittleEndian>(0).unwrap();
    zip.write_all(name).unwrap();
    zip.write_all(data).unwrap();

    let cd_offset = zip.len() as u32;
    zip.write_all(&CDFH_SIGNATURE).unwrap();
    zip.write_u16::<LittleEndian>(45).unwrap(); // made by
    zip.write_u16::<LittleEndian>(45).unwrap(); // needed
    zip.write_u16::<LittleEndian>(0).unwrap(); // flags
    zip.write_u16::<LittleEndian>(0).unwrap(); // stored
    zip.write_u32::<LittleEndian>(0).unwrap(); // time, date
    zip.write_u32::<LittleEndian>(0).unwrap(); // crc
    zip.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap(); // compressed
    zip.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap(); // uncompressed
    zip.write_u16::<LittleEndian>(name.len() as u16).unwrap();
    zip.write_u16::<LittleEndian>(20).unwrap(); // extra length
    zip.write_u16::<LittleEndian>(0).unwrap(); // comment length
    zip.write_u16::<LittleEndian>(0).unwrap(); // disk start
    zip.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
    zip.write_u32::<LittleEndian>(0).unwrap(); // external attrs
    zip.write_u32::<LittleEndian>(0).unwrap(); // local header offset
    zip.write_all(name).unwrap();
    zip.write_u16::<LittleEndian>(ZIP64_EXTRA_ID).unwrap();
    zip.write_u16::<LittleEndian>(16).unwrap();
    zip.write_u64::<LittleEndian>(declared_size).unwrap(); // uncompressed
    zip.write_u64::<LittleEndian>(declared_size).unwrap(); // compressed
    let cd_size = zip.len() as u32 - cd_offset;

    EndOfCentralDirectory::new(1, cd_size, cd_offset)
        .write_to(&mut zip)
        .unwrap();
    zip
}

#[test]
fn huge_declared_size_is_a_container_error() {
    let s = Scratch::new("huge");
    let dir = s.path("d");
    fs::create_dir(&dir).unwrap();

    for declared in [1u64 << 62, u64::MAX, 0xFFFF_FFF0] {
        let carrier = s.file("carrier.bin", &compose(b"HOST", &zip64_sized_archive(declared)));
        assert_eq!(list_hidden(&carrier).unwrap()[0].compressed_size, declared);

        let err = unpack(&carrier, &dir).unwrap_err();
        assert!(err.is_container_error(), "declared {declared}: {err}");
        assert!(dir_is_empty(&dir));
    }
}
