use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::{debug, info};

use crate::error::{Result, StegError};
use crate::zip::{CompressionMethod, EntryOptions, ZipWriter};

use super::compose;

/// How hidden files are compressed.
#[derive(Debug, Clone, Copy)]
pub struct PackOptions {
    pub method: CompressionMethod,
    /// Deflate level, 0..=9.
    pub level: u32,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Deflate,
            level: 6,
        }
    }
}

/// Hide `inputs` inside a copy of `host` written to `output`.
///
/// The archive is built completely before the host is read or the output
/// is touched, so an unreadable input leaves no output behind. An existing
/// file at `output` is replaced.
pub fn pack<P: AsRef<Path>>(
    host: &Path,
    inputs: &[P],
    output: &Path,
    options: &PackOptions,
) -> Result<()> {
    let archive = build_archive(inputs, options)?;

    let host_bytes = fs::read(host).map_err(|e| StegError::io(host, e))?;
    debug!(
        host = %host.display(),
        host_len = host_bytes.len(),
        archive_len = archive.len(),
        "composing carrier"
    );

    let carrier = compose(&host_bytes, &archive);
    fs::write(output, &carrier).map_err(|e| StegError::io(output, e))?;

    info!(output = %output.display(), bytes = carrier.len(), "wrote carrier file");
    Ok(())
}

/// Compress `inputs` into one in-memory ZIP archive.
///
/// Each entry is named after the input's base name and records its
/// modification time and permission bits.
pub fn build_archive<P: AsRef<Path>>(inputs: &[P], options: &PackOptions) -> Result<Vec<u8>> {
    if inputs.is_empty() {
        return Err(StegError::NoInputs);
    }

    let entry_options = EntryOptions {
        method: options.method,
        level: options.level,
        ..EntryOptions::default()
    };

    let mut seen = HashSet::new();
    let mut writer = ZipWriter::new();

    for input in inputs {
        let path = input.as_ref();
        let name = entry_name(path)?;
        if !seen.insert(name.clone()) {
            return Err(StegError::DuplicateEntry(name));
        }

        let (data, modified, unix_mode) = read_input(path)?;
        writer.add_file(
            &name,
            &data,
            &EntryOptions {
                modified,
                unix_mode: Some(unix_mode),
                ..entry_options
            },
        )?;
        info!(entry = %name, bytes = data.len(), "added file");
    }

    writer.finish()
}

fn entry_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            StegError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })
}

/// Read an input file together with its mtime and mode.
fn read_input(path: &Path) -> Result<(Vec<u8>, i64, u32)> {
    let to_err = |e: std::io::Error| StegError::io(path, e);

    let mut file = fs::File::open(path).map_err(to_err)?;
    let metadata = file.metadata().map_err(to_err)?;
    if !metadata.is_file() {
        return Err(to_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let mut data = Vec::with_capacity(metadata.len() as usize);
    file.read_to_end(&mut data).map_err(to_err)?;

    let modified = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs() as i64);

    Ok((data, modified, file_mode(&metadata)))
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    // regular file, rw-r--r-- or r--r--r--
    if metadata.permissions().readonly() {
        0o100444
    } else {
        0o100644
    }
}
