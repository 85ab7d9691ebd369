use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, StegError};
use crate::io::SliceReader;
use crate::zip::{ZipExtractor, ZipFileEntry};

use super::locate_payload;

/// Recover the files hidden in `carrier` into `output_dir`.
///
/// Every entry is decompressed and checked before the first file is
/// written, so a damaged payload produces an error and no output. Existing
/// files with the same names are overwritten. Returns the paths written.
pub fn unpack(carrier: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let data = fs::read(carrier).map_err(|e| StegError::io(carrier, e))?;
    let payload = locate_payload(&data)?;

    let extractor = ZipExtractor::new(SliceReader::new(payload));
    let entries = extractor.list_files()?;
    debug!(entries = entries.len(), "read central directory");

    let mut staged = Vec::with_capacity(entries.len());
    for entry in &entries {
        let path = entry_path(output_dir, &entry.file_name)?;
        let data = if entry.is_directory {
            None
        } else {
            Some(extractor.extract_to_memory(entry)?)
        };
        staged.push((entry, path, data));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (entry, path, data) in staged {
        match data {
            None => fs::create_dir_all(&path).map_err(|e| StegError::io(&path, e))?,
            Some(data) => {
                write_entry(&path, &data, entry.unix_mode)?;
                info!(entry = %entry.file_name, bytes = data.len(), "extracted");
            }
        }
        written.push(path);
    }

    Ok(written)
}

/// List the entries hidden in `carrier` without extracting them.
pub fn list_hidden(carrier: &Path) -> Result<Vec<ZipFileEntry>> {
    let data = fs::read(carrier).map_err(|e| StegError::io(carrier, e))?;
    let payload = locate_payload(&data)?;
    ZipExtractor::new(SliceReader::new(payload)).list_files()
}

/// Resolve an entry name under `output_dir`.
///
/// Names are relative paths using `/` (or `\`) separators. Absolute
/// names, `..` segments and drive prefixes are refused so that nothing is
/// written outside `output_dir`.
fn entry_path(output_dir: &Path, name: &str) -> Result<PathBuf> {
    let unsafe_name = || StegError::UnsafeEntryName(name.to_string());

    if name.starts_with(['/', '\\']) {
        return Err(unsafe_name());
    }

    let mut path = output_dir.to_path_buf();
    let mut depth = 0;
    for part in name.split(['/', '\\']) {
        if part.is_empty() || part == "." {
            continue;
        }
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(segment)), None) => path.push(segment),
            _ => return Err(unsafe_name()),
        }
        depth += 1;
    }

    if depth == 0 {
        return Err(unsafe_name());
    }
    Ok(path)
}

fn write_entry(path: &Path, data: &[u8], unix_mode: Option<u32>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StegError::io(parent, e))?;
        }
    }

    fs::write(path, data).map_err(|e| StegError::io(path, e))?;

    #[cfg(unix)]
    if let Some(mode) = unix_mode {
        use std::os::unix::fs::PermissionsExt;
        // owner keeps read/write so a later unpack can overwrite the file
        let perms = fs::Permissions::from_mode((mode & 0o777) | 0o600);
        fs::set_permissions(path, perms).map_err(|e| StegError::io(path, e))?;
    }
    #[cfg(not(unix))]
    let _ = unix_mode;

    Ok(())
}
