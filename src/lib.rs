//! # steg
//!
//! Hide files inside another file by appending a marked ZIP archive after
//! the host's own bytes, and recover them later.
//!
//! The host is never parsed. Most image, audio and document readers stop at
//! the end of their own data, so the carrier still opens as the original
//! file. This is not concealment in any cryptographic sense: anyone who
//! knows the layout can find the payload, and re-encoding the host drops it.
//!
//! ## Layout
//!
//! ```text
//! [host bytes][0C 00 0F 0F 0E 0E][PK\x03\x04 ... ZIP archive ...]
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use steg::{PackOptions, pack, unpack};
//!
//! fn main() -> anyhow::Result<()> {
//!     pack(
//!         Path::new("photo.jpg"),
//!         &["notes.txt", "keys.pem"],
//!         Path::new("holiday.jpg"),
//!         &PackOptions::default(),
//!     )?;
//!
//!     for path in unpack(Path::new("holiday.jpg"), Path::new("recovered"))? {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod carrier;
pub mod cli;
pub mod error;
pub mod io;
pub mod zip;

pub use carrier::{ARCHIVE_SIGNATURE, MAGIC_MARKER, PackOptions, list_hidden, pack, unpack};
pub use cli::Cli;
pub use error::{Result, StegError};
pub use zip::ZipFileEntry;
