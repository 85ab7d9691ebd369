//! ZIP archive writing, parsing and extraction.
//!
//! The hidden payload of a carrier file is a plain PKZIP archive, so any
//! ZIP tool can inspect it once the host bytes and marker are cut off.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures representing ZIP format elements (EOCD, file headers, etc.)
//! - [`writer`]: In-memory archive builder used by the packer
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: Decompression and CRC checking of individual entries
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! ## Supported Features
//!
//! - STORED and DEFLATE compression methods
//! - Reading ZIP64 end records and extra fields
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - The writer never emits ZIP64 records

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{EntryOptions, ZipWriter};
