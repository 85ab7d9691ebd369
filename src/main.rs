//! Main entry point for the steg CLI application.
//!
//! Validates the command-line arguments, prepares the output directory and
//! hands the checked paths to the library.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use steg::cli::{Command, HideArgs, ListArgs, ShowArgs};
use steg::{Cli, list_hidden, pack, unpack};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match &cli.command {
        Command::Hide(args) => hide(args),
        Command::Show(args) => show(args),
        Command::List(args) => list(args),
    }
}

fn hide(args: &HideArgs) -> Result<()> {
    require_file(&args.input)?;

    let missing = missing_inputs(&args.files);
    if !missing.is_empty() {
        bail!("error(s) found whilst processing file(s):\n{}", missing.join("\n"));
    }

    pack(&args.input, &args.files, &args.output, &args.pack_options())
        .with_context(|| format!("failed to hide files in {}", args.input.display()))?;
    Ok(())
}

fn show(args: &ShowArgs) -> Result<()> {
    require_file(&args.input)?;
    prepare_output_dir(&args.output_dir)?;

    let written = unpack(&args.input, &args.output_dir)
        .with_context(|| format!("failed to recover files from {}", args.input.display()))?;
    tracing::info!(files = written.len(), dir = %args.output_dir.display(), "done");
    Ok(())
}

fn list(args: &ListArgs) -> Result<()> {
    require_file(&args.input)?;
    let entries = list_hidden(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    if args.detailed {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if !args.detailed {
            println!("{}", entry.file_name);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed = total_uncompressed.saturating_add(entry.uncompressed_size);
            total_compressed = total_compressed.saturating_add(entry.compressed_size);
            file_count += 1;
        }
    }

    if args.detailed {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files ({})",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count,
            format_size(total_uncompressed)
        );
    }

    Ok(())
}

/// One line per input that cannot be stat'ed, so all are reported at once.
fn missing_inputs(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .filter_map(|f| fs::metadata(f).err().map(|e| format!("- {}: {e}", f.display())))
        .collect()
}

fn require_file(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).with_context(|| format!("{}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a file.", path.display());
    }
    Ok(())
}

/// Create `dir` when missing and make sure it is a directory.
fn prepare_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let meta = fs::metadata(dir).with_context(|| format!("{}", dir.display()))?;
    if !meta.is_dir() {
        bail!("{} is not a directory.", dir.display());
    }
    Ok(())
}

/// Percentage saved by compression, formatted as a 5-wide column.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        // compressed <= uncompressed keeps the quotient within 0..=100
        let kept = (compressed as u128 * 100 / uncompressed as u128) as u64;
        format!("{:>4}%", 100 - kept)
    } else {
        "  0%".to_string()
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
