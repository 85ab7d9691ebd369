use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::carrier::PackOptions;
use crate::zip::CompressionMethod;

#[derive(Parser, Debug)]
#[command(name = "steg")]
#[command(version)]
#[command(about = "Hide files inside other files", long_about = None)]
#[command(after_help = "Examples:\n  \
  steg hide --input test.jpeg -f path/to/a.txt -f path/to/b.txt --output hidden.jpeg\n  \
  steg show --input hidden.jpeg --outputdir path/to/dir\n  \
  steg list -v --input hidden.jpeg")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode (-qq => errors only)
    #[arg(short = 'q', global = true, action = ArgAction::Count)]
    pub quiet: u8,

    /// More log output (-vv => trace)
    #[arg(long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Hide one or more files inside another file
    #[command(visible_alias = "pack")]
    Hide(HideArgs),

    /// Extract hidden files into a directory
    #[command(visible_alias = "unpack")]
    Show(ShowArgs),

    /// List hidden files without extracting them
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct HideArgs {
    /// Path to file to hide files in
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: PathBuf,

    /// Path to file to hide (repeat for more files)
    #[arg(short = 'f', value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Output path to new file, which contains hidden file(s)
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: PathBuf,

    /// Store files without compression
    #[arg(long)]
    pub store: bool,

    /// Deflate compression level
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: u32,
}

impl HideArgs {
    pub fn pack_options(&self) -> PackOptions {
        PackOptions {
            method: if self.store {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflate
            },
            level: self.level,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Path to file which contains hidden files
    #[arg(long, short = 'i', value_name = "FILE", alias = "image")]
    pub input: PathBuf,

    /// Path to directory to save files (created if missing)
    #[arg(long = "outputdir", short = 'd', value_name = "DIR")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Path to file which contains hidden files
    #[arg(long, short = 'i', value_name = "FILE", alias = "image")]
    pub input: PathBuf,

    /// Show size, compression ratio and timestamp for each entry
    #[arg(short = 'v')]
    pub detailed: bool,
}

impl Cli {
    /// Log level filter derived from `-q` / `--verbose`.
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (q, _) if q > 1 => tracing::Level::ERROR,
            (1, _) => tracing::Level::WARN,
            (_, 0) => tracing::Level::INFO,
            (_, 1) => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hide_with_repeated_files() {
        let cli = Cli::try_parse_from([
            "steg", "hide", "--input", "host.jpg", "-f", "a.txt", "-f", "b.txt", "--output",
            "out.jpg",
        ])
        .unwrap();
        let Command::Hide(args) = cli.command else {
            panic!("expected hide");
        };
        assert_eq!(args.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(args.pack_options().method, CompressionMethod::Deflate);
        assert_eq!(args.level, 6);
    }

    #[test]
    fn hide_requires_files() {
        assert!(
            Cli::try_parse_from(["steg", "hide", "--input", "h", "--output", "o"]).is_err()
        );
    }

    #[test]
    fn store_and_level_options() {
        let cli = Cli::try_parse_from([
            "steg", "pack", "-i", "h", "-f", "a", "-o", "o", "--store", "--level", "9",
        ])
        .unwrap();
        let Command::Hide(args) = cli.command else {
            panic!("expected hide");
        };
        let options = args.pack_options();
        assert_eq!(options.method, CompressionMethod::Stored);
        assert_eq!(options.level, 9);

        assert!(
            Cli::try_parse_from(["steg", "hide", "-i", "h", "-f", "a", "-o", "o", "--level", "10"])
                .is_err()
        );
    }

    #[test]
    fn parses_show_and_log_level() {
        let cli =
            Cli::try_parse_from(["steg", "show", "--input", "x.jpg", "--outputdir", "out", "-q"])
                .unwrap();
        assert_eq!(cli.log_level(), tracing::Level::WARN);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn list_verbose_flag_is_local() {
        let cli = Cli::try_parse_from(["steg", "list", "-v", "-i", "x.jpg"]).unwrap();
        assert_eq!(cli.log_level(), tracing::Level::INFO);
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert!(args.detailed);
    }
}
