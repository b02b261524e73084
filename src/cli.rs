//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a media segment over HTTP with live progress.
///
/// dash-fetch streams a resource in fixed-size chunks, reports progress as it
/// goes and can be interrupted with Ctrl-C, which cancels the transfer at the
/// next chunk boundary.
#[derive(Parser, Debug)]
#[command(name = "dash-fetch")]
#[command(author, version, about)]
pub struct Args {
    /// URL of the resource to fetch
    pub url: String,

    /// Write the fetched bytes to this file (content is discarded otherwise)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with download settings; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bytes read per iteration [default: 4096]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk_size: Option<u32>,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_url() {
        let result = Args::try_parse_from(["dash-fetch"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_minimal_args_leave_overrides_unset() {
        let args = Args::try_parse_from(["dash-fetch", "http://example.com/seg.m4s"]).unwrap();
        assert_eq!(args.url, "http://example.com/seg.m4s");
        assert!(args.output.is_none());
        assert!(args.config.is_none());
        assert!(args.chunk_size.is_none());
        assert!(args.connect_timeout.is_none());
        assert!(args.read_timeout.is_none());
        assert!(!args.no_progress);
        assert_eq!(args.default_log_level(), "info");
    }

    #[test]
    fn test_cli_rejects_zero_chunk_size() {
        let result = Args::try_parse_from(["dash-fetch", "http://x/", "--chunk-size", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_overrides() {
        let args = Args::try_parse_from([
            "dash-fetch",
            "http://x/seg",
            "-o",
            "out.m4s",
            "-c",
            "8192",
            "--read-timeout",
            "60",
        ])
        .unwrap();
        assert_eq!(args.output, Some(PathBuf::from("out.m4s")));
        assert_eq!(args.chunk_size, Some(8192));
        assert_eq!(args.read_timeout, Some(60));
    }

    #[test]
    fn test_cli_verbosity_levels() {
        let args = Args::try_parse_from(["dash-fetch", "u", "-vv"]).unwrap();
        assert_eq!(args.default_log_level(), "trace");

        let args = Args::try_parse_from(["dash-fetch", "u", "-v", "-q"]).unwrap();
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["dash-fetch", "--help"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }
}
