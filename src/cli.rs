//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sci_clone::download::DEFAULT_MAX_RETRIES;
use sci_clone::resolver::MirrorProtocol;

/// Batch download journal articles as PDFs.
///
/// Queries Crossref for a journal's article DOIs or takes identifiers
/// directly (DOI, URL, PMID, arXiv tag, or `.txt`/`.bib` list files), then
/// fetches each PDF through a sci-hub mirror into per-batch directories.
#[derive(Parser, Debug)]
#[command(name = "sci-clone")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output directory; must already exist
    #[arg(short = 'd', long, default_value = ".", global = true)]
    pub dir: PathBuf,

    /// Mirror host name, without scheme (e.g. sci-hub.se)
    #[arg(short = 's', long = "scihub", default_value = "sci-hub.se", global = true)]
    pub scihub: String,

    /// Mirror page protocol: anchor, frame, or embed
    #[arg(long, default_value = "anchor", global = true)]
    pub protocol: MirrorProtocol,

    /// Maximum attempts per request for transient failures (1-10)
    #[arg(
        short = 'r',
        long,
        default_value_t = DEFAULT_MAX_RETRIES,
        value_parser = clap::value_parser!(u32).range(1..=10),
        global = true
    )]
    pub max_retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download every article of a journal for a year range
    Issn {
        /// Journal ISSN (e.g. 0002-9602)
        issn: String,
        /// First year, inclusive
        year_from: u16,
        /// Last year, inclusive; defaults to YEAR_FROM
        year_to: Option<u16>,
    },
    /// Download articles by identifier or identifier list file
    Doi {
        /// DOIs, URLs, PMIDs, arXiv tags, or paths to .txt/.bib files
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_issn_subcommand_parses() {
        let args = Args::try_parse_from(["sci-clone", "issn", "0002-9602", "2010", "2012"]).unwrap();
        match args.command {
            Command::Issn {
                issn,
                year_from,
                year_to,
            } => {
                assert_eq!(issn, "0002-9602");
                assert_eq!(year_from, 2010);
                assert_eq!(year_to, Some(2012));
            }
            Command::Doi { .. } => panic!("expected issn subcommand"),
        }
    }

    #[test]
    fn test_cli_issn_single_year_omits_year_to() {
        let args = Args::try_parse_from(["sci-clone", "issn", "0002-9602", "2010"]).unwrap();
        match args.command {
            Command::Issn { year_to, .. } => assert_eq!(year_to, None),
            Command::Doi { .. } => panic!("expected issn subcommand"),
        }
    }

    #[test]
    fn test_cli_doi_subcommand_collects_tokens() {
        let args =
            Args::try_parse_from(["sci-clone", "doi", "10.1/a", "list.txt", "refs.bib"]).unwrap();
        match args.command {
            Command::Doi { ids } => assert_eq!(ids, vec!["10.1/a", "list.txt", "refs.bib"]),
            Command::Issn { .. } => panic!("expected doi subcommand"),
        }
    }

    #[test]
    fn test_cli_doi_requires_at_least_one_token() {
        let result = Args::try_parse_from(["sci-clone", "doi"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["sci-clone", "doi", "10.1/a"]).unwrap();
        assert_eq!(args.dir, PathBuf::from("."));
        assert_eq!(args.scihub, "sci-hub.se");
        assert_eq!(args.protocol, MirrorProtocol::Anchor);
        assert_eq!(args.max_retries, 3);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "sci-clone", "doi", "10.1/a", "-d", "/tmp/out", "-s", "sci-hub.ru", "--protocol",
            "frame", "-r", "5",
        ])
        .unwrap();
        assert_eq!(args.dir, PathBuf::from("/tmp/out"));
        assert_eq!(args.scihub, "sci-hub.ru");
        assert_eq!(args.protocol, MirrorProtocol::Frame);
        assert_eq!(args.max_retries, 5);
    }

    #[test]
    fn test_cli_invalid_protocol_rejected() {
        let result =
            Args::try_parse_from(["sci-clone", "doi", "10.1/a", "--protocol", "iframe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_max_retries_bounds() {
        assert!(Args::try_parse_from(["sci-clone", "doi", "10.1/a", "-r", "0"]).is_err());
        assert!(Args::try_parse_from(["sci-clone", "doi", "10.1/a", "-r", "11"]).is_err());
        assert!(Args::try_parse_from(["sci-clone", "doi", "10.1/a", "-r", "10"]).is_ok());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["sci-clone", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        let result = Args::try_parse_from(["sci-clone"]);
        assert!(result.is_err());
    }
}
