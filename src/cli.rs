use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::scrape::DownloadLink;

/// Search Anna's Archive and download books from the terminal
#[derive(Parser, Debug)]
#[command(name = "anna-dl")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Search and download the first result:
        anna-dl \"the rust programming language\"

    List results without downloading:
        anna-dl --dry-run -n 20 \"dune\"

    Download the third result using its second link:
        anna-dl --book 3 --link 2 \"dune\"

    Change the default download directory:
        anna-dl config set-path ~/Books

For advanced options, edit ~/.config/anna-dl/config.toml")]
pub struct Cli {
    /// Search query
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Number of results to list
    #[arg(short = 'n', long, value_name = "N")]
    pub num_results: Option<usize>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Result to download, 1-based
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub book: usize,

    /// Download link to use, 1-based (default: first reliable link)
    #[arg(long, value_name = "N")]
    pub link: Option<usize>,

    /// File name to save as (default: "<title> - <author>.<format>")
    #[arg(long, value_name = "NAME")]
    pub filename: Option<String>,

    /// List results and links without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Bypass the search cache
    #[arg(long)]
    pub no_cache: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (-vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON output for scripting
    #[arg(long)]
    pub json: bool,

    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Remove partial download files from the download directory
    Cleanup,

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the configuration file location and contents
    Show,

    /// Set the default download directory
    SetPath {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

impl Cli {
    /// Parse arguments and handle special cases
    pub fn parse_and_validate() -> Self {
        Self::parse().normalized()
    }

    fn normalized(mut self) -> Self {
        if self.quiet {
            self.verbose = 0;
        }
        self.book = self.book.max(1);
        self
    }

    /// The query words joined with single spaces
    pub fn query_string(&self) -> Option<String> {
        let query = self.query.join(" ");
        let query = query.trim();
        (!query.is_empty()).then(|| query.to_string())
    }

    /// Get the effective log level, falling back to `config_level`
    pub fn get_log_level<'a>(&'a self, config_level: &'a str) -> &'a str {
        if let Some(ref level) = self.log_level {
            level
        } else {
            match self.verbose {
                0 if self.quiet => "error",
                0 => config_level,
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Get configuration overrides from CLI arguments
    pub fn get_config_overrides(&self) -> crate::config::ConfigOverrides {
        crate::config::ConfigOverrides {
            download_dir: self.output.clone(),
            max_results: self.num_results,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

/// The 1-based `choice` if given, else the first reliable link, else the first link
pub fn select_link(links: &[DownloadLink], choice: Option<usize>) -> Option<&DownloadLink> {
    match choice {
        Some(n) => links.get(n.checked_sub(1)?),
        None => links
            .iter()
            .find(|link| link.is_reliable())
            .or_else(|| links.first()),
    }
}

/// CLI-specific error messages
pub mod messages {
    pub const NO_QUERY: &str = "No search query given. Use 'anna-dl --help' for usage information.";
    pub const NO_LINKS: &str = "No download links found for this book.";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("anna-dl").chain(args.iter().copied()))
            .unwrap()
            .normalized()
    }

    #[test]
    fn test_query_words_are_joined() {
        let cli = parse(&["-n", "5", "the", "rust", "book"]);
        assert_eq!(cli.query_string().as_deref(), Some("the rust book"));
        assert_eq!(cli.num_results, Some(5));
        assert_eq!(cli.book, 1);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_no_query() {
        assert_eq!(parse(&[]).query_string(), None);
    }

    #[test]
    fn test_log_level() {
        assert_eq!(parse(&["q"]).get_log_level("warn"), "warn");
        assert_eq!(parse(&["-v", "q"]).get_log_level("warn"), "info");
        assert_eq!(parse(&["-vv", "q"]).get_log_level("warn"), "debug");
        assert_eq!(parse(&["-q", "-vv", "q"]).get_log_level("warn"), "error");
        assert_eq!(parse(&["--log-level", "trace", "q"]).get_log_level("warn"), "trace");
    }

    #[test]
    fn test_config_subcommand() {
        let cli = parse(&["config", "set-path", "/tmp/books"]);
        match cli.command {
            Some(Commands::Config {
                action: Some(ConfigAction::SetPath { path }),
            }) => assert_eq!(path, PathBuf::from("/tmp/books")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_book_index_is_one_based() {
        assert_eq!(parse(&["--book", "0", "q"]).book, 1);
        assert_eq!(parse(&["--book", "3", "--link", "2", "q"]).link, Some(2));
    }

    #[test]
    fn test_select_link() {
        let links = vec![
            DownloadLink::new("Slow partner server", "https://annas-archive.org/slow_download/1"),
            DownloadLink::new("Libgen.li", "https://libgen.li/ads.php?md5=1"),
        ];
        assert_eq!(select_link(&links, None).unwrap().text, "Libgen.li");
        assert_eq!(select_link(&links, Some(1)).unwrap().text, "Slow partner server");
        assert!(select_link(&links, Some(0)).is_none());
        assert!(select_link(&links, Some(3)).is_none());
        assert_eq!(select_link(&links[..1], None).unwrap().text, "Slow partner server");
        assert!(select_link(&[], None).is_none());
    }

    #[test]
    fn test_overrides() {
        let overrides = parse(&["-o", "/tmp/out", "-n", "3", "q"]).get_config_overrides();
        assert_eq!(overrides.download_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(overrides.max_results, Some(3));
    }
}
