use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use anna_dl::{
    cache::{self, SearchCache},
    cli::{self, messages, Cli, Commands, ConfigAction},
    config::Config,
    download::Downloader,
    error::{AnnaDlError, ConfigError, Recovery, ScrapeError},
    progress::{self, ProgressStyle},
    scrape::{Book, DownloadLink, Scraper},
    tasks::{self, Message},
};

type Result<T> = std::result::Result<T, AnnaDlError>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_and_validate();

    // Load configuration (auto-creates if it doesn't exist)
    let mut config = Config::load()?;
    config.apply_overrides(cli.get_config_overrides());

    init_logging(&cli, &config)?;

    let outcome = match &cli.command {
        Some(command) => handle_command(command, &cli, &config).await,
        None => match cli.query_string() {
            Some(query) => handle_search(&cli, &config, &query).await,
            None => {
                eprintln!("{}", messages::NO_QUERY);
                return Ok(());
            }
        },
    };

    if let Err(e) = outcome {
        report_error(&e);
        std::process::exit(1);
    }
    Ok(())
}

/// Initialize logging based on CLI arguments and the `[logging]` section
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let filter = EnvFilter::try_new(cli.get_log_level(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if let Some(log_file) = &config.logging.file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        subscriber.with_ansi(false).with_writer(file).init();
    } else if cli.quiet {
        subscriber.without_time().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

fn report_error(error: &AnnaDlError) {
    let kind = error.kind();
    eprintln!("\x1b[1;31m✗ {}\x1b[0m", kind.message());
    eprintln!("  \x1b[90m└─\x1b[0m {}", error);
    match kind.recovery() {
        Recovery::Retry => eprintln!("  \x1b[90m└─\x1b[0m Try again in a moment."),
        Recovery::BackToSearch => {
            eprintln!("  \x1b[90m└─\x1b[0m Try another book, link or query.")
        }
    }
}

/// Handle subcommands
async fn handle_command(command: &Commands, cli: &Cli, config: &Config) -> Result<()> {
    match command {
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => {
                let config_path = Config::active_path()?;

                println!("Configuration file location:");
                println!("  {}", config_path.display());
                println!();
                println!("Download directory:");
                println!("  {}", config.download_dir(cli.output.as_deref()).display());
                println!();
                println!("Current configuration:");
                println!("{}", "─".repeat(60));
                let toml = toml::to_string_pretty(config).map_err(|e| {
                    ConfigError::ParseError(format!("Failed to serialize config: {}", e))
                })?;
                println!("{}", toml);
                println!("{}", "─".repeat(60));
                Ok(())
            }

            Some(ConfigAction::SetPath { path }) => {
                let config_path = Config::active_path()?;
                // Persist only what is in the file, not environment overrides.
                let mut stored = Config::read_file(&config_path)?;
                let absolute = stored.set_download_path(path)?;
                stored.save(&config_path)?;
                println!("\x1b[32m✓ Download directory set to:\x1b[0m {}", absolute.display());
                Ok(())
            }
        },

        Commands::Cleanup => {
            let downloader = Downloader::from_config(config, cli.output.as_deref())?;
            let removed = downloader.cleanup_partial_downloads().await?;
            println!(
                "Removed {} partial download{} from {}",
                removed,
                if removed == 1 { "" } else { "s" },
                downloader.download_dir().display()
            );
            Ok(())
        }

        Commands::Version => {
            println!("anna-dl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Wait for the next message, treating a closed channel as cancellation
async fn next_message(rx: &mut UnboundedReceiver<Message>) -> Result<Message> {
    rx.recv().await.ok_or(AnnaDlError::Cancelled)
}

fn spinner(cli: &Cli, message: &'static str) -> ProgressBar {
    if cli.quiet || cli.json {
        return ProgressBar::hidden();
    }
    let bar = progress::create_progress_bar(0, ProgressStyle::Stream);
    bar.set_message(message);
    bar
}

/// Search, pick a book and a link, then download
async fn handle_search(cli: &Cli, config: &Config, query: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let scraper = Arc::new(Scraper::from_config(config)?);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let books = search_books(cli, config, query, &scraper, &tx, &cancel, &mut rx).await?;
    if books.is_empty() {
        if cli.json {
            println!("{}", serde_json::json!({ "books": [] }));
        } else {
            report_error(&ScrapeError::NoResults { query: query.to_string() }.into());
        }
        return Ok(());
    }

    let Some(book) = books.get(cli.book - 1) else {
        return Err(ConfigError::Invalid {
            field: "--book".to_string(),
            reason: format!("only {} result(s) available", books.len()),
        }
        .into());
    };

    let status = spinner(cli, "Fetching download links...");
    tasks::spawn_links(Arc::clone(&scraper), book.url.clone(), tx.clone(), cancel.clone());
    let links = match next_message(&mut rx).await? {
        Message::LinkResult(result) => result,
        _ => Err(AnnaDlError::Cancelled),
    };
    status.finish_and_clear();
    let links = links?;

    if cli.dry_run {
        print_listing(cli, &books, book, &links);
        return Ok(());
    }

    if !cli.json {
        print_books(&books);
        println!();
        println!("\x1b[1m{}\x1b[0m", book.title);
        print_links(&links);
        println!();
    }

    let Some(link) = cli::select_link(&links, cli.link) else {
        if links.is_empty() {
            report_error(&ScrapeError::NoLinks { url: book.url.clone() }.into());
            return Ok(());
        }
        return Err(ConfigError::Invalid {
            field: "--link".to_string(),
            reason: format!("only {} link(s) available", links.len()),
        }
        .into());
    };

    let filename = cli
        .filename
        .clone()
        .unwrap_or_else(|| book.suggested_filename());
    let downloader = Downloader::from_config(config, cli.output.as_deref())?;
    let path = download_book(cli, downloader, link, filename, &tx, &cancel, &mut rx).await?;

    if cli.json {
        println!("{}", serde_json::json!({ "book": book, "link": link, "path": path }));
    } else {
        println!("\x1b[1;32m✓ Complete:\x1b[0m \x1b[37m{}\x1b[0m", path.display());
    }
    Ok(())
}

async fn search_books(
    cli: &Cli,
    config: &Config,
    query: &str,
    scraper: &Arc<Scraper>,
    tx: &mpsc::UnboundedSender<Message>,
    cancel: &CancellationToken,
    rx: &mut UnboundedReceiver<Message>,
) -> Result<Vec<Book>> {
    let max_results = config.search.max_results;
    let cache = if cli.no_cache {
        None
    } else {
        SearchCache::new()
            .map_err(|e| tracing::warn!("Search cache unavailable: {}", e))
            .ok()
    };

    cache::search_cached(cache.as_ref(), query, max_results, move || async move {
        let status = spinner(cli, "Searching...");
        tasks::spawn_search(
            Arc::clone(scraper),
            query.to_string(),
            max_results,
            tx.clone(),
            cancel.clone(),
        );
        let result = match next_message(rx).await? {
            Message::SearchResult(result) => result,
            _ => Err(AnnaDlError::Cancelled),
        };
        status.finish_and_clear();
        result
    })
    .await
}

async fn download_book(
    cli: &Cli,
    downloader: Downloader,
    link: &DownloadLink,
    filename: String,
    tx: &mpsc::UnboundedSender<Message>,
    cancel: &CancellationToken,
    rx: &mut UnboundedReceiver<Message>,
) -> Result<PathBuf> {
    if downloader.is_download_in_progress(&filename) {
        tracing::warn!("A partial download of {} already exists", filename);
    }

    tasks::spawn_download(
        downloader,
        link.url.clone(),
        Some(filename),
        tx.clone(),
        cancel.clone(),
    );

    let show_progress = !(cli.quiet || cli.json);
    let mut bar: Option<ProgressBar> = None;
    loop {
        match next_message(rx).await? {
            Message::Progress { current, total } => {
                if !show_progress {
                    continue;
                }
                let bar = bar.get_or_insert_with(|| {
                    progress::create_progress_bar(total, ProgressStyle::for_total(total))
                });
                bar.set_position(current);
                if total == 0 {
                    bar.set_message(progress::format_progress(current, total));
                }
            }
            Message::Complete(result) => {
                if let Some(bar) = bar.take() {
                    bar.finish_and_clear();
                }
                return result;
            }
            _ => {}
        }
    }
}

fn print_books(books: &[Book]) {
    for (i, book) in books.iter().enumerate() {
        println!("{:>3}. \x1b[1m{}\x1b[0m", i + 1, book.title);
        println!(
            "     \x1b[90m{} · {} · {} · {} · {}\x1b[0m",
            book.author, book.year, book.language, book.format, book.size
        );
    }
}

fn print_links(links: &[DownloadLink]) {
    for (i, link) in links.iter().enumerate() {
        let marker = if link.is_reliable() { " \x1b[32m✓\x1b[0m" } else { "" };
        println!("{:>3}. [{}] {}{}", i + 1, link.source, link.text, marker);
    }
}

fn print_listing(cli: &Cli, books: &[Book], book: &Book, links: &[DownloadLink]) {
    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "books": books, "selected": book, "links": links })
        );
        return;
    }

    print_books(books);
    println!();
    println!("\x1b[1m{}\x1b[0m", book.title);
    if links.is_empty() {
        println!("{}", messages::NO_LINKS);
    } else {
        print_links(links);
    }
}
