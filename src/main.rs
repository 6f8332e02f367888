//! browse - scrape pages from the browser you are already logged in to.
//!
//! Every command loads the config, attaches to the relay, acts on one tab,
//! prints JSON on stdout and disconnects. Failures print
//! `{ "error", "code", "hint" }` on stderr and exit with the kind's code.

mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use browse_config::{Config, ConfigError, ConfigLoader, ConfigValidator, LoggingSection};
use browse_relay::{ConnectionConfig, ConnectionManager, PageHandle};
use browse_scrapers::generic;
use browse_scrapers::sites::{InstagramScraper, LinkedInScraper, RedditScraper, TwitterScraper};
use browse_scrapers::{ScrapeError, ScrapeOptions};

use cli::{Cli, Commands, InstagramAction, LinkedinAction, RedditAction, TwitterAction};

/// Exit code for failures outside the scraping taxonomy (bad config, I/O).
const EXIT_USAGE: u8 = 1;

fn init_tracing(logging: &LoggingSection) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let file_layer = match &logging.dir {
        Some(dir) => {
            let log_dir = ConfigLoader::expand_path(dir);
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("creating log directory {}", log_dir.display()))?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("browse")
                .filename_suffix("log")
                .max_log_files(14)
                .build(&log_dir)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Flushes buffered lines on exit.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Explicit paths must exist; the default location may be absent.
fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => {
            let path = ConfigLoader::expand_path(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            let mut config = ConfigLoader::load(&path)?;
            ConfigLoader::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
            Ok(config)
        }
        None => ConfigLoader::load_or_default(&ConfigLoader::default_path()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return report(&anyhow::Error::new(e)),
    };

    if let Err(e) = init_tracing(&config.logging) {
        return report(&e);
    }

    match ConfigValidator::ensure_valid(&config) {
        Ok(warnings) => {
            for warning in warnings {
                warn!("{}: {}", warning.path, warning.message);
            }
        }
        Err(e) => return report(&anyhow::Error::new(e)),
    }

    let manager = ConnectionManager::with_cdp(ConnectionConfig::from(&config.relay));
    let options = ScrapeOptions::from(&config.scraping);

    let result = run(&cli, &manager, options).await;
    manager.disconnect().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(cli: &Cli, manager: &ConnectionManager, options: ScrapeOptions) -> anyhow::Result<()> {
    let out = Output {
        compact: cli.compact,
    };

    match &cli.command {
        Commands::Pages => {
            let pages = manager.list_pages().await.map_err(ScrapeError::from)?;
            out.print(&pages)
        }
        Commands::Switch { index } => {
            let page = manager
                .switch_page(*index)
                .await
                .map_err(ScrapeError::from)?;
            let info = generic::page_info(page.as_ref()).await?;
            out.print(&json!({ "index": index, "url": info.url, "title": info.title }))
        }
        Commands::Info => {
            let page = current_page(manager, cli.tab).await?;
            out.print(&generic::page_info(page.as_ref()).await?)
        }
        Commands::Navigate { url } => {
            let page = current_page(manager, cli.tab).await?;
            let result = generic::navigate(page.as_ref(), url, options.navigation_timeout).await?;
            out.print(&result)
        }
        Commands::Screenshot { full_page, output } => {
            let page = current_page(manager, cli.tab).await?;
            let shot = generic::take_screenshot(page.as_ref(), *full_page).await?;
            match output {
                Some(path) => {
                    write_png(path, &shot.decode()?)?;
                    out.print(&json!({ "path": path, "size": shot.size }))
                }
                None => out.print(&shot),
            }
        }
        Commands::Scrape { selector } => {
            let page = current_page(manager, cli.tab).await?;
            out.print(&generic::scrape_page(page.as_ref(), selector.as_deref()).await?)
        }
        Commands::Exec { script } => {
            let page = current_page(manager, cli.tab).await?;
            out.print(&generic::execute_script(page.as_ref(), script).await?)
        }
        Commands::Twitter { action } => {
            let page = current_page(manager, cli.tab).await?;
            let scraper = TwitterScraper::new(page.as_ref(), options);
            match action {
                TwitterAction::Profile { username } => {
                    out.print(&scraper.scrape_profile(username).await?)
                }
                TwitterAction::Timeline { username, count } => {
                    out.print(&scraper.scrape_timeline(username.as_deref(), *count).await?)
                }
                TwitterAction::Post { url } => out.print(&scraper.scrape_post(url).await?),
                TwitterAction::Search { query, count } => {
                    out.print(&scraper.scrape_search(query, *count).await?)
                }
                TwitterAction::List { list_id, count } => {
                    out.print(&scraper.scrape_list(list_id, *count).await?)
                }
            }
        }
        Commands::Linkedin { action } => {
            let page = current_page(manager, cli.tab).await?;
            let scraper = LinkedInScraper::new(page.as_ref(), options);
            match action {
                LinkedinAction::Profile { profile } => {
                    out.print(&scraper.scrape_profile(profile).await?)
                }
                LinkedinAction::Posts { profile, count } => {
                    out.print(&scraper.scrape_posts(profile, *count).await?)
                }
                LinkedinAction::Search { query, kind, count } => {
                    out.print(&scraper.scrape_search(query, *kind, *count).await?)
                }
            }
        }
        Commands::Reddit { action } => {
            let page = current_page(manager, cli.tab).await?;
            let scraper = RedditScraper::new(page.as_ref(), options);
            match action {
                RedditAction::User { username } => out.print(&scraper.scrape_user(username).await?),
                RedditAction::Subreddit { name, count, sort } => {
                    out.print(&scraper.scrape_subreddit(name, *count, *sort).await?)
                }
                RedditAction::Post { url, max_comments } => {
                    out.print(&scraper.scrape_post(url, *max_comments).await?)
                }
            }
        }
        Commands::Instagram { action } => {
            let page = current_page(manager, cli.tab).await?;
            let scraper = InstagramScraper::new(page.as_ref(), options);
            match action {
                InstagramAction::Profile { username } => {
                    out.print(&scraper.scrape_profile(username).await?)
                }
                InstagramAction::Posts { username, count } => {
                    out.print(&scraper.scrape_posts(username, *count).await?)
                }
                InstagramAction::Stories { username } => {
                    out.print(&scraper.scrape_stories(username).await?)
                }
            }
        }
    }
}

/// The tab to act on: `--tab` when given, else the manager's current tab.
async fn current_page(
    manager: &ConnectionManager,
    tab: Option<usize>,
) -> Result<Arc<dyn PageHandle>, ScrapeError> {
    let page = match tab {
        Some(index) => manager.switch_page(index).await?,
        None => manager.get_page().await?,
    };
    debug!("Using tab {}", page.target_id());
    Ok(page)
}

fn write_png(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

struct Output {
    compact: bool,
}

impl Output {
    fn print<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        let text = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        println!("{}", text);
        Ok(())
    }
}

/// Print the failure as JSON on stderr and pick the exit code.
fn report(err: &anyhow::Error) -> ExitCode {
    let body = match err.downcast_ref::<ScrapeError>() {
        Some(e) => {
            let kind = e.kind();
            json!({ "error": e.to_string(), "code": kind.code(), "hint": kind.hint() })
        }
        None => {
            let code = if err.downcast_ref::<ConfigError>().is_some() {
                "config_error"
            } else {
                "internal_error"
            };
            json!({ "error": format!("{:#}", err), "code": code, "hint": null })
        }
    };
    eprintln!("{}", body);

    let code = err
        .downcast_ref::<ScrapeError>()
        .map(|e| e.kind().exit_code())
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(EXIT_USAGE);
    ExitCode::from(code)
}
